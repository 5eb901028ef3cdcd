//! Festival home screen: countdown, background music toggle and the
//! donation UPI ID, composed from `festival-widgets`.
//!
//! Logs go to a file so the terminal UI stays clean:
//!
//! ```text
//! RUST_LOG=festival_widgets=debug cargo run -- --track-secs 20 --no-loop
//! ```

mod app;

use anyhow::{Context, Result};
use bubbletea_rs::Program;
use chrono::NaiveDateTime;
use clap::Parser;
use festival_widgets::countdown::{parse_target, KALI_PUJA_2025};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Settings read once at startup. `Model::init` takes no arguments, so the
/// app pulls them from here.
pub static SETTINGS: OnceCell<Settings> = OnceCell::new();

#[derive(Parser, Debug)]
#[command(name = "festival", about = "Shantinagar Kali Puja home screen")]
struct Cli {
    /// Local date-time the countdown runs to, e.g. 2025-11-01T18:00:00
    #[arg(long, value_parser = parse_target)]
    target: Option<NaiveDateTime>,

    /// Length of the simulated devotional track in seconds
    #[arg(long, default_value_t = 180)]
    track_secs: u64,

    /// Play the track once instead of looping it
    #[arg(long)]
    no_loop: bool,

    /// Refuse the first play request, like a browser autoplay policy
    #[arg(long)]
    block_autoplay: bool,

    /// UPI ID shown on the donation line
    #[arg(long, default_value = "kali-puja@paytm")]
    upi_id: String,

    /// Log file path
    #[arg(long, default_value = "festival.log")]
    log_file: PathBuf,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Resolved demo configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub target: NaiveDateTime,
    pub track_length: Duration,
    pub looping: bool,
    pub rejected_plays: usize,
    pub upi_id: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target: *KALI_PUJA_2025,
            track_length: Duration::from_secs(180),
            looping: true,
            rejected_plays: 0,
            upi_id: "kali-puja@paytm".to_string(),
        }
    }
}

impl From<&Cli> for Settings {
    fn from(cli: &Cli) -> Self {
        Self {
            target: cli.target.unwrap_or(*KALI_PUJA_2025),
            track_length: Duration::from_secs(cli.track_secs.max(1)),
            looping: !cli.no_loop,
            rejected_plays: usize::from(cli.block_autoplay),
            upi_id: cli.upi_id.clone(),
        }
    }
}

fn init_logging(path: &Path, level: &str) -> Result<WorkerGuard> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .context("log file path has no file name")?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(filter)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))?;

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(&cli.log_file, &cli.log_level)?;

    let settings = Settings::from(&cli);
    info!(
        target_time = %settings.target,
        track_secs = settings.track_length.as_secs(),
        looping = settings.looping,
        "starting festival screen"
    );
    SETTINGS
        .set(settings)
        .map_err(|_| anyhow::anyhow!("settings already initialized"))?;

    let program = Program::<app::App>::builder().alt_screen(true).build()?;
    program.run().await?;

    info!("festival screen closed");
    Ok(())
}
