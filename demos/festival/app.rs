use crate::{Settings, SETTINGS};
use bubbletea_rs::{batch, quit, Cmd, KeyMsg, Model, Msg};
use crossterm::event::{KeyCode, KeyModifiers};
use festival_widgets::audio::{PlayResultMsg, ResourceEventMsg};
use festival_widgets::copy::{CopiedMsg, CopyErrMsg, ResetMsg};
use festival_widgets::prelude::*;
use lipgloss_extras::prelude::*;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Music,
    Donation,
}

pub struct App {
    countdown: Countdown,
    music: MusicToggle,
    upi: CopyButton,
    focus: Focus,
    title_style: Style,
    subtitle_style: Style,
    heading_style: Style,
    help_style: Style,
}

impl App {
    fn new(settings: &Settings) -> (Self, Vec<Cmd>) {
        let mut countdown = countdown_new(settings.target);
        let tick = countdown.activate();

        let track = SimulatedTrack::builder()
            .length(settings.track_length)
            .looping(settings.looping)
            .reject_plays(settings.rejected_plays)
            .build();
        track.load();
        let mut music = music_toggle_new(Arc::new(track));
        let listen = music.init();
        music.focus();

        let upi = copy_button_new("UPI ID", settings.upi_id.clone());

        let mut cmds = vec![tick];
        cmds.extend(listen);

        let app = Self {
            countdown,
            music,
            upi,
            focus: Focus::Music,
            title_style: Style::new().bold(true).foreground(Color::from("#B71C1C")),
            subtitle_style: Style::new().faint(true),
            heading_style: Style::new().bold(true).foreground(Color::from("#D4AF37")),
            help_style: Style::new().faint(true),
        };
        (app, cmds)
    }

    fn cycle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Music => {
                self.music.blur();
                self.upi.focus();
                Focus::Donation
            }
            Focus::Donation => {
                self.upi.blur();
                self.music.focus();
                Focus::Music
            }
        };
        debug!(focus = ?self.focus, "focus moved");
    }

    fn help(&self) -> String {
        let widget = match self.focus {
            Focus::Music => short_help_view(&self.music.keymap, " • "),
            Focus::Donation => short_help_view(&self.upi.keymap, " • "),
        };
        let mut parts = vec!["tab switch".to_string()];
        if !widget.is_empty() {
            parts.push(widget);
        }
        parts.push("q quit".to_string());
        parts.join(" • ")
    }
}

impl Model for App {
    fn init() -> (Self, Option<Cmd>) {
        let settings = SETTINGS.get().cloned().unwrap_or_default();
        let (app, cmds) = App::new(&settings);
        (app, Some(batch(cmds)))
    }

    fn update(&mut self, msg: Msg) -> Option<Cmd> {
        if let Some(key) = msg.downcast_ref::<KeyMsg>() {
            match key.key {
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return Some(quit());
                }
                KeyCode::Char('q') | KeyCode::Esc => return Some(quit()),
                KeyCode::Tab | KeyCode::BackTab => {
                    self.cycle_focus();
                    return None;
                }
                _ => {}
            }
            return match self.focus {
                Focus::Music => self.music.update(msg),
                Focus::Donation => self.upi.update(msg),
            };
        }

        if msg.is::<CountdownReachedMsg>() {
            info!("countdown reached the festival start");
            return self.countdown.update(msg);
        }
        if msg.is::<CountdownTickMsg>() {
            return self.countdown.update(msg);
        }
        if msg.is::<ResourceEventMsg>() || msg.is::<PlayResultMsg>() {
            return self.music.update(msg);
        }
        if msg.is::<CopiedMsg>() || msg.is::<CopyErrMsg>() || msg.is::<ResetMsg>() {
            return self.upi.update(msg);
        }

        None
    }

    fn view(&self) -> String {
        let countdown = if self.countdown.reached() {
            self.heading_style.render("Jai Maa Kali! The celebration has begun.")
        } else {
            self.countdown.view()
        };

        format!(
            "\n  {}\n  {}\n\n  {}\n  {}\n\n{}\n\n  {}\n{}\n\n  {}\n",
            self.title_style.render("Shantinagar Kali Puja"),
            self.subtitle_style
                .render("A Celebration of Devotion, Unity, and Art"),
            self.heading_style.render("Countdown to Kali Puja"),
            countdown,
            self.music.view(),
            self.heading_style.render("Support the Puja"),
            self.upi.view(),
            self.help_style.render(&self.help()),
        )
    }
}
