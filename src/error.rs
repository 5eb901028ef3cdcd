//! Error types shared by the widgets.

use thiserror::Error;

/// Reasons an audio resource can refuse a play request.
///
/// Play failures are never fatal: the toggle logs them, shows a notice and
/// falls back to the paused state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    /// The host environment blocked playback (for example an autoplay policy
    /// that requires a user gesture first).
    #[error("playback not allowed: {0}")]
    NotAllowed(String),

    /// The resource has not buffered enough data to start.
    #[error("resource is not ready to play")]
    NotReady,

    /// A pause reached the resource before the request could start.
    #[error("play request aborted")]
    Aborted,
}

/// Convenience alias for results of playback requests.
pub type PlaybackResult<T = ()> = Result<T, PlaybackError>;
