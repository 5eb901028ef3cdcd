#![warn(missing_docs)]

//! # festival-widgets
//!
//! Interactive widgets for festival landing screens, built for
//! [bubbletea-rs](https://github.com/joshka/bubbletea-rs) applications.
//!
//! ## Overview
//!
//! Each widget follows the Elm Architecture used by bubbletea-rs: it owns its
//! state, reacts to messages in `update()`, schedules work by returning
//! commands, and renders itself with `view()`. Widgets filter messages by
//! their own id, so several instances can live side by side.
//!
//! ## Components
//!
//! | Component | Description | Module |
//! |-----------|-------------|--------|
//! | `Countdown` | Days/hours/minutes/seconds left until a local date-time | [`countdown`] |
//! | `MusicToggle` | Play/pause control for one background track | [`audio`] |
//! | `CopyButton` | Copies a fixed value to the clipboard with feedback | [`copy`] |
//!
//! ## Quick Start
//!
//! ```rust
//! use festival_widgets::prelude::*;
//! use bubbletea_rs::{batch, Cmd, Model, Msg};
//! use std::sync::Arc;
//!
//! struct Home {
//!     countdown: Countdown,
//!     music: MusicToggle,
//! }
//!
//! impl Model for Home {
//!     fn init() -> (Self, Option<Cmd>) {
//!         let mut countdown = countdown_new(*KALI_PUJA_2025);
//!         let tick = countdown.activate();
//!
//!         let track = SimulatedTrack::builder().build();
//!         track.load();
//!         let mut music = music_toggle_new(Arc::new(track));
//!         let _ = music.focus();
//!
//!         let mut cmds = vec![tick];
//!         cmds.extend(music.init());
//!         (Self { countdown, music }, Some(batch(cmds)))
//!     }
//!
//!     fn update(&mut self, msg: Msg) -> Option<Cmd> {
//!         if msg.is::<CountdownTickMsg>() || msg.is::<CountdownReachedMsg>() {
//!             return self.countdown.update(msg);
//!         }
//!         // Resource events, play results and key presses
//!         self.music.update(msg)
//!     }
//!
//!     fn view(&self) -> String {
//!         format!("{}\n{}", self.countdown.view(), self.music.view())
//!     }
//! }
//! ```

pub mod audio;
pub mod copy;
pub mod countdown;
pub mod error;
pub mod key;

use bubbletea_rs::Cmd;

/// Focus management shared by the interactive widgets.
///
/// A focused widget reacts to its key bindings; a blurred one ignores key
/// presses but still processes its own timer and resource messages.
///
/// # Examples
///
/// ```rust
/// use festival_widgets::prelude::*;
///
/// fn cycle<A: Component, B: Component>(a: &mut A, b: &mut B) {
///     if a.focused() {
///         a.blur();
///         let _ = b.focus();
///     } else {
///         b.blur();
///         let _ = a.focus();
///     }
/// }
///
/// let mut upi = copy_button_new("UPI ID", "kali-puja@paytm");
/// let mut other = copy_button_new("Phone", "+91 00000 00000");
/// cycle(&mut upi, &mut other);
/// assert!(upi.focused());
/// cycle(&mut upi, &mut other);
/// assert!(other.focused() && !upi.focused());
/// ```
pub trait Component {
    /// Gives the widget keyboard focus. May return a command to run.
    fn focus(&mut self) -> Option<Cmd>;

    /// Takes keyboard focus away.
    fn blur(&mut self);

    /// Whether the widget currently has focus.
    fn focused(&self) -> bool;
}

pub use audio::{
    new as music_toggle_new, AudioResource, Model as MusicToggle, PlaybackState, ResourceEvent,
    SimulatedTrack, Status as MusicStatus,
};
pub use copy::{new as copy_button_new, Model as CopyButton};
pub use countdown::{
    new as countdown_new, Model as Countdown, ReachedMsg as CountdownReachedMsg,
    RemainingDuration, TickMsg as CountdownTickMsg, KALI_PUJA_2025,
};
pub use error::PlaybackError;
pub use key::{Binding, KeyMap};

/// Prelude module for convenient imports.
///
/// ```rust
/// use festival_widgets::prelude::*;
///
/// let countdown = countdown_new(*KALI_PUJA_2025);
/// assert!(!countdown.active());
/// ```
pub mod prelude {
    pub use crate::audio::{
        new as music_toggle_new, AudioResource, Model as MusicToggle, PlayResultMsg,
        PlaybackState, ResourceEvent, ResourceEventMsg, SimulatedTrack, Status as MusicStatus,
    };
    pub use crate::copy::{
        new as copy_button_new, CopiedMsg, CopyErrMsg, Model as CopyButton,
    };
    pub use crate::countdown::{
        new as countdown_new, new_with_options as countdown_new_with_options, with_interval,
        with_label_style, with_style, CountdownOption, Model as Countdown,
        ReachedMsg as CountdownReachedMsg, RemainingDuration, TickMsg as CountdownTickMsg,
        KALI_PUJA_2025,
    };
    pub use crate::error::PlaybackError;
    pub use crate::key::{short_help_view, Binding, KeyMap};
    pub use crate::Component;
}
