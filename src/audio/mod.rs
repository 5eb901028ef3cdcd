//! Music toggle component for Bubble Tea applications.
//!
//! A floating play/pause control for one background track. The toggle does
//! not decode audio itself; it drives anything implementing
//! [`AudioResource`]: a `play` request that may be refused, an infallible
//! `pause`, and lifecycle events (`CanPlayThrough`, `Ended`) delivered
//! through a subscription.
//!
//! # States
//!
//! ```text
//! NotReady --ready--> Paused --toggle--> Starting --confirmed--> Playing
//!                       ^                   |                       |
//!                       +---refused/toggle--+                       |
//!                       +----------------toggle or ended------------+
//! ```
//!
//! Toggling while not ready does nothing.
//!
//! # Basic Usage
//!
//! ```rust
//! use festival_widgets::audio::{new, SimulatedTrack, Status};
//! use std::sync::Arc;
//!
//! let track = SimulatedTrack::builder().build();
//! let mut toggle = new(Arc::new(track.clone()));
//! assert_eq!(toggle.status(), Status::NotReady);
//!
//! toggle.on_resource_ready();
//! assert!(toggle.is_ready());
//! assert!(!toggle.is_playing());
//! ```
//!
//! # bubbletea-rs Integration
//!
//! ```rust
//! use bubbletea_rs::{Model as BubbleTeaModel, Msg, Cmd};
//! use festival_widgets::audio::{new, Model, SimulatedTrack};
//! use festival_widgets::Component;
//! use std::sync::Arc;
//!
//! struct Player {
//!     music: Model,
//! }
//!
//! impl BubbleTeaModel for Player {
//!     fn init() -> (Self, Option<Cmd>) {
//!         let track = SimulatedTrack::builder().build();
//!         track.load();
//!         let mut music = new(Arc::new(track));
//!         music.focus();
//!         let cmd = music.init();
//!         (Self { music }, cmd)
//!     }
//!
//!     fn update(&mut self, msg: Msg) -> Option<Cmd> {
//!         self.music.update(msg)
//!     }
//!
//!     fn view(&self) -> String {
//!         self.music.view()
//!     }
//! }
//! ```

pub mod keymap;
pub mod model;
pub mod resource;
pub mod simulated;


pub use keymap::{default_key_map, KeyMap};
pub use model::{Model, PlayResultMsg, PlaybackState, ResourceEventMsg, Status, Styles};
pub use resource::{
    AudioResource, EventHub, PlayFuture, ResourceEvent, Subscription, SubscriptionId,
};
pub use simulated::{SimulatedTrack, SimulatedTrackBuilder};

use std::sync::Arc;

/// Creates a music toggle for `resource`.
pub fn new(resource: Arc<dyn AudioResource>) -> Model {
    Model::new(resource)
}
