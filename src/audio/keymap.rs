//! Key bindings for the music toggle.

use crate::key::{self, Binding};
use crossterm::event::KeyCode;

/// Keys the music toggle reacts to while focused.
#[derive(Debug, Clone)]
pub struct KeyMap {
    /// Starts or stops the music.
    pub toggle: Binding,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            toggle: Binding::new(vec![KeyCode::Char(' '), KeyCode::Enter, KeyCode::Char('m')])
                .with_help("space", "play/pause music"),
        }
    }
}

impl key::KeyMap for KeyMap {
    fn short_help(&self) -> Vec<&Binding> {
        vec![&self.toggle]
    }
}

/// Returns the default music toggle key map.
pub fn default_key_map() -> KeyMap {
    KeyMap::default()
}
