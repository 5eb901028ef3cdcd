//! Key bindings for the interactive widgets.
//!
//! A [`Binding`] pairs one or more key codes with a short help label. Widgets
//! expose their bindings through a key map implementing [`KeyMap`], which the
//! host screen can render as a help line.
//!
//! ```rust
//! use festival_widgets::key::Binding;
//! use bubbletea_rs::KeyMsg;
//! use crossterm::event::{KeyCode, KeyModifiers};
//!
//! let toggle = Binding::new(vec![KeyCode::Char(' '), KeyCode::Enter])
//!     .with_help("space", "play/pause");
//!
//! let msg = KeyMsg { key: KeyCode::Enter, modifiers: KeyModifiers::NONE };
//! assert!(toggle.matches(&msg));
//! ```

use bubbletea_rs::KeyMsg;
use crossterm::event::KeyCode;

/// A set of keys that trigger one widget action.
#[derive(Debug, Clone)]
pub struct Binding {
    /// Key codes that activate the binding. Modifiers are ignored.
    pub keys: Vec<KeyCode>,
    /// Short key label shown in help, e.g. `"space"`.
    pub help: String,
    /// What the binding does, e.g. `"play/pause"`.
    pub description: String,
    enabled: bool,
}

impl Binding {
    /// Creates an enabled binding without help text.
    pub fn new(keys: Vec<KeyCode>) -> Self {
        Self {
            keys,
            help: String::new(),
            description: String::new(),
            enabled: true,
        }
    }

    /// Sets the help label and description.
    pub fn with_help(mut self, help: impl Into<String>, description: impl Into<String>) -> Self {
        self.help = help.into();
        self.description = description.into();
        self
    }

    /// Enables or disables the binding. Disabled bindings never match and are
    /// left out of help output.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether the binding is currently active.
    pub fn enabled(&self) -> bool {
        self.enabled && !self.keys.is_empty()
    }

    /// Reports whether `msg` triggers this binding.
    pub fn matches(&self, msg: &KeyMsg) -> bool {
        self.enabled() && self.keys.contains(&msg.key)
    }

    /// Renders `help description`, or an empty string when disabled.
    pub fn help_line(&self) -> String {
        if !self.enabled() {
            return String::new();
        }
        format!("{} {}", self.help, self.description)
    }
}

/// Implemented by widget key maps so hosts can list available actions.
pub trait KeyMap {
    /// Bindings to show in a one-line help view.
    fn short_help(&self) -> Vec<&Binding>;
}

/// Joins the enabled bindings of a key map into a single help line.
pub fn short_help_view<K: KeyMap + ?Sized>(keymap: &K, separator: &str) -> String {
    keymap
        .short_help()
        .into_iter()
        .filter(|b| b.enabled())
        .map(Binding::help_line)
        .collect::<Vec<_>>()
        .join(separator)
}
