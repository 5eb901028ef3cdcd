//! Copy-to-clipboard button for Bubble Tea applications.
//!
//! Shows a fixed value (a payment ID, an address) and copies it to the
//! system clipboard on request. A successful copy is confirmed for a short
//! window; a failure asks the user to copy the value by hand.
//!
//! Clipboard access needs the `clipboard-support` feature, which is on by
//! default. Without it every copy reports a failure.
//!
//! ```rust
//! use festival_widgets::copy::new;
//!
//! let button = new("UPI ID", "kali-puja@paytm");
//! assert!(!button.copied());
//! let _cmd = button.copy(); // resolves to CopiedMsg or CopyErrMsg
//! ```

use crate::key::{self, Binding};
use crate::Component;
use bubbletea_rs::{tick as bubbletea_tick, Cmd, KeyMsg, Model as BubbleTeaModel, Msg};
use crossterm::event::KeyCode;
use lipgloss_extras::prelude::*;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

static LAST_ID: AtomicI64 = AtomicI64::new(0);

fn next_id() -> i64 {
    LAST_ID.fetch_add(1, Ordering::SeqCst) + 1
}

/// The value reached the clipboard.
#[derive(Debug, Clone)]
pub struct CopiedMsg {
    /// The button that copied.
    pub id: i64,
}

/// The clipboard refused the value.
#[derive(Debug, Clone)]
pub struct CopyErrMsg {
    /// The button that tried to copy.
    pub id: i64,
    /// Why the copy failed.
    pub reason: String,
}

/// Ends the confirmation window of one successful copy.
#[derive(Debug, Clone)]
pub struct ResetMsg {
    /// The button to reset.
    pub id: i64,
    tag: i64,
}

/// Keys the copy button reacts to while focused.
#[derive(Debug, Clone)]
pub struct KeyMap {
    /// Copies the value.
    pub copy: Binding,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            copy: Binding::new(vec![KeyCode::Char('c'), KeyCode::Enter]).with_help("c", "copy"),
        }
    }
}

impl key::KeyMap for KeyMap {
    fn short_help(&self) -> Vec<&Binding> {
        vec![&self.copy]
    }
}

/// Visual styles of the copy button.
#[derive(Debug, Clone)]
pub struct Styles {
    /// The label in front of the value.
    pub label: Style,
    /// The value itself.
    pub value: Style,
    /// The confirmation line.
    pub confirm: Style,
    /// The failure line.
    pub error: Style,
}

impl Default for Styles {
    fn default() -> Self {
        Self {
            label: Style::new().faint(true),
            value: Style::new().bold(true),
            confirm: Style::new().foreground(Color::from("#2E7D32")),
            error: Style::new().foreground(Color::from("#C62828")),
        }
    }
}

/// A value with a copy action and transient feedback.
#[derive(Debug, Clone)]
pub struct Model {
    /// Caption shown before the value.
    pub label: String,
    /// Text placed on the clipboard.
    pub value: String,
    /// How long the confirmation stays visible.
    pub confirm_for: Duration,
    /// Key bindings, active while focused.
    pub keymap: KeyMap,
    /// Visual styles.
    pub styles: Styles,
    id: i64,
    tag: i64,
    copied: bool,
    error: Option<String>,
    focus: bool,
}

impl Model {
    /// Creates a button for `value` with a two second confirmation.
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            confirm_for: Duration::from_secs(2),
            keymap: KeyMap::default(),
            styles: Styles::default(),
            id: next_id(),
            tag: 0,
            copied: false,
            error: None,
            focus: false,
        }
    }

    /// Sets how long the confirmation stays visible.
    pub fn with_confirm_for(mut self, confirm_for: Duration) -> Self {
        self.confirm_for = confirm_for;
        self
    }

    /// Unique id of this button.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Whether the confirmation is showing.
    pub fn copied(&self) -> bool {
        self.copied
    }

    /// Why the last copy failed, if it did.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Copies the value outside the update loop.
    ///
    /// The command resolves to [`CopiedMsg`] or [`CopyErrMsg`].
    pub fn copy(&self) -> Cmd {
        let id = self.id;
        let value = self.value.clone();
        bubbletea_tick(Duration::from_nanos(1), move |_| {
            match write_clipboard(value.clone()) {
                Ok(()) => Box::new(CopiedMsg { id }) as Msg,
                Err(reason) => Box::new(CopyErrMsg { id, reason }) as Msg,
            }
        })
    }

    fn reset_after(&self) -> Cmd {
        let id = self.id;
        let tag = self.tag;
        bubbletea_tick(self.confirm_for, move |_| Box::new(ResetMsg { id, tag }) as Msg)
    }

    /// Applies copy outcomes and confirmation resets; copies on the bound
    /// key while focused.
    pub fn update(&mut self, msg: Msg) -> Option<Cmd> {
        if let Some(copied) = msg.downcast_ref::<CopiedMsg>() {
            if copied.id != self.id {
                return None;
            }
            debug!(button = self.id, "value copied to clipboard");
            self.copied = true;
            self.error = None;
            self.tag += 1;
            return Some(self.reset_after());
        }

        if let Some(failed) = msg.downcast_ref::<CopyErrMsg>() {
            if failed.id != self.id {
                return None;
            }
            warn!(button = self.id, reason = %failed.reason, "clipboard copy failed");
            self.copied = false;
            self.error = Some(failed.reason.clone());
            self.tag += 1;
            return None;
        }

        if let Some(reset) = msg.downcast_ref::<ResetMsg>() {
            // Only the newest copy may end the confirmation.
            if reset.id == self.id && reset.tag == self.tag {
                self.copied = false;
            }
            return None;
        }

        if let Some(key_msg) = msg.downcast_ref::<KeyMsg>() {
            if self.focus && self.keymap.copy.matches(key_msg) {
                return Some(self.copy());
            }
        }

        None
    }

    /// Renders `Label: value`, plus the confirmation or failure line.
    pub fn view(&self) -> String {
        let marker = if self.focus { "> " } else { "  " };
        let line = format!(
            "{}{} {}",
            marker,
            self.styles.label.render(&format!("{}:", self.label)),
            self.styles.value.render(&self.value)
        );

        if self.copied {
            format!(
                "{}\n{}",
                line,
                self.styles.confirm.render("  ✓ Copied to clipboard!")
            )
        } else if self.error.is_some() {
            format!(
                "{}\n{}",
                line,
                self.styles
                    .error
                    .render(&format!("  Copy failed: please copy the {} manually", self.label))
            )
        } else {
            line
        }
    }
}

#[cfg(feature = "clipboard-support")]
fn write_clipboard(value: String) -> Result<(), String> {
    use clipboard::{ClipboardContext, ClipboardProvider};

    let mut ctx: ClipboardContext = ClipboardProvider::new()
        .map_err(|e| format!("Failed to create clipboard context: {}", e))?;
    ctx.set_contents(value)
        .map_err(|e| format!("Failed to write clipboard: {}", e))
}

#[cfg(not(feature = "clipboard-support"))]
fn write_clipboard(_value: String) -> Result<(), String> {
    Err("Clipboard support not enabled".to_string())
}

impl Component for Model {
    fn focus(&mut self) -> Option<Cmd> {
        self.focus = true;
        None
    }

    fn blur(&mut self) {
        self.focus = false;
    }

    fn focused(&self) -> bool {
        self.focus
    }
}

impl BubbleTeaModel for Model {
    fn init() -> (Self, Option<Cmd>) {
        let mut model = new("UPI ID", "kali-puja@paytm");
        model.focus = true;
        (model, None)
    }

    fn update(&mut self, msg: Msg) -> Option<Cmd> {
        self.update(msg)
    }

    fn view(&self) -> String {
        self.view()
    }
}

/// Creates a copy button showing `label` and copying `value`.
pub fn new(label: impl Into<String>, value: impl Into<String>) -> Model {
    Model::new(label, value)
}
