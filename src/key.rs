//! Type-safe key bindings for feed navigation.
//!
//! A [`Binding`] associates one or more key codes with a single action and
//! carries the help text shown in the feed's footer. The [`KeyMap`] trait lets
//! a component expose its bindings to help renderers.

use bubbletea_rs::KeyMsg;
use crossterm::event::KeyCode;

/// Help text for a single binding: the key label and what it does.
#[derive(Debug, Clone, Default)]
pub struct Help {
    /// Short key label, e.g. `"↑/k"`.
    pub key: String,
    /// What the key does, e.g. `"up"`.
    pub desc: String,
}

/// A set of key codes bound to one action.
///
/// # Examples
///
/// ```rust
/// use bubbletea_feed::key::Binding;
/// use crossterm::event::KeyCode;
///
/// let up = Binding::new(vec![KeyCode::Up, KeyCode::Char('k')]).with_help("↑/k", "up");
/// assert_eq!(up.help().key, "↑/k");
/// ```
#[derive(Debug, Clone)]
pub struct Binding {
    keys: Vec<KeyCode>,
    help: Help,
    enabled: bool,
}

impl Binding {
    /// Creates a binding for the given key codes. Bindings start enabled.
    pub fn new(keys: Vec<KeyCode>) -> Self {
        Self {
            keys,
            help: Help::default(),
            enabled: true,
        }
    }

    /// Sets the help text shown for this binding.
    pub fn with_help(mut self, key: &str, desc: &str) -> Self {
        self.help = Help {
            key: key.to_string(),
            desc: desc.to_string(),
        };
        self
    }

    /// The key codes this binding responds to.
    pub fn keys(&self) -> &[KeyCode] {
        &self.keys
    }

    /// The help text for this binding.
    pub fn help(&self) -> &Help {
        &self.help
    }

    /// Whether the binding currently responds to input.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Enables or disables the binding. Disabled bindings never match and are
    /// skipped by help renderers.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Returns true if the key message matches one of this binding's keys.
    pub fn matches(&self, msg: &KeyMsg) -> bool {
        self.enabled && self.keys.contains(&msg.key)
    }
}

/// Trait for components that expose their key bindings for help displays.
pub trait KeyMap {
    /// The essential bindings, for a one-line help view.
    fn short_help(&self) -> Vec<&Binding>;
    /// All bindings, grouped in columns for an expanded help view.
    fn full_help(&self) -> Vec<Vec<&Binding>>;
}
