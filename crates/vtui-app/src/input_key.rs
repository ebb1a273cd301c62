//! Abstract input key event, independent of any terminal library.
//!
//! Frontends convert their native key events into [`InputKey`] at the
//! boundary so the engine can be driven headlessly and from tests.

use std::fmt;

/// Abstract input key event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputKey {
    // Character keys
    /// Regular character key (a-z, 0-9, symbols)
    Char(char),
    /// Character with Ctrl modifier (Ctrl+a, Ctrl+c, etc.)
    CharCtrl(char),

    // Navigation
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,

    // Action keys
    Enter,
    Esc,
    Tab,
    BackTab,
    Backspace,
    Delete,

    /// Function key (F1-F12)
    F(u8),
}

impl fmt::Display for InputKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputKey::Char(c) => write!(f, "{}", c),
            InputKey::CharCtrl(c) => write!(f, "ctrl+{}", c),
            InputKey::Up => f.write_str("↑"),
            InputKey::Down => f.write_str("↓"),
            InputKey::Left => f.write_str("←"),
            InputKey::Right => f.write_str("→"),
            InputKey::Home => f.write_str("home"),
            InputKey::End => f.write_str("end"),
            InputKey::PageUp => f.write_str("pgup"),
            InputKey::PageDown => f.write_str("pgdn"),
            InputKey::Enter => f.write_str("enter"),
            InputKey::Esc => f.write_str("esc"),
            InputKey::Tab => f.write_str("tab"),
            InputKey::BackTab => f.write_str("shift+tab"),
            InputKey::Backspace => f.write_str("backspace"),
            InputKey::Delete => f.write_str("del"),
            InputKey::F(n) => write!(f, "f{}", n),
        }
    }
}

/// A key binding advertised in help output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    pub keys: Vec<InputKey>,
    pub help: String,
}

impl KeyBinding {
    pub fn new(keys: impl IntoIterator<Item = InputKey>, help: impl Into<String>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
            help: help.into(),
        }
    }

    pub fn matches(&self, key: &InputKey) -> bool {
        self.keys.contains(key)
    }
}

impl fmt::Display for KeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<String> = self.keys.iter().map(ToString::to_string).collect();
        write!(f, "{} {}", keys.join("/"), self.help)
    }
}
