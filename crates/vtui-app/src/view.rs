//! Contracts for the frames hosted by the page and dialog stacks
//!
//! Views only mutate themselves in response to messages and return
//! [`Effect`]s for anything deferred. Rendering is a pull-based query with no
//! side effects.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::debounce::Debouncer;
use crate::effect::Effect;
use crate::input_key::KeyBinding;
use crate::message::Message;
use crate::task_registry::TaskRegistry;

/// Unique page identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(String);

impl PageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh id with a readable prefix, e.g. `browser-3f2a9c1e`
    pub fn unique(prefix: &str) -> Self {
        let uuid = Uuid::new_v4().simple().to_string();
        Self(format!("{}-{}", prefix, &uuid[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique dialog identifier; reopening an id reuses the stack slot
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DialogId(String);

impl DialogId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DialogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shared engine services available to views
#[derive(Debug, Clone)]
pub struct Context {
    pub tasks: Arc<TaskRegistry>,
    pub debouncer: Arc<Debouncer>,
}

impl Context {
    pub fn new(tasks: Arc<TaskRegistry>, debouncer: Arc<Debouncer>) -> Self {
        Self { tasks, debouncer }
    }
}

/// A navigation stack frame
pub trait Page: Send + fmt::Debug {
    fn id(&self) -> &PageId;

    fn title(&self) -> &str;

    /// Called once when pushed
    fn init(&mut self, ctx: &Context) -> Effect;

    fn handle(&mut self, msg: &Message, ctx: &Context) -> Effect;

    fn render(&self) -> String;

    /// Called once when popped or replaced
    fn close(&mut self, _ctx: &Context) -> Effect {
        Effect::none()
    }

    fn set_size(&mut self, _width: u16, _height: u16) {}

    /// Period of automatic refresh; `None` disables it
    fn refresh_interval(&self) -> Option<Duration> {
        None
    }

    fn supports_filtering(&self) -> bool {
        false
    }

    /// Whether key input should reach this page when it is active
    fn has_input_focus(&self) -> bool {
        true
    }

    fn short_help(&self) -> Vec<KeyBinding> {
        Vec::new()
    }

    fn full_help(&self) -> Vec<KeyBinding> {
        self.short_help()
    }
}

/// Size class of a dialog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DialogSize {
    Small,
    #[default]
    Medium,
    Large,
    Full,
    Custom { width: u16, height: u16 },
}

impl DialogSize {
    /// Concrete dimensions inside a `width` x `height` window
    pub fn dimensions(self, width: u16, height: u16) -> (u16, u16) {
        let scale = |value: u16, percent: u32| (u32::from(value) * percent / 100) as u16;
        match self {
            DialogSize::Small => (scale(width, 40), scale(height, 30)),
            DialogSize::Medium => (scale(width, 60), scale(height, 50)),
            DialogSize::Large => (scale(width, 80), scale(height, 75)),
            DialogSize::Full => (width, height),
            DialogSize::Custom {
                width: w,
                height: h,
            } => (w.min(width), h.min(height)),
        }
    }
}

/// A modal overlay frame
pub trait Dialog: Send + fmt::Debug {
    fn id(&self) -> &DialogId;

    fn init(&mut self, _ctx: &Context) -> Effect {
        Effect::none()
    }

    fn handle(&mut self, msg: &Message, ctx: &Context) -> Effect;

    fn render(&self) -> String;

    fn close(&mut self, _ctx: &Context) -> Effect {
        Effect::none()
    }

    fn set_size(&mut self, _width: u16, _height: u16) {}

    fn size(&self) -> DialogSize {
        DialogSize::Medium
    }

    /// While this dialog is on top, no other dialog may open over it
    fn disables_children(&self) -> bool {
        false
    }

    fn has_input_focus(&self) -> bool {
        true
    }
}
