//! Focus routing between the page stack, dialog stack and filter bar

use tracing::debug;

use crate::effect::Effect;
use crate::message::Message;

/// The surface that currently receives key and paste input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FocusOwner {
    #[default]
    Page,
    Dialog,
    FilterBar,
}

/// Tracks the single focus owner and the one before it
#[derive(Debug, Clone, Default)]
pub struct FocusRouter {
    current: FocusOwner,
    previous: FocusOwner,
}

impl FocusRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> FocusOwner {
        self.current
    }

    pub fn previous(&self) -> FocusOwner {
        self.previous
    }

    pub fn is_focused(&self, owner: FocusOwner) -> bool {
        self.current == owner
    }

    /// Move focus to `owner` and announce it.
    ///
    /// `previous` only changes when the owner actually changes, so repeated
    /// requests for the same owner never lose the way back.
    pub fn change_focus(&mut self, owner: FocusOwner) -> Effect {
        let previous = self.current;
        if owner != previous {
            self.previous = previous;
            self.current = owner;
            debug!("Focus {:?} -> {:?}", previous, owner);
        }
        Effect::message(Message::FocusChanged { owner, previous })
    }

    /// Restore the previous owner
    pub fn request_previous_focus(&mut self) -> Effect {
        self.change_focus(self.previous)
    }
}
