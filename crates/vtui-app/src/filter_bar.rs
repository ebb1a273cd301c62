//! Filter input owned by the focus router's `FilterBar` slot
//!
//! Edits are debounced: the active page only sees one `FilterChanged` once
//! typing pauses.

use std::time::Duration;

use crate::effect::Effect;
use crate::focus::FocusRouter;
use crate::input_key::InputKey;
use crate::message::Message;
use crate::view::Context;

/// Debounce key shared by every filter edit
pub const FILTER_DEBOUNCE_ID: &str = "filter-bar";

#[derive(Debug, Clone)]
pub struct FilterBar {
    value: String,
    debounce: Duration,
}

impl FilterBar {
    pub fn new(debounce: Duration) -> Self {
        Self {
            value: String::new(),
            debounce,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Handle key or paste input while focused
    pub fn handle(&mut self, msg: &Message, focus: &mut FocusRouter, ctx: &Context) -> Effect {
        match msg {
            Message::Key(InputKey::Char(c)) => {
                self.value.push(*c);
                self.changed(ctx)
            }
            Message::Paste(text) => {
                self.value.extend(text.chars().filter(|c| !c.is_control()));
                self.changed(ctx)
            }
            Message::Key(InputKey::Backspace) => {
                if self.value.pop().is_some() {
                    self.changed(ctx)
                } else {
                    Effect::none()
                }
            }
            Message::Key(InputKey::Esc) => {
                // Clearing applies immediately
                let had_value = !self.value.is_empty();
                self.value.clear();
                ctx.debouncer.cancel(FILTER_DEBOUNCE_ID);
                let clear = if had_value {
                    Effect::message(Message::FilterChanged {
                        value: String::new(),
                    })
                } else {
                    Effect::none()
                };
                clear.and(focus.request_previous_focus())
            }
            Message::Key(InputKey::Enter) => focus.request_previous_focus(),
            _ => Effect::none(),
        }
    }

    fn changed(&self, ctx: &Context) -> Effect {
        ctx.debouncer.send(
            FILTER_DEBOUNCE_ID,
            self.debounce,
            Effect::message(Message::FilterChanged {
                value: self.value.clone(),
            }),
        )
    }

    pub fn render(&self, focused: bool) -> String {
        if focused {
            format!("/{}_", self.value)
        } else if self.value.is_empty() {
            String::new()
        } else {
            format!("/{}", self.value)
        }
    }
}
