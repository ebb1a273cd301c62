//! Global key bindings and focus-based input routing

use vtui_core::prelude::*;

use crate::dialogs::{ConfirmQuitDialog, HelpDialog};
use crate::effect::Effect;
use crate::focus::FocusOwner;
use crate::input_key::InputKey;
use crate::message::Message;
use crate::state::AppState;
use crate::task_registry::metadata;
use crate::view::Context;

/// Route key or paste input to exactly one receiver.
///
/// Ctrl+C always quits. Global bindings only apply while pages own focus,
/// so typing into the filter bar or a dialog never triggers them.
pub fn route_input(state: &mut AppState, msg: &Message, ctx: &Context) -> Effect {
    if let Message::Key(InputKey::CharCtrl('c')) = msg {
        return Effect::message(Message::Quit);
    }

    match state.focus.current() {
        FocusOwner::Dialog if !state.dialogs.is_empty() => state.dialogs.route_input(msg, ctx),
        FocusOwner::FilterBar => state.filter.handle(msg, &mut state.focus, ctx),
        _ => {
            if let Message::Key(key) = msg {
                if let Some(effect) = handle_global_key(state, key, ctx) {
                    return effect;
                }
            }
            state.pages.route_input(msg, &state.focus, ctx)
        }
    }
}

fn handle_global_key(state: &mut AppState, key: &InputKey, ctx: &Context) -> Option<Effect> {
    match key {
        InputKey::Char('q') => {
            let running = ctx.tasks.count();
            if running > 0 {
                debug!("Quit requested with {} running tasks", running);
                Some(Effect::message(Message::OpenDialog(Box::new(
                    ConfirmQuitDialog::new(running),
                ))))
            } else {
                Some(Effect::message(Message::Quit))
            }
        }
        InputKey::Esc if state.pages.len() > 1 => Some(Effect::message(Message::ClosePage)),
        InputKey::Char('/') => {
            let filtering = state.pages.active().is_some_and(|p| p.supports_filtering());
            filtering.then(|| state.focus.change_focus(FocusOwner::FilterBar))
        }
        InputKey::Char('?') => {
            let page = state.pages.active()?;
            let dialog = HelpDialog::new(page.title(), page.full_help());
            Some(Effect::message(Message::OpenDialog(Box::new(dialog))))
        }
        InputKey::Char('x') => {
            let page = state.pages.active()?;
            let filters = metadata([("page", page.id().as_str())]);
            Some(Effect::message(Message::CancelTasks { filters }))
        }
        _ => None,
    }
}
