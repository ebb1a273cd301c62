//! Main update function - handles state transitions (TEA pattern)

use vtui_core::prelude::*;

use super::keys;
use crate::effect::Effect;
use crate::message::{Message, StatusLevel, StatusLine};
use crate::state::{AppPhase, AppState};
use crate::view::Context;

/// Process a message and return the effect to run.
///
/// Input goes to the single focus owner. Navigation commands go to the
/// stacks. Everything else is broadcast to all pages and dialogs.
pub fn update(state: &mut AppState, msg: Message, ctx: &Context) -> Effect {
    match msg {
        Message::Key(_) | Message::Paste(_) => keys::route_input(state, &msg, ctx),

        Message::Resize { width, height } => {
            state.size = (width, height);
            state.pages.resize(width, height);
            state.dialogs.resize(width, height);
            broadcast(state, &msg, ctx)
        }

        // ─────────────────────────────────────────────────────────
        // Focus
        // ─────────────────────────────────────────────────────────
        Message::ChangeFocus(owner) => state.focus.change_focus(owner),
        Message::RequestPreviousFocus => state.focus.request_previous_focus(),
        Message::FocusChanged { owner, previous } => {
            debug!("Focus {:?} -> {:?}", previous, owner);
            let page = state.pages.on_focus_changed(owner, previous, ctx);
            page.and(broadcast(state, &msg, ctx))
        }

        // ─────────────────────────────────────────────────────────
        // Navigation
        // ─────────────────────────────────────────────────────────
        Message::OpenPage { page, root } => state.pages.open(page, root, &mut state.focus, ctx),
        Message::ClosePage => state.pages.close_active(&mut state.focus, ctx),
        Message::OpenDialog(dialog) => state.dialogs.open(dialog, &mut state.focus, ctx),
        Message::CloseDialog(id) => state.dialogs.close(id.as_ref(), &mut state.focus, ctx),

        // ─────────────────────────────────────────────────────────
        // Tasks
        // ─────────────────────────────────────────────────────────
        Message::CancelTasks { filters } => {
            let cancelled = ctx.tasks.cancel_by_filter(&filters);
            if cancelled.is_empty() {
                debug!("No tasks matched {:?}", filters);
            }
            Effect::batch(cancelled.into_iter().map(Effect::message))
        }
        Message::TaskCancelled { ref id } => {
            state.status = Some(StatusLine::info(format!("cancelled {}", id)));
            broadcast(state, &msg, ctx)
        }

        // ─────────────────────────────────────────────────────────
        // Deferred events
        // ─────────────────────────────────────────────────────────
        Message::DebounceFired { id, fence } => ctx.debouncer.fire(&id, fence),
        Message::RefreshRequested { page } => state.pages.handle_refresh(&page, ctx),
        Message::FilterChanged { .. } => state.pages.route_filter(&msg, ctx),

        // ─────────────────────────────────────────────────────────
        // Control
        // ─────────────────────────────────────────────────────────
        Message::Status(line) => {
            if line.level == StatusLevel::Error {
                warn!("{}", line.text);
            }
            state.status = Some(line);
            Effect::none()
        }
        Message::Quit => {
            info!("Quit requested");
            state.phase = AppPhase::Quitting;
            Effect::none()
        }

        other => broadcast(state, &other, ctx),
    }
}

/// Deliver a non-input message to every page and dialog
fn broadcast(state: &mut AppState, msg: &Message, ctx: &Context) -> Effect {
    let pages = state.pages.broadcast(msg, ctx);
    pages.and(state.dialogs.broadcast(msg, ctx))
}
