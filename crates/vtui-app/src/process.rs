//! Message processing - bridges the update function and effect dispatch

use tokio::task::JoinHandle;
use tracing::trace;

use crate::dispatch::Dispatcher;
use crate::handler;
use crate::message::Message;
use crate::state::AppState;
use crate::view::Context;

/// Run one message through `update` and dispatch the resulting effect.
///
/// Returns the handle of the spawned effect task, if any work was left after
/// enqueueing bare messages.
pub fn process_message(
    state: &mut AppState,
    msg: Message,
    ctx: &Context,
    dispatcher: &Dispatcher,
) -> Option<JoinHandle<()>> {
    trace!("Processing {}", msg.name());
    let effect = handler::update(state, msg, ctx);
    dispatcher.dispatch(effect)
}
