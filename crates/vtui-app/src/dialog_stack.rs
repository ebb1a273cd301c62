//! Modal overlay stack
//!
//! Every dialog on the stack is rendered, bottom to top, but only the top one
//! receives key input.

use tracing::{debug, info, warn};

use crate::effect::Effect;
use crate::focus::{FocusOwner, FocusRouter};
use crate::message::{Message, StatusLine};
use crate::view::{Context, Dialog, DialogId};

#[derive(Debug, Default)]
pub struct DialogStack {
    dialogs: Vec<Box<dyn Dialog>>,
    width: u16,
    height: u16,
}

impl DialogStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.dialogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dialogs.is_empty()
    }

    pub fn top(&self) -> Option<&dyn Dialog> {
        self.dialogs.last().map(|d| d.as_ref())
    }

    /// Dialog ids from bottom to top
    pub fn ids(&self) -> Vec<DialogId> {
        self.dialogs.iter().map(|d| d.id().clone()).collect()
    }

    pub fn contains(&self, id: &DialogId) -> bool {
        self.dialogs.iter().any(|d| d.id() == id)
    }

    /// Open `dialog` on top of the stack.
    ///
    /// Refused while the top dialog disables children; focus is then simply
    /// sent back to the dialog layer. A dialog whose id is already on the
    /// stack takes over that slot and moves to the top without being
    /// re-initialised.
    pub fn open(
        &mut self,
        mut dialog: Box<dyn Dialog>,
        focus: &mut FocusRouter,
        ctx: &Context,
    ) -> Effect {
        if let Some(top) = self.dialogs.last() {
            if top.disables_children() {
                warn!(
                    "Dialog {} refused: {} disables children",
                    dialog.id(),
                    top.id()
                );
                let status = Effect::message(Message::Status(StatusLine::warning(format!(
                    "close {} first",
                    top.id()
                ))));
                return focus.change_focus(FocusOwner::Dialog).then(status);
            }
        }

        let (width, height) = dialog.size().dimensions(self.width, self.height);
        dialog.set_size(width, height);

        if let Some(pos) = self.dialogs.iter().position(|d| d.id() == dialog.id()) {
            debug!("Dialog {} reopened, moving to top", dialog.id());
            self.dialogs.remove(pos);
            self.dialogs.push(dialog);
            return focus.change_focus(FocusOwner::Dialog);
        }

        info!("Opening dialog {}", dialog.id());
        let init = dialog.init(ctx);
        let id = dialog.id().clone();
        self.dialogs.push(dialog);

        let announce = focus
            .change_focus(FocusOwner::Dialog)
            .then(Effect::message(Message::DialogOpened(id)));
        announce.and(init)
    }

    /// Close `id`, or the top dialog when `None`.
    ///
    /// Focus returns to the page layer once the stack is empty. A newly
    /// exposed dialog is not refocused.
    pub fn close(&mut self, id: Option<&DialogId>, focus: &mut FocusRouter, ctx: &Context) -> Effect {
        let removed = match id {
            Some(id) => self
                .dialogs
                .iter()
                .position(|d| d.id() == id)
                .map(|pos| self.dialogs.remove(pos)),
            None => self.dialogs.pop(),
        };
        let Some(mut dialog) = removed else {
            debug!("No dialog to close for {:?}", id);
            return Effect::none();
        };

        info!("Closing dialog {}", dialog.id());
        let closed = dialog
            .close(ctx)
            .then(Effect::message(Message::DialogClosed(dialog.id().clone())));
        if self.dialogs.is_empty() {
            closed.then(focus.change_focus(FocusOwner::Page))
        } else {
            closed
        }
    }

    /// Close every dialog, top first
    pub fn close_all(&mut self, focus: &mut FocusRouter, ctx: &Context) -> Effect {
        let mut effects = Vec::with_capacity(self.dialogs.len());
        while !self.dialogs.is_empty() {
            effects.push(self.close(None, focus, ctx));
        }
        Effect::sequence(effects)
    }

    /// Deliver key or paste input to the top dialog
    pub fn route_input(&mut self, msg: &Message, ctx: &Context) -> Effect {
        match self.dialogs.last_mut() {
            Some(top) if top.has_input_focus() => top.handle(msg, ctx),
            _ => Effect::none(),
        }
    }

    /// Deliver a non-input message to every dialog
    pub fn broadcast(&mut self, msg: &Message, ctx: &Context) -> Effect {
        Effect::batch(self.dialogs.iter_mut().map(|d| d.handle(msg, ctx)))
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        for dialog in &mut self.dialogs {
            let (w, h) = dialog.size().dimensions(width, height);
            dialog.set_size(w, h);
        }
    }

    /// Render every dialog, bottom first
    pub fn render(&self) -> Vec<String> {
        self.dialogs.iter().map(|d| d.render()).collect()
    }
}
