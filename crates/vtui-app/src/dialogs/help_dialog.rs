//! Key binding overview for the active page

use crate::effect::Effect;
use crate::input_key::{InputKey, KeyBinding};
use crate::message::Message;
use crate::view::{Context, Dialog, DialogId, DialogSize};

pub const HELP_DIALOG_ID: &str = "help";

/// Lists global bindings followed by the page's own. Blocks other dialogs
/// from stacking on top of it.
#[derive(Debug, Clone)]
pub struct HelpDialog {
    id: DialogId,
    page_title: String,
    bindings: Vec<KeyBinding>,
}

impl HelpDialog {
    pub fn new(page_title: impl Into<String>, page_bindings: Vec<KeyBinding>) -> Self {
        let mut bindings = global_bindings();
        bindings.extend(page_bindings);
        Self {
            id: DialogId::new(HELP_DIALOG_ID),
            page_title: page_title.into(),
            bindings,
        }
    }

    pub fn bindings(&self) -> &[KeyBinding] {
        &self.bindings
    }
}

/// Bindings handled by the engine regardless of the active page
pub fn global_bindings() -> Vec<KeyBinding> {
    vec![
        KeyBinding::new([InputKey::CharCtrl('c'), InputKey::Char('q')], "quit"),
        KeyBinding::new([InputKey::Esc], "back"),
        KeyBinding::new([InputKey::Char('/')], "filter"),
        KeyBinding::new([InputKey::Char('x')], "cancel running tasks"),
        KeyBinding::new([InputKey::Char('?')], "help"),
    ]
}

impl Dialog for HelpDialog {
    fn id(&self) -> &DialogId {
        &self.id
    }

    fn handle(&mut self, msg: &Message, _ctx: &Context) -> Effect {
        match msg {
            Message::Key(InputKey::Esc | InputKey::Enter | InputKey::Char('?' | 'q')) => {
                Effect::message(Message::CloseDialog(Some(self.id.clone())))
            }
            _ => Effect::none(),
        }
    }

    fn render(&self) -> String {
        let mut lines = vec![format!("Help: {}", self.page_title)];
        lines.extend(self.bindings.iter().map(|b| format!("  {}", b)));
        lines.join("\n")
    }

    fn size(&self) -> DialogSize {
        DialogSize::Large
    }

    fn disables_children(&self) -> bool {
        true
    }
}
