//! Informational and error popups

use crate::effect::Effect;
use crate::input_key::InputKey;
use crate::message::{Message, StatusLevel};
use crate::view::{Context, Dialog, DialogId, DialogSize};

/// A titled text popup, dismissed with Enter or Esc
#[derive(Debug, Clone)]
pub struct MessageDialog {
    id: DialogId,
    level: StatusLevel,
    title: String,
    body: String,
    width: u16,
}

impl MessageDialog {
    pub fn new(
        id: impl Into<String>,
        level: StatusLevel,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: DialogId::new(id),
            level,
            title: title.into(),
            body: body.into(),
            width: 0,
        }
    }

    pub fn info(id: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(id, StatusLevel::Info, title, body)
    }

    pub fn warning(id: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(id, StatusLevel::Warning, title, body)
    }

    pub fn error(id: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(id, StatusLevel::Error, title, body)
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

impl Dialog for MessageDialog {
    fn id(&self) -> &DialogId {
        &self.id
    }

    fn handle(&mut self, msg: &Message, _ctx: &Context) -> Effect {
        match msg {
            Message::Key(InputKey::Enter | InputKey::Esc) => {
                Effect::message(Message::CloseDialog(Some(self.id.clone())))
            }
            _ => Effect::none(),
        }
    }

    fn render(&self) -> String {
        let marker = match self.level {
            StatusLevel::Info => "i",
            StatusLevel::Warning => "!",
            StatusLevel::Error => "x",
        };
        let mut out = format!("[{}] {}\n{}", marker, self.title, self.body);
        if self.width > 0 {
            let rule = "-".repeat(usize::from(self.width).min(out.len()));
            out = format!("{}\n{}", out, rule);
        }
        out
    }

    fn set_size(&mut self, width: u16, _height: u16) {
        self.width = width;
    }

    fn size(&self) -> DialogSize {
        DialogSize::Small
    }
}
