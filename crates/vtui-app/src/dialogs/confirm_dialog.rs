//! Quit confirmation while background tasks are still running

use crate::effect::Effect;
use crate::input_key::InputKey;
use crate::message::Message;
use crate::view::{Context, Dialog, DialogId, DialogSize};

pub const CONFIRM_QUIT_ID: &str = "confirm-quit";

#[derive(Debug, Clone)]
pub struct ConfirmQuitDialog {
    id: DialogId,
    task_count: usize,
}

impl ConfirmQuitDialog {
    pub fn new(task_count: usize) -> Self {
        Self {
            id: DialogId::new(CONFIRM_QUIT_ID),
            task_count,
        }
    }
}

impl Dialog for ConfirmQuitDialog {
    fn id(&self) -> &DialogId {
        &self.id
    }

    fn handle(&mut self, msg: &Message, _ctx: &Context) -> Effect {
        match msg {
            Message::Key(InputKey::Char('y') | InputKey::Enter) => Effect::message(Message::Quit),
            Message::Key(InputKey::Char('n') | InputKey::Esc) => {
                Effect::message(Message::CloseDialog(Some(self.id.clone())))
            }
            _ => Effect::none(),
        }
    }

    fn render(&self) -> String {
        let tasks = if self.task_count == 1 {
            "1 task is still running.".to_string()
        } else {
            format!("{} tasks are still running.", self.task_count)
        };
        format!("Quit vault-tui?\n{}\n[y] Quit  [n] Cancel", tasks)
    }

    fn size(&self) -> DialogSize {
        DialogSize::Small
    }

    fn disables_children(&self) -> bool {
        true
    }
}
