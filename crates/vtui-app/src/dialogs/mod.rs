//! Concrete dialogs hosted by the dialog stack

pub mod confirm_dialog;
pub mod help_dialog;
pub mod message_dialog;

pub use confirm_dialog::{ConfirmQuitDialog, CONFIRM_QUIT_ID};
pub use help_dialog::{global_bindings, HelpDialog, HELP_DIALOG_ID};
pub use message_dialog::MessageDialog;
