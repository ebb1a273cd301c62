//! Concrete pages hosted by the page stack

pub mod secret_browser;
pub mod secret_detail;

pub use secret_browser::{Row, SecretBrowserPage, INCOMPLETE_DIALOG_ID};
pub use secret_detail::{SecretDetail, SecretDetailPage};
