//! vtui-app - Orchestration engine for vault-tui
//!
//! Implements the TEA (The Elm Architecture) pattern: a closed [`Message`]
//! enum, an `update` function that returns an [`Effect`], and an [`Engine`]
//! that applies messages one at a time while effects run concurrently.
//! Around that core sit the focus router, page and dialog stacks, task
//! registry, debouncer, and budgeted recursive discovery, plus the concrete
//! views that use them.

pub mod cancel;
pub mod config;
pub mod debounce;
pub mod dialog_stack;
pub mod dialogs;
pub mod discovery;
pub mod dispatch;
pub mod effect;
pub mod engine;
pub mod filter_bar;
pub mod focus;
pub mod handler;
pub mod input_key;
pub mod loadable;
pub mod message;
pub mod page_stack;
pub mod pages;
pub mod process;
pub mod signals;
pub mod state;
pub mod task_registry;
pub mod view;

#[cfg(test)]
mod test_support;

// Re-export primary types
pub use config::Settings;
pub use debounce::{Debouncer, Fence};
pub use discovery::{discover, DiscoveryOptions, DiscoveryReport};
pub use dispatch::Dispatcher;
pub use effect::Effect;
pub use engine::Engine;
pub use focus::{FocusOwner, FocusRouter};
pub use input_key::{InputKey, KeyBinding};
pub use message::{Message, Payload, ResponseError, StatusLevel, StatusLine};
pub use state::{AppPhase, AppState};
pub use task_registry::{TaskInfo, TaskRegistry};
pub use view::{Context, Dialog, DialogId, DialogSize, Page, PageId};
