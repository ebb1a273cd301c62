//! Message types for the application (TEA pattern)

use std::collections::HashMap;
use std::fmt;

use uuid::Uuid;

use vtui_core::Mount;

use crate::debounce::Fence;
use crate::discovery::DiscoveryReport;
use crate::focus::FocusOwner;
use crate::input_key::InputKey;
use crate::view::{Dialog, DialogId, Page, PageId};

/// Severity of a status line entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// Transient status shown under the active page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub level: StatusLevel,
    pub text: String,
}

impl StatusLine {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Info,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Error,
            text: text.into(),
        }
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            StatusLevel::Info => write!(f, "{}", self.text),
            StatusLevel::Warning => write!(f, "warning: {}", self.text),
            StatusLevel::Error => write!(f, "error: {}", self.text),
        }
    }
}

/// Successful backend payloads
#[derive(Debug)]
pub enum Payload {
    Mounts(Vec<Mount>),
    Discovery(DiscoveryReport),
}

/// A collaborator error converted at the engine boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseError {
    pub message: String,
    /// Whether retrying (refresh) may succeed
    pub recoverable: bool,
}

impl fmt::Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<vtui_core::Error> for ResponseError {
    fn from(err: vtui_core::Error) -> Self {
        Self {
            recoverable: err.is_recoverable(),
            message: err.to_string(),
        }
    }
}

/// All possible messages in the application
#[derive(Debug)]
pub enum Message {
    // ─────────────────────────────────────────────────────────
    // Input
    // ─────────────────────────────────────────────────────────
    /// Keyboard event from the frontend
    Key(InputKey),
    /// Bracketed paste
    Paste(String),
    /// Window resized
    Resize { width: u16, height: u16 },
    /// Tick event for periodic updates
    Tick,

    // ─────────────────────────────────────────────────────────
    // Focus
    // ─────────────────────────────────────────────────────────
    /// The focus owner changed
    FocusChanged {
        owner: FocusOwner,
        previous: FocusOwner,
    },
    /// Request to move focus to `owner`
    ChangeFocus(FocusOwner),
    /// Request to restore the previous focus owner
    RequestPreviousFocus,

    // ─────────────────────────────────────────────────────────
    // Navigation commands
    // ─────────────────────────────────────────────────────────
    /// Push a page; `root` replaces the whole stack
    OpenPage { page: Box<dyn Page>, root: bool },
    /// Pop the active page (the root is never popped)
    ClosePage,
    OpenDialog(Box<dyn Dialog>),
    /// Close a dialog by id, or the top dialog when `None`
    CloseDialog(Option<DialogId>),

    // ─────────────────────────────────────────────────────────
    // Lifecycle notifications
    // ─────────────────────────────────────────────────────────
    PageOpened(PageId),
    PageClosed(PageId),
    PageHidden,
    PageVisible,
    PageRefocused,
    PageBlurred,
    DialogOpened(DialogId),
    DialogClosed(DialogId),

    // ─────────────────────────────────────────────────────────
    // Tasks
    // ─────────────────────────────────────────────────────────
    TaskStarted { id: String },
    TaskCancelled { id: String },
    /// Cancel every task whose metadata contains all of `filters`
    CancelTasks { filters: HashMap<String, String> },

    // ─────────────────────────────────────────────────────────
    // Deferred events
    // ─────────────────────────────────────────────────────────
    /// A debounce check came due
    DebounceFired { id: String, fence: Fence },
    /// Periodic or manual refresh for a page
    RefreshRequested { page: PageId },
    /// Debounced filter query
    FilterChanged { value: String },
    /// Backend call finished, correlated by request id
    BackendResponse {
        request_id: Uuid,
        result: Result<Payload, ResponseError>,
    },

    // ─────────────────────────────────────────────────────────
    // Control
    // ─────────────────────────────────────────────────────────
    Status(StatusLine),
    Quit,
}

impl Message {
    /// Variant name, for logging
    pub fn name(&self) -> &'static str {
        match self {
            Message::Key(_) => "Key",
            Message::Paste(_) => "Paste",
            Message::Resize { .. } => "Resize",
            Message::Tick => "Tick",
            Message::FocusChanged { .. } => "FocusChanged",
            Message::ChangeFocus(_) => "ChangeFocus",
            Message::RequestPreviousFocus => "RequestPreviousFocus",
            Message::OpenPage { .. } => "OpenPage",
            Message::ClosePage => "ClosePage",
            Message::OpenDialog(_) => "OpenDialog",
            Message::CloseDialog(_) => "CloseDialog",
            Message::PageOpened(_) => "PageOpened",
            Message::PageClosed(_) => "PageClosed",
            Message::PageHidden => "PageHidden",
            Message::PageVisible => "PageVisible",
            Message::PageRefocused => "PageRefocused",
            Message::PageBlurred => "PageBlurred",
            Message::DialogOpened(_) => "DialogOpened",
            Message::DialogClosed(_) => "DialogClosed",
            Message::TaskStarted { .. } => "TaskStarted",
            Message::TaskCancelled { .. } => "TaskCancelled",
            Message::CancelTasks { .. } => "CancelTasks",
            Message::DebounceFired { .. } => "DebounceFired",
            Message::RefreshRequested { .. } => "RefreshRequested",
            Message::FilterChanged { .. } => "FilterChanged",
            Message::BackendResponse { .. } => "BackendResponse",
            Message::Status(_) => "Status",
            Message::Quit => "Quit",
        }
    }

    /// Key and paste input, which is routed to the focus owner only
    pub fn is_input(&self) -> bool {
        matches!(self, Message::Key(_) | Message::Paste(_))
    }

    /// Build a backend response from a collaborator result
    pub fn response<T>(
        request_id: Uuid,
        result: vtui_core::Result<T>,
        into_payload: impl FnOnce(T) -> Payload,
    ) -> Self {
        Message::BackendResponse {
            request_id,
            result: result.map(into_payload).map_err(ResponseError::from),
        }
    }
}
