//! Application state (Model in TEA pattern)

use crate::config::Settings;
use crate::dialog_stack::DialogStack;
use crate::filter_bar::FilterBar;
use crate::focus::{FocusOwner, FocusRouter};
use crate::message::StatusLine;
use crate::page_stack::PageStack;

/// Lifecycle of the whole application
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AppPhase {
    #[default]
    Running,
    /// Quit was accepted; the event loop exits after the current message
    Quitting,
}

/// Complete application state
#[derive(Debug)]
pub struct AppState {
    pub focus: FocusRouter,
    pub pages: PageStack,
    pub dialogs: DialogStack,
    pub filter: FilterBar,
    /// Most recent status line
    pub status: Option<StatusLine>,
    /// Terminal size (width, height)
    pub size: (u16, u16),
    pub phase: AppPhase,
    pub settings: Settings,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            focus: FocusRouter::new(),
            pages: PageStack::new(),
            dialogs: DialogStack::new(),
            filter: FilterBar::new(settings.ui.filter_debounce()),
            status: None,
            size: (80, 24),
            phase: AppPhase::Running,
            settings,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.phase == AppPhase::Quitting
    }

    /// Compose a text frame: breadcrumb, active page, filter bar, dialogs,
    /// status line
    pub fn render(&self) -> String {
        let mut sections = Vec::new();

        let breadcrumb = self.pages.breadcrumb();
        if !breadcrumb.is_empty() {
            sections.push(breadcrumb);
        }
        sections.push(self.pages.render());

        let filter_focused = self.focus.is_focused(FocusOwner::FilterBar);
        if filter_focused || !self.filter.value().is_empty() {
            sections.push(self.filter.render(filter_focused));
        }

        for dialog in self.dialogs.render() {
            sections.push(format!("┌─\n{}\n└─", dialog));
        }

        if let Some(status) = &self.status {
            sections.push(status.to_string());
        }

        sections.join("\n")
    }
}
