//! Loading state for page data fed by backend responses

use uuid::Uuid;

/// Display state of a page's data
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Errored(String),
}

/// Data plus the state of the most recent load.
///
/// Previously loaded data is kept while reloading or after an error, so a
/// failed refresh does not blank the page.
#[derive(Debug, Clone, Default)]
pub struct Loadable<T> {
    data: Option<T>,
    state: LoadState,
}

impl<T> Loadable<T> {
    pub fn new() -> Self {
        Self {
            data: None,
            state: LoadState::Idle,
        }
    }

    pub fn begin(&mut self) {
        self.state = LoadState::Loading;
    }

    pub fn finish(&mut self, data: T) {
        self.data = Some(data);
        self.state = LoadState::Loaded;
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.state = LoadState::Errored(error.into());
    }

    /// Back to idle after an aborted load, keeping data
    pub fn abort(&mut self) {
        if self.state == LoadState::Loading {
            self.state = LoadState::Idle;
        }
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            LoadState::Errored(e) => Some(e),
            _ => None,
        }
    }
}

/// Request ids a page is still waiting on
#[derive(Debug, Clone, Default)]
pub struct PendingRequests {
    ids: Vec<Uuid>,
}

impl PendingRequests {
    /// Allocate and remember a new request id
    pub fn issue(&mut self) -> Uuid {
        let id = Uuid::new_v4();
        self.ids.push(id);
        id
    }

    /// Take `id` out of the pending set. False for responses this page
    /// never asked for, or already handled.
    pub fn accept(&mut self, id: Uuid) -> bool {
        match self.ids.iter().position(|pending| *pending == id) {
            Some(pos) => {
                self.ids.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Forget every outstanding request
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }
}
