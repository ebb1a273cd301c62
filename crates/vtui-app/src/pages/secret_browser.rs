//! Root page: discovered secret tree with filtering and refresh
//!
//! Discovery runs as a registered task tagged with this page's id, so closing
//! the page (or pressing `x`) cancels it. Responses are matched against the
//! request ids this page issued; anything else is ignored.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use vtui_backend::Backend;
use vtui_core::{NodeId, SecretTree};

use crate::dialogs::MessageDialog;
use crate::discovery::{discover, DiscoveryOptions, DiscoveryReport};
use crate::effect::Effect;
use crate::input_key::{InputKey, KeyBinding};
use crate::loadable::{LoadState, Loadable, PendingRequests};
use crate::message::{Message, Payload, ResponseError, StatusLine};
use crate::pages::secret_detail::{SecretDetail, SecretDetailPage};
use crate::task_registry::metadata;
use crate::view::{Context, Page, PageId};

pub const INCOMPLETE_DIALOG_ID: &str = "discovery-incomplete";

/// One visible line of the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub node: NodeId,
    pub depth: usize,
    pub label: String,
}

pub struct SecretBrowserPage<B> {
    id: PageId,
    backend: Arc<B>,
    options: DiscoveryOptions,
    refresh: Option<Duration>,
    tree: Loadable<DiscoveryReport>,
    pending: PendingRequests,
    filter: String,
    selected: usize,
    focused: bool,
    visible: bool,
    height: u16,
}

impl<B> fmt::Debug for SecretBrowserPage<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretBrowserPage")
            .field("id", &self.id)
            .field("state", self.tree.state())
            .field("pending", &self.pending.len())
            .field("filter", &self.filter)
            .field("selected", &self.selected)
            .finish()
    }
}

impl<B> SecretBrowserPage<B>
where
    B: Backend + Sync + 'static,
{
    pub fn new(backend: Arc<B>, options: DiscoveryOptions) -> Self {
        Self {
            id: PageId::unique("browser"),
            backend,
            options,
            refresh: None,
            tree: Loadable::new(),
            pending: PendingRequests::default(),
            filter: String::new(),
            selected: 0,
            focused: true,
            visible: true,
            height: 0,
        }
    }

    pub fn with_refresh_interval(mut self, every: Option<Duration>) -> Self {
        self.refresh = every;
        self
    }

    /// Registry id of this page's discovery task
    pub fn task_id(&self) -> String {
        format!("discovery:{}", self.id)
    }

    pub fn report(&self) -> Option<&DiscoveryReport> {
        self.tree.data()
    }

    pub fn load_state(&self) -> &LoadState {
        self.tree.state()
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    fn start_discovery(&mut self, ctx: &Context) -> Effect {
        // A newer run supersedes any response still in flight
        self.pending.clear();
        let request_id = self.pending.issue();
        self.tree.begin();
        debug!("Page {} starting discovery {}", self.id, request_id);

        let backend = Arc::clone(&self.backend);
        let options = self.options;
        let meta = metadata([("kind", "discovery"), ("page", self.id.as_str())]);

        ctx.tasks.run(self.task_id(), meta, move |token| async move {
            let result = token
                .run_until_cancelled(async {
                    let mounts = backend.list_mounts().await?;
                    discover(backend.as_ref(), &mounts, options).await
                })
                .await?;
            Some(Message::response(request_id, result, Payload::Discovery))
        })
    }

    fn on_report(&mut self, report: &DiscoveryReport) -> Effect {
        let was_incomplete = self.report().is_some_and(|r| r.is_incomplete());
        let secrets = report.tree.leaf_count();
        let mounts = report.tree.roots().len();
        let listings = report.list_requests;
        let incomplete = report.is_incomplete();
        self.tree.finish(report.clone());
        self.clamp_selection();

        info!(
            "Page {} loaded {} secrets from {} mounts ({} listings)",
            self.id, secrets, mounts, listings
        );

        let status = Effect::message(Message::Status(StatusLine::info(format!(
            "{} secrets in {} mounts ({} listings)",
            secrets, mounts, listings
        ))));

        if incomplete && !was_incomplete {
            let dialog = MessageDialog::warning(
                INCOMPLETE_DIALOG_ID,
                "Partial results",
                format!(
                    "Stopped after {} listing requests; folders marked … were not explored.",
                    listings
                ),
            );
            status.and(Effect::message(Message::OpenDialog(Box::new(dialog))))
        } else {
            status
        }
    }

    fn on_error(&mut self, err: &ResponseError) -> Effect {
        warn!("Page {} discovery failed: {}", self.id, err);
        self.tree.fail(err.message.clone());
        let hint = if err.recoverable { " (r to retry)" } else { "" };
        Effect::message(Message::Status(StatusLine::error(format!(
            "discovery failed: {}{}",
            err, hint
        ))))
    }

    /// Visible rows after filtering, in tree order
    pub fn rows(&self) -> Vec<Row> {
        let Some(report) = self.report() else {
            return Vec::new();
        };
        let tree = &report.tree;
        let needle = self.filter.to_lowercase();
        tree.walk()
            .into_iter()
            .filter(|id| needle.is_empty() || matches_filter(tree, *id, &needle))
            .filter_map(|id| {
                let node = tree.get(id)?;
                let mut label = node.name().to_string();
                if node.incomplete && !node.is_leaf() {
                    label.push_str(" …");
                }
                if let Some(caps) = &node.capabilities {
                    if node.is_leaf() {
                        label.push_str(&format!(" [{}]", caps));
                    }
                }
                Some(Row {
                    node: id,
                    depth: tree.depth(id),
                    label,
                })
            })
            .collect()
    }

    fn clamp_selection(&mut self) {
        let count = self.rows().len();
        self.selected = self.selected.min(count.saturating_sub(1));
    }

    fn open_selected(&self) -> Effect {
        let Some(report) = self.report() else {
            return Effect::none();
        };
        let rows = self.rows();
        let Some(row) = rows.get(self.selected) else {
            return Effect::none();
        };
        match report.tree.get(row.node) {
            Some(node) if node.is_leaf() => {
                let page = SecretDetailPage::new(SecretDetail::from_node(node));
                Effect::message(Message::OpenPage {
                    page: Box::new(page),
                    root: false,
                })
            }
            _ => Effect::none(),
        }
    }

    fn handle_key(&mut self, key: &InputKey) -> Effect {
        let count = self.rows().len();
        match key {
            InputKey::Down | InputKey::Char('j') => {
                if self.selected + 1 < count {
                    self.selected += 1;
                }
                Effect::none()
            }
            InputKey::Up | InputKey::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                Effect::none()
            }
            InputKey::Home => {
                self.selected = 0;
                Effect::none()
            }
            InputKey::End => {
                self.selected = count.saturating_sub(1);
                Effect::none()
            }
            InputKey::Enter => self.open_selected(),
            InputKey::Char('r') => Effect::message(Message::RefreshRequested {
                page: self.id.clone(),
            }),
            _ => Effect::none(),
        }
    }
}

/// Case-insensitive substring match on the full path of `id` or any
/// descendant, so ancestors of matches stay visible
fn matches_filter(tree: &SecretTree, id: NodeId, needle: &str) -> bool {
    let Some(node) = tree.get(id) else {
        return false;
    };
    if node.full_path().to_lowercase().contains(needle) {
        return true;
    }
    tree.children(id)
        .iter()
        .any(|child| matches_filter(tree, *child, needle))
}

impl<B> Page for SecretBrowserPage<B>
where
    B: Backend + Sync + 'static,
{
    fn id(&self) -> &PageId {
        &self.id
    }

    fn title(&self) -> &str {
        "Secrets"
    }

    fn init(&mut self, ctx: &Context) -> Effect {
        self.start_discovery(ctx)
    }

    fn handle(&mut self, msg: &Message, ctx: &Context) -> Effect {
        match msg {
            Message::Key(key) => self.handle_key(key),
            Message::RefreshRequested { page } if *page == self.id => self.start_discovery(ctx),
            Message::FilterChanged { value } => {
                self.filter = value.clone();
                self.selected = 0;
                Effect::none()
            }
            Message::BackendResponse { request_id, result } => {
                if !self.pending.accept(*request_id) {
                    return Effect::none();
                }
                match result {
                    Ok(Payload::Discovery(report)) => self.on_report(report),
                    Ok(other) => {
                        debug!("Page {} ignoring payload {:?}", self.id, other);
                        Effect::none()
                    }
                    Err(err) => self.on_error(err),
                }
            }
            Message::TaskCancelled { id } if *id == self.task_id() => {
                self.pending.clear();
                self.tree.abort();
                Effect::none()
            }
            Message::PageHidden => {
                self.visible = false;
                Effect::none()
            }
            Message::PageVisible => {
                self.visible = true;
                Effect::none()
            }
            Message::PageBlurred => {
                self.focused = false;
                Effect::none()
            }
            Message::PageRefocused => {
                self.focused = true;
                Effect::none()
            }
            _ => Effect::none(),
        }
    }

    fn render(&self) -> String {
        let mut lines = Vec::new();
        match self.tree.state() {
            LoadState::Loading if self.report().is_none() => lines.push("Loading…".to_string()),
            LoadState::Loading => lines.push("Refreshing…".to_string()),
            LoadState::Errored(e) => lines.push(format!("error: {}", e)),
            LoadState::Idle | LoadState::Loaded => {}
        }

        let rows = self.rows();
        let window = if self.height > 2 {
            usize::from(self.height - 2)
        } else {
            rows.len()
        };
        let start = self.selected.saturating_sub(window.saturating_sub(1));
        for (i, row) in rows.iter().enumerate().skip(start).take(window) {
            let cursor = if i == self.selected && self.focused {
                ">"
            } else {
                " "
            };
            lines.push(format!("{}{}{}", cursor, "  ".repeat(row.depth), row.label));
        }

        if let Some(report) = self.report() {
            let mut footer = format!(
                "{} secrets, {} listings",
                report.tree.leaf_count(),
                report.list_requests
            );
            if report.is_incomplete() {
                footer.push_str(", partial");
            }
            if !self.filter.is_empty() {
                footer.push_str(&format!(", filter: {}", self.filter));
            }
            lines.push(footer);
        }
        lines.join("\n")
    }

    fn close(&mut self, ctx: &Context) -> Effect {
        let cancelled = ctx
            .tasks
            .cancel_by_filter(&metadata([("page", self.id.as_str())]));
        Effect::batch(cancelled.into_iter().map(Effect::message))
    }

    fn set_size(&mut self, _width: u16, height: u16) {
        self.height = height;
    }

    fn refresh_interval(&self) -> Option<Duration> {
        self.refresh
    }

    fn supports_filtering(&self) -> bool {
        true
    }

    fn short_help(&self) -> Vec<KeyBinding> {
        vec![
            KeyBinding::new([InputKey::Up, InputKey::Char('k')], "up"),
            KeyBinding::new([InputKey::Down, InputKey::Char('j')], "down"),
            KeyBinding::new([InputKey::Enter], "open"),
            KeyBinding::new([InputKey::Char('r')], "refresh"),
        ]
    }

    fn full_help(&self) -> Vec<KeyBinding> {
        let mut help = self.short_help();
        help.push(KeyBinding::new([InputKey::Home], "first"));
        help.push(KeyBinding::new([InputKey::End], "last"));
        help
    }
}
