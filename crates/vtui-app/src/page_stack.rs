//! Navigation stack of pages
//!
//! The innermost (last) page is active. Lifecycle notifications such as
//! `PageHidden` or `PageRefocused` are delivered straight to the affected
//! page; `PageOpened` / `PageClosed` are emitted into the update loop.

use tracing::{debug, info};

use crate::effect::Effect;
use crate::focus::{FocusOwner, FocusRouter};
use crate::message::Message;
use crate::view::{Context, Page, PageId};

/// Debounce key used for a page's refresh cycle
pub fn refresh_key(page: &PageId) -> String {
    format!("page-refresh:{}", page)
}

#[derive(Debug, Default)]
pub struct PageStack {
    pages: Vec<Box<dyn Page>>,
    width: u16,
    height: u16,
}

impl PageStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn active(&self) -> Option<&dyn Page> {
        self.pages.last().map(|p| p.as_ref())
    }

    pub fn active_mut(&mut self) -> Option<&mut Box<dyn Page>> {
        self.pages.last_mut()
    }

    /// Page ids from root to active
    pub fn ids(&self) -> Vec<PageId> {
        self.pages.iter().map(|p| p.id().clone()).collect()
    }

    pub fn contains(&self, id: &PageId) -> bool {
        self.pages.iter().any(|p| p.id() == id)
    }

    /// Push `page`, replacing the whole stack when `root` is set
    pub fn open(
        &mut self,
        page: Box<dyn Page>,
        root: bool,
        focus: &mut FocusRouter,
        ctx: &Context,
    ) -> Effect {
        if root {
            self.open_root(page, focus, ctx)
        } else {
            self.open_child(page, focus, ctx)
        }
    }

    fn open_root(&mut self, page: Box<dyn Page>, focus: &mut FocusRouter, ctx: &Context) -> Effect {
        info!("Opening root page {}", page.id());
        let closed = self.close_all(ctx);
        let opened = self.push(page, focus, ctx);
        closed.then(opened)
    }

    fn open_child(&mut self, page: Box<dyn Page>, focus: &mut FocusRouter, ctx: &Context) -> Effect {
        info!("Opening page {}", page.id());
        let hidden = match self.pages.last_mut() {
            Some(top) if focus.is_focused(FocusOwner::Page) => top.handle(&Message::PageHidden, ctx),
            _ => Effect::none(),
        };
        let opened = self.push(page, focus, ctx);
        hidden.and(opened)
    }

    fn push(&mut self, mut page: Box<dyn Page>, focus: &mut FocusRouter, ctx: &Context) -> Effect {
        page.set_size(self.width, self.height);
        let init = page.init(ctx);
        let refresh = schedule_refresh(page.as_ref(), ctx);
        let id = page.id().clone();
        self.pages.push(page);

        let announce = focus
            .change_focus(FocusOwner::Page)
            .then(Effect::message(Message::PageOpened(id)));
        Effect::batch([announce, init, refresh])
    }

    /// Close every page, innermost first
    pub fn close_all(&mut self, ctx: &Context) -> Effect {
        let mut effects = Vec::with_capacity(self.pages.len());
        while let Some(page) = self.pages.pop() {
            effects.push(close_page(page, ctx));
        }
        Effect::sequence(effects)
    }

    /// Pop the active page. The root page is never popped.
    pub fn close_active(&mut self, focus: &mut FocusRouter, ctx: &Context) -> Effect {
        if self.pages.len() <= 1 {
            debug!("Not closing the root page");
            return Effect::none();
        }
        let Some(page) = self.pages.pop() else {
            return Effect::none();
        };
        let closed = close_page(page, ctx);
        let focused = focus.change_focus(FocusOwner::Page);
        let visible = match self.pages.last_mut() {
            Some(top) => top.handle(&Message::PageVisible, ctx),
            None => Effect::none(),
        };
        Effect::sequence([closed, focused]).and(visible)
    }

    /// React to a focus change announced by the router
    pub fn on_focus_changed(
        &mut self,
        owner: FocusOwner,
        previous: FocusOwner,
        ctx: &Context,
    ) -> Effect {
        let Some(top) = self.pages.last_mut() else {
            return Effect::none();
        };
        if owner == FocusOwner::Page && previous != FocusOwner::Page {
            top.handle(&Message::PageRefocused, ctx)
        } else if previous == FocusOwner::Page && owner != FocusOwner::Page {
            top.handle(&Message::PageBlurred, ctx)
        } else {
            Effect::none()
        }
    }

    /// Deliver a refresh to `id` and re-arm its timer.
    ///
    /// Re-arming overwrites the debounce fence, so a timer check already in
    /// flight is dropped when a manual refresh lands first.
    pub fn handle_refresh(&mut self, id: &PageId, ctx: &Context) -> Effect {
        let Some(page) = self.pages.iter_mut().find(|p| p.id() == id) else {
            debug!("Refresh for closed page {} ignored", id);
            ctx.debouncer.cancel(&refresh_key(id));
            return Effect::none();
        };
        let refreshed = page.handle(&Message::RefreshRequested { page: id.clone() }, ctx);
        let rearm = schedule_refresh(page.as_ref(), ctx);
        refreshed.and(rearm)
    }

    /// Deliver a filter change to the active page when it filters
    pub fn route_filter(&mut self, msg: &Message, ctx: &Context) -> Effect {
        match self.pages.last_mut() {
            Some(top) if top.supports_filtering() => top.handle(msg, ctx),
            _ => Effect::none(),
        }
    }

    /// Deliver key or paste input to the active page, if it may see it
    pub fn route_input(&mut self, msg: &Message, focus: &FocusRouter, ctx: &Context) -> Effect {
        if !focus.is_focused(FocusOwner::Page) {
            return Effect::none();
        }
        match self.pages.last_mut() {
            Some(top) if top.has_input_focus() => top.handle(msg, ctx),
            _ => Effect::none(),
        }
    }

    /// Deliver a non-input message to every page
    pub fn broadcast(&mut self, msg: &Message, ctx: &Context) -> Effect {
        Effect::batch(self.pages.iter_mut().map(|p| p.handle(msg, ctx)))
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        for page in &mut self.pages {
            page.set_size(width, height);
        }
    }

    /// Render the active page
    pub fn render(&self) -> String {
        self.active().map(|p| p.render()).unwrap_or_default()
    }

    /// Breadcrumb of page titles, root first
    pub fn breadcrumb(&self) -> String {
        let titles: Vec<&str> = self.pages.iter().map(|p| p.title()).collect();
        titles.join(" > ")
    }
}

fn close_page(mut page: Box<dyn Page>, ctx: &Context) -> Effect {
    let id = page.id().clone();
    ctx.debouncer.cancel(&refresh_key(&id));
    debug!("Closing page {}", id);
    page.close(ctx).then(Effect::message(Message::PageClosed(id)))
}

fn schedule_refresh(page: &dyn Page, ctx: &Context) -> Effect {
    match page.refresh_interval() {
        Some(every) if !every.is_zero() => {
            let id = page.id().clone();
            ctx.debouncer.send(
                refresh_key(&id),
                every,
                Effect::message(Message::RefreshRequested { page: id }),
            )
        }
        _ => Effect::none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::test_support::{event_log, events_for, message_names, test_context, RecordingPage};

    #[test]
    fn test_root_replace_always_yields_single_page() {
        let ctx = test_context();
        let log = event_log();
        let mut focus = FocusRouter::new();
        let mut stack = PageStack::new();

        for depth in 0..4 {
            for i in 0..depth {
                let page = RecordingPage::new(&format!("child{}", i), &log).boxed();
                stack.open(page, false, &mut focus, &ctx);
            }
            let root = RecordingPage::new("root", &log).boxed();
            stack.open(root, true, &mut focus, &ctx);

            assert_eq!(stack.len(), 1);
            assert_eq!(stack.ids(), vec![PageId::new("root")]);
        }
    }

    #[test]
    fn test_root_replace_closes_every_page() {
        let ctx = test_context();
        let log = event_log();
        let mut focus = FocusRouter::new();
        let mut stack = PageStack::new();
        stack.open(RecordingPage::new("a", &log).boxed(), true, &mut focus, &ctx);
        stack.open(RecordingPage::new("b", &log).boxed(), false, &mut focus, &ctx);

        let effect = stack.open(RecordingPage::new("c", &log).boxed(), true, &mut focus, &ctx);

        assert_eq!(events_for(&log, "a"), vec!["init", "PageHidden", "close"]);
        assert_eq!(events_for(&log, "b"), vec!["init", "close"]);
        assert_eq!(events_for(&log, "c"), vec!["init"]);
        assert_eq!(
            message_names(&effect),
            vec!["PageClosed", "PageClosed", "FocusChanged", "PageOpened"]
        );
    }

    #[test]
    fn test_open_child_hides_focused_top() {
        let ctx = test_context();
        let log = event_log();
        let mut focus = FocusRouter::new();
        let mut stack = PageStack::new();
        stack.open(RecordingPage::new("a", &log).boxed(), true, &mut focus, &ctx);

        focus.change_focus(FocusOwner::Dialog);
        stack.open(RecordingPage::new("b", &log).boxed(), false, &mut focus, &ctx);
        // `a` was not focused when `b` opened, so it is not told it is hidden
        assert_eq!(events_for(&log, "a"), vec!["init"]);
        assert_eq!(focus.current(), FocusOwner::Page);

        stack.open(RecordingPage::new("c", &log).boxed(), false, &mut focus, &ctx);
        assert_eq!(events_for(&log, "b"), vec!["init", "PageHidden"]);
        assert_eq!(stack.len(), 3);
    }

    #[test]
    fn test_close_active_never_pops_root() {
        let ctx = test_context();
        let log = event_log();
        let mut focus = FocusRouter::new();
        let mut stack = PageStack::new();
        stack.open(RecordingPage::new("root", &log).boxed(), true, &mut focus, &ctx);

        let effect = stack.close_active(&mut focus, &ctx);
        assert!(effect.is_none());
        assert_eq!(stack.len(), 1);
        assert!(!events_for(&log, "root").contains(&"close".to_string()));
    }

    #[test]
    fn test_close_active_reveals_previous_page() {
        let ctx = test_context();
        let log = event_log();
        let mut focus = FocusRouter::new();
        let mut stack = PageStack::new();
        stack.open(RecordingPage::new("a", &log).boxed(), true, &mut focus, &ctx);
        stack.open(RecordingPage::new("b", &log).boxed(), false, &mut focus, &ctx);
        focus.change_focus(FocusOwner::FilterBar);

        let effect = stack.close_active(&mut focus, &ctx);

        assert_eq!(stack.ids(), vec![PageId::new("a")]);
        assert_eq!(events_for(&log, "b"), vec!["init", "close"]);
        assert_eq!(events_for(&log, "a"), vec!["init", "PageHidden", "PageVisible"]);
        assert_eq!(focus.current(), FocusOwner::Page);
        assert_eq!(message_names(&effect), vec!["PageClosed", "FocusChanged"]);
    }

    #[test]
    fn test_focus_transitions_notify_top() {
        let ctx = test_context();
        let log = event_log();
        let mut focus = FocusRouter::new();
        let mut stack = PageStack::new();
        stack.open(RecordingPage::new("a", &log).boxed(), true, &mut focus, &ctx);

        stack.on_focus_changed(FocusOwner::Dialog, FocusOwner::Page, &ctx);
        stack.on_focus_changed(FocusOwner::FilterBar, FocusOwner::Dialog, &ctx);
        stack.on_focus_changed(FocusOwner::Page, FocusOwner::FilterBar, &ctx);
        stack.on_focus_changed(FocusOwner::Page, FocusOwner::Page, &ctx);

        assert_eq!(
            events_for(&log, "a"),
            vec!["init", "PageBlurred", "PageRefocused"]
        );
    }

    #[test]
    fn test_input_requires_page_focus_and_input_flag() {
        let ctx = test_context();
        let log = event_log();
        let mut focus = FocusRouter::new();
        let mut stack = PageStack::new();
        let mut page = RecordingPage::new("a", &log);
        page.input_focus = false;
        stack.open(page.boxed(), true, &mut focus, &ctx);
        stack.open(RecordingPage::new("b", &log).boxed(), false, &mut focus, &ctx);

        let key = Message::Key(crate::input_key::InputKey::Enter);
        stack.route_input(&key, &focus, &ctx);
        focus.change_focus(FocusOwner::Dialog);
        stack.route_input(&key, &focus, &ctx);

        assert_eq!(events_for(&log, "b"), vec!["init", "Key"]);
        assert!(!events_for(&log, "a").contains(&"Key".to_string()));
    }

    #[test]
    fn test_filter_only_reaches_filtering_top() {
        let ctx = test_context();
        let log = event_log();
        let mut focus = FocusRouter::new();
        let mut stack = PageStack::new();
        stack.open(
            RecordingPage::new("a", &log).with_filtering().boxed(),
            true,
            &mut focus,
            &ctx,
        );
        let filter = Message::FilterChanged { value: "x".into() };
        stack.route_filter(&filter, &ctx);

        stack.open(RecordingPage::new("b", &log).boxed(), false, &mut focus, &ctx);
        stack.route_filter(&filter, &ctx);

        assert_eq!(events_for(&log, "a"), vec!["init", "FilterChanged", "PageHidden"]);
        assert_eq!(events_for(&log, "b"), vec!["init"]);
    }

    #[test]
    fn test_broadcast_and_resize_reach_every_page() {
        let ctx = test_context();
        let log = event_log();
        let mut focus = FocusRouter::new();
        let mut stack = PageStack::new();
        stack.open(RecordingPage::new("a", &log).boxed(), true, &mut focus, &ctx);
        stack.open(RecordingPage::new("b", &log).boxed(), false, &mut focus, &ctx);

        stack.broadcast(&Message::Resize { width: 100, height: 30 }, &ctx);

        assert!(events_for(&log, "a").contains(&"Resize".to_string()));
        assert!(events_for(&log, "b").contains(&"Resize".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_is_armed_and_rearmed_through_debouncer() {
        let ctx = test_context();
        let log = event_log();
        let mut focus = FocusRouter::new();
        let mut stack = PageStack::new();
        let page = RecordingPage::new("a", &log).with_refresh(Duration::from_secs(5));

        let effect = stack.open(page.boxed(), true, &mut focus, &ctx);
        assert_eq!(effect.future_count(), 1);
        let key = refresh_key(&PageId::new("a"));
        assert!(ctx.debouncer.contains(&key));

        let effect = stack.handle_refresh(&PageId::new("a"), &ctx);
        assert_eq!(effect.future_count(), 1);
        assert_eq!(events_for(&log, "a"), vec!["init", "RefreshRequested"]);

        stack.close_all(&ctx);
        assert!(!ctx.debouncer.contains(&key));
        assert!(stack.handle_refresh(&PageId::new("a"), &ctx).is_none());
    }

    #[test]
    fn test_pages_are_sized_on_push() {
        let ctx = test_context();
        let log = event_log();
        let mut focus = FocusRouter::new();
        let mut stack = PageStack::new();
        stack.resize(120, 40);
        stack.open(RecordingPage::new("a", &log).boxed(), true, &mut focus, &ctx);
        assert_eq!(stack.render(), "page a 120x40");
        assert_eq!(stack.breadcrumb(), "a");

        stack.open(RecordingPage::new("b", &log).boxed(), false, &mut focus, &ctx);
        assert_eq!(stack.render(), "page b 120x40");

        stack.resize(80, 24);
        assert_eq!(stack.render(), "page b 80x24");
    }
}
