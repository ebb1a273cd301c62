//! Routing tests for the update function

use tokio::sync::mpsc;

use super::update;
use crate::config::Settings;
use crate::dialogs::{HelpDialog, CONFIRM_QUIT_ID, HELP_DIALOG_ID};
use crate::dispatch::Dispatcher;
use crate::focus::FocusOwner;
use crate::input_key::InputKey;
use crate::message::{Message, StatusLevel};
use crate::state::{AppPhase, AppState};
use crate::task_registry::metadata;
use crate::test_support::{event_log, events_for, test_context, EventLog, RecordingDialog, RecordingPage};
use crate::view::{Context, DialogId, PageId};

/// Apply `msg` and every message it causes, until the channel runs dry.
/// Spawned futures are left running.
fn drive(state: &mut AppState, ctx: &Context, msg: Message) {
    let (tx, mut rx) = mpsc::channel(256);
    let dispatcher = Dispatcher::new(tx);
    dispatcher.dispatch(update(state, msg, ctx));
    while let Ok(next) = rx.try_recv() {
        dispatcher.dispatch(update(state, next, ctx));
    }
}

fn key(c: char) -> Message {
    Message::Key(InputKey::Char(c))
}

fn state_with_root(ctx: &Context, log: &EventLog, page: RecordingPage) -> AppState {
    let mut state = AppState::new(Settings::default());
    drive(
        &mut state,
        ctx,
        Message::OpenPage {
            page: page.boxed(),
            root: true,
        },
    );
    log.lock().unwrap().clear();
    state
}

fn focused_count(state: &AppState) -> usize {
    [FocusOwner::Page, FocusOwner::Dialog, FocusOwner::FilterBar]
        .into_iter()
        .filter(|o| state.focus.is_focused(*o))
        .count()
}

#[tokio::test]
async fn test_focus_exclusive_across_change_requests() {
    let ctx = test_context();
    let log = event_log();
    let mut state = state_with_root(&ctx, &log, RecordingPage::new("root", &log));

    for owner in [
        FocusOwner::Dialog,
        FocusOwner::FilterBar,
        FocusOwner::FilterBar,
        FocusOwner::Page,
        FocusOwner::Dialog,
    ] {
        drive(&mut state, &ctx, Message::ChangeFocus(owner));
        assert_eq!(state.focus.current(), owner);
        assert_eq!(focused_count(&state), 1);
    }

    drive(&mut state, &ctx, Message::RequestPreviousFocus);
    assert_eq!(state.focus.current(), FocusOwner::Page);
    assert_eq!(focused_count(&state), 1);
}

#[tokio::test]
async fn test_focus_away_from_page_blurs_then_refocuses() {
    let ctx = test_context();
    let log = event_log();
    let mut state = state_with_root(&ctx, &log, RecordingPage::new("root", &log));

    drive(&mut state, &ctx, Message::ChangeFocus(FocusOwner::FilterBar));
    drive(&mut state, &ctx, Message::RequestPreviousFocus);

    let events = events_for(&log, "root");
    let blurred = events.iter().position(|e| e == "PageBlurred");
    let refocused = events.iter().position(|e| e == "PageRefocused");
    assert!(blurred.is_some());
    assert!(refocused > blurred);
}

#[tokio::test]
async fn test_input_reaches_only_the_top_dialog() {
    let ctx = test_context();
    let log = event_log();
    let mut state = state_with_root(&ctx, &log, RecordingPage::new("root", &log));

    drive(
        &mut state,
        &ctx,
        Message::OpenDialog(RecordingDialog::new("lower", &log).boxed()),
    );
    drive(
        &mut state,
        &ctx,
        Message::OpenDialog(RecordingDialog::new("upper", &log).boxed()),
    );
    drive(&mut state, &ctx, key('z'));

    assert!(events_for(&log, "upper").contains(&"Key".to_string()));
    assert!(!events_for(&log, "lower").contains(&"Key".to_string()));
    assert!(!events_for(&log, "root").contains(&"Key".to_string()));
}

#[tokio::test]
async fn test_non_input_messages_fan_out() {
    let ctx = test_context();
    let log = event_log();
    let mut state = state_with_root(&ctx, &log, RecordingPage::new("root", &log));
    drive(
        &mut state,
        &ctx,
        Message::OpenDialog(RecordingDialog::new("d1", &log).boxed()),
    );
    drive(
        &mut state,
        &ctx,
        Message::OpenDialog(RecordingDialog::new("d2", &log).boxed()),
    );

    drive(
        &mut state,
        &ctx,
        Message::Resize {
            width: 120,
            height: 40,
        },
    );

    assert_eq!(state.size, (120, 40));
    for id in ["root", "d1", "d2"] {
        assert!(events_for(&log, id).contains(&"Resize".to_string()), "{id}");
    }
}

#[tokio::test]
async fn test_dialog_blocking_keeps_stack_and_refocuses_dialog() {
    let ctx = test_context();
    let log = event_log();
    let mut state = state_with_root(&ctx, &log, RecordingPage::new("root", &log));

    drive(
        &mut state,
        &ctx,
        Message::OpenDialog(RecordingDialog::new("a", &log).blocking().boxed()),
    );
    drive(&mut state, &ctx, Message::ChangeFocus(FocusOwner::Page));

    drive(
        &mut state,
        &ctx,
        Message::OpenDialog(RecordingDialog::new("b", &log).boxed()),
    );

    assert_eq!(state.dialogs.ids(), vec![DialogId::new("a")]);
    assert_eq!(state.focus.current(), FocusOwner::Dialog);
    assert!(events_for(&log, "b").is_empty());
    let status = state.status.as_ref().unwrap();
    assert_eq!(status.level, StatusLevel::Warning);
}

#[tokio::test]
async fn test_closing_last_dialog_returns_focus_to_page() {
    let ctx = test_context();
    let log = event_log();
    let mut state = state_with_root(&ctx, &log, RecordingPage::new("root", &log));

    drive(
        &mut state,
        &ctx,
        Message::OpenDialog(RecordingDialog::new("d", &log).boxed()),
    );
    assert_eq!(state.focus.current(), FocusOwner::Dialog);

    drive(&mut state, &ctx, Message::CloseDialog(None));
    assert!(state.dialogs.is_empty());
    assert_eq!(state.focus.current(), FocusOwner::Page);
    assert_eq!(events_for(&log, "d").last().map(String::as_str), Some("close"));
}

#[tokio::test]
async fn test_slash_focuses_filter_bar_only_for_filtering_pages() {
    let ctx = test_context();
    let log = event_log();

    let mut plain = state_with_root(&ctx, &log, RecordingPage::new("plain", &log));
    drive(&mut plain, &ctx, key('/'));
    assert_eq!(plain.focus.current(), FocusOwner::Page);
    assert!(events_for(&log, "plain").contains(&"Key".to_string()));

    let mut filtering = state_with_root(
        &ctx,
        &log,
        RecordingPage::new("filtering", &log).with_filtering(),
    );
    drive(&mut filtering, &ctx, key('/'));
    assert_eq!(filtering.focus.current(), FocusOwner::FilterBar);

    drive(&mut filtering, &ctx, key('d'));
    drive(&mut filtering, &ctx, key('b'));
    assert_eq!(filtering.filter.value(), "db");
    assert!(!events_for(&log, "filtering").contains(&"Key".to_string()));
}

#[tokio::test]
async fn test_global_keys_ignored_while_filter_focused() {
    let ctx = test_context();
    let log = event_log();
    let mut state = state_with_root(
        &ctx,
        &log,
        RecordingPage::new("root", &log).with_filtering(),
    );

    drive(&mut state, &ctx, key('/'));
    drive(&mut state, &ctx, key('q'));

    assert_eq!(state.phase, AppPhase::Running);
    assert_eq!(state.filter.value(), "q");
}

#[tokio::test]
async fn test_quit_without_tasks() {
    let ctx = test_context();
    let log = event_log();
    let mut state = state_with_root(&ctx, &log, RecordingPage::new("root", &log));

    drive(&mut state, &ctx, key('q'));
    assert!(state.should_quit());
}

#[tokio::test]
async fn test_quit_with_running_tasks_asks_first() {
    let ctx = test_context();
    let log = event_log();
    let mut state = state_with_root(&ctx, &log, RecordingPage::new("root", &log));
    ctx.tasks.add_task("fetch", metadata([("page", "root")]), None);

    drive(&mut state, &ctx, key('q'));
    assert!(!state.should_quit());
    assert_eq!(state.dialogs.ids(), vec![DialogId::new(CONFIRM_QUIT_ID)]);

    drive(&mut state, &ctx, key('y'));
    assert!(state.should_quit());
}

#[tokio::test]
async fn test_esc_never_pops_root() {
    let ctx = test_context();
    let log = event_log();
    let mut state = state_with_root(&ctx, &log, RecordingPage::new("root", &log));

    drive(&mut state, &ctx, Message::Key(InputKey::Esc));
    assert_eq!(state.pages.len(), 1);

    drive(
        &mut state,
        &ctx,
        Message::OpenPage {
            page: RecordingPage::new("child", &log).boxed(),
            root: false,
        },
    );
    drive(&mut state, &ctx, Message::Key(InputKey::Esc));
    assert_eq!(state.pages.ids(), vec![PageId::new("root")]);
    assert!(events_for(&log, "root").contains(&"PageVisible".to_string()));
}

#[tokio::test]
async fn test_help_opens_with_active_page_title() {
    let ctx = test_context();
    let log = event_log();
    let mut state = state_with_root(&ctx, &log, RecordingPage::new("root", &log));

    drive(&mut state, &ctx, key('?'));
    assert_eq!(state.dialogs.ids(), vec![DialogId::new(HELP_DIALOG_ID)]);
    assert!(state.render().contains("Help: root"));

    // Help disables children
    drive(
        &mut state,
        &ctx,
        Message::OpenDialog(Box::new(HelpDialog::new("other", Vec::new()))),
    );
    assert_eq!(state.dialogs.len(), 1);

    drive(&mut state, &ctx, Message::Key(InputKey::Esc));
    assert!(state.dialogs.is_empty());
    assert_eq!(state.focus.current(), FocusOwner::Page);
}

#[tokio::test]
async fn test_cancel_tasks_removes_only_matches() {
    let ctx = test_context();
    let log = event_log();
    let mut state = state_with_root(&ctx, &log, RecordingPage::new("root", &log));
    ctx.tasks.add_task("1", metadata([("tag", "fetch")]), None);
    ctx.tasks.add_task("2", metadata([("tag", "poll")]), None);

    drive(
        &mut state,
        &ctx,
        Message::CancelTasks {
            filters: metadata([("tag", "fetch")]),
        },
    );

    assert!(ctx.tasks.get("1").is_none());
    assert!(ctx.tasks.get("2").is_some());
    assert!(events_for(&log, "root").contains(&"TaskCancelled".to_string()));
    assert_eq!(state.status.as_ref().unwrap().text, "cancelled 1");
}

#[tokio::test]
async fn test_x_cancels_active_page_tasks() {
    let ctx = test_context();
    let log = event_log();
    let mut state = state_with_root(&ctx, &log, RecordingPage::new("root", &log));
    ctx.tasks.add_task("mine", metadata([("page", "root")]), None);
    ctx.tasks.add_task("other", metadata([("page", "elsewhere")]), None);

    drive(&mut state, &ctx, key('x'));

    assert_eq!(ctx.tasks.count(), 1);
    assert!(ctx.tasks.get("other").is_some());
}

#[tokio::test]
async fn test_quit_message_sets_phase() {
    let ctx = test_context();
    let mut state = AppState::new(Settings::default());
    drive(&mut state, &ctx, Message::Quit);
    assert_eq!(state.phase, AppPhase::Quitting);
}
