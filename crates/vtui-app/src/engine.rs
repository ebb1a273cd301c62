//! Engine - owns the update loop and every long-lived service
//!
//! The Engine holds the TEA state, the message channel, the effect
//! dispatcher, the task registry, the debouncer and its janitor, and the
//! shutdown signal. Frontends (headless runner, tests) drive it by sending
//! messages and pulling rendered frames.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use vtui_core::prelude::*;

use crate::config::Settings;
use crate::debounce::Debouncer;
use crate::dispatch::Dispatcher;
use crate::effect::Effect;
use crate::message::Message;
use crate::process;
use crate::state::AppState;
use crate::task_registry::TaskRegistry;
use crate::view::{Context, Page};

/// Capacity of the unified message channel
pub const CHANNEL_CAPACITY: usize = 256;

const JANITOR_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// Orchestration engine for vault-tui.
///
/// Messages are applied strictly one at a time; effects run concurrently on
/// the tokio runtime and only ever report back through the channel.
pub struct Engine {
    /// TEA application state (the Model)
    pub state: AppState,

    /// Sender half of the unified message channel.
    /// Clone this to give to input sources (signal handler, frontends).
    msg_tx: mpsc::Sender<Message>,

    /// Receiver half of the unified message channel
    msg_rx: mpsc::Receiver<Message>,

    dispatcher: Dispatcher,

    /// Task registry and debouncer handed to every view
    ctx: Context,

    /// Sender for the shutdown signal. Send `true` to initiate shutdown.
    shutdown_tx: watch::Sender<bool>,

    /// Receiver for the shutdown signal. Clone for background tasks.
    shutdown_rx: watch::Receiver<bool>,

    janitor: Option<JoinHandle<()>>,

    /// Effect tasks that have not finished yet
    in_flight: Vec<JoinHandle<()>>,
}

impl Engine {
    /// Create an engine from loaded settings.
    ///
    /// Must be called inside a tokio runtime: the debounce janitor is spawned
    /// immediately.
    pub fn new(settings: Settings) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel::<Message>(CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let tasks = Arc::new(TaskRegistry::new());
        let debouncer = Arc::new(Debouncer::new(
            settings.debounce.default_delay(),
            settings.debounce.retention(),
        ));
        let janitor =
            debouncer.spawn_janitor(settings.debounce.janitor_interval(), shutdown_rx.clone());

        Self {
            state: AppState::new(settings),
            dispatcher: Dispatcher::new(msg_tx.clone()),
            msg_tx,
            msg_rx,
            ctx: Context::new(tasks, debouncer),
            shutdown_tx,
            shutdown_rx,
            janitor: Some(janitor),
            in_flight: Vec::new(),
        }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Get a clone of the message sender for spawning input sources.
    pub fn msg_sender(&self) -> mpsc::Sender<Message> {
        self.msg_tx.clone()
    }

    /// Get a clone of the shutdown receiver for background tasks.
    pub fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    /// Queue a message behind everything already in the channel
    pub fn send(&mut self, msg: Message) {
        self.dispatch(Effect::message(msg));
    }

    /// Replace the page stack with `page`
    pub fn open_root(&mut self, page: Box<dyn Page>) {
        self.process_message(Message::OpenPage { page, root: true });
    }

    /// Process a single message through the TEA update cycle.
    pub fn process_message(&mut self, msg: Message) {
        if let Some(handle) =
            process::process_message(&mut self.state, msg, &self.ctx, &self.dispatcher)
        {
            self.in_flight.push(handle);
        }
        self.in_flight.retain(|handle| !handle.is_finished());
    }

    /// Drain and process all pending messages from the channel.
    ///
    /// Returns the number of messages processed.
    pub fn drain_pending_messages(&mut self) -> usize {
        let mut count = 0;
        while let Ok(msg) = self.msg_rx.try_recv() {
            self.process_message(msg);
            count += 1;
        }
        count
    }

    /// Process messages until every spawned effect has finished and the
    /// channel is empty.
    ///
    /// Never returns while a page keeps re-arming a periodic refresh.
    pub async fn settle(&mut self) {
        loop {
            self.drain_pending_messages();
            let handles = std::mem::take(&mut self.in_flight);
            if handles.is_empty() {
                break;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    warn!("Effect task failed: {}", e);
                }
            }
        }
    }

    /// Process messages until `stop` matches one, or the app quits.
    ///
    /// The matching message is processed before returning `true`.
    pub async fn run_until<F>(&mut self, mut stop: F) -> bool
    where
        F: FnMut(&Message) -> bool,
    {
        while !self.should_quit() {
            let Some(msg) = self.msg_rx.recv().await else {
                warn!("Message channel closed");
                return false;
            };
            let matched = stop(&msg);
            self.process_message(msg);
            if matched {
                return true;
            }
        }
        false
    }

    /// Render the current frame
    pub fn render(&self) -> String {
        self.state.render()
    }

    /// Check if the application should quit.
    pub fn should_quit(&self) -> bool {
        self.state.should_quit()
    }

    /// Close every view, cancel running tasks and stop the janitor.
    pub async fn shutdown(&mut self) {
        info!("Engine shutting down");

        // Close hooks run for their side effects only; the loop is over.
        let _ = self
            .state
            .dialogs
            .close_all(&mut self.state.focus, &self.ctx);
        let _ = self.state.pages.close_all(&self.ctx);

        let cancelled = self.ctx.tasks.cancel_all();
        if !cancelled.is_empty() {
            info!("Cancelled {} running task(s)", cancelled.len());
        }

        let _ = self.shutdown_tx.send(true);

        if let Some(janitor) = self.janitor.take() {
            match tokio::time::timeout(JANITOR_SHUTDOWN_TIMEOUT, janitor).await {
                Ok(Ok(())) => debug!("Debounce janitor stopped"),
                Ok(Err(e)) => warn!("Debounce janitor panicked: {}", e),
                Err(_) => warn!("Debounce janitor shutdown timed out"),
            }
        }

        for handle in self.in_flight.drain(..) {
            handle.abort();
        }
    }

    fn dispatch(&mut self, effect: Effect) {
        if let Some(handle) = self.dispatcher.dispatch(effect) {
            self.in_flight.push(handle);
        }
    }
}
