//! Recording views and helpers shared by unit tests

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::debounce::Debouncer;
use crate::effect::Effect;
use crate::message::Message;
use crate::task_registry::TaskRegistry;
use crate::view::{Context, Dialog, DialogId, DialogSize, Page, PageId};

/// Shared log of `"<view id>:<event>"` lines
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Entries for one view, without the id prefix
pub fn events_for(log: &EventLog, id: &str) -> Vec<String> {
    let prefix = format!("{}:", id);
    log.lock()
        .unwrap()
        .iter()
        .filter_map(|line| line.strip_prefix(&prefix).map(str::to_string))
        .collect()
}

pub fn test_context() -> Context {
    Context::new(
        Arc::new(TaskRegistry::new()),
        Arc::new(Debouncer::new(
            Duration::from_millis(200),
            Duration::from_secs(300),
        )),
    )
}

/// Message names carried directly by an effect
pub fn message_names(effect: &Effect) -> Vec<&'static str> {
    effect.immediate_messages().iter().map(|m| m.name()).collect()
}

#[derive(Debug)]
pub struct RecordingPage {
    pub id: PageId,
    pub log: EventLog,
    pub refresh: Option<Duration>,
    pub filtering: bool,
    pub input_focus: bool,
    pub size: (u16, u16),
}

impl RecordingPage {
    pub fn new(id: &str, log: &EventLog) -> Self {
        Self {
            id: PageId::new(id),
            log: Arc::clone(log),
            refresh: None,
            filtering: false,
            input_focus: true,
            size: (0, 0),
        }
    }

    pub fn with_refresh(mut self, every: Duration) -> Self {
        self.refresh = Some(every);
        self
    }

    pub fn with_filtering(mut self) -> Self {
        self.filtering = true;
        self
    }

    pub fn boxed(self) -> Box<dyn Page> {
        Box::new(self)
    }

    fn record(&self, event: &str) {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:{}", self.id, event));
    }
}

impl Page for RecordingPage {
    fn id(&self) -> &PageId {
        &self.id
    }

    fn title(&self) -> &str {
        self.id.as_str()
    }

    fn init(&mut self, _ctx: &Context) -> Effect {
        self.record("init");
        Effect::none()
    }

    fn handle(&mut self, msg: &Message, _ctx: &Context) -> Effect {
        self.record(msg.name());
        Effect::none()
    }

    fn render(&self) -> String {
        format!("page {} {}x{}", self.id, self.size.0, self.size.1)
    }

    fn close(&mut self, _ctx: &Context) -> Effect {
        self.record("close");
        Effect::none()
    }

    fn set_size(&mut self, width: u16, height: u16) {
        self.size = (width, height);
    }

    fn refresh_interval(&self) -> Option<Duration> {
        self.refresh
    }

    fn supports_filtering(&self) -> bool {
        self.filtering
    }

    fn has_input_focus(&self) -> bool {
        self.input_focus
    }
}

#[derive(Debug)]
pub struct RecordingDialog {
    pub id: DialogId,
    pub log: EventLog,
    pub blocking: bool,
    pub size: DialogSize,
    /// Distinguishes two instances sharing an id
    pub instance: u32,
}

impl RecordingDialog {
    pub fn new(id: &str, log: &EventLog) -> Self {
        Self {
            id: DialogId::new(id),
            log: Arc::clone(log),
            blocking: false,
            size: DialogSize::Small,
            instance: 0,
        }
    }

    pub fn blocking(mut self) -> Self {
        self.blocking = true;
        self
    }

    pub fn instance(mut self, instance: u32) -> Self {
        self.instance = instance;
        self
    }

    pub fn boxed(self) -> Box<dyn Dialog> {
        Box::new(self)
    }

    fn record(&self, event: &str) {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:{}", self.id, event));
    }
}

impl Dialog for RecordingDialog {
    fn id(&self) -> &DialogId {
        &self.id
    }

    fn init(&mut self, _ctx: &Context) -> Effect {
        self.record("init");
        Effect::none()
    }

    fn handle(&mut self, msg: &Message, _ctx: &Context) -> Effect {
        self.record(msg.name());
        Effect::none()
    }

    fn render(&self) -> String {
        format!("dialog {}#{}", self.id, self.instance)
    }

    fn close(&mut self, _ctx: &Context) -> Effect {
        self.record("close");
        Effect::none()
    }

    fn size(&self) -> DialogSize {
        self.size
    }

    fn disables_children(&self) -> bool {
        self.blocking
    }
}
