//! Headless mode runner - drives the engine without a terminal
//!
//! Loads a JSON fixture into the in-memory backend, opens the secret browser
//! as the root page, waits for its first discovery run and returns either the
//! rendered page or the discovery report as JSON. SIGINT/SIGTERM during the
//! run cancel the discovery.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use vtui_app::pages::SecretBrowserPage;
use vtui_app::signals::spawn_signal_handler;
use vtui_app::{Engine, Message, Payload, Settings};
use vtui_backend::{Fixture, FixtureBackend};
use vtui_core::prelude::*;

/// What `run_headless` returns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// The browser page as rendered text
    #[default]
    Text,
    /// The discovery report, pretty-printed
    Json,
}

#[derive(Debug, Clone)]
pub struct HeadlessOptions {
    pub fixture: PathBuf,
    pub settings: Settings,
    pub format: OutputFormat,
    /// Simulated latency added to every backend call
    pub latency: Duration,
}

impl HeadlessOptions {
    pub fn new(fixture: impl Into<PathBuf>) -> Self {
        Self {
            fixture: fixture.into(),
            settings: Settings::default(),
            format: OutputFormat::default(),
            latency: Duration::ZERO,
        }
    }
}

/// Run one discovery against the fixture and return its output
pub async fn run_headless(options: HeadlessOptions) -> Result<String> {
    info!("═══════════════════════════════════════════════════════");
    info!("vault-tui starting in HEADLESS mode");
    info!("Fixture: {}", options.fixture.display());
    info!("═══════════════════════════════════════════════════════");

    let fixture = Fixture::load(&options.fixture)?;
    let backend = Arc::new(
        FixtureBackend::new(fixture)
            .with_timeout(options.settings.backend.timeout())
            .with_latency(options.latency),
    );
    let page = SecretBrowserPage::new(backend, options.settings.discovery.options())
        .with_refresh_interval(options.settings.ui.refresh_interval());

    let mut engine = Engine::new(options.settings);
    let signals = spawn_signal_handler(engine.msg_sender(), engine.shutdown_receiver());
    engine.open_root(Box::new(page));

    let format = options.format;
    let mut outcome: Option<Result<Option<String>>> = None;
    let finished = engine
        .run_until(|msg| {
            let Message::BackendResponse { result, .. } = msg else {
                return false;
            };
            outcome = Some(match result {
                Ok(Payload::Discovery(report)) => match format {
                    OutputFormat::Json => serde_json::to_string_pretty(report)
                        .map(Some)
                        .map_err(Error::from),
                    OutputFormat::Text => Ok(None),
                },
                Ok(other) => {
                    warn!("Unexpected payload {:?}", other);
                    return false;
                }
                Err(e) => Err(Error::backend(e.message.clone())),
            });
            true
        })
        .await;

    // Let follow-up messages (status, dialogs) land before rendering
    engine.drain_pending_messages();
    let rendered = engine.state.pages.render();
    engine.shutdown().await;
    if let Err(e) = signals.await {
        warn!("Signal listener failed: {}", e);
    }

    if !finished {
        return Err(Error::cancelled("discovery"));
    }
    match outcome {
        Some(Ok(Some(json))) => Ok(json),
        Some(Ok(None)) => Ok(rendered),
        Some(Err(e)) => Err(e),
        None => Err(Error::cancelled("discovery")),
    }
}
