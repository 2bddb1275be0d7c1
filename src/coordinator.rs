//! Change coordinator: the pipeline nucleus.
//!
//! Consumes page events, runs the evaluation cycle, and drives the overlay.
//! One task owns every piece of mutable session state; the only suspension
//! point is the translation request, and a resumed cycle re-checks the
//! last-seen caption before touching the overlay, because completions may
//! arrive in any order.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::stream::FuturesUnordered;
use futures_util::{FutureExt, StreamExt};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::detect;
use crate::overlay::Overlay;
use crate::page::{self, extract, HostPage, PageEvent, CAPTION_SELECTORS};
use crate::translate::TranslationService;

/// Coordinator lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunState {
    /// Disabled or missing a credential: native captions untouched.
    Idle,
    /// Observing the page and translating.
    Active,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Idle => write!(f, "Idle"),
            RunState::Active => write!(f, "Active"),
        }
    }
}

/// Session counters, logged when the coordinator stops.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionStats {
    pub evaluations: u64,
    pub cache_hits: u64,
    pub requests: u64,
    pub shown: u64,
    pub stale_dropped: u64,
}

/// A suspended evaluation cycle: the caption that triggered it, paired with
/// the translation outcome.
type PendingCycle = BoxFuture<'static, (String, Option<String>)>;

pub struct Coordinator {
    host: Arc<dyn HostPage>,
    service: Arc<TranslationService>,
    settings: watch::Receiver<SessionConfig>,
    events: mpsc::UnboundedReceiver<PageEvent>,
    overlay: Overlay,
    state: RunState,
    config: SessionConfig,
    last_text: String,
    pending: FuturesUnordered<PendingCycle>,
    stats: SessionStats,
}

impl Coordinator {
    pub fn new(
        host: Arc<dyn HostPage>,
        service: Arc<TranslationService>,
        settings: watch::Receiver<SessionConfig>,
        events: mpsc::UnboundedReceiver<PageEvent>,
    ) -> Self {
        let overlay = Overlay::new(Arc::clone(&host));
        Self {
            host,
            service,
            settings,
            events,
            overlay,
            state: RunState::Idle,
            config: SessionConfig::default(),
            last_text: String::new(),
            pending: FuturesUnordered::new(),
            stats: SessionStats::default(),
        }
    }

    /// Run until `cancel` fires, the settings gateway closes, or the host
    /// page adapter goes away.
    pub async fn run(mut self, cancel: CancellationToken) {
        let initial = self.settings.borrow_and_update().clone();
        self.apply_config(initial);

        loop {
            let hide_deadline = self.overlay.hide_deadline();
            // Disabled select branches still evaluate their expression.
            let hide_sleep_until =
                hide_deadline.unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("coordinator cancelled");
                    break;
                }
                changed = self.settings.changed() => {
                    if changed.is_err() {
                        info!("settings gateway closed");
                        break;
                    }
                    let config = self.settings.borrow_and_update().clone();
                    self.apply_config(config);
                }
                event = self.events.recv() => {
                    match event {
                        Some(PageEvent::Mutation) => self.on_mutation(),
                        Some(PageEvent::FullscreenChange) => self.on_fullscreen_change(),
                        None => {
                            info!("host page adapter closed");
                            break;
                        }
                    }
                }
                Some((source, outcome)) = self.pending.next(), if !self.pending.is_empty() => {
                    self.on_translation_settled(source, outcome);
                }
                _ = tokio::time::sleep_until(hide_sleep_until), if hide_deadline.is_some() => {
                    self.overlay.complete_hide();
                }
            }
        }

        if self.state == RunState::Active {
            self.enter_idle();
        }
        info!(
            stats = %serde_json::to_string(&self.stats).unwrap_or_default(),
            "coordinator stopped"
        );
    }

    /// Refresh the cached config and move between Idle and Active.
    fn apply_config(&mut self, config: SessionConfig) {
        let desired = if config.is_ready() {
            RunState::Active
        } else {
            RunState::Idle
        };
        self.config = config;
        if desired == self.state {
            return;
        }
        info!(from = %self.state, to = %desired, "state_transition");
        self.state = desired;
        match desired {
            RunState::Active => self.enter_active(),
            RunState::Idle => self.enter_idle(),
        }
    }

    fn enter_active(&mut self) {
        self.host.set_native_captions_hidden(true);
        self.overlay.ensure_attached();
    }

    /// Restore the native captions and drop suspended cycles. Their
    /// underlying requests still settle into the cache on their own tasks.
    fn enter_idle(&mut self) {
        self.overlay.teardown();
        self.host.set_native_captions_hidden(false);
        self.last_text.clear();
        self.pending = FuturesUnordered::new();
    }

    /// One evaluation cycle, run synchronously up to the network boundary.
    fn on_mutation(&mut self) {
        if self.state != RunState::Active {
            return;
        }
        self.stats.evaluations += 1;

        let Some(container) = page::query_first(self.host.as_ref(), CAPTION_SELECTORS) else {
            self.overlay.schedule_hide();
            self.last_text.clear();
            return;
        };
        let Some(markup) = self.host.snapshot(container) else {
            self.overlay.schedule_hide();
            self.last_text.clear();
            return;
        };

        let text = extract::caption_text(&markup);
        if text.is_empty() {
            self.overlay.schedule_hide();
            self.last_text.clear();
            return;
        }

        // Unrelated mutations re-deliver the caption that is already up.
        if text == self.last_text {
            return;
        }
        self.last_text = text.clone();

        if !detect::contains_hangul(&text) {
            // Leave non-Korean captions to the player's own rendering.
            self.overlay.schedule_hide();
            return;
        }

        if let Some(translated) = self.service.cached(&text) {
            self.stats.cache_hits += 1;
            self.stats.shown += 1;
            self.overlay.show(&translated);
            return;
        }

        let Some(api_key) = self.config.api_key.clone() else {
            return;
        };
        self.stats.requests += 1;
        let service = Arc::clone(&self.service);
        self.pending.push(
            async move {
                let outcome = service.translate(&text, &api_key).await;
                (text, outcome)
            }
            .boxed(),
        );
    }

    /// A suspended cycle resolved. The caption may have moved on while the
    /// request was in flight; only a still-current result may touch the
    /// overlay.
    fn on_translation_settled(&mut self, source: String, outcome: Option<String>) {
        if self.state != RunState::Active {
            return;
        }
        match outcome {
            Some(translated) if source == self.last_text => {
                self.stats.shown += 1;
                self.overlay.show(&translated);
            }
            Some(_) => {
                self.stats.stale_dropped += 1;
                debug!(source = %source, "superseded translation dropped");
            }
            // Failures were already logged; the next mutation retries.
            None => {}
        }
    }

    fn on_fullscreen_change(&mut self) {
        if self.state != RunState::Active {
            return;
        }
        self.overlay.reattach();
    }

    /// Counters for the session so far.
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }
}
