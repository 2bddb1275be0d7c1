//! Demo driver: runs the pipeline against a scripted in-memory player page.
//!
//! With `HANSUB_API_KEY` set the captions go through the real translation
//! backend; otherwise a stub echoes them back.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use hansub::config::SettingsChannel;
use hansub::coordinator::Coordinator;
use hansub::page::sim::SimulatedPage;
use hansub::page::HostPage;
use hansub::translate::cache::DEFAULT_CAPACITY;
use hansub::translate::google::GoogleTranslateClient;
use hansub::translate::{StubBackend, TranslateBackend, TranslationService};

/// Caption timeline: one frame per entry, empty means the player blanked
/// the container between lines.
const SCRIPT: &[&[&str]] = &[
    &["안녕하세요"],
    &["오늘 날씨가 좋네요"],
    &["오늘 날씨가", "좋네요"],
    &[],
    &["안녕하세요"],
];

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hansub=debug".parse().unwrap()),
        )
        .with_target(true)
        .init();

    let settings = SettingsChannel::from_env();

    let backend: Arc<dyn TranslateBackend> = if settings.current().api_key.is_some() {
        match GoogleTranslateClient::new() {
            Ok(client) => {
                info!("using the remote translation backend");
                Arc::new(client)
            }
            Err(e) => {
                warn!(error = %e, "client init failed, falling back to stub backend");
                Arc::new(StubBackend)
            }
        }
    } else {
        info!("no credential configured, using stub backend");
        settings.update(|c| c.api_key = Some("stub".into()));
        Arc::new(StubBackend)
    };

    let service = Arc::new(TranslationService::new(backend, DEFAULT_CAPACITY));
    let (page, events) = SimulatedPage::new();
    let host: Arc<dyn HostPage> = Arc::clone(&page) as Arc<dyn HostPage>;

    let coordinator = Coordinator::new(host, service, settings.subscribe(), events);
    let cancel = CancellationToken::new();
    let pipeline = tokio::spawn(coordinator.run(cancel.clone()));

    for lines in SCRIPT {
        if lines.is_empty() {
            page.clear_caption();
        } else {
            page.set_caption_lines(lines);
        }
        tokio::time::sleep(Duration::from_millis(400)).await;
        info!(caption = ?lines, overlay = ?page.visible_overlay_text(), "frame");
    }

    page.toggle_fullscreen();
    page.set_caption_lines(&["전체 화면입니다"]);
    tokio::time::sleep(Duration::from_millis(400)).await;
    info!(overlay = ?page.visible_overlay_text(), "after fullscreen");

    settings.update(|c| c.enabled = false);
    tokio::time::sleep(Duration::from_millis(100)).await;
    info!(
        captions_hidden = page.native_captions_hidden(),
        overlays = page.overlay_count(),
        "disabled"
    );

    cancel.cancel();
    let _ = pipeline.await;
}
