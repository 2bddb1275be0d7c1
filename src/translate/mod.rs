//! Translation pipeline: backend adapter, request coalescing, result cache.

pub mod cache;
pub mod google;

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::{BoxFuture, Shared};
use futures_util::FutureExt;
use parking_lot::Mutex;
use tracing::{debug, error, warn};

use self::cache::TranslationCache;

/// Failure modes of a translation request. Every one of them resolves to
/// "no translation" at the service boundary; none abort the pipeline.
#[derive(Debug)]
pub enum TranslateError {
    /// Transport-level failure (DNS, connect, TLS, body read).
    Http(reqwest::Error),
    /// Backend answered with a non-success status.
    Status(u16),
    /// Response body did not carry a usable translation.
    MalformedResponse(String),
}

impl std::fmt::Display for TranslateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranslateError::Http(e) => write!(f, "http error: {e}"),
            TranslateError::Status(code) => write!(f, "unexpected status {code}"),
            TranslateError::MalformedResponse(msg) => write!(f, "malformed response: {msg}"),
        }
    }
}

/// Backend adapter: one network call per invocation, no caching, no retry.
pub trait TranslateBackend: Send + Sync {
    fn request<'a>(
        &'a self,
        text: &'a str,
        api_key: &'a str,
    ) -> BoxFuture<'a, Result<String, TranslateError>>;
}

/// Echo backend for development runs without a credential.
pub struct StubBackend;

impl TranslateBackend for StubBackend {
    fn request<'a>(
        &'a self,
        text: &'a str,
        _api_key: &'a str,
    ) -> BoxFuture<'a, Result<String, TranslateError>> {
        async move { Ok(format!("[stub] {text}")) }.boxed()
    }
}

/// A settled-or-pending translation shared by every caller of the same text.
type PendingTranslation = Shared<BoxFuture<'static, Option<String>>>;

/// Caching, coalescing front of the translation backend.
///
/// Concurrent calls for the same text collapse onto a single network
/// request whose result is delivered to every caller. Successes are cached;
/// failures are not, so the next caption cycle naturally retries.
pub struct TranslationService {
    backend: Arc<dyn TranslateBackend>,
    cache: Arc<TranslationCache>,
    pending: Arc<Mutex<HashMap<String, PendingTranslation>>>,
}

impl TranslationService {
    pub fn new(backend: Arc<dyn TranslateBackend>, cache_capacity: usize) -> Self {
        Self {
            backend,
            cache: Arc::new(TranslationCache::new(cache_capacity)),
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Cached translation for `text`, if present. Never goes to the network.
    pub fn cached(&self, text: &str) -> Option<String> {
        self.cache.get(text)
    }

    /// Translate `text`, going to the backend only when neither the cache
    /// nor the in-flight table covers it. Resolves to `None` on failure.
    pub async fn translate(&self, text: &str, api_key: &str) -> Option<String> {
        if let Some(hit) = self.cache.get(text) {
            debug!(text, "translation cache hit");
            return Some(hit);
        }

        let shared = {
            let mut pending = self.pending.lock();
            match pending.get(text) {
                Some(existing) => {
                    debug!(text, "joining in-flight translation");
                    existing.clone()
                }
                None => {
                    let fut = self.spawn_request(text, api_key);
                    pending.insert(text.to_string(), fut.clone());
                    fut
                }
            }
        };

        shared.await
    }

    /// Start the backend call on its own task so it settles (and fills the
    /// cache) even when every awaiter has moved on to a newer caption.
    fn spawn_request(&self, text: &str, api_key: &str) -> PendingTranslation {
        let backend = Arc::clone(&self.backend);
        let cache = Arc::clone(&self.cache);
        let pending = Arc::clone(&self.pending);
        let text = text.to_string();
        let api_key = api_key.to_string();

        let task = tokio::spawn(async move {
            let outcome = backend.request(&text, &api_key).await;
            let resolved = match outcome {
                Ok(translated) => {
                    cache.insert(&text, &translated);
                    Some(translated)
                }
                Err(e) => {
                    warn!(error = %e, text = %text, "translation request failed");
                    None
                }
            };
            pending.lock().remove(&text);
            resolved
        });

        task.map(|joined| {
            joined.unwrap_or_else(|e| {
                error!(error = %e, "translation task aborted");
                None
            })
        })
        .boxed()
        .shared()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Semaphore;

    /// Backend that counts calls and holds each one until released.
    struct GatedBackend {
        calls: AtomicUsize,
        gate: Semaphore,
        fail: bool,
    }

    impl GatedBackend {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                gate: Semaphore::new(0),
                fail,
            })
        }

        fn release(&self, n: usize) {
            self.gate.add_permits(n);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl TranslateBackend for GatedBackend {
        fn request<'a>(
            &'a self,
            text: &'a str,
            _api_key: &'a str,
        ) -> BoxFuture<'a, Result<String, TranslateError>> {
            async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                let permit = self.gate.acquire().await.expect("gate closed");
                permit.forget();
                if self.fail {
                    Err(TranslateError::Status(500))
                } else {
                    Ok(format!("en:{text}"))
                }
            }
            .boxed()
        }
    }

    fn service_with(backend: &Arc<GatedBackend>) -> Arc<TranslationService> {
        Arc::new(TranslationService::new(
            Arc::clone(backend) as Arc<dyn TranslateBackend>,
            cache::DEFAULT_CAPACITY,
        ))
    }

    #[tokio::test]
    async fn concurrent_identical_requests_share_one_call() {
        let backend = GatedBackend::new(false);
        let service = service_with(&backend);

        let a = tokio::spawn({
            let service = Arc::clone(&service);
            async move { service.translate("안녕", "key").await }
        });
        let b = tokio::spawn({
            let service = Arc::clone(&service);
            async move { service.translate("안녕", "key").await }
        });
        tokio::task::yield_now().await;
        backend.release(2);

        assert_eq!(a.await.unwrap(), Some("en:안녕".into()));
        assert_eq!(b.await.unwrap(), Some("en:안녕".into()));
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn cache_hit_skips_backend() {
        let backend = GatedBackend::new(false);
        let service = service_with(&backend);

        backend.release(1);
        assert_eq!(service.translate("안녕", "key").await, Some("en:안녕".into()));
        assert_eq!(service.cached("안녕"), Some("en:안녕".into()));

        // no gate permit left: a second network call would hang
        assert_eq!(service.translate("안녕", "key").await, Some("en:안녕".into()));
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn failures_resolve_to_none_and_are_not_cached() {
        let backend = GatedBackend::new(true);
        let service = service_with(&backend);

        backend.release(1);
        assert_eq!(service.translate("안녕", "key").await, None);
        assert_eq!(service.cached("안녕"), None);

        // nothing cached: the next attempt issues a fresh call
        backend.release(1);
        assert_eq!(service.translate("안녕", "key").await, None);
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn distinct_texts_do_not_coalesce() {
        let backend = GatedBackend::new(false);
        let service = service_with(&backend);

        backend.release(2);
        let first = service.translate("안녕", "key").await;
        let second = service.translate("잘 가", "key").await;
        assert_eq!(first, Some("en:안녕".into()));
        assert_eq!(second, Some("en:잘 가".into()));
        assert_eq!(backend.calls(), 2);
    }
}
