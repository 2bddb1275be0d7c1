//! Session configuration and the settings gateway.
//!
//! The settings store itself (UI, persistence) lives outside this crate.
//! Whoever owns it publishes values through a `SettingsChannel`; the
//! coordinator holds the receiving end and reacts to every change.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Environment variables the demo binary reads its settings from.
pub const ENV_API_KEY: &str = "HANSUB_API_KEY";
pub const ENV_ENABLED: &str = "HANSUB_ENABLED";

/// User-facing settings the pipeline runs on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Translation backend credential.
    pub api_key: Option<String>,
    /// Master switch; on by default so a configured credential is enough.
    pub enabled: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            enabled: true,
        }
    }
}

impl SessionConfig {
    /// Both conditions for running: enabled and a non-empty credential.
    pub fn is_ready(&self) -> bool {
        self.enabled && self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// Publishing side of the settings gateway.
///
/// Keeps the `watch` sender alive for the life of the session; a dropped
/// channel tells the coordinator the gateway is gone and it shuts down.
pub struct SettingsChannel {
    tx: watch::Sender<SessionConfig>,
}

impl SettingsChannel {
    pub fn new(initial: SessionConfig) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Build a channel from the process environment.
    pub fn from_env() -> Self {
        let api_key = std::env::var(ENV_API_KEY).ok().filter(|k| !k.is_empty());
        let enabled = std::env::var(ENV_ENABLED)
            .map(|v| v != "0" && v != "false")
            .unwrap_or(true);
        Self::new(SessionConfig { api_key, enabled })
    }

    /// Apply a change-notification delta to the stored config.
    pub fn update(&self, apply: impl FnOnce(&mut SessionConfig)) {
        self.tx.send_modify(apply);
    }

    /// Replace the stored config wholesale.
    pub fn publish(&self, config: SessionConfig) {
        self.tx.send_replace(config);
    }

    pub fn current(&self) -> SessionConfig {
        self.tx.borrow().clone()
    }

    /// Subscription handle for the coordinator.
    pub fn subscribe(&self) -> watch::Receiver<SessionConfig> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_requires_credential_and_enabled() {
        let mut config = SessionConfig::default();
        assert!(!config.is_ready());

        config.api_key = Some("key".into());
        assert!(config.is_ready());

        config.enabled = false;
        assert!(!config.is_ready());

        config.enabled = true;
        config.api_key = Some(String::new());
        assert!(!config.is_ready());
    }

    #[tokio::test]
    async fn update_notifies_subscribers() {
        let channel = SettingsChannel::new(SessionConfig::default());
        let mut rx = channel.subscribe();

        channel.update(|c| c.api_key = Some("key".into()));
        rx.changed().await.expect("channel open");
        assert!(rx.borrow().is_ready());

        channel.update(|c| c.enabled = false);
        rx.changed().await.expect("channel open");
        assert!(!rx.borrow().is_ready());
    }
}
