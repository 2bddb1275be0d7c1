//! Overlay presenter: owns the injected caption element.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::page::{self, HostPage, NodeId, CAPTION_SELECTORS, PLAYER_SELECTORS};

/// How long an empty caption container must stay empty before the overlay
/// actually hides. The player blanks the container between consecutive
/// lines even in continuous speech; hiding immediately would flicker.
pub const HIDE_DELAY: Duration = Duration::from_millis(1500);

pub struct Overlay {
    host: Arc<dyn HostPage>,
    node: Option<NodeId>,
    hide_at: Option<Instant>,
}

impl Overlay {
    pub fn new(host: Arc<dyn HostPage>) -> Self {
        Self {
            host,
            node: None,
            hide_at: None,
        }
    }

    /// Create and attach the overlay element unless a live one exists.
    /// Anchors inside the player region when possible so the element shows
    /// in fullscreen layouts; the caption container's parent and finally
    /// the body serve as fallbacks.
    pub fn ensure_attached(&mut self) {
        if let Some(node) = self.node {
            if self.host.is_connected(node) {
                return;
            }
        }
        let host = self.host.as_ref();
        let anchor = page::query_first(host, PLAYER_SELECTORS)
            .or_else(|| {
                page::query_first(host, CAPTION_SELECTORS).and_then(|container| host.parent(container))
            })
            .unwrap_or_else(|| host.body());

        let node = self.host.append_overlay(anchor);
        self.host.set_overlay_visible(node, false);
        debug!(node = %node, anchor = %anchor, "overlay attached");
        self.node = Some(node);
    }

    /// Display `text`, cancelling any pending hide.
    pub fn show(&mut self, text: &str) {
        self.hide_at = None;
        self.ensure_attached();
        if let Some(node) = self.node {
            self.host.set_overlay_text(node, text);
            self.host.set_overlay_visible(node, true);
        }
    }

    /// Arm (or re-arm) the delayed hide. The overlay stays up until the
    /// deadline passes without an intervening `show` or re-arm.
    pub fn schedule_hide(&mut self) {
        self.hide_at = Some(Instant::now() + HIDE_DELAY);
    }

    /// Deadline the owning event loop should sleep on, if a hide is armed.
    pub fn hide_deadline(&self) -> Option<Instant> {
        self.hide_at
    }

    /// The armed deadline passed: blank and hide the element.
    pub fn complete_hide(&mut self) {
        self.hide_at = None;
        if let Some(node) = self.node {
            self.host.set_overlay_text(node, "");
            self.host.set_overlay_visible(node, false);
        }
    }

    /// Fullscreen transitions rebuild the player subtree, leaving the old
    /// element detached or buried in a dead layout. Discard and re-attach.
    pub fn reattach(&mut self) {
        if let Some(node) = self.node.take() {
            self.host.remove_node(node);
        }
        self.ensure_attached();
    }

    /// Remove the element and forget all pending state.
    pub fn teardown(&mut self) {
        self.hide_at = None;
        if let Some(node) = self.node.take() {
            self.host.remove_node(node);
        }
    }
}
