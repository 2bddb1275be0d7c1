//! Host page surface.
//!
//! The player page is reached through the `HostPage` trait: selector
//! queries, markup snapshots for caption extraction, and the handful of
//! overlay node operations. Mutation and fullscreen notifications arrive on
//! a `PageEvent` channel owned by the adapter; there is no backpressure on
//! that channel because a dropped mutation is a missed caption.

pub mod extract;
pub mod sim;

use std::fmt;

/// Caption container candidates, highest priority first.
pub const CAPTION_SELECTORS: &[&str] = &[
    ".player-timedtext-text-container",
    "[data-uia='player-timedtext']",
    ".player-timedtext",
];

/// Player region candidates used to anchor the overlay, highest priority
/// first. Anchoring inside the player keeps the overlay visible in
/// fullscreen layouts.
pub const PLAYER_SELECTORS: &[&str] = &[
    ".watch-video--player-view",
    "[data-uia='video-canvas']",
    ".VideoContainer",
];

/// Opaque handle to a live node in the host page. Minted by the adapter;
/// a handle stays valid until its node leaves the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Notification from the host page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    /// Something changed in the observed subtree.
    Mutation,
    /// The player entered or left fullscreen; its subtree was rebuilt.
    FullscreenChange,
}

/// Point-in-time copy of a node's markup, detached from the live page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeSnapshot {
    Element {
        tag: String,
        children: Vec<NodeSnapshot>,
    },
    Text(String),
}

impl NodeSnapshot {
    pub fn element(tag: impl Into<String>, children: Vec<NodeSnapshot>) -> Self {
        NodeSnapshot::Element {
            tag: tag.into(),
            children,
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        NodeSnapshot::Text(content.into())
    }

    /// Concatenated text of every descendant text run, in document order.
    pub fn text_content(&self) -> String {
        fn collect(node: &NodeSnapshot, out: &mut String) {
            match node {
                NodeSnapshot::Text(t) => out.push_str(t),
                NodeSnapshot::Element { children, .. } => {
                    for child in children {
                        collect(child, out);
                    }
                }
            }
        }
        let mut out = String::new();
        collect(self, &mut out);
        out
    }

    /// Whether this node renders as its own line.
    pub fn is_block(&self) -> bool {
        matches!(self, NodeSnapshot::Element { tag, .. } if tag == "div" || tag == "p")
    }
}

/// Operations the pipeline needs from the live page.
///
/// Everything here is synchronous and must never block; adapters own the
/// `PageEvent` sender side.
pub trait HostPage: Send + Sync {
    /// First element matching `selector`, if any.
    fn query_selector(&self, selector: &str) -> Option<NodeId>;

    /// Parent element of `node`, while it is still in the page.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// The document body. Always present.
    fn body(&self) -> NodeId;

    /// Markup snapshot of `node`; `None` once the node left the page.
    fn snapshot(&self, node: NodeId) -> Option<NodeSnapshot>;

    /// Whether `node` is still attached to the page.
    fn is_connected(&self, node: NodeId) -> bool;

    /// Create the overlay element under `anchor` and return its handle.
    fn append_overlay(&self, anchor: NodeId) -> NodeId;

    fn set_overlay_text(&self, node: NodeId, text: &str);

    fn set_overlay_visible(&self, node: NodeId, visible: bool);

    /// Detach `node` from the page.
    fn remove_node(&self, node: NodeId);

    /// Toggle the styling that hides the player's own caption rendering.
    fn set_native_captions_hidden(&self, hidden: bool);
}

/// First match from a prioritized selector list.
pub fn query_first(host: &dyn HostPage, selectors: &[&str]) -> Option<NodeId> {
    selectors
        .iter()
        .find_map(|selector| host.query_selector(selector))
}
