//! In-memory host page for the demo binary and the test suite.
//!
//! Models just enough of a player page: a body, a player region, a caption
//! container with settable markup, and overlay nodes. `Mutation` is emitted
//! only when content actually changes, and style toggles emit nothing,
//! matching what a child-list/character-data observer would deliver.
//! `FullscreenChange` rebuilds the player subtree, so node handles minted
//! before the transition go stale.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::{HostPage, NodeId, NodeSnapshot, PageEvent, CAPTION_SELECTORS, PLAYER_SELECTORS};

struct OverlayNode {
    parent: NodeId,
    text: String,
    visible: bool,
    connected: bool,
}

struct PageState {
    player: NodeId,
    caption_container: Option<NodeId>,
    caption_markup: NodeSnapshot,
    overlays: HashMap<NodeId, OverlayNode>,
    captions_hidden: bool,
    fullscreen: bool,
}

pub struct SimulatedPage {
    body: NodeId,
    state: Mutex<PageState>,
    next_id: AtomicU64,
    events: mpsc::UnboundedSender<PageEvent>,
}

impl SimulatedPage {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<PageEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let page = Arc::new(Self {
            body: NodeId(1),
            state: Mutex::new(PageState {
                player: NodeId(2),
                caption_container: Some(NodeId(3)),
                caption_markup: NodeSnapshot::element("div", Vec::new()),
                overlays: HashMap::new(),
                captions_hidden: false,
                fullscreen: false,
            }),
            next_id: AtomicU64::new(4),
            events: tx,
        });
        (page, rx)
    }

    fn mint(&self) -> NodeId {
        NodeId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn emit(&self, event: PageEvent) {
        // Receiver gone means the pipeline stopped; nothing to notify.
        let _ = self.events.send(event);
    }

    /// Render one block element per caption line.
    pub fn set_caption_lines(&self, lines: &[&str]) {
        let children = lines
            .iter()
            .map(|line| NodeSnapshot::element("div", vec![NodeSnapshot::text(*line)]))
            .collect();
        self.set_caption_markup(NodeSnapshot::element("div", children));
    }

    /// Replace the caption markup wholesale, recreating the container if the
    /// player had dropped it.
    pub fn set_caption_markup(&self, markup: NodeSnapshot) {
        let changed = {
            let mut st = self.state.lock();
            let recreated = st.caption_container.is_none();
            if recreated {
                st.caption_container = Some(self.mint());
            }
            let changed = recreated || st.caption_markup != markup;
            st.caption_markup = markup;
            changed
        };
        if changed {
            self.emit(PageEvent::Mutation);
        }
    }

    /// Empty the caption container, as the player does between lines.
    pub fn clear_caption(&self) {
        self.set_caption_markup(NodeSnapshot::element("div", Vec::new()));
    }

    /// Drop the caption container entirely (captions turned off).
    pub fn remove_caption_container(&self) {
        let changed = {
            let mut st = self.state.lock();
            st.caption_container.take().is_some()
        };
        if changed {
            self.emit(PageEvent::Mutation);
        }
    }

    /// Deliver a mutation that did not touch the captions.
    pub fn emit_unrelated_mutation(&self) {
        self.emit(PageEvent::Mutation);
    }

    /// Enter or leave fullscreen. The player subtree is rebuilt: the player
    /// and caption container get fresh nodes and everything attached under
    /// the old player is detached.
    pub fn toggle_fullscreen(&self) {
        {
            let mut st = self.state.lock();
            st.fullscreen = !st.fullscreen;
            st.player = self.mint();
            if st.caption_container.is_some() {
                st.caption_container = Some(self.mint());
            }
            for overlay in st.overlays.values_mut() {
                if overlay.parent != self.body {
                    overlay.connected = false;
                }
            }
        }
        self.emit(PageEvent::FullscreenChange);
        self.emit(PageEvent::Mutation);
    }

    pub fn is_fullscreen(&self) -> bool {
        self.state.lock().fullscreen
    }

    /// Text of the attached overlay, if one exists.
    pub fn overlay_text(&self) -> Option<String> {
        let st = self.state.lock();
        st.overlays
            .values()
            .find(|o| o.connected)
            .map(|o| o.text.clone())
    }

    /// The overlay text a viewer currently sees, if any.
    pub fn visible_overlay_text(&self) -> Option<String> {
        let st = self.state.lock();
        st.overlays
            .values()
            .find(|o| o.connected && o.visible && !o.text.is_empty())
            .map(|o| o.text.clone())
    }

    pub fn overlay_visible(&self) -> bool {
        let st = self.state.lock();
        st.overlays.values().any(|o| o.connected && o.visible)
    }

    /// Number of overlay nodes attached to the page.
    pub fn overlay_count(&self) -> usize {
        let st = self.state.lock();
        st.overlays.values().filter(|o| o.connected).count()
    }

    pub fn overlay_anchored_to_player(&self) -> bool {
        let st = self.state.lock();
        st.overlays
            .values()
            .any(|o| o.connected && o.parent == st.player)
    }

    pub fn native_captions_hidden(&self) -> bool {
        self.state.lock().captions_hidden
    }
}

impl HostPage for SimulatedPage {
    fn query_selector(&self, selector: &str) -> Option<NodeId> {
        let st = self.state.lock();
        if CAPTION_SELECTORS.contains(&selector) {
            return st.caption_container;
        }
        if PLAYER_SELECTORS.contains(&selector) {
            return Some(st.player);
        }
        None
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        let st = self.state.lock();
        if Some(node) == st.caption_container {
            return Some(st.player);
        }
        if node == st.player {
            return Some(self.body);
        }
        st.overlays
            .get(&node)
            .filter(|o| o.connected)
            .map(|o| o.parent)
    }

    fn body(&self) -> NodeId {
        self.body
    }

    fn snapshot(&self, node: NodeId) -> Option<NodeSnapshot> {
        let st = self.state.lock();
        (Some(node) == st.caption_container).then(|| st.caption_markup.clone())
    }

    fn is_connected(&self, node: NodeId) -> bool {
        let st = self.state.lock();
        node == self.body
            || node == st.player
            || Some(node) == st.caption_container
            || st.overlays.get(&node).is_some_and(|o| o.connected)
    }

    fn append_overlay(&self, anchor: NodeId) -> NodeId {
        let id = self.mint();
        {
            let mut st = self.state.lock();
            st.overlays.insert(
                id,
                OverlayNode {
                    parent: anchor,
                    text: String::new(),
                    visible: false,
                    connected: true,
                },
            );
        }
        self.emit(PageEvent::Mutation);
        id
    }

    fn set_overlay_text(&self, node: NodeId, text: &str) {
        let changed = {
            let mut st = self.state.lock();
            match st.overlays.get_mut(&node) {
                Some(o) if o.text != text => {
                    o.text = text.to_string();
                    true
                }
                _ => false,
            }
        };
        if changed {
            self.emit(PageEvent::Mutation);
        }
    }

    fn set_overlay_visible(&self, node: NodeId, visible: bool) {
        // Style toggle: no child-list or character-data mutation.
        let mut st = self.state.lock();
        if let Some(o) = st.overlays.get_mut(&node) {
            o.visible = visible;
        }
    }

    fn remove_node(&self, node: NodeId) {
        let removed = {
            let mut st = self.state.lock();
            if Some(node) == st.caption_container {
                st.caption_container = None;
                true
            } else if let Some(o) = st.overlays.get_mut(&node) {
                let was_connected = o.connected;
                o.connected = false;
                was_connected
            } else {
                false
            }
        };
        if removed {
            self.emit(PageEvent::Mutation);
        }
    }

    fn set_native_captions_hidden(&self, hidden: bool) {
        // Class toggle on the body: styling only, not an observed mutation.
        self.state.lock().captions_hidden = hidden;
    }
}
