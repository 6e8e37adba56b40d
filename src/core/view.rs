//! Interactive network tree view.
//!
//! `NetworkTreeView` owns everything a rendered network needs between
//! interactions: the tree itself, the expanded-node set, which node (if any) is
//! waiting for its next level, the per-node info panels and highlights, and the
//! measured layout.
//!
//! Expanding a node that sits on the deepest loaded level asks a [`LevelLoader`]
//! for the next level first. The load is split in two steps so a caller can
//! release the view while the loader runs: [`NetworkTreeView::begin_expand`]
//! marks the node as loading and reports what to fetch, and
//! [`NetworkTreeView::finish_load`] / [`NetworkTreeView::fail_load`] settle it.
//! [`NetworkTreeView::toggle_expand`] does both around a single await.

use super::{
    expansion::ExpansionState,
    geometry::TreeLayout,
    tree::{LevelBatch, NetworkNode, NetworkTree},
};
use crate::errors::{Error, Result};
use std::{
    collections::{HashMap, HashSet},
    future::Future,
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};
use tracing::{debug, info, instrument, warn};

/// How long a node stays highlighted after its info panel is toggled.
pub const DEFAULT_HIGHLIGHT: Duration = Duration::from_millis(1200);

static NEXT_LOAD_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Fetches one deeper level of the network on demand.
pub trait LevelLoader {
    /// Loads every node on `next_level`, grouped by parent.
    ///
    /// `node_id` is the node whose expansion triggered the load.
    fn load_level(
        &self,
        next_level: u32,
        node_id: &str,
    ) -> impl Future<Output = Result<LevelBatch>> + Send;
}

/// Outcome of the first half of an expand/collapse toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpandStep {
    /// The node is now expanded
    Expanded,
    /// The node is now collapsed; its children stay loaded
    Collapsed,
    /// The next level has to be loaded before the node can expand
    NeedsLoad(PendingLoad),
}

/// A level load started by [`NetworkTreeView::begin_expand`].
///
/// The token is unique per started load across all views, so a result can only
/// settle the load that asked for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLoad {
    /// Level to load
    pub level: u32,
    /// Node waiting for it
    pub node_id: String,
    /// Identifies this load
    pub token: u64,
}

/// What a node's expand control shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affordance {
    /// The node's next level is being fetched
    Pending,
    /// Children are shown
    Expanded,
    /// Children exist but are hidden
    Collapsed,
    /// Nothing to expand
    Leaf,
}

impl Affordance {
    /// Single-character marker for text rendering.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Pending => '…',
            Self::Expanded => '▾',
            Self::Collapsed => '▸',
            Self::Leaf => '•',
        }
    }
}

/// State of one rendered network.
#[derive(Debug, Clone)]
pub struct NetworkTreeView {
    tree: NetworkTree,
    expansion: ExpansionState,
    max_loaded_level: u32,
    lazy_loading: bool,
    loading: Option<PendingLoad>,
    show_info: HashSet<String>,
    root_info: bool,
    highlights: HashMap<String, Instant>,
    highlight_duration: Duration,
    layout: TreeLayout,
}

impl NetworkTreeView {
    /// Creates a view with every node collapsed and lazy loading disabled.
    #[must_use]
    pub fn new(tree: NetworkTree, max_loaded_level: u32) -> Self {
        let expansion = ExpansionState::default();
        let layout = TreeLayout::measure(&tree, &expansion);
        Self {
            tree,
            expansion,
            max_loaded_level,
            lazy_loading: false,
            loading: None,
            show_info: HashSet::new(),
            root_info: false,
            highlights: HashMap::new(),
            highlight_duration: DEFAULT_HIGHLIGHT,
            layout,
        }
    }

    /// Enables fetching deeper levels when a node on the deepest level is expanded.
    #[must_use]
    pub const fn with_lazy_loading(mut self, enabled: bool) -> Self {
        self.lazy_loading = enabled;
        self
    }

    /// Overrides the highlight duration.
    #[must_use]
    pub const fn with_highlight_duration(mut self, duration: Duration) -> Self {
        self.highlight_duration = duration;
        self
    }

    /// The network being shown.
    #[must_use]
    pub const fn tree(&self) -> &NetworkTree {
        &self.tree
    }

    /// Read access to the expanded-node set.
    #[must_use]
    pub const fn expansion(&self) -> &ExpansionState {
        &self.expansion
    }

    /// Deepest level that has been fetched.
    #[must_use]
    pub const fn max_loaded_level(&self) -> u32 {
        self.max_loaded_level
    }

    /// Node currently waiting for its next level.
    #[must_use]
    pub fn loading_node(&self) -> Option<&str> {
        self.loading.as_ref().map(|p| p.node_id.as_str())
    }

    /// Layout of the currently visible nodes.
    #[must_use]
    pub const fn layout(&self) -> &TreeLayout {
        &self.layout
    }

    /// Whether the root's info panel is open.
    #[must_use]
    pub const fn root_info_shown(&self) -> bool {
        self.root_info
    }

    /// Whether a node's info panel is open.
    #[must_use]
    pub fn info_shown(&self, id: &str) -> bool {
        self.show_info.contains(id)
    }

    /// Whether a node is still inside its highlight window at `now`.
    #[must_use]
    pub fn is_highlighted(&self, id: &str, now: Instant) -> bool {
        self.highlights.get(id).is_some_and(|until| now < *until)
    }

    /// The expand control a node should render.
    #[must_use]
    pub fn affordance(&self, node: &NetworkNode) -> Affordance {
        if self.loading_node() == Some(node.id.as_str()) {
            Affordance::Pending
        } else if !node.has_children() {
            Affordance::Leaf
        } else if self.expansion.is_expanded(&node.id) {
            Affordance::Expanded
        } else {
            Affordance::Collapsed
        }
    }

    fn needs_level_load(&self, node: &NetworkNode) -> bool {
        self.lazy_loading && node.level == self.max_loaded_level
    }

    fn remeasure(&mut self) {
        self.layout = TreeLayout::measure(&self.tree, &self.expansion);
    }

    /// First half of a toggle.
    ///
    /// Collapses an expanded node, expands a collapsed one, or, when the node sits
    /// on the deepest loaded level and lazy loading is on, marks it as loading and
    /// returns [`ExpandStep::NeedsLoad`]. Only one load may be in flight: a toggle
    /// that would start a second load fails with [`Error::LoadPending`].
    pub fn begin_expand(&mut self, id: &str) -> Result<ExpandStep> {
        let needs_load = self
            .tree
            .find(id)
            .map(|node| self.needs_level_load(node))
            .ok_or_else(|| Error::NodeNotFound { id: id.to_string() })?;

        if self.loading_node() == Some(id) {
            return Err(Error::LoadPending {
                node_id: id.to_string(),
            });
        }

        if needs_load && !self.expansion.is_expanded(id) {
            if let Some(pending) = &self.loading {
                return Err(Error::LoadPending {
                    node_id: pending.node_id.clone(),
                });
            }
            let pending = PendingLoad {
                level: self.max_loaded_level + 1,
                node_id: id.to_string(),
                token: NEXT_LOAD_TOKEN.fetch_add(1, Ordering::Relaxed),
            };
            debug!(
                node_id = id,
                level = pending.level,
                "Node needs the next level before expanding"
            );
            self.loading = Some(pending.clone());
            return Ok(ExpandStep::NeedsLoad(pending));
        }

        let expanded = self.expansion.toggle(id);
        self.remeasure();
        if expanded {
            debug!(node_id = id, "Expanded node");
            Ok(ExpandStep::Expanded)
        } else {
            debug!(node_id = id, "Collapsed node");
            Ok(ExpandStep::Collapsed)
        }
    }

    fn settles_pending(&self, load: &PendingLoad) -> bool {
        self.loading.as_ref() == Some(load)
    }

    /// Second half of a toggle after a successful load.
    ///
    /// Merges the batch, raises the loaded depth, clears the loading marker, and
    /// expands the node. Returns the number of merged nodes.
    ///
    /// A result for a load this view is not waiting for (the view was replaced
    /// or the load already settled) is discarded. A batch for a level other than
    /// the one requested settles the load like a failure.
    pub fn finish_load(&mut self, load: &PendingLoad, batch: LevelBatch) -> usize {
        let node_id = load.node_id.as_str();
        if !self.settles_pending(load) {
            warn!(
                node_id,
                token = load.token,
                "Discarding level load this view is not waiting for"
            );
            return 0;
        }
        self.loading = None;

        if batch.level != load.level {
            warn!(
                node_id,
                expected = load.level,
                got = batch.level,
                "Level load returned the wrong level, node stays collapsed"
            );
            return 0;
        }

        let merged = self.tree.merge_batch(batch);
        self.max_loaded_level = load.level;
        self.expansion.expand(node_id);
        self.remeasure();
        info!(node_id, level = load.level, merged, "Loaded next network level");
        merged
    }

    /// Second half of a toggle after a failed load: clears the loading marker and
    /// leaves the node collapsed.
    pub fn fail_load(&mut self, load: &PendingLoad) {
        if self.settles_pending(load) {
            self.loading = None;
            warn!(node_id = %load.node_id, "Level load failed, node stays collapsed");
        }
    }

    /// Toggles a node, loading the next level through `loader` when needed.
    ///
    /// Returns whether the node is expanded afterwards. Loader errors are returned
    /// to the caller after the loading marker has been cleared.
    #[instrument(skip(self, loader))]
    pub async fn toggle_expand<L: LevelLoader>(&mut self, loader: &L, id: &str) -> Result<bool> {
        match self.begin_expand(id)? {
            ExpandStep::Expanded => Ok(true),
            ExpandStep::Collapsed => Ok(false),
            ExpandStep::NeedsLoad(load) => {
                match loader.load_level(load.level, &load.node_id).await {
                    Ok(batch) => {
                        self.finish_load(&load, batch);
                        Ok(self.expansion.is_expanded(&load.node_id))
                    }
                    Err(e) => {
                        self.fail_load(&load);
                        Err(e)
                    }
                }
            }
        }
    }

    /// Toggles a node's info panel and starts its highlight.
    ///
    /// Returns whether the panel is open afterwards.
    pub fn toggle_info(&mut self, id: &str, now: Instant) -> Result<bool> {
        if self.tree.find(id).is_none() {
            return Err(Error::NodeNotFound { id: id.to_string() });
        }
        let shown = if self.show_info.remove(id) {
            false
        } else {
            self.show_info.insert(id.to_string());
            true
        };
        self.highlights
            .insert(id.to_string(), now + self.highlight_duration);
        Ok(shown)
    }

    /// Toggles the root's info panel. The root never collapses.
    pub fn toggle_root_info(&mut self) -> bool {
        self.root_info = !self.root_info;
        self.root_info
    }

    /// Drops highlights that have run out at `now`.
    pub fn expire_highlights(&mut self, now: Instant) {
        self.highlights.retain(|_, until| now < *until);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::tree::RootUser;
    use std::sync::Mutex;

    struct FakeLoader {
        batch: Option<LevelBatch>,
        calls: Mutex<Vec<(u32, String)>>,
    }

    impl FakeLoader {
        fn returning(batch: LevelBatch) -> Self {
            Self {
                batch: Some(batch),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                batch: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(u32, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl LevelLoader for FakeLoader {
        async fn load_level(&self, next_level: u32, node_id: &str) -> Result<LevelBatch> {
            self.calls
                .lock()
                .unwrap()
                .push((next_level, node_id.to_string()));
            self.batch.clone().ok_or_else(|| Error::LevelLoad {
                level: next_level,
                node_id: node_id.to_string(),
                message: "backend unavailable".to_string(),
            })
        }
    }

    // root -> alice (level 1, with carol at level 2 loaded), bob (level 1)
    fn sample_view(max_loaded_level: u32) -> NetworkTreeView {
        let mut alice = NetworkNode::new("alice", Some("Alice".to_string()), 1);
        let mut carol = NetworkNode::new("carol", Some("Carol".to_string()), 2);
        carol.total_children = 1;
        alice.children.push(carol);
        alice.total_children = 1;
        let bob = NetworkNode::new("bob", Some("Bob".to_string()), 1);
        let tree = NetworkTree::new(
            RootUser {
                id: "rita".to_string(),
                name: Some("Rita".to_string()),
            },
            vec![alice, bob],
        );
        NetworkTreeView::new(tree, max_loaded_level).with_lazy_loading(true)
    }

    fn carol_batch() -> LevelBatch {
        LevelBatch::new(3).with_children("carol", vec![NetworkNode::new("dave", None, 3)])
    }

    #[test]
    fn test_nodes_start_collapsed() {
        let view = sample_view(2);
        assert!(view.expansion().is_empty());
        assert_eq!(view.layout().nodes().len(), 2);
        let alice = view.tree().find("alice").unwrap();
        assert_eq!(view.affordance(alice), Affordance::Collapsed);
        let bob = view.tree().find("bob").unwrap();
        assert_eq!(view.affordance(bob), Affordance::Leaf);
    }

    #[test]
    fn test_expand_and_collapse_without_loading() {
        let mut view = sample_view(2);
        assert_eq!(view.begin_expand("alice").unwrap(), ExpandStep::Expanded);
        assert!(view.expansion().is_expanded("alice"));
        assert!(view.layout().rect("carol").is_some());

        assert_eq!(view.begin_expand("alice").unwrap(), ExpandStep::Collapsed);
        assert!(!view.expansion().is_expanded("alice"));
        assert!(view.layout().rect("carol").is_none());
        // Children stay in memory.
        assert_eq!(view.tree().find("alice").unwrap().children.len(), 1);
    }

    #[test]
    fn test_toggling_twice_restores_expansion() {
        let mut view = sample_view(2);
        view.begin_expand("alice").unwrap();
        let before = view.expansion().clone();

        assert_eq!(view.begin_expand("bob").unwrap(), ExpandStep::Expanded);
        assert_eq!(view.begin_expand("bob").unwrap(), ExpandStep::Collapsed);
        assert_eq!(view.expansion(), &before);

        assert_eq!(view.begin_expand("alice").unwrap(), ExpandStep::Collapsed);
        assert_eq!(view.begin_expand("alice").unwrap(), ExpandStep::Expanded);
        assert_eq!(view.expansion(), &before);
    }

    #[test]
    fn test_unknown_node() {
        let mut view = sample_view(2);
        assert!(matches!(
            view.begin_expand("nobody"),
            Err(Error::NodeNotFound { .. })
        ));
        assert!(matches!(
            view.toggle_info("nobody", Instant::now()),
            Err(Error::NodeNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_expanding_deepest_level_loads_next_level() -> Result<()> {
        let mut view = sample_view(2);
        let loader = FakeLoader::returning(carol_batch());

        view.toggle_expand(&loader, "alice").await?;
        assert!(loader.calls().is_empty(), "level 1 node should not load");

        assert!(view.toggle_expand(&loader, "carol").await?);
        assert_eq!(loader.calls(), vec![(3, "carol".to_string())]);
        assert_eq!(view.max_loaded_level(), 3);
        assert!(view.loading_node().is_none());
        assert!(view.expansion().is_expanded("carol"));
        assert!(view.layout().rect("dave").is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_reexpanding_does_not_refetch() -> Result<()> {
        let mut view = sample_view(2);
        let loader = FakeLoader::returning(carol_batch());
        view.toggle_expand(&loader, "alice").await?;
        view.toggle_expand(&loader, "carol").await?;
        assert!(!view.toggle_expand(&loader, "carol").await?);
        assert!(view.toggle_expand(&loader, "carol").await?);
        assert_eq!(loader.calls().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_without_lazy_loading_nothing_is_fetched() -> Result<()> {
        let mut view = sample_view(1).with_lazy_loading(false);
        let loader = FakeLoader::returning(carol_batch());
        assert!(view.toggle_expand(&loader, "alice").await?);
        assert!(loader.calls().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_load_clears_marker_and_stays_collapsed() {
        let mut view = sample_view(1);
        let loader = FakeLoader::failing();

        let result = view.toggle_expand(&loader, "alice").await;
        assert!(matches!(result, Err(Error::LevelLoad { level: 2, .. })));
        assert!(view.loading_node().is_none());
        assert!(!view.expansion().is_expanded("alice"));
        assert_eq!(view.max_loaded_level(), 1);
    }

    #[test]
    fn test_reentrant_expand_is_rejected_while_pending() {
        let mut view = sample_view(1);
        let ExpandStep::NeedsLoad(load) = view.begin_expand("alice").unwrap() else {
            panic!("alice should need a load");
        };
        assert_eq!(load.level, 2);
        assert_eq!(load.node_id, "alice");
        assert_eq!(view.loading_node(), Some("alice"));
        let alice = view.tree().find("alice").unwrap();
        assert_eq!(view.affordance(alice), Affordance::Pending);

        assert!(matches!(
            view.begin_expand("alice"),
            Err(Error::LoadPending { .. })
        ));
        // A second node on the same level cannot start its own load either.
        assert!(matches!(
            view.begin_expand("bob"),
            Err(Error::LoadPending { node_id }) if node_id == "alice"
        ));
    }

    fn begin_load(view: &mut NetworkTreeView, id: &str) -> PendingLoad {
        match view.begin_expand(id).unwrap() {
            ExpandStep::NeedsLoad(load) => load,
            step => panic!("{id} should need a load, got {step:?}"),
        }
    }

    #[test]
    fn test_orphaned_load_result_is_discarded() {
        let mut view = sample_view(2);
        let orphan = PendingLoad {
            level: 3,
            node_id: "carol".to_string(),
            token: 0,
        };
        assert_eq!(view.finish_load(&orphan, carol_batch()), 0);
        assert!(view.tree().find("dave").is_none());
        assert_eq!(view.max_loaded_level(), 2);
    }

    #[test]
    fn test_load_for_replaced_view_is_discarded() {
        let mut old = sample_view(1);
        let stale = begin_load(&mut old, "alice");

        // The user reopened the same network and expanded the same node again.
        let mut replacement = sample_view(1);
        let current = begin_load(&mut replacement, "alice");
        assert_ne!(stale.token, current.token);

        let ghost = LevelBatch::new(7)
            .with_children("alice", vec![NetworkNode::new("ghost", None, 7)]);
        assert_eq!(replacement.finish_load(&stale, ghost), 0);
        assert!(replacement.tree().find("ghost").is_none());
        assert_eq!(replacement.max_loaded_level(), 1);
        assert_eq!(replacement.loading_node(), Some("alice"));

        // A stale failure does not clear the live marker either.
        replacement.fail_load(&stale);
        assert_eq!(replacement.loading_node(), Some("alice"));

        let batch =
            LevelBatch::new(2).with_children("alice", vec![NetworkNode::new("dan", None, 2)]);
        assert_eq!(replacement.finish_load(&current, batch), 1);
        assert_eq!(replacement.max_loaded_level(), 2);
    }

    #[tokio::test]
    async fn test_wrong_level_batch_is_not_merged() -> Result<()> {
        let mut view = sample_view(2);
        view.begin_expand("alice")?;
        let loader = FakeLoader::returning(LevelBatch::default());

        assert!(!view.toggle_expand(&loader, "carol").await?);
        assert!(view.loading_node().is_none());
        assert_eq!(view.max_loaded_level(), 2);
        assert!(!view.expansion().is_expanded("carol"));
        Ok(())
    }

    #[test]
    fn test_two_phase_load() {
        let mut view = sample_view(2);
        view.begin_expand("alice").unwrap();
        let load = begin_load(&mut view, "carol");
        assert_eq!(load.level, 3);
        assert_eq!(view.finish_load(&load, carol_batch()), 1);
        assert!(view.expansion().is_expanded("carol"));
        assert_eq!(view.layout().connectors_for("carol").map(|c| c.stubs.len()), Some(1));
    }

    #[test]
    fn test_info_toggle_is_independent_of_expansion() {
        let mut view = sample_view(2);
        let now = Instant::now();
        assert!(view.toggle_info("alice", now).unwrap());
        assert!(view.info_shown("alice"));
        assert!(!view.expansion().is_expanded("alice"));
        assert!(!view.toggle_info("alice", now).unwrap());
        assert!(!view.info_shown("alice"));
    }

    #[test]
    fn test_highlight_reverts_after_duration() {
        let mut view = sample_view(2).with_highlight_duration(Duration::from_millis(1200));
        let now = Instant::now();
        view.toggle_info("bob", now).unwrap();

        assert!(view.is_highlighted("bob", now));
        assert!(view.is_highlighted("bob", now + Duration::from_millis(1199)));
        assert!(!view.is_highlighted("bob", now + Duration::from_millis(1200)));

        view.expire_highlights(now + Duration::from_secs(2));
        assert!(!view.is_highlighted("bob", now));
    }

    #[test]
    fn test_root_info_toggle() {
        let mut view = sample_view(2);
        assert!(view.toggle_root_info());
        assert!(view.root_info_shown());
        assert!(!view.toggle_root_info());
        assert!(view.expansion().is_empty());
    }
}
