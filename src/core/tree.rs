//! Referral network tree.
//!
//! The network is a recursive structure: a distinguished root user whose direct
//! referrals form level 1, each of which holds its own referrals, and so on. Deeper
//! levels are fetched lazily and merged in as [`LevelBatch`]es.

use super::records::{Identity, lenient_count, lenient_id};
use crate::errors::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Id used for the root of payloads that carry no `rootUser`.
pub const ANONYMOUS_ROOT_ID: &str = "root";

/// One member in the referral network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkNode {
    /// Backend user id
    pub id: String,
    /// Display name, if the backend sent one
    pub name: Option<String>,
    /// Depth below the root (1 = direct referral)
    pub level: u32,
    /// Number of direct referrals the backend knows about, loaded or not
    pub total_children: u32,
    /// Loaded direct referrals
    pub children: Vec<NetworkNode>,
}

impl NetworkNode {
    /// Creates a leaf node.
    #[must_use]
    pub fn new(id: impl Into<String>, name: Option<String>, level: u32) -> Self {
        Self {
            id: id.into(),
            name,
            level,
            total_children: 0,
            children: Vec::new(),
        }
    }

    /// Name if known, otherwise the id.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Whether the node has referrals that could be shown.
    #[must_use]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty() || self.total_children > 0
    }

    fn find(&self, id: &str) -> Option<&Self> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Self> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(id))
    }

    fn count(&self) -> usize {
        1 + self.children.iter().map(Self::count).sum::<usize>()
    }

    fn deepest_level(&self) -> u32 {
        self.children
            .iter()
            .map(Self::deepest_level)
            .max()
            .unwrap_or(self.level)
    }
}

/// The root of a network view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootUser {
    /// Backend user id
    pub id: String,
    /// Display name
    pub name: Option<String>,
}

impl RootUser {
    /// Name if known, otherwise the id.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// Root user plus their loaded network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkTree {
    /// The member whose network is shown
    pub root: RootUser,
    /// Level-1 referrals of the root
    pub network: Vec<NetworkNode>,
}

/// Children fetched for one deeper level, grouped by parent id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelBatch {
    /// Level of every child in the batch
    pub level: u32,
    /// Parent id to its children, in display order
    pub children: BTreeMap<String, Vec<NetworkNode>>,
}

impl LevelBatch {
    /// Creates an empty batch for `level`.
    #[must_use]
    pub fn new(level: u32) -> Self {
        Self {
            level,
            children: BTreeMap::new(),
        }
    }

    /// Adds `children` under `parent_id`.
    #[must_use]
    pub fn with_children(mut self, parent_id: impl Into<String>, children: Vec<NetworkNode>) -> Self {
        self.children.entry(parent_id.into()).or_default().extend(children);
        self
    }

    /// Number of nodes in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.children.values().map(Vec::len).sum()
    }

    /// True when the batch holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NetworkTree {
    /// Creates a tree from a root and its level-1 nodes.
    #[must_use]
    pub const fn new(root: RootUser, network: Vec<NetworkNode>) -> Self {
        Self { root, network }
    }

    /// Finds a node anywhere below the root.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&NetworkNode> {
        self.network.iter().find_map(|n| n.find(id))
    }

    /// Mutable variant of [`Self::find`].
    pub fn find_mut(&mut self, id: &str) -> Option<&mut NetworkNode> {
        self.network.iter_mut().find_map(|n| n.find_mut(id))
    }

    /// Number of loaded nodes, root excluded.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.network.iter().map(NetworkNode::count).sum()
    }

    /// Deepest loaded level, 0 for an empty network.
    #[must_use]
    pub fn deepest_level(&self) -> u32 {
        self.network
            .iter()
            .map(NetworkNode::deepest_level)
            .max()
            .unwrap_or(0)
    }

    /// Merges a lazily loaded level into the tree and returns how many nodes were added.
    ///
    /// Children already present under a parent are not duplicated. Batches for a
    /// parent that is not in the tree are ignored.
    pub fn merge_batch(&mut self, batch: LevelBatch) -> usize {
        let mut merged = 0;
        for (parent_id, children) in batch.children {
            let root_id = self.root.id.clone();
            let target = if parent_id == root_id {
                Some(&mut self.network)
            } else {
                self.find_mut(&parent_id).map(|parent| {
                    parent.total_children = parent
                        .total_children
                        .max(u32::try_from(children.len()).unwrap_or(u32::MAX));
                    &mut parent.children
                })
            };

            let Some(target) = target else {
                debug!(parent_id = %parent_id, "Skipping level batch for unknown parent");
                continue;
            };

            for child in children {
                if target.iter().all(|existing| existing.id != child.id) {
                    target.push(child);
                    merged += 1;
                }
            }
        }
        merged
    }
}

#[derive(Debug, Deserialize)]
struct RawNode {
    #[serde(default, deserialize_with = "lenient_id")]
    user_id: Option<String>,
    #[serde(default, rename = "uId", deserialize_with = "lenient_id")]
    uid: Option<String>,
    #[serde(default, rename = "userInfo")]
    user_info: Option<Identity>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    level: Option<u32>,
    #[serde(default, deserialize_with = "lenient_count")]
    total_children: Option<u32>,
    #[serde(default)]
    children: Vec<RawNode>,
}

impl RawNode {
    fn id(&self) -> Option<String> {
        self.user_id
            .clone()
            .or_else(|| self.user_info.as_ref().and_then(|u| u.uid.clone()))
            .or_else(|| self.uid.clone())
    }

    fn name(&self) -> Option<String> {
        self.name
            .clone()
            .or_else(|| self.user_info.as_ref().and_then(|u| u.name.clone()))
    }

    fn into_node(self, depth: u32) -> Option<NetworkNode> {
        let Some(id) = self.id() else {
            debug!("Dropping network node without an id");
            return None;
        };
        let name = self.name();
        let level = self.level.unwrap_or(depth);
        let children: Vec<NetworkNode> = self
            .children
            .into_iter()
            .filter_map(|c| c.into_node(level + 1))
            .collect();
        let loaded = u32::try_from(children.len()).unwrap_or(u32::MAX);

        Some(NetworkNode {
            id,
            name,
            level,
            total_children: self.total_children.unwrap_or(0).max(loaded),
            children,
        })
    }
}

// Variant order matters: derived structs also accept sequences, so the bare
// array has to be tried before the rooted shape.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPayload {
    Bare(Vec<RawNode>),
    Rooted {
        #[serde(rename = "rootUser")]
        root_user: RawNode,
        #[serde(default)]
        network: Vec<RawNode>,
    },
    Wrapped {
        network: Vec<RawNode>,
    },
}

/// Parses a network payload.
///
/// Accepts the current `{rootUser, network}` shape and the older shapes that
/// only carry the network (wrapped in an object or as a bare array); those get an
/// anonymous root. Nodes without an id are dropped together with their subtree.
pub fn parse_network_payload(json: &str) -> Result<NetworkTree> {
    let payload: RawPayload = serde_json::from_str(json)?;
    let (root, network) = match payload {
        RawPayload::Rooted { root_user, network } => {
            let root = RootUser {
                id: root_user
                    .id()
                    .unwrap_or_else(|| ANONYMOUS_ROOT_ID.to_string()),
                name: root_user.name(),
            };
            (root, network)
        }
        RawPayload::Wrapped { network } | RawPayload::Bare(network) => (
            RootUser {
                id: ANONYMOUS_ROOT_ID.to_string(),
                name: None,
            },
            network,
        ),
    };

    Ok(NetworkTree {
        root,
        network: network.into_iter().filter_map(|n| n.into_node(1)).collect(),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn sample_tree() -> NetworkTree {
        let mut alice = NetworkNode::new("alice", Some("Alice".to_string()), 1);
        alice.children.push(NetworkNode::new("carol", None, 2));
        alice.total_children = 1;
        let bob = NetworkNode::new("bob", Some("Bob".to_string()), 1);
        NetworkTree::new(
            RootUser {
                id: "rita".to_string(),
                name: Some("Rita".to_string()),
            },
            vec![alice, bob],
        )
    }

    #[test]
    fn test_parse_rooted_payload() {
        let json = r#"{
            "rootUser": {"user_id": "rita", "name": "Rita"},
            "network": [
                {"user_id": "alice", "name": "Alice", "level": 1, "total_children": 3,
                 "children": [{"userInfo": {"uId": "carol", "name": "Carol"}, "level": 2}]},
                {"userInfo": {"uId": 77, "name": "Bob"}}
            ]
        }"#;

        let tree = parse_network_payload(json).unwrap();
        assert_eq!(tree.root.id, "rita");
        assert_eq!(tree.network.len(), 2);
        let alice = tree.find("alice").unwrap();
        assert_eq!(alice.total_children, 3);
        assert_eq!(alice.children[0].display_name(), "Carol");
        let bob = tree.find("77").unwrap();
        assert_eq!(bob.level, 1);
        assert_eq!(bob.display_name(), "Bob");
    }

    #[test]
    fn test_parse_legacy_payloads() {
        let bare = parse_network_payload(r#"[{"user_id": "a", "children": [{"user_id": "b"}]}]"#)
            .unwrap();
        assert_eq!(bare.root.id, ANONYMOUS_ROOT_ID);
        assert_eq!(bare.find("b").map(|n| n.level), Some(2));
        assert_eq!(bare.find("a").map(|n| n.total_children), Some(1));

        let wrapped = parse_network_payload(r#"{"network": [{"user_id": "a"}]}"#).unwrap();
        assert_eq!(wrapped.node_count(), 1);
    }

    #[test]
    fn test_malformed_counts_degrade_per_node() {
        let json = r#"[
            {"user_id": "a", "level": "1", "total_children": "4"},
            {"user_id": "b", "level": -2, "total_children": "many"}
        ]"#;

        let tree = parse_network_payload(json).unwrap();
        let a = tree.find("a").unwrap();
        assert_eq!((a.level, a.total_children), (1, 4));
        let b = tree.find("b").unwrap();
        assert_eq!((b.level, b.total_children), (1, 0));
    }

    #[test]
    fn test_nodes_without_id_are_dropped() {
        let tree = parse_network_payload(r#"[{"name": "ghost"}, {"user_id": "a"}]"#).unwrap();
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_find_and_counts() {
        let tree = sample_tree();
        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.deepest_level(), 2);
        assert!(tree.find("carol").is_some());
        assert!(tree.find("rita").is_none());
    }

    #[test]
    fn test_merge_batch() {
        let mut tree = sample_tree();
        let batch = LevelBatch::new(3)
            .with_children("carol", vec![NetworkNode::new("dave", None, 3)])
            .with_children("nobody", vec![NetworkNode::new("eve", None, 3)]);

        assert_eq!(tree.merge_batch(batch), 1);
        let carol = tree.find("carol").unwrap();
        assert_eq!(carol.children.len(), 1);
        assert_eq!(carol.total_children, 1);
        assert!(tree.find("eve").is_none());
    }

    #[test]
    fn test_merge_batch_does_not_duplicate() {
        let mut tree = sample_tree();
        let batch = LevelBatch::new(2).with_children(
            "alice",
            vec![NetworkNode::new("carol", None, 2), NetworkNode::new("dan", None, 2)],
        );
        assert_eq!(tree.merge_batch(batch), 1);
        assert_eq!(tree.find("alice").unwrap().children.len(), 2);
    }

    #[test]
    fn test_merge_batch_into_root() {
        let mut tree = sample_tree();
        let batch = LevelBatch::new(1).with_children("rita", vec![NetworkNode::new("zed", None, 1)]);
        assert_eq!(tree.merge_batch(batch), 1);
        assert_eq!(tree.network.len(), 3);
    }
}
