//! Context Tree
//!
//! Arena of context nodes keyed by unit id. Parent/child links are ids, and the
//! size of a node's `children` set acts as its reference count: a node is
//! removed once it has finished and has no live children, and removing it may
//! in turn release its parent.

pub mod node;
pub mod snapshot;

pub use node::{ContextNode, NodeState};
pub use snapshot::{ContextSnapshot, EntrySummary, SnapshotEntry, SnapshotIter};

use crate::config::TreeConfig;
use crate::types::{ContextKey, ContextValue, UnitId};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Tree handle shared between the facade and the lifecycle adapter.
pub type SharedTree = Arc<Mutex<ContextTree>>;

pub struct ContextTree {
    nodes: HashMap<UnitId, ContextNode>,
    config: TreeConfig,
    next_growth_warning: usize,
}

impl Default for ContextTree {
    fn default() -> Self {
        Self::new(TreeConfig::default())
    }
}

impl ContextTree {
    pub fn new(config: TreeConfig) -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(UnitId::ROOT, ContextNode::root());
        ContextTree {
            nodes,
            next_growth_warning: config.leak_warning_threshold,
            config,
        }
    }

    pub fn shared(config: TreeConfig) -> SharedTree {
        Arc::new(Mutex::new(Self::new(config)))
    }

    pub fn root(&self) -> &ContextNode {
        &self.nodes[&UnitId::ROOT]
    }

    pub fn node(&self, id: UnitId) -> Option<&ContextNode> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: UnitId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of tracked nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when only the root is tracked.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Return the node for `id`, creating it as a child of `parent_id` if needed.
    ///
    /// A parent that was never announced is materialized on the spot as a child
    /// of the root. An existing node is returned untouched, whatever parent the
    /// caller names.
    pub fn get_or_create_node(&mut self, id: UnitId, parent_id: UnitId) -> &ContextNode {
        if !self.nodes.contains_key(&id) {
            self.insert_child(id, parent_id);
            self.note_growth();
        }
        &self.nodes[&id]
    }

    fn insert_child(&mut self, id: UnitId, parent_id: UnitId) {
        let parent_id = if parent_id == id {
            UnitId::ROOT
        } else {
            parent_id
        };
        if !self.nodes.contains_key(&parent_id) {
            debug!(unit = %id, parent = %parent_id, "Parent unit not tracked; materializing under root");
            self.insert_child(parent_id, UnitId::ROOT);
        }
        if let Some(parent) = self.nodes.get_mut(&parent_id) {
            parent.children.insert(id);
            let node = ContextNode::child_of(id, parent);
            trace!(unit = %id, parent = %parent_id, merge = node.merge, "Context node created");
            self.nodes.insert(id, node);
        }
    }

    fn note_growth(&mut self) {
        let threshold = self.config.leak_warning_threshold;
        if threshold == 0 || self.nodes.len() < self.next_growth_warning {
            return;
        }
        warn!(
            tracked = self.nodes.len(),
            "Context tree keeps growing; units of work may be finishing without notification"
        );
        self.next_growth_warning = self.nodes.len() + threshold;
    }

    /// Switch `id` into merge mode. Nodes created from it afterwards alias its
    /// store. The root never merges.
    pub fn enable_merge(&mut self, id: UnitId) -> bool {
        if id.is_root() {
            debug!("Merge requested while no unit is active; root context stays private");
            return false;
        }
        match self.nodes.get_mut(&id) {
            Some(node) => {
                if !node.merge {
                    node.merge = true;
                    debug!(unit = %id, "Merge mode enabled");
                }
                true
            }
            None => false,
        }
    }

    /// Mark `id` finished and remove every node that becomes eligible.
    ///
    /// Returns the number of nodes removed. Unknown ids and repeated calls are
    /// no-ops.
    pub fn reclaim(&mut self, id: UnitId) -> usize {
        if id.is_root() {
            return 0;
        }
        match self.nodes.get_mut(&id) {
            Some(node) => {
                if node.finished {
                    trace!(unit = %id, "Duplicate finish notification");
                }
                node.finished = true;
            }
            None => {
                trace!(unit = %id, "Finish notification for untracked unit ignored");
                return 0;
            }
        }

        let mut reclaimed = 0;
        let mut cursor = id;
        while self
            .nodes
            .get(&cursor)
            .map_or(false, ContextNode::is_reclaimable)
        {
            let Some(node) = self.nodes.remove(&cursor) else {
                break;
            };
            reclaimed += 1;
            if let Some(parent) = self.nodes.get_mut(&node.parent_id) {
                parent.children.remove(&cursor);
            }
            cursor = node.parent_id;
        }

        if reclaimed > 0 {
            debug!(unit = %id, reclaimed, "Context nodes reclaimed");
        }
        reclaimed
    }

    /// Hold `id` alive with a placeholder child until the returned id is
    /// reclaimed.
    ///
    /// Returns `None` for the root and for ids that are not tracked; a
    /// reclaimed node is never brought back.
    pub(crate) fn pin(&mut self, id: UnitId) -> Option<UnitId> {
        if id.is_root() {
            return None;
        }
        let target = self.nodes.get_mut(&id)?;
        let pin = UnitId::issue();
        target.children.insert(pin);
        let placeholder = ContextNode::placeholder(pin, target);
        self.nodes.insert(pin, placeholder);
        Some(pin)
    }

    /// Walk from `id` up to and including the root.
    pub fn ancestors(&self, id: UnitId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: Some(id),
        }
    }

    /// First value for `key` along the ancestor chain of `id`.
    pub fn resolve(&self, id: UnitId, key: &ContextKey) -> Option<ContextValue> {
        self.ancestors(id).find_map(|node| node.store.get(key))
    }

    pub fn is_visible(&self, id: UnitId, key: &ContextKey) -> bool {
        self.ancestors(id).any(|node| node.store.contains(key))
    }

    /// Every key visible from `id`, each once, nearest definitions first.
    pub fn visible_keys(&self, id: UnitId) -> Vec<ContextKey> {
        let mut seen = HashSet::new();
        let mut keys = Vec::new();
        for node in self.ancestors(id) {
            for key in node.store.keys() {
                if seen.insert(key.clone()) {
                    keys.push(key);
                }
            }
        }
        keys
    }

    /// Lazily computed diagnostic view from `id` to the root.
    pub fn snapshot(&self, id: UnitId) -> impl Iterator<Item = SnapshotEntry> + '_ {
        self.ancestors(id).map(SnapshotEntry::from_node)
    }

    /// Drop every node and start over with an empty root.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.nodes.insert(UnitId::ROOT, ContextNode::root());
        self.next_growth_warning = self.config.leak_warning_threshold;
    }
}

/// Iterator over a node and its ancestors, ending at the root.
pub struct Ancestors<'a> {
    tree: &'a ContextTree,
    next: Option<UnitId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a ContextNode;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next.take()?;
        let node = self.tree.nodes.get(&id)?;
        if !id.is_root() {
            self.next = Some(node.parent_id);
        }
        Some(node)
    }
}
