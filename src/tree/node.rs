//! Context node: one unit of work's store plus its tree linkage.

use crate::store::Store;
use crate::types::UnitId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Lifecycle state of a node still present in the tree.
///
/// A reclaimed node has no state: it is simply gone from the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    Created,
    /// Finished, but descendants are still live.
    PendingReclaim,
}

#[derive(Debug, Clone)]
pub struct ContextNode {
    pub(crate) id: UnitId,
    pub(crate) parent_id: UnitId,
    pub(crate) store: Store,
    pub(crate) children: HashSet<UnitId>,
    pub(crate) merge: bool,
    pub(crate) finished: bool,
    pub(crate) created_at: DateTime<Utc>,
}

impl ContextNode {
    pub(crate) fn root() -> Self {
        ContextNode {
            id: UnitId::ROOT,
            parent_id: UnitId::ROOT,
            store: Store::new(),
            children: HashSet::new(),
            merge: false,
            finished: false,
            created_at: Utc::now(),
        }
    }

    /// Build a child of `parent`: aliases the parent's store in merge mode,
    /// otherwise takes an independent copy of it.
    pub(crate) fn child_of(id: UnitId, parent: &ContextNode) -> Self {
        let store = if parent.merge {
            parent.store.share()
        } else {
            parent.store.fork()
        };
        ContextNode {
            id,
            parent_id: parent.id,
            store,
            children: HashSet::new(),
            merge: parent.merge,
            finished: false,
            created_at: Utc::now(),
        }
    }

    /// Finished child that shares `parent`'s store and only exists to keep
    /// `parent` from being reclaimed.
    pub(crate) fn placeholder(id: UnitId, parent: &ContextNode) -> Self {
        ContextNode {
            id,
            parent_id: parent.id,
            store: parent.store.share(),
            children: HashSet::new(),
            merge: parent.merge,
            finished: true,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn parent_id(&self) -> UnitId {
        self.parent_id
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn children(&self) -> &HashSet<UnitId> {
        &self.children
    }

    pub fn is_merged(&self) -> bool {
        self.merge
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn state(&self) -> NodeState {
        if self.finished {
            NodeState::PendingReclaim
        } else {
            NodeState::Created
        }
    }

    pub(crate) fn is_reclaimable(&self) -> bool {
        !self.id.is_root() && self.finished && self.children.is_empty()
    }
}
