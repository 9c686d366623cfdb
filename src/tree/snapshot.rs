//! Read-only diagnostic view of an ancestor chain.

use crate::error::ContextError;
use crate::tree::node::{ContextNode, NodeState};
use crate::tree::SharedTree;
use crate::types::{ContextKey, ContextValue, UnitId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// One node of the chain, copied out of the tree.
#[derive(Debug, Clone)]
pub struct SnapshotEntry {
    pub id: UnitId,
    pub parent_id: UnitId,
    pub merge: bool,
    pub state: NodeState,
    pub created_at: DateTime<Utc>,
    pub values: HashMap<ContextKey, ContextValue>,
}

impl SnapshotEntry {
    pub(crate) fn from_node(node: &ContextNode) -> Self {
        SnapshotEntry {
            id: node.id(),
            parent_id: node.parent_id(),
            merge: node.is_merged(),
            state: node.state(),
            created_at: node.created_at(),
            values: node.store().entries(),
        }
    }

    pub fn summary(&self) -> EntrySummary {
        EntrySummary {
            id: self.id,
            parent_id: self.parent_id,
            merge: self.merge,
            state: self.state,
            created_at: self.created_at,
            values: self
                .values
                .iter()
                .map(|(key, value)| (key.to_string(), value.type_name()))
                .collect(),
        }
    }
}

/// Serializable form of a [`SnapshotEntry`]; values are shown by type name.
#[derive(Debug, Clone, Serialize)]
pub struct EntrySummary {
    pub id: UnitId,
    pub parent_id: UnitId,
    pub merge: bool,
    pub state: NodeState,
    pub created_at: DateTime<Utc>,
    pub values: BTreeMap<String, &'static str>,
}

/// Chain from one unit up to the root.
///
/// Nothing is copied until iteration, and every call to [`iter`](Self::iter)
/// starts again from the first unit. Each step holds the tree lock only while
/// reading one node, so a node reclaimed mid-walk simply ends the sequence.
#[derive(Clone)]
pub struct ContextSnapshot {
    tree: SharedTree,
    start: UnitId,
}

impl ContextSnapshot {
    pub(crate) fn new(tree: SharedTree, start: UnitId) -> Self {
        ContextSnapshot { tree, start }
    }

    pub fn start(&self) -> UnitId {
        self.start
    }

    pub fn iter(&self) -> SnapshotIter {
        SnapshotIter {
            tree: self.tree.clone(),
            next: Some(self.start),
        }
    }

    /// Render the chain as pretty JSON.
    pub fn to_json(&self) -> Result<String, ContextError> {
        let summaries: Vec<EntrySummary> = self.iter().map(|entry| entry.summary()).collect();
        Ok(serde_json::to_string_pretty(&summaries)?)
    }
}

impl<'a> IntoIterator for &'a ContextSnapshot {
    type Item = SnapshotEntry;
    type IntoIter = SnapshotIter;

    fn into_iter(self) -> SnapshotIter {
        self.iter()
    }
}

pub struct SnapshotIter {
    tree: SharedTree,
    next: Option<UnitId>,
}

impl Iterator for SnapshotIter {
    type Item = SnapshotEntry;

    fn next(&mut self) -> Option<SnapshotEntry> {
        let id = self.next.take()?;
        let tree = self.tree.lock();
        let node = tree.node(id)?;
        if !id.is_root() {
            self.next = Some(node.parent_id());
        }
        Some(SnapshotEntry::from_node(node))
    }
}
