//! Lifecycle Adapter
//!
//! Turns host notifications into context tree operations.

use crate::host::{scope, LifecycleHooks};
use crate::tree::SharedTree;
use crate::types::UnitId;

#[derive(Clone)]
pub struct LifecycleAdapter {
    tree: SharedTree,
}

impl LifecycleAdapter {
    pub fn new(tree: SharedTree) -> Self {
        LifecycleAdapter { tree }
    }

    pub fn current_unit_id(&self) -> UnitId {
        scope::current_unit_id()
    }

    pub fn current_trigger_id(&self) -> UnitId {
        scope::current_trigger_id()
    }
}

impl LifecycleHooks for LifecycleAdapter {
    fn on_unit_created(&self, id: UnitId, trigger_id: UnitId) {
        self.tree.lock().get_or_create_node(id, trigger_id);
    }

    // Some work only becomes visible when it first runs (recurring timers,
    // work queued before the hooks were attached).
    fn on_unit_about_to_run(&self, id: UnitId) {
        let trigger = if scope::current_unit_id() == id {
            scope::current_trigger_id()
        } else {
            UnitId::ROOT
        };
        self.tree.lock().get_or_create_node(id, trigger);
    }

    fn on_unit_finished(&self, id: UnitId) {
        self.tree.lock().reclaim(id);
    }
}
