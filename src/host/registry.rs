//! Hook registry: fan-out of lifecycle notifications.

use crate::host::{scope, LifecycleHooks};
use crate::types::UnitId;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::trace;

static NEXT_HOOK_ID: AtomicU64 = AtomicU64::new(1);
static GLOBAL_REGISTRY: OnceLock<HookRegistry> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookId(u64);

/// Dispatches lifecycle notifications to every registered hook set.
///
/// Cloning is cheap; clones share registrations. Besides dispatching, the
/// registry issues unit ids and remembers each live unit's trigger so it can
/// restore the right frame when the unit runs.
#[derive(Clone, Default)]
pub struct HookRegistry {
    inner: Arc<RegistryInner>,
}

#[derive(Default)]
struct RegistryInner {
    hooks: RwLock<Vec<(HookId, Arc<dyn LifecycleHooks>)>>,
    triggers: Mutex<HashMap<UnitId, UnitId>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry.
    pub fn global() -> &'static HookRegistry {
        GLOBAL_REGISTRY.get_or_init(HookRegistry::new)
    }

    pub fn register(&self, hooks: Arc<dyn LifecycleHooks>) -> HookId {
        let id = HookId(NEXT_HOOK_ID.fetch_add(1, Ordering::Relaxed));
        self.inner.hooks.write().push((id, hooks));
        id
    }

    /// Returns false if `id` was not registered.
    pub fn unregister(&self, id: HookId) -> bool {
        let mut hooks = self.inner.hooks.write();
        let before = hooks.len();
        hooks.retain(|(hook_id, _)| *hook_id != id);
        hooks.len() != before
    }

    pub fn hook_count(&self) -> usize {
        self.inner.hooks.read().len()
    }

    /// Units created but not yet finished.
    pub fn live_units(&self) -> usize {
        self.inner.triggers.lock().len()
    }

    // Snapshot of the listeners so no lock is held while hooks run.
    fn listeners(&self) -> Vec<Arc<dyn LifecycleHooks>> {
        self.inner
            .hooks
            .read()
            .iter()
            .map(|(_, hooks)| hooks.clone())
            .collect()
    }

    /// Declare a new unit triggered by the executing one.
    pub fn create_unit(&self) -> UnitId {
        self.create_unit_with_trigger(scope::current_unit_id())
    }

    pub fn create_unit_with_trigger(&self, trigger: UnitId) -> UnitId {
        let id = UnitId::issue();
        self.inner.triggers.lock().insert(id, trigger);
        trace!(unit = %id, trigger = %trigger, "Unit created");
        for hooks in self.listeners() {
            hooks.on_unit_created(id, trigger);
        }
        id
    }

    /// Trigger recorded for a live unit; the root for unknown ones.
    pub fn trigger_of(&self, id: UnitId) -> UnitId {
        self.inner
            .triggers
            .lock()
            .get(&id)
            .copied()
            .unwrap_or(UnitId::ROOT)
    }

    /// Run `f` as `id`. May be called any number of times before the unit
    /// finishes.
    pub fn enter_unit<R>(&self, id: UnitId, f: impl FnOnce() -> R) -> R {
        let trigger = self.trigger_of(id);
        scope::enter(id, trigger, || {
            for hooks in self.listeners() {
                hooks.on_unit_about_to_run(id);
            }
            f()
        })
    }

    pub fn finish_unit(&self, id: UnitId) {
        self.inner.triggers.lock().remove(&id);
        trace!(unit = %id, "Unit finished");
        for hooks in self.listeners() {
            hooks.on_unit_finished(id);
        }
    }

    /// Run `f` synchronously as a fresh child of the executing unit.
    pub fn run_unit<R>(&self, f: impl FnOnce() -> R) -> R {
        let id = self.create_unit();
        let _finish = FinishOnDrop { registry: self, id };
        self.enter_unit(id, f)
    }
}

struct FinishOnDrop<'a> {
    registry: &'a HookRegistry,
    id: UnitId,
}

impl Drop for FinishOnDrop<'_> {
    fn drop(&mut self) {
        self.registry.finish_unit(self.id);
    }
}
