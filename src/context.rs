//! Context Facade
//!
//! Key/value access to the context of whichever unit of work is executing.
//! Reads walk from the current node up to the root; writes and deletes only
//! ever touch the current node's own store.

use crate::config::{ContextConfig, TreeConfig};
use crate::error::ContextError;
use crate::host::{scope, HookId, HookRegistry};
use crate::lifecycle::LifecycleAdapter;
use crate::tree::{ContextSnapshot, ContextTree, SharedTree};
use crate::types::{ContextKey, ContextValue, UnitId};
use parking_lot::Mutex;
use std::any::Any;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

static GLOBAL_MANAGER: OnceLock<ContextManager> = OnceLock::new();

pub struct ContextManager {
    tree: SharedTree,
    attachment: Mutex<Option<Attachment>>,
}

impl std::fmt::Debug for ContextManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextManager").finish_non_exhaustive()
    }
}

struct Attachment {
    registry: HookRegistry,
    hook: HookId,
}

/// Materialize the executing unit's node and return its id.
fn current_unit(tree: &mut ContextTree) -> UnitId {
    let frame = scope::current();
    tree.get_or_create_node(frame.unit, frame.trigger);
    frame.unit
}

impl ContextManager {
    /// A manager that receives no lifecycle notifications until attached.
    pub fn new(config: TreeConfig) -> Self {
        ContextManager {
            tree: ContextTree::shared(config),
            attachment: Mutex::new(None),
        }
    }

    pub fn attached(config: TreeConfig, registry: &HookRegistry) -> Self {
        let manager = Self::new(config);
        manager.attach(registry);
        manager
    }

    /// Process-wide manager, attached to [`HookRegistry::global`].
    pub fn global() -> &'static ContextManager {
        GLOBAL_MANAGER
            .get_or_init(|| ContextManager::attached(TreeConfig::default(), HookRegistry::global()))
    }

    /// Initialize the process-wide manager from configuration.
    ///
    /// Fails if it already exists, including implicitly through [`global`](Self::global).
    pub fn init_global(config: &ContextConfig) -> Result<&'static ContextManager, ContextError> {
        let mut created = false;
        let manager = GLOBAL_MANAGER.get_or_init(|| {
            created = true;
            ContextManager::attached(config.tree.clone(), HookRegistry::global())
        });
        if !created {
            return Err(ContextError::AlreadyInitialized);
        }
        info!(
            leak_warning_threshold = config.tree.leak_warning_threshold,
            "Global context manager initialized"
        );
        Ok(manager)
    }

    /// Start receiving lifecycle notifications from `registry`, replacing any
    /// previous attachment.
    pub fn attach(&self, registry: &HookRegistry) {
        let mut attachment = self.attachment.lock();
        if let Some(previous) = attachment.take() {
            previous.registry.unregister(previous.hook);
        }
        let hook = registry.register(Arc::new(LifecycleAdapter::new(self.tree.clone())));
        *attachment = Some(Attachment {
            registry: registry.clone(),
            hook,
        });
    }

    /// Stop receiving lifecycle notifications. Returns false if not attached.
    pub fn detach(&self) -> bool {
        match self.attachment.lock().take() {
            Some(attachment) => attachment.registry.unregister(attachment.hook),
            None => false,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attachment.lock().is_some()
    }

    /// Adapter a custom host can drive directly instead of attaching.
    pub fn lifecycle_adapter(&self) -> LifecycleAdapter {
        LifecycleAdapter::new(self.tree.clone())
    }

    /// Forget every node and start over with an empty root.
    pub fn reset(&self) {
        self.tree.lock().clear();
        debug!("Context tree reset");
    }

    /// Detach and reset.
    pub fn teardown(&self) {
        self.detach();
        self.reset();
    }

    pub fn tree(&self) -> SharedTree {
        self.tree.clone()
    }

    /// Number of tracked nodes, root included.
    pub fn tree_len(&self) -> usize {
        self.tree.lock().len()
    }

    pub fn contains_unit(&self, id: UnitId) -> bool {
        self.tree.lock().contains(id)
    }

    fn with_current<R>(&self, f: impl FnOnce(&mut ContextTree, UnitId) -> R) -> R {
        let mut tree = self.tree.lock();
        let unit = current_unit(&mut tree);
        f(&mut tree, unit)
    }

    /// Nearest value for `key`, or `None` if no node up to the root holds it.
    pub fn get(&self, key: impl Into<ContextKey>) -> Option<ContextValue> {
        let key = key.into();
        self.with_current(|tree, unit| tree.resolve(unit, &key))
    }

    /// Typed read. `Ok(None)` when absent; an error when the value has
    /// another type.
    pub fn get_as<T: Any + Clone>(&self, key: impl Into<ContextKey>) -> Result<Option<T>, ContextError> {
        let key = key.into();
        match self.get(&key) {
            None => Ok(None),
            Some(value) => match value.downcast_ref::<T>() {
                Some(typed) => Ok(Some(typed.clone())),
                None => Err(ContextError::TypeMismatch {
                    key: key.to_string(),
                    expected: std::any::type_name::<T>(),
                    actual: value.type_name(),
                }),
            },
        }
    }

    pub fn set<T: Any + Send + Sync>(&self, key: impl Into<ContextKey>, value: T) {
        self.set_value(key, ContextValue::new(value));
    }

    /// Store an already wrapped value without wrapping it again.
    pub fn set_value(&self, key: impl Into<ContextKey>, value: ContextValue) {
        let key = key.into();
        self.with_current(|tree, unit| {
            if let Some(node) = tree.node(unit) {
                node.store().insert(key, value);
            }
        });
    }

    pub fn has(&self, key: impl Into<ContextKey>) -> bool {
        let key = key.into();
        self.with_current(|tree, unit| tree.is_visible(unit, &key))
    }

    /// Remove `key` from the current node only. An ancestor's definition, if
    /// any, becomes visible again.
    pub fn delete(&self, key: impl Into<ContextKey>) -> bool {
        let key = key.into();
        self.with_current(|tree, unit| {
            tree.node(unit)
                .map_or(false, |node| node.store().remove(&key))
        })
    }

    /// Every visible key, each once.
    pub fn keys(&self) -> Vec<ContextKey> {
        self.with_current(|tree, unit| tree.visible_keys(unit))
    }

    /// The executing unit, for use with [`rebind`](Self::rebind).
    pub fn capture(&self) -> UnitId {
        self.with_current(|_, unit| unit)
    }

    /// Share the current node's store with every unit it creates from now on.
    ///
    /// Returns false when no unit is active: the root never shares.
    pub fn begin_sharing(&self) -> bool {
        self.with_current(|tree, unit| tree.enable_merge(unit))
    }

    pub fn is_merged(&self) -> bool {
        self.with_current(|tree, unit| tree.node(unit).map_or(false, |node| node.is_merged()))
    }

    /// Wrap an entry point so that each invocation puts the unit running it
    /// into merge mode before calling `f`. Everything `f` spawns then reads
    /// and writes that unit's store.
    pub fn begin_entry_point<A, R, F>(&self, mut f: F) -> impl FnMut(A) -> R + Send + 'static
    where
        F: FnMut(A) -> R + Send + 'static,
    {
        let tree = self.tree.clone();
        move |arg| {
            {
                let mut tree = tree.lock();
                let unit = current_unit(&mut tree);
                tree.enable_merge(unit);
            }
            f(arg)
        }
    }

    /// Wrap `f` so it always runs as `captured`, whoever invokes it.
    ///
    /// The captured node is kept alive for as long as the wrapper exists. A
    /// unit that was already reclaimed cannot be restored; the wrapper then
    /// runs `f` against the root context.
    pub fn rebind<A, R, F>(&self, mut f: F, captured: UnitId) -> impl FnMut(A) -> R + Send + 'static
    where
        F: FnMut(A) -> R + Send + 'static,
    {
        let tree = self.tree.clone();
        let (frame, retain) = {
            let mut guard = tree.lock();
            match guard.pin(captured) {
                Some(pin) => {
                    let trigger = guard
                        .node(captured)
                        .map_or(UnitId::ROOT, |node| node.parent_id());
                    let retain = RetainGuard {
                        tree: tree.clone(),
                        pin,
                    };
                    ((captured, trigger), Some(retain))
                }
                None => {
                    if !captured.is_root() {
                        debug!(unit = %captured, "Rebind target no longer tracked; using root context");
                    }
                    ((UnitId::ROOT, UnitId::ROOT), None)
                }
            }
        };
        move |arg| {
            let _retain = &retain;
            scope::enter(frame.0, frame.1, || f(arg))
        }
    }

    /// Diagnostic chain from the current node up to the root.
    pub fn snapshot(&self) -> ContextSnapshot {
        let unit = self.capture();
        ContextSnapshot::new(self.tree.clone(), unit)
    }
}

impl Drop for ContextManager {
    fn drop(&mut self) {
        self.detach();
    }
}

struct RetainGuard {
    tree: SharedTree,
    pin: UnitId,
}

impl Drop for RetainGuard {
    fn drop(&mut self) {
        self.tree.lock().reclaim(self.pin);
    }
}
