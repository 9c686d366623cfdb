//! Ambient Context: Implicit Context Propagation
//!
//! Every unit of work (a spawned task, a callback, a timer) gets a key/value
//! context inherited from the unit that scheduled it, without passing a context
//! value through function signatures. By default a unit sees a private copy of
//! its parent's context; an entry point can switch into merge mode so that all
//! the work it spawns shares one store with it.
//!
//! ```no_run
//! use ambient_ctx::{ContextManager, HookRegistry};
//!
//! # async fn demo() {
//! let ctx = ContextManager::global();
//! let hooks = HookRegistry::global();
//! ctx.set("app", "svc1");
//!
//! hooks
//!     .spawn(async move {
//!         ctx.begin_sharing();
//!         hooks
//!             .spawn(async move { ctx.set("ip", "1.2.3.4") })
//!             .await
//!             .unwrap();
//!         assert!(ctx.has("ip"));
//!     })
//!     .await
//!     .unwrap();
//! # }
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod host;
pub mod lifecycle;
pub mod logging;
pub mod store;
pub mod tree;
pub mod types;

pub use config::{ContextConfig, TreeConfig};
pub use context::ContextManager;
pub use error::ContextError;
pub use host::{HookRegistry, LifecycleHooks, Tracked};
pub use lifecycle::LifecycleAdapter;
pub use tree::{ContextSnapshot, ContextTree, SnapshotEntry};
pub use types::{ContextKey, ContextValue, KeyToken, UnitId};

/// Shorthand for [`ContextManager::global`].
pub fn context() -> &'static ContextManager {
    ContextManager::global()
}
