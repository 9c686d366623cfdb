//! Host Runtime Integration
//!
//! The host runtime announces units of work through [`LifecycleHooks`] and
//! tracks which unit is executing through [`scope`]. [`HookRegistry`] is the
//! dispatcher between the two and also serves as a small host of its own for
//! synchronous callbacks and tokio futures.

pub mod registry;
pub mod scope;
pub mod task;

pub use registry::{HookId, HookRegistry};
pub use scope::{current_trigger_id, current_unit_id, Frame};
pub use task::Tracked;

use crate::types::UnitId;

/// Notifications a host runtime delivers for each unit of work.
///
/// `on_unit_created` always precedes any other notification for the same id.
/// Hosts may repeat `on_unit_about_to_run` and `on_unit_finished`; receivers
/// must tolerate both.
pub trait LifecycleHooks: Send + Sync {
    fn on_unit_created(&self, id: UnitId, trigger_id: UnitId);

    fn on_unit_about_to_run(&self, _id: UnitId) {}

    fn on_unit_finished(&self, id: UnitId);
}
