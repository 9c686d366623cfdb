//! Which unit of work is executing on this thread right now.

use crate::types::UnitId;
use std::cell::Cell;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub unit: UnitId,
    pub trigger: UnitId,
}

impl Frame {
    pub const ROOT: Frame = Frame {
        unit: UnitId::ROOT,
        trigger: UnitId::ROOT,
    };
}

thread_local! {
    static CURRENT: Cell<Frame> = const { Cell::new(Frame::ROOT) };
}

pub fn current() -> Frame {
    CURRENT.with(Cell::get)
}

/// Executing unit, or `UnitId::ROOT` when none is active.
pub fn current_unit_id() -> UnitId {
    current().unit
}

/// Unit that scheduled the executing one, or `UnitId::ROOT`.
pub fn current_trigger_id() -> UnitId {
    current().trigger
}

/// Run `f` with `unit` as the current unit, restoring the previous frame
/// afterwards, even if `f` panics.
pub fn enter<R>(unit: UnitId, trigger: UnitId, f: impl FnOnce() -> R) -> R {
    let _guard = FrameGuard::install(Frame { unit, trigger });
    f()
}

struct FrameGuard {
    previous: Frame,
}

impl FrameGuard {
    fn install(frame: Frame) -> Self {
        let previous = CURRENT.with(|current| current.replace(frame));
        FrameGuard { previous }
    }
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        CURRENT.with(|current| current.set(self.previous));
    }
}
