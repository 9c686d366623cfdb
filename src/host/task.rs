//! Tokio integration: futures as units of work.

use crate::host::HookRegistry;
use crate::types::UnitId;
use futures::FutureExt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::task::JoinHandle;

/// A future running as its own unit of work.
///
/// Every poll runs inside the unit's frame. The unit finishes when the future
/// completes, or when it is dropped unfinished since it can never run again.
pub struct Tracked<F> {
    unit: UnitId,
    registry: HookRegistry,
    future: Pin<Box<F>>,
    finished: bool,
}

impl<F> Tracked<F> {
    pub fn unit(&self) -> UnitId {
        self.unit
    }
}

impl<F: Future> Future for Tracked<F> {
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<F::Output> {
        let Tracked {
            unit,
            registry,
            future,
            finished,
        } = self.get_mut();

        let poll = registry.enter_unit(*unit, || future.poll_unpin(cx));
        if poll.is_ready() && !*finished {
            *finished = true;
            registry.finish_unit(*unit);
        }
        poll
    }
}

impl<F> Drop for Tracked<F> {
    fn drop(&mut self) {
        if !self.finished {
            self.finished = true;
            self.registry.finish_unit(self.unit);
        }
    }
}

impl HookRegistry {
    /// Declare `future` as a unit triggered by the executing one.
    ///
    /// The unit is created now, not at first poll, so work declared inside a
    /// merge scope joins that scope even if it runs later.
    pub fn instrument<F: Future>(&self, future: F) -> Tracked<F> {
        Tracked {
            unit: self.create_unit(),
            registry: self.clone(),
            future: Box::pin(future),
            finished: false,
        }
    }

    /// `tokio::spawn` the future as a tracked unit.
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        tokio::spawn(self.instrument(future))
    }
}
