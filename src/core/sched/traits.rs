//! The pluggable scheduler interface (components G/H, spec §4.G/§4.H).
//!
//! Every scheduling algorithm the kernel can run implements this trait over
//! the shared [`NodePool`](crate::core::pool::NodePool) arena. The trait is
//! object-safe, which the registry (`core::sched::registry`) relies on to
//! hand out `&mut dyn Scheduler` to callers that only need to drive the
//! active algorithm generically; the registry itself stores concrete,
//! `Sized` algorithms in a closed enum rather than trait objects, to avoid
//! needing a heap allocator for ownership (spec Non-goals: no heap). This
//! generalizes the reference's single hardcoded `core::sched` module into
//! spec §4.G's vtable contract.

use crate::core::error::KernelResult;
use crate::core::pool::NodePool;
use crate::core::types::{Priority, ScheduleReason, SchedulerKind, TaskId, Tick};

/// A schedulable algorithm. Implementors own whatever queue shape suits
/// their ordering (priority buckets, a FIFO ring, a deadline-sorted list)
/// but all manipulate tasks only through the shared node pool.
pub trait Scheduler {
    /// Which algorithm family this is (spec §3 "Scheduler descriptor").
    fn kind(&self) -> SchedulerKind;

    /// Reset to the empty state.
    fn init(&mut self);

    /// Release any resources held (node pool entries) back to the pool.
    fn deinit(&mut self, pool: &mut NodePool);

    /// Make `task` eligible to run at `priority`, effective from `now`.
    fn enqueue(&mut self, pool: &mut NodePool, task: TaskId, priority: Priority, now: Tick) -> KernelResult<()>;

    /// Remove `task` from eligibility (it blocked, suspended, or exited).
    fn dequeue(&mut self, pool: &mut NodePool, task: TaskId) -> KernelResult<()>;

    /// Choose the task that should run next, without removing it.
    fn select_next(&mut self, pool: &mut NodePool) -> Option<TaskId>;

    /// Move `task` to the back of its eligibility class (round-robin
    /// rotation, or a fresh deadline/period admission). Default
    /// implementation is dequeue-then-enqueue; schedulers with cheaper
    /// native rotation override it.
    fn requeue(&mut self, pool: &mut NodePool, task: TaskId, priority: Priority, now: Tick) -> KernelResult<()> {
        self.dequeue(pool, task)?;
        self.enqueue(pool, task, priority, now)
    }

    /// Voluntarily give up the CPU: move `task` to the back of its own
    /// eligibility class so an equal-or-lower priority peer gets a turn
    /// (spec §4.G vtable `yield`). Default implementation is `requeue` at
    /// the task's unchanged priority; schedulers with bespoke rotation
    /// bookkeeping may override it.
    fn yield_task(&mut self, pool: &mut NodePool, task: TaskId, priority: Priority, now: Tick) -> KernelResult<()> {
        self.requeue(pool, task, priority, now)
    }

    /// Number of tasks currently eligible.
    fn count(&self) -> u32;

    fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Whether `reason` should provoke an immediate reschedule under this
    /// algorithm (e.g. round-robin reschedules on `Tick` when the current
    /// task's slice has expired; priority scheduling reschedules on any
    /// reason that could change the head of the queue).
    fn need_reschedule(&self, reason: ScheduleReason) -> bool;

    /// Optional: change a queued task's priority in place. Default is
    /// unsupported (`Ok(())` no-op), overridden by priority-aware
    /// schedulers.
    fn change_priority(
        &mut self,
        _pool: &mut NodePool,
        _task: TaskId,
        _old: Priority,
        _new: Priority,
        _now: Tick,
    ) -> KernelResult<()> {
        Ok(())
    }

    /// Optional: the effective priority this scheduler is currently using
    /// for `task`, if it tracks one.
    fn get_effective_priority(&self, _task: TaskId) -> Option<Priority> {
        None
    }
}
