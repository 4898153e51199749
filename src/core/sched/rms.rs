//! Rate-Monotonic scheduler (spec §4.G, feature `rms`).
//!
//! Rate-monotonic is fixed-priority scheduling where the priority ordering
//! happens to come from task periods (shorter period, higher priority);
//! computing that mapping is the admission layer's job, not the
//! scheduler's. This adapter is therefore a thin wrapper over
//! [`PriorityScheduler`] that exists so `SchedulerKind::Rms` has its own
//! registry-visible identity and statistics, per spec §3's scheduler
//! descriptor having one slot per registered kind.

use crate::core::error::KernelResult;
use crate::core::pool::NodePool;
use crate::core::types::{Priority, ScheduleReason, SchedulerKind, TaskId, Tick};

use super::priority::PriorityScheduler;
use super::traits::Scheduler;

pub struct RmsScheduler {
    inner: PriorityScheduler,
}

impl RmsScheduler {
    pub const fn new() -> Self {
        Self {
            inner: PriorityScheduler::new(),
        }
    }

    /// Derive a static priority from a task's period, per rate-monotonic
    /// theory: shorter period implies higher urgency. `period_ticks` must
    /// be non-zero; callers own admission-time schedulability analysis.
    pub fn priority_for_period(period_ticks: Tick) -> Priority {
        if period_ticks == 0 {
            return Priority::MAX;
        }
        // Map period inversely onto the 0..=255 priority range: a period at
        // or beyond the range floors to priority 0, shorter periods get
        // proportionally higher priority.
        let clamped = period_ticks.min(Priority::MAX as Tick);
        (Priority::MAX as Tick - clamped) as Priority
    }
}

impl Default for RmsScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for RmsScheduler {
    fn kind(&self) -> SchedulerKind {
        SchedulerKind::Rms
    }

    fn init(&mut self) {
        self.inner.init();
    }

    fn deinit(&mut self, pool: &mut NodePool) {
        self.inner.deinit(pool);
    }

    fn enqueue(&mut self, pool: &mut NodePool, task: TaskId, priority: Priority, now: Tick) -> KernelResult<()> {
        self.inner.enqueue(pool, task, priority, now)
    }

    fn dequeue(&mut self, pool: &mut NodePool, task: TaskId) -> KernelResult<()> {
        self.inner.dequeue(pool, task)
    }

    fn select_next(&mut self, pool: &mut NodePool) -> Option<TaskId> {
        self.inner.select_next(pool)
    }

    fn count(&self) -> u32 {
        self.inner.count()
    }

    fn need_reschedule(&self, reason: ScheduleReason) -> bool {
        self.inner.need_reschedule(reason)
    }

    fn change_priority(
        &mut self,
        pool: &mut NodePool,
        task: TaskId,
        old: Priority,
        new: Priority,
        now: Tick,
    ) -> KernelResult<()> {
        self.inner.change_priority(pool, task, old, new, now)
    }

    fn get_effective_priority(&self, task: TaskId) -> Option<Priority> {
        self.inner.get_effective_priority(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorter_period_yields_higher_priority() {
        let fast = RmsScheduler::priority_for_period(10);
        let slow = RmsScheduler::priority_for_period(200);
        assert!(fast > slow);
    }
}
