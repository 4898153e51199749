//! Round-robin scheduler (spec §4.G alternate algorithm).
//!
//! All ready tasks share a single FIFO ring (reusing
//! [`PriorityList`](crate::core::queue::PriorityList) at priority level
//! zero, ignoring any priority a caller passes in); the task at the head
//! runs until its time slice expires or it blocks, then rotates to the
//! tail.

use crate::core::config::CFG_TIME_SLICE_DEFAULT;
use crate::core::error::{KernelError, KernelResult};
use crate::core::pool::{NodeHandle, NodePool};
use crate::core::queue::PriorityList;
use crate::core::types::{Priority, ScheduleReason, SchedulerKind, TaskId, Tick};

use super::traits::Scheduler;

pub struct RoundRobinScheduler {
    ring: PriorityList,
    handles: [Option<NodeHandle>; crate::core::config::CFG_MAX_TASKS],
    slice_remaining: u32,
}

impl RoundRobinScheduler {
    pub const fn new() -> Self {
        Self {
            ring: PriorityList::new(),
            handles: [None; crate::core::config::CFG_MAX_TASKS],
            slice_remaining: CFG_TIME_SLICE_DEFAULT,
        }
    }
}

impl Default for RoundRobinScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for RoundRobinScheduler {
    fn kind(&self) -> SchedulerKind {
        SchedulerKind::RoundRobin
    }

    fn init(&mut self) {
        self.ring.init();
        self.handles = [None; crate::core::config::CFG_MAX_TASKS];
        self.slice_remaining = CFG_TIME_SLICE_DEFAULT;
    }

    fn deinit(&mut self, pool: &mut NodePool) {
        for slot in self.handles.iter_mut() {
            if let Some(handle) = slot.take() {
                self.ring.remove(pool, handle);
                pool.free(handle);
            }
        }
        self.ring.init();
    }

    fn enqueue(&mut self, pool: &mut NodePool, task: TaskId, _priority: Priority, now: Tick) -> KernelResult<()> {
        if self.handles[task as usize].is_some() {
            return Err(KernelError::AlreadyInitialized);
        }
        let handle = pool.allocate(task, now)?;
        self.ring.insert_tail(pool, handle);
        self.handles[task as usize] = Some(handle);
        Ok(())
    }

    fn dequeue(&mut self, pool: &mut NodePool, task: TaskId) -> KernelResult<()> {
        if let Some(handle) = self.handles[task as usize].take() {
            self.ring.remove(pool, handle);
            pool.free(handle);
        }
        Ok(())
    }

    fn select_next(&mut self, pool: &mut NodePool) -> Option<TaskId> {
        self.ring.head().map(|h| pool.get(h).tcb)
    }

    fn requeue(&mut self, pool: &mut NodePool, task: TaskId, _priority: Priority, now: Tick) -> KernelResult<()> {
        if let Some(handle) = self.handles[task as usize] {
            self.ring.remove(pool, handle);
            pool.free(handle);
        }
        let handle = pool.allocate(task, now)?;
        self.ring.insert_tail(pool, handle);
        self.handles[task as usize] = Some(handle);
        self.slice_remaining = CFG_TIME_SLICE_DEFAULT;
        Ok(())
    }

    fn count(&self) -> u32 {
        self.ring.count() as u32
    }

    fn need_reschedule(&self, reason: ScheduleReason) -> bool {
        match reason {
            ScheduleReason::Tick => self.slice_remaining == 0,
            // A voluntary yield always cedes the remainder of the current
            // slice, regardless of how much was left.
            ScheduleReason::Yield => true,
            _ => true,
        }
    }
}

impl RoundRobinScheduler {
    /// Called once per tick by the kernel's tick handler before
    /// `need_reschedule` is consulted (spec §4.G: "round-robin decrements
    /// a per-task time slice on every tick").
    pub fn tick(&mut self) {
        self.slice_remaining = self.slice_remaining.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotates_fifo_on_requeue() {
        let mut pool = NodePool::new();
        let mut sched = RoundRobinScheduler::new();
        sched.init();
        sched.enqueue(&mut pool, 1, 0, 0).unwrap();
        sched.enqueue(&mut pool, 2, 0, 0).unwrap();
        sched.enqueue(&mut pool, 3, 0, 0).unwrap();
        assert_eq!(sched.select_next(&mut pool), Some(1));
        sched.requeue(&mut pool, 1, 0, 1).unwrap();
        assert_eq!(sched.select_next(&mut pool), Some(2));
    }

    #[test]
    fn reschedules_only_after_slice_expires() {
        let mut sched = RoundRobinScheduler::new();
        sched.init();
        assert!(!sched.need_reschedule(ScheduleReason::Tick));
        for _ in 0..CFG_TIME_SLICE_DEFAULT {
            sched.tick();
        }
        assert!(sched.need_reschedule(ScheduleReason::Tick));
    }
}
