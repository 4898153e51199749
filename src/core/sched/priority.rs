//! Fixed-priority scheduler (spec §4.G default algorithm).
//!
//! A thin [`Scheduler`] adapter over the priority-indexed ready queue
//! (component D): this is the algorithm spec §9 names as
//! `CFG_DEFAULT_SCHEDULER`, and the one every other scheduler in this
//! module is grounded on or delegates to.

use crate::core::error::KernelResult;
use crate::core::pool::{NodeHandle, NodePool};
use crate::core::queue::ReadyQueue;
use crate::core::types::{Priority, ScheduleReason, SchedulerKind, TaskId, Tick};

use super::traits::Scheduler;

pub struct PriorityScheduler {
    queue: ReadyQueue,
    handles: [Option<NodeHandle>; crate::core::config::CFG_MAX_TASKS],
    priorities: [Priority; crate::core::config::CFG_MAX_TASKS],
}

impl PriorityScheduler {
    pub const fn new() -> Self {
        Self {
            queue: ReadyQueue::new(),
            handles: [None; crate::core::config::CFG_MAX_TASKS],
            priorities: [0; crate::core::config::CFG_MAX_TASKS],
        }
    }

    pub fn queue(&self) -> &ReadyQueue {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut ReadyQueue {
        &mut self.queue
    }

    pub fn set_idle_task(&mut self, task: TaskId) {
        self.queue.set_idle_task(task);
    }
}

impl Default for PriorityScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for PriorityScheduler {
    fn kind(&self) -> SchedulerKind {
        SchedulerKind::Priority
    }

    fn init(&mut self) {
        self.queue.init();
        self.handles = [None; crate::core::config::CFG_MAX_TASKS];
        self.priorities = [0; crate::core::config::CFG_MAX_TASKS];
    }

    fn deinit(&mut self, pool: &mut NodePool) {
        for id in 0..crate::core::config::CFG_MAX_TASKS {
            if let Some(handle) = self.handles[id] {
                self.queue.list_mut(self.priorities[id]).remove(pool, handle);
                pool.free(handle);
                self.handles[id] = None;
            }
        }
        self.queue.init();
    }

    fn enqueue(&mut self, pool: &mut NodePool, task: TaskId, priority: Priority, now: Tick) -> KernelResult<()> {
        let handle = self.queue.insert(pool, task, priority, now, false)?;
        self.handles[task as usize] = Some(handle);
        self.priorities[task as usize] = priority;
        Ok(())
    }

    fn dequeue(&mut self, pool: &mut NodePool, task: TaskId) -> KernelResult<()> {
        if let Some(handle) = self.handles[task as usize].take() {
            self.queue.remove(pool, handle, self.priorities[task as usize])?;
        }
        Ok(())
    }

    fn select_next(&mut self, pool: &mut NodePool) -> Option<TaskId> {
        self.queue.peek_highest(pool)
    }

    fn count(&self) -> u32 {
        self.queue.stats().total_tasks
    }

    fn need_reschedule(&self, _reason: ScheduleReason) -> bool {
        // Any event can change which priority level is now highest, so
        // fixed-priority scheduling always re-evaluates.
        true
    }

    fn change_priority(
        &mut self,
        pool: &mut NodePool,
        task: TaskId,
        old: Priority,
        new: Priority,
        now: Tick,
    ) -> KernelResult<()> {
        self.dequeue(pool, task)?;
        let _ = old;
        self.enqueue(pool, task, new, now)
    }

    fn get_effective_priority(&self, task: TaskId) -> Option<Priority> {
        self.handles[task as usize].map(|_| self.priorities[task as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueue_and_select_respects_priority() {
        let mut pool = NodePool::new();
        let mut sched = PriorityScheduler::new();
        sched.init();
        sched.enqueue(&mut pool, 1, 10, 0).unwrap();
        sched.enqueue(&mut pool, 2, 50, 0).unwrap();
        assert_eq!(sched.select_next(&mut pool), Some(2));
        sched.dequeue(&mut pool, 2).unwrap();
        assert_eq!(sched.select_next(&mut pool), Some(1));
    }

    #[test]
    fn change_priority_moves_task_between_levels() {
        let mut pool = NodePool::new();
        let mut sched = PriorityScheduler::new();
        sched.init();
        sched.enqueue(&mut pool, 1, 10, 0).unwrap();
        sched.change_priority(&mut pool, 1, 10, 200, 1).unwrap();
        assert_eq!(sched.get_effective_priority(1), Some(200));
        assert_eq!(sched.select_next(&mut pool), Some(1));
    }
}
