//! Earliest-Deadline-First scheduler (spec §4.G, feature `edf`).
//!
//! Ready tasks are kept in a small unsorted set with a parallel absolute-
//! deadline table indexed by task id; `select_next` does a bounded linear
//! scan for the minimum deadline. `CFG_MAX_TASKS` is small enough (spec
//! §6) that this is cheaper in code size and simpler to audit than
//! maintaining a sorted list purely to shave an O(n) scan to O(log n).

use crate::core::config::CFG_MAX_TASKS;
use crate::core::error::{KernelError, KernelResult};
use crate::core::pool::NodePool;
use crate::core::types::{Priority, ScheduleReason, SchedulerKind, TaskId, Tick};

use super::traits::Scheduler;

pub struct EdfScheduler {
    ready: heapless::Vec<TaskId, CFG_MAX_TASKS>,
    deadlines: [Tick; CFG_MAX_TASKS],
}

impl EdfScheduler {
    pub const fn new() -> Self {
        Self {
            ready: heapless::Vec::new(),
            deadlines: [0; CFG_MAX_TASKS],
        }
    }
}

impl Default for EdfScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for EdfScheduler {
    fn kind(&self) -> SchedulerKind {
        SchedulerKind::Edf
    }

    fn init(&mut self) {
        self.ready.clear();
        self.deadlines = [0; CFG_MAX_TASKS];
    }

    fn deinit(&mut self, _pool: &mut NodePool) {
        self.ready.clear();
    }

    /// `priority` is reinterpreted as an absolute deadline in ticks for
    /// this scheduler, per spec §4.G's "the scheduler owns the meaning of
    /// the ordering key it is given".
    fn enqueue(&mut self, _pool: &mut NodePool, task: TaskId, priority: Priority, now: Tick) -> KernelResult<()> {
        if self.ready.contains(&task) {
            return Err(KernelError::AlreadyInitialized);
        }
        self.deadlines[task as usize] = now.wrapping_add(priority as Tick);
        self.ready.push(task).map_err(|_| KernelError::LimitExceeded)
    }

    fn dequeue(&mut self, _pool: &mut NodePool, task: TaskId) -> KernelResult<()> {
        if let Some(pos) = self.ready.iter().position(|&t| t == task) {
            self.ready.swap_remove(pos);
        }
        Ok(())
    }

    fn select_next(&mut self, _pool: &mut NodePool) -> Option<TaskId> {
        self.ready
            .iter()
            .copied()
            .min_by_key(|&t| self.deadlines[t as usize])
    }

    fn count(&self) -> u32 {
        self.ready.len() as u32
    }

    fn need_reschedule(&self, _reason: ScheduleReason) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn earliest_absolute_deadline_wins() {
        let mut pool = NodePool::new();
        let mut sched = EdfScheduler::new();
        sched.init();
        sched.enqueue(&mut pool, 1, 100, 0).unwrap();
        sched.enqueue(&mut pool, 2, 20, 0).unwrap();
        assert_eq!(sched.select_next(&mut pool), Some(2));
        sched.dequeue(&mut pool, 2).unwrap();
        assert_eq!(sched.select_next(&mut pool), Some(1));
    }
}
