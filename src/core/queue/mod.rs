//! Priority-indexed ready queue (component D).
//!
//! Generalizes the reference's `[ReadyList; CFG_PRIO_MAX]` + `PrioTable`
//! pair (`core::kernel::SchedState`, `core::sched::rdy_list`) into the
//! single self-validating structure spec §3/§4.D describes: 256 priority
//! lists, a redundant bitmap, statistics, a non-recursive lock record, and
//! leading/trailing magics. The ready queue is deliberately ignorant of
//! `Tcb` — it only ever sees `TaskId`/`Priority`/`NodeHandle` — so that
//! component F (the task-state machine) is the sole owner of what a given
//! task's queue membership means.

mod list;

pub use list::PriorityList;

use crate::core::bitmap::PriorityBitmap;
use crate::core::config::{CFG_MAX_TASKS, CFG_PRIO_LEVELS};
use crate::core::error::{KernelError, KernelResult};
use crate::core::pool::{NodeHandle, NodePool};
use crate::core::types::{IntegrityStatus, Priority, TaskId, Tick};

const LEAD_MAGIC: u32 = 0x5251_4844; // "RQHD"
const TRAIL_MAGIC: u32 = 0x5251_544C; // "RQTL"

/// Ready-queue-wide statistics (spec §3).
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadyQueueStats {
    pub total_tasks: u32,
    pub high_water_mark: u32,
    pub insertions: u32,
    pub removals: u32,
    pub corruptions_detected: u32,
    pub repairs_attempted: u32,
    pub repairs_successful: u32,
    pub highest_priority: u16,
}

/// The priority-indexed ready queue itself.
pub struct ReadyQueue {
    lead_magic: u32,
    lists: [PriorityList; CFG_PRIO_LEVELS],
    bitmap: PriorityBitmap,
    stats: ReadyQueueStats,
    locked: bool,
    validation_interval: u32,
    ops_since_check: u32,
    idle_task: Option<TaskId>,
    trail_magic: u32,
}

impl ReadyQueue {
    pub const fn new() -> Self {
        Self {
            lead_magic: LEAD_MAGIC,
            lists: [PriorityList::new(); CFG_PRIO_LEVELS],
            bitmap: PriorityBitmap::new(),
            stats: ReadyQueueStats {
                total_tasks: 0,
                high_water_mark: 0,
                insertions: 0,
                removals: 0,
                corruptions_detected: 0,
                repairs_attempted: 0,
                repairs_successful: 0,
                highest_priority: 0,
            },
            locked: false,
            validation_interval: 64,
            ops_since_check: 0,
            idle_task: None,
            trail_magic: TRAIL_MAGIC,
        }
    }

    pub fn init(&mut self) {
        self.lead_magic = LEAD_MAGIC;
        self.trail_magic = TRAIL_MAGIC;
        for list in self.lists.iter_mut() {
            list.init();
        }
        self.bitmap.init();
        self.stats = ReadyQueueStats::default();
        self.locked = false;
        self.ops_since_check = 0;
    }

    pub fn set_idle_task(&mut self, id: TaskId) {
        self.idle_task = Some(id);
    }

    pub fn set_validation_interval(&mut self, ops: u32) {
        self.validation_interval = ops.max(1);
    }

    pub fn stats(&self) -> ReadyQueueStats {
        self.stats
    }

    fn lock(&mut self) -> KernelResult<()> {
        if self.locked {
            return Err(KernelError::NotPermitted);
        }
        self.locked = true;
        Ok(())
    }

    fn unlock(&mut self) {
        self.locked = false;
    }

    /// Insert `task` at `effective_priority`. Spec §4.D `insert`.
    pub fn insert(
        &mut self,
        pool: &mut NodePool,
        task: TaskId,
        effective_priority: Priority,
        now: Tick,
        already_linked: bool,
    ) -> KernelResult<NodeHandle> {
        if already_linked {
            return Err(KernelError::AlreadyInitialized);
        }
        self.lock()?;

        let list = &mut self.lists[effective_priority as usize];
        if list.count() as usize >= CFG_MAX_TASKS {
            self.unlock();
            return Err(KernelError::LimitExceeded);
        }

        let handle = match pool.allocate(task, now) {
            Ok(h) => h,
            Err(e) => {
                self.unlock();
                return Err(e);
            }
        };

        list.insert_tail(pool, handle);
        self.bitmap.set(effective_priority);

        self.stats.total_tasks += 1;
        self.stats.insertions += 1;
        if self.stats.total_tasks > self.stats.high_water_mark {
            self.stats.high_water_mark = self.stats.total_tasks;
        }
        let highest = self.bitmap.highest_set();
        self.stats.highest_priority = highest;

        self.maybe_self_check(pool);
        self.unlock();
        Ok(handle)
    }

    /// Remove `task`'s node (previously returned by `insert`) from
    /// `effective_priority`'s list. Spec §4.D `remove`.
    pub fn remove(
        &mut self,
        pool: &mut NodePool,
        handle: NodeHandle,
        effective_priority: Priority,
    ) -> KernelResult<()> {
        if !pool.is_allocated(handle) {
            return Err(KernelError::InvalidParameter);
        }
        self.lock()?;

        let list = &mut self.lists[effective_priority as usize];
        list.remove(pool, handle);
        pool.free(handle);

        if list.is_empty() {
            self.bitmap.clear(effective_priority);
            if self.stats.highest_priority == (effective_priority as u16 + 1) {
                self.stats.highest_priority = self.bitmap.highest_set();
            }
        }

        self.stats.total_tasks = self.stats.total_tasks.saturating_sub(1);
        self.stats.removals += 1;

        self.maybe_self_check(pool);
        self.unlock();
        Ok(())
    }

    /// Return the task at the head of the highest-priority non-empty list,
    /// falling back to the registered idle task when the bitmap is empty
    /// (spec §4.D `peek_highest`).
    pub fn peek_highest(&mut self, pool: &mut NodePool) -> Option<TaskId> {
        loop {
            let highest = self.bitmap.highest_set();
            if highest == 0 {
                return self.idle_task;
            }
            let prio = (highest - 1) as usize;
            let list = &mut self.lists[prio];
            match list.head() {
                None => {
                    // Bitmap/list disagreement: clear the stale bit and retry.
                    self.bitmap.clear(prio as u8);
                    continue;
                }
                Some(handle) => {
                    let node = pool.get(handle);
                    if !pool.is_allocated(handle) || !node.magics_valid() || !node.checksum_valid() {
                        // A corrupt node at the head: drop it and retry
                        // (spec §4.D: "A corrupt node discovered during
                        // peek_highest is removed during repair before
                        // selection continues").
                        self.stats.corruptions_detected += 1;
                        list.remove(pool, handle);
                        pool.free(handle);
                        if list.is_empty() {
                            self.bitmap.clear(prio as u8);
                        }
                        continue;
                    }
                    return Some(node.tcb);
                }
            }
        }
    }

    fn maybe_self_check(&mut self, pool: &mut NodePool) {
        self.ops_since_check += 1;
        if self.ops_since_check >= self.validation_interval {
            self.ops_since_check = 0;
            let _ = self.validate(pool);
        }
    }

    /// Full structural validation (spec §4.D `validate`).
    pub fn validate(&mut self, pool: &NodePool) -> IntegrityStatus {
        if self.lead_magic != LEAD_MAGIC || self.trail_magic != TRAIL_MAGIC {
            return IntegrityStatus::MagicFail;
        }
        if !self.bitmap.mirrors_agree() {
            return IntegrityStatus::BitmapMismatch;
        }

        let mut total = 0u32;
        for (prio, list) in self.lists.iter().enumerate() {
            if list.has_cycle(pool) {
                return IntegrityStatus::CycleDetected;
            }
            let traversed = match list.traverse_count(pool, CFG_MAX_TASKS) {
                Some(c) => c,
                None => return IntegrityStatus::CycleDetected,
            };
            if traversed != list.count() {
                return IntegrityStatus::CountMismatch;
            }
            if (traversed > 0) != self.bitmap.is_set(prio as u8) {
                return IntegrityStatus::BitmapMismatch;
            }

            let mut current = list.head();
            let mut steps = 0;
            while let Some(handle) = current {
                steps += 1;
                if steps > CFG_MAX_TASKS {
                    return IntegrityStatus::CycleDetected;
                }
                if !pool.is_allocated(handle) {
                    return IntegrityStatus::NodeCorrupted;
                }
                let node = pool.get(handle);
                if !node.magics_valid() || !node.checksum_valid() {
                    return IntegrityStatus::NodeCorrupted;
                }
                current = node.next;
            }

            total += traversed as u32;
        }

        if total != self.stats.total_tasks {
            return IntegrityStatus::CountMismatch;
        }

        IntegrityStatus::Ok
    }

    pub fn list(&self, prio: Priority) -> &PriorityList {
        &self.lists[prio as usize]
    }

    pub fn list_mut(&mut self, prio: Priority) -> &mut PriorityList {
        &mut self.lists[prio as usize]
    }

    pub fn bitmap(&self) -> &PriorityBitmap {
        &self.bitmap
    }

    pub fn bitmap_mut(&mut self) -> &mut PriorityBitmap {
        &mut self.bitmap
    }

    pub fn record_repair_attempt(&mut self) {
        self.stats.repairs_attempted += 1;
    }

    pub fn record_repair_success(&mut self) {
        self.stats.repairs_successful += 1;
    }

    pub fn record_corruption(&mut self) {
        self.stats.corruptions_detected += 1;
    }

    pub fn recompute_total_from_lists(&mut self) {
        let mut total = 0u32;
        for list in self.lists.iter() {
            total += list.count() as u32;
        }
        self.stats.total_tasks = total;
    }

    pub fn rewrite_magics(&mut self) {
        self.lead_magic = LEAD_MAGIC;
        self.trail_magic = TRAIL_MAGIC;
    }
}

impl Default for ReadyQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_peek_respects_highest_priority() {
        let mut pool = NodePool::new();
        let mut q = ReadyQueue::new();
        q.init();
        q.set_idle_task(0);

        let h10a = q.insert(&mut pool, 1, 10, 0, false).unwrap();
        let _h20 = q.insert(&mut pool, 2, 20, 0, false).unwrap();
        let _h10b = q.insert(&mut pool, 3, 10, 0, false).unwrap();

        assert_eq!(q.peek_highest(&mut pool), Some(2));
        q.remove(&mut pool, _h20, 20).unwrap();

        // FIFO within priority 10: task 1 was inserted first.
        assert_eq!(q.peek_highest(&mut pool), Some(1));
        q.remove(&mut pool, h10a, 10).unwrap();
        assert_eq!(q.peek_highest(&mut pool), Some(3));
    }

    #[test]
    fn empty_queue_falls_back_to_idle() {
        let mut pool = NodePool::new();
        let mut q = ReadyQueue::new();
        q.init();
        q.set_idle_task(7);
        assert_eq!(q.peek_highest(&mut pool), Some(7));
    }

    #[test]
    fn full_insert_cycle_zeroes_out() {
        let mut pool = NodePool::new();
        let mut q = ReadyQueue::new();
        q.init();

        let mut handles = heapless::Vec::<(NodeHandle, Priority), 64>::new();
        for i in 0..1000u32 {
            let prio = (i % 16) as Priority;
            let h = q.insert(&mut pool, (i % 60) as TaskId, prio, i, false).unwrap();
            handles.push((h, prio)).ok();
            let (rh, rp) = handles.pop().unwrap();
            q.remove(&mut pool, rh, rp).unwrap();
        }

        assert_eq!(q.stats().total_tasks, 0);
        assert_eq!(q.stats().insertions, 1000);
        assert_eq!(q.stats().removals, 1000);
        assert!(q.bitmap().is_empty());
        assert_eq!(q.validate(&pool), IntegrityStatus::Ok);
    }

    #[test]
    fn validate_detects_count_mismatch_and_repair_fixes_it() {
        let mut pool = NodePool::new();
        let mut q = ReadyQueue::new();
        q.init();

        q.insert(&mut pool, 1, 7, 0, false).unwrap();
        q.insert(&mut pool, 2, 7, 0, false).unwrap();

        // Directly corrupt list[7].count (simulating the scenario in spec §8).
        q.list_mut(7).force_count_for_test(99);
        assert_eq!(q.validate(&pool), IntegrityStatus::CountMismatch);

        let fixed = q.list_mut(7).rebuild(&mut pool, CFG_MAX_TASKS);
        q.recompute_total_from_lists();
        assert_eq!(fixed, 2);
        assert_eq!(q.validate(&pool), IntegrityStatus::Ok);
    }
}
