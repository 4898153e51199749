//! Task table and state machine (component F).
//!
//! `TaskTable` is the fixed-size TCB arena; [`state`] holds the transition
//! rule table applied to individual TCBs. Linking a transition to ready
//! queue / blocked list / suspended list membership is the kernel's job
//! (`core::kernel`), which owns all the singletons a transition may touch.

pub mod state;
pub mod tcb;

use crate::core::config::CFG_MAX_TASKS;
use crate::core::error::{KernelError, KernelResult};
use crate::core::types::{Priority, TaskId};
use tcb::Tcb;

const OCC_WORDS: usize = (CFG_MAX_TASKS + 31) / 32;

/// Fixed-capacity table of task control blocks.
pub struct TaskTable {
    tasks: [Tcb; CFG_MAX_TASKS],
    occupancy: [u32; OCC_WORDS],
}

impl TaskTable {
    pub const fn new() -> Self {
        Self {
            tasks: [Tcb::new(); CFG_MAX_TASKS],
            occupancy: [0; OCC_WORDS],
        }
    }

    pub fn init(&mut self) {
        self.tasks = [Tcb::new(); CFG_MAX_TASKS];
        self.occupancy = [0; OCC_WORDS];
    }

    /// Allocate a TCB slot and initialize it to `Created` (spec §4.F).
    pub fn create_task(&mut self, name: &'static str, base_priority: Priority) -> KernelResult<TaskId> {
        for word_idx in 0..OCC_WORDS {
            let word = self.occupancy[word_idx];
            if word != u32::MAX {
                let bit = (!word).trailing_zeros();
                let idx = word_idx * 32 + bit as usize;
                if idx >= CFG_MAX_TASKS {
                    break;
                }
                self.occupancy[word_idx] |= 1 << bit;
                let id = idx as TaskId;
                self.tasks[idx].init(id, name, base_priority);
                return Ok(id);
            }
        }
        Err(KernelError::NoResource)
    }

    /// Return a slot to the free pool. `Terminated` is absorbing (spec
    /// §4.F/§8), so there is no further state transition to drive before
    /// reclaiming the slot; the next `create_task` on this index
    /// overwrites the TCB outright via `Tcb::init`, which resets `state`
    /// to `Created` directly.
    pub fn delete_task(&mut self, id: TaskId) {
        let idx = id as usize;
        debug_assert!(idx < CFG_MAX_TASKS);
        self.occupancy[idx / 32] &= !(1 << (idx % 32));
    }

    pub fn is_allocated(&self, id: TaskId) -> bool {
        let idx = id as usize;
        if idx >= CFG_MAX_TASKS {
            return false;
        }
        (self.occupancy[idx / 32] & (1 << (idx % 32))) != 0
    }

    #[inline]
    pub fn get(&self, id: TaskId) -> &Tcb {
        &self.tasks[id as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, id: TaskId) -> &mut Tcb {
        &mut self.tasks[id as usize]
    }

    pub fn allocated_count(&self) -> usize {
        self.occupancy.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Iterate all allocated task ids, ascending.
    pub fn iter_ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        (0..CFG_MAX_TASKS as TaskId).filter(move |&id| self.is_allocated(id))
    }
}

impl Default for TaskTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_assigns_increasing_ids_and_initializes_created() {
        let mut table = TaskTable::new();
        let a = table.create_task("a", 10).unwrap();
        let b = table.create_task("b", 20).unwrap();
        assert_ne!(a, b);
        assert_eq!(table.get(a).state, crate::core::types::TaskState::Created);
        assert_eq!(table.get(b).base_priority, 20);
    }

    #[test]
    fn delete_frees_slot_for_reuse() {
        let mut table = TaskTable::new();
        let a = table.create_task("a", 1).unwrap();
        table.delete_task(a);
        assert!(!table.is_allocated(a));
        let b = table.create_task("b", 2).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn exhaustion_is_reported() {
        let mut table = TaskTable::new();
        for i in 0..CFG_MAX_TASKS {
            table.create_task("t", i as Priority).unwrap();
        }
        assert_eq!(table.create_task("overflow", 0), Err(KernelError::NoResource));
    }
}
