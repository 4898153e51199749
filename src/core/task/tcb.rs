//! Task Control Block (component F data model, spec §3).
//!
//! Fields follow spec §3 exactly; shape (plain struct, `#[repr(C)]`, magic
//! + checksum trailer) is grounded on the reference's `OsTcb`
//! (`src/core/task/tcb.rs`), generalized to index-based queue linkage
//! (the `queue_node` field is a `NodeHandle`, not a raw pointer) and to the
//! spec's richer timing/stats records.

use crate::core::checksum::checksum_bytes;
use crate::core::pool::NodeHandle;
use crate::core::types::{Priority, TaskId, TaskState, Tick};

const TCB_MAGIC: u32 = 0x5443_4221; // "TCB!"

/// Timing record (spec §3).
#[derive(Debug, Clone, Copy, Default)]
pub struct TimingRecord {
    pub activation_time: Tick,
    pub last_runtime: u32,
    pub total_runtime: u64,
    pub response_time: u32,
    pub response_time_min: u32,
    pub response_time_max: u32,
    pub jitter_max: u32,
}

/// Per-task stats record (spec §3, elaborated by §4.K).
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskStatsRecord {
    pub context_switches: u32,
    pub deadline_misses: u32,
    pub migrations: u32,
    pub runtime_min: u32,
    pub runtime_max: u32,
}

/// Stack bookkeeping (spec §3).
#[derive(Debug, Clone, Copy)]
pub struct StackInfo {
    pub base: usize,
    pub size: usize,
    pub canary_offset: usize,
    pub fill_pattern: u32,
}

impl StackInfo {
    pub const fn empty() -> Self {
        Self {
            base: 0,
            size: 0,
            canary_offset: 0,
            fill_pattern: crate::core::config::CFG_STACK_FILL,
        }
    }
}

/// Task Control Block.
#[derive(Clone, Copy)]
pub struct Tcb {
    magic: u32,
    pub task_id: TaskId,
    pub name: &'static str,
    pub state: TaskState,
    pub prev_state: TaskState,
    pub base_priority: Priority,
    pub effective_priority: Priority,
    pub stack: StackInfo,
    pub queue_node: Option<NodeHandle>,
    pub timing: TimingRecord,
    pub stats: TaskStatsRecord,
    /// Explicit wake-time member (spec §9 open question: the reference
    /// reuses an unrelated field for this; here it is first-class).
    pub wake_time: Tick,
    pub history: [TransitionRecord; crate::core::config::CFG_STATE_HISTORY_DEPTH],
    pub history_next: u8,
    pub max_transition_cycles: u32,
    checksum: u32,
}

/// One entry of a task's transition history ring (spec §4.F).
#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionRecord {
    pub from: Option<TaskState>,
    pub to: Option<TaskState>,
    pub tick: Tick,
}

impl Tcb {
    pub const fn new() -> Self {
        Self {
            magic: TCB_MAGIC,
            task_id: 0,
            name: "",
            state: TaskState::Invalid,
            prev_state: TaskState::Invalid,
            base_priority: 0,
            effective_priority: 0,
            stack: StackInfo::empty(),
            queue_node: None,
            timing: TimingRecord {
                activation_time: 0,
                last_runtime: 0,
                total_runtime: 0,
                response_time: 0,
                response_time_min: u32::MAX,
                response_time_max: 0,
                jitter_max: 0,
            },
            stats: TaskStatsRecord {
                context_switches: 0,
                deadline_misses: 0,
                migrations: 0,
                runtime_min: u32::MAX,
                runtime_max: 0,
            },
            wake_time: 0,
            history: [TransitionRecord {
                from: None,
                to: None,
                tick: 0,
            }; crate::core::config::CFG_STATE_HISTORY_DEPTH],
            history_next: 0,
            max_transition_cycles: 0,
            checksum: 0,
        }
    }

    pub fn init(&mut self, task_id: TaskId, name: &'static str, base_priority: Priority) {
        *self = Self::new();
        self.task_id = task_id;
        self.name = name;
        self.base_priority = base_priority;
        self.effective_priority = base_priority;
        self.state = TaskState::Created;
        self.recompute_checksum();
    }

    pub fn record_transition(&mut self, from: TaskState, to: TaskState, tick: Tick) {
        let idx = (self.history_next as usize) % self.history.len();
        self.history[idx] = TransitionRecord {
            from: Some(from),
            to: Some(to),
            tick,
        };
        self.history_next = self.history_next.wrapping_add(1);
    }

    pub fn magic_valid(&self) -> bool {
        self.magic == TCB_MAGIC
    }

    pub fn rewrite_magic(&mut self) {
        self.magic = TCB_MAGIC;
    }

    pub fn recompute_checksum(&mut self) {
        let mut bytes = [0u8; 2 + 1 + 1 + 1 + 1];
        bytes[0..2].copy_from_slice(&self.task_id.to_le_bytes());
        bytes[2] = self.state as u8;
        bytes[3] = self.prev_state as u8;
        bytes[4] = self.base_priority;
        bytes[5] = self.effective_priority;
        self.checksum = checksum_bytes(0x7CB0_0003, &bytes);
    }

    pub fn checksum_valid(&self) -> bool {
        let mut probe = *self;
        probe.recompute_checksum();
        probe.checksum == self.checksum
    }

    /// Validate the invariants spec §3 requires of a well-formed TCB:
    /// effective priority dominates base priority, and queue linkage
    /// matches the task's current state.
    pub fn invariants_hold(&self) -> bool {
        if self.effective_priority < self.base_priority {
            return false;
        }
        match self.state {
            TaskState::Ready => self.queue_node.is_some(),
            TaskState::Blocked | TaskState::Suspended => true,
            _ => true,
        }
    }

    /// Write the canary word just inside the stack limit. Unsafe because
    /// `stack.base`/`stack.size` must describe real, owned memory.
    ///
    /// # Safety
    /// The caller must ensure the stack region is valid and not aliased.
    pub unsafe fn write_canary(&mut self) {
        if self.stack.base == 0 {
            return;
        }
        let canary_ptr = (self.stack.base + self.stack.canary_offset) as *mut u32;
        unsafe { core::ptr::write_volatile(canary_ptr, crate::core::config::CFG_STACK_CANARY) };
    }

    /// Check the canary word. Returns `false` if it has been overwritten
    /// (stack overflow, spec §7 unrecoverable error class).
    ///
    /// # Safety
    /// See [`write_canary`](Self::write_canary).
    pub unsafe fn check_canary(&self) -> bool {
        if self.stack.base == 0 {
            return true;
        }
        let canary_ptr = (self.stack.base + self.stack.canary_offset) as *const u32;
        unsafe { core::ptr::read_volatile(canary_ptr) == crate::core::config::CFG_STACK_CANARY }
    }
}

impl Default for Tcb {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl Send for Tcb {}
unsafe impl Sync for Tcb {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_sets_created_state_and_matching_priorities() {
        let mut tcb = Tcb::new();
        tcb.init(3, "worker", 50);
        assert_eq!(tcb.state, TaskState::Created);
        assert_eq!(tcb.base_priority, 50);
        assert_eq!(tcb.effective_priority, 50);
        assert!(tcb.invariants_hold());
        assert!(tcb.checksum_valid());
    }

    #[test]
    fn canary_detects_stack_overflow() {
        let mut stack = [0u32; 16];
        let mut tcb = Tcb::new();
        tcb.init(1, "t", 10);
        tcb.stack.base = stack.as_mut_ptr() as usize;
        tcb.stack.size = stack.len();
        tcb.stack.canary_offset = 0;
        unsafe {
            tcb.write_canary();
            assert!(tcb.check_canary());
            stack[0] = 0; // simulate overflow clobbering the canary
            assert!(!tcb.check_canary());
        }
    }
}
