//! Kernel bring-up and orchestration (spec §4.L kernel lifecycle FSM).
//!
//! Owns every singleton the rest of `core` defines and drives the overall
//! `KernelState` machine: `Uninitialized -> Initializing -> Ready ->
//! Running <-> Suspended/Shutdown`, with `Error` reachable from any state
//! (spec §4.L). This is the one module allowed to see every other
//! component at once; everywhere else, components only see the pieces
//! they operate on directly.

use crate::core::config::CFG_STACK_SIZE_IDLE;
use crate::core::error::{KernelError, KernelResult};
use crate::core::hooks::HookTable;
use crate::core::integrity::{self};
use crate::core::lists::{BlockedList, DelayedList, SuspendedList};
use crate::core::queue::PriorityList;
use crate::core::monitor::Monitor;
use crate::core::panic::{self, RecoveryAction};
use crate::core::pool::NodePool;
use crate::core::sched::registry::SchedulerRegistry;
use crate::core::services::ServiceRegistry;
use crate::core::stats::SystemStats;
use crate::core::task::state;
use crate::core::task::TaskTable;
use crate::core::types::{
    HookType, IntegrityStatus, KernelState, Priority, RepairTier, ScheduleReason, TaskId, TaskState, Tick,
};

/// KERNEL FSM transitions allowed from each state, mirroring the static
/// table approach used for task states (spec §4.F) applied at the
/// kernel-wide level.
fn kernel_transition_allowed(from: KernelState, to: KernelState) -> bool {
    if to == KernelState::Error {
        return true; // Error is reachable from any state.
    }
    matches!(
        (from, to),
        (KernelState::Uninitialized, KernelState::Initializing)
            | (KernelState::Initializing, KernelState::Ready)
            | (KernelState::Ready, KernelState::Running)
            | (KernelState::Running, KernelState::Suspended)
            | (KernelState::Suspended, KernelState::Running)
            | (KernelState::Running, KernelState::Shutdown)
            | (KernelState::Suspended, KernelState::Shutdown)
    )
}

pub struct Kernel {
    state: KernelState,
    pool: NodePool,
    tasks: TaskTable,
    schedulers: SchedulerRegistry,
    active_scheduler_id: Option<usize>,
    blocked: BlockedList,
    suspended: SuspendedList,
    delayed: DelayedList,
    stats: SystemStats,
    monitor: Monitor,
    hooks: HookTable,
    services: ServiceRegistry,
    tick_count: Tick,
    next_integrity_check: Tick,
    idle_task: Option<TaskId>,
    current_task: Option<TaskId>,
    window_busy: u32,
    window_idle: u32,
    sched_lock_nesting: u8,
}

impl Kernel {
    pub const fn new() -> Self {
        Self {
            state: KernelState::Uninitialized,
            pool: NodePool::new(),
            tasks: TaskTable::new(),
            schedulers: SchedulerRegistry::new(),
            active_scheduler_id: None,
            blocked: BlockedList::new(),
            suspended: SuspendedList::new(),
            delayed: DelayedList::new(),
            stats: SystemStats::new(),
            monitor: Monitor::new(),
            hooks: HookTable::new(),
            services: ServiceRegistry::new(),
            tick_count: 0,
            next_integrity_check: crate::core::config::CFG_INTEGRITY_INTERVAL_TICKS,
            idle_task: None,
            current_task: None,
            window_busy: 0,
            window_idle: 0,
            sched_lock_nesting: 0,
        }
    }

    fn move_to(&mut self, to: KernelState) -> KernelResult<()> {
        if !kernel_transition_allowed(self.state, to) {
            return Err(KernelError::InvalidState);
        }
        self.state = to;
        Ok(())
    }

    pub fn state(&self) -> KernelState {
        self.state
    }

    /// `os_init` equivalent: bring every singleton up, register the
    /// default scheduler, create the idle task, and self-test before
    /// declaring `Ready`.
    pub fn init(&mut self) -> KernelResult<()> {
        if self.state != KernelState::Uninitialized {
            return Err(KernelError::AlreadyInitialized);
        }
        self.move_to(KernelState::Initializing)?;

        self.pool.init();
        self.tasks.init();
        self.schedulers.init();
        self.blocked.init();
        self.suspended.init();
        self.delayed.init();
        self.stats.init();
        self.monitor.init();
        self.hooks.init();
        self.services.init();
        self.tick_count = 0;
        self.next_integrity_check = crate::core::config::CFG_INTEGRITY_INTERVAL_TICKS;
        self.current_task = None;

        let sched_id = self.schedulers.register(crate::core::config::CFG_DEFAULT_SCHEDULER)?;
        self.schedulers.set_active(sched_id, &mut self.pool)?;
        self.active_scheduler_id = Some(sched_id);

        let idle = self.tasks.create_task("idle", 0)?;
        self.tasks.get_mut(idle).stack.size = CFG_STACK_SIZE_IDLE;
        self.idle_task = Some(idle);
        self.run_transition(idle, TaskState::Ready)?;
        self.active_scheduler_mut()?.enqueue(&mut self.pool, idle, 0, 0)?;

        if self.self_test() != IntegrityStatus::Ok {
            self.state = KernelState::Error;
            return Err(KernelError::Internal);
        }

        self.move_to(KernelState::Ready)
    }

    fn self_test(&mut self) -> IntegrityStatus {
        if self.active_scheduler_id.is_none() || !self.schedulers.validate() {
            return IntegrityStatus::MagicFail;
        }
        match self.schedulers.active_priority_queue_mut() {
            Some(queue) => integrity::check(queue, &self.pool),
            // Non-priority algorithms are trusted structurally by the
            // registry's own validate() above.
            None => IntegrityStatus::Ok,
        }
    }

    fn active_scheduler_mut(&mut self) -> KernelResult<&mut dyn crate::core::sched::Scheduler> {
        self.schedulers.get_active_mut().ok_or(KernelError::NotInitialized)
    }

    fn run_transition(&mut self, task: TaskId, to: TaskState) -> KernelResult<()> {
        let tick = self.tick_count;
        state::transition(self.tasks.get_mut(task), to, tick).map_err(|_| KernelError::InvalidState)
    }

    /// `os_start` equivalent: `Ready -> Running`.
    pub fn start(&mut self) -> KernelResult<()> {
        self.hooks.invoke(HookType::KernelPreStart, 0);
        self.move_to(KernelState::Running)?;
        self.hooks.invoke(HookType::KernelPostStart, 0);
        Ok(())
    }

    pub fn suspend_kernel(&mut self) -> KernelResult<()> {
        self.move_to(KernelState::Suspended)
    }

    pub fn resume_kernel(&mut self) -> KernelResult<()> {
        self.move_to(KernelState::Running)
    }

    pub fn shutdown(&mut self) -> KernelResult<()> {
        self.hooks.invoke(HookType::KernelPreShutdown, 0);
        self.move_to(KernelState::Shutdown)?;
        self.hooks.invoke(HookType::KernelPostShutdown, 0);
        Ok(())
    }

    /// Nest a scheduler lock, preventing blocking operations (spec §9.1
    /// supplement: a multi-step kernel operation can ask the scheduler not
    /// to hand off mid-sequence). Not callable from an ISR.
    pub fn sched_lock(&mut self) -> KernelResult<()> {
        if crate::port::is_isr_context() {
            return Err(KernelError::NotPermitted);
        }
        self.sched_lock_nesting = self
            .sched_lock_nesting
            .checked_add(1)
            .ok_or(KernelError::LimitExceeded)?;
        Ok(())
    }

    /// Unwind one level of scheduler lock.
    pub fn sched_unlock(&mut self) -> KernelResult<()> {
        self.sched_lock_nesting = self.sched_lock_nesting.checked_sub(1).ok_or(KernelError::InvalidState)?;
        Ok(())
    }

    pub fn sched_lock_nesting(&self) -> u8 {
        self.sched_lock_nesting
    }

    /// Create a task and make it `Ready`, enqueued with the active
    /// scheduler at `priority`.
    pub fn create_task(&mut self, name: &'static str, priority: Priority) -> KernelResult<TaskId> {
        if matches!(self.state, KernelState::Shutdown | KernelState::Error) {
            return Err(KernelError::InvalidState);
        }
        let id = self.tasks.create_task(name, priority)?;
        self.run_transition(id, TaskState::Ready)?;
        let now = self.tick_count;
        self.active_scheduler_mut()?.enqueue(&mut self.pool, id, priority, now)?;
        self.hooks.invoke(HookType::TaskCreate, id as u32);
        Ok(id)
    }

    /// Move `task` from `Ready`/`Running` into the blocked list, with an
    /// optional timeout (spec §4.E "insertion optionally schedules a wake
    /// time").
    pub fn block_task(&mut self, task: TaskId, timeout: Option<Tick>) -> KernelResult<()> {
        self.active_scheduler_mut()?.dequeue(&mut self.pool, task)?;
        self.run_transition(task, TaskState::Blocked)?;
        let handle = self.pool.allocate(task, self.tick_count)?;
        self.blocked.insert_tail(&mut self.pool, handle);
        if let Some(timeout_ticks) = timeout {
            let wake_time = self.tick_count.wrapping_add(timeout_ticks);
            self.delayed.insert(&mut self.pool, &mut self.tasks, task, wake_time)?;
        }
        Ok(())
    }

    /// Move `task` back to `Ready` and re-enqueue it with the active
    /// scheduler (unblock, whether by event or timeout). Unlinks the task
    /// from both the blocked list and, if it was sleeping under a
    /// blocking-call timeout, the delayed list (spec §5 "cancellation of a
    /// pending delay is the explicit state transition BLOCKED ->
    /// SUSPENDED/TERMINATED"; waking it early via `unblock_task` is the
    /// same cancellation with a different destination state).
    pub fn unblock_task(&mut self, task: TaskId) -> KernelResult<()> {
        if let Some(handle) = find_in_list(&self.blocked, &self.pool, task) {
            self.blocked.remove(&mut self.pool, handle);
            self.pool.free(handle);
        }
        if let Some(handle) = find_in_list(&self.delayed, &self.pool, task) {
            self.delayed.remove(&mut self.pool, handle);
        }
        self.run_transition(task, TaskState::Ready)?;
        let prio = self.tasks.get(task).effective_priority;
        let now = self.tick_count;
        self.active_scheduler_mut()?.enqueue(&mut self.pool, task, prio, now)
    }

    pub fn suspend_task(&mut self, task: TaskId) -> KernelResult<()> {
        let was_ready = self.tasks.get(task).state == TaskState::Ready;
        if was_ready {
            self.active_scheduler_mut()?.dequeue(&mut self.pool, task)?;
        } else {
            self.detach_from_wait_lists(task);
        }
        self.run_transition(task, TaskState::Suspended)?;
        let handle = self.pool.allocate(task, self.tick_count)?;
        self.suspended.insert_tail(&mut self.pool, handle);
        Ok(())
    }

    /// Unlink `task` from the blocked list and, if present, its pending
    /// delayed-list wake — used when a BLOCKED task is transitioned
    /// straight to SUSPENDED or TERMINATED without passing back through
    /// `unblock_task` (spec §3 "if state ∈ {BLOCKED, SUSPENDED} then it is
    /// linked in the corresponding global list and not in any [other]
    /// list").
    fn detach_from_wait_lists(&mut self, task: TaskId) {
        if let Some(handle) = find_in_list(&self.blocked, &self.pool, task) {
            self.blocked.remove(&mut self.pool, handle);
            self.pool.free(handle);
        }
        if let Some(handle) = find_in_list(&self.delayed, &self.pool, task) {
            self.delayed.remove(&mut self.pool, handle);
        }
    }

    pub fn resume_task(&mut self, task: TaskId) -> KernelResult<()> {
        let mut current = self.suspended.head();
        while let Some(h) = current {
            if self.pool.get(h).tcb == task {
                self.suspended.remove(&mut self.pool, h);
                self.pool.free(h);
                break;
            }
            current = self.pool.get(h).next;
        }
        self.run_transition(task, TaskState::Ready)?;
        let prio = self.tasks.get(task).effective_priority;
        let now = self.tick_count;
        self.active_scheduler_mut()?.enqueue(&mut self.pool, task, prio, now)
    }

    pub fn terminate_task(&mut self, task: TaskId) -> KernelResult<()> {
        let _ = self.active_scheduler_mut()?.dequeue(&mut self.pool, task);
        self.detach_from_wait_lists(task);
        if let Some(handle) = find_in_list(&self.suspended, &self.pool, task) {
            self.suspended.remove(&mut self.pool, handle);
            self.pool.free(handle);
        }
        self.run_transition(task, TaskState::Terminated)?;
        self.hooks.invoke(HookType::TaskDelete, task as u32);
        if self.current_task == Some(task) {
            self.current_task = None;
        }
        // Terminated is absorbing (spec §4.F/§8): the slot is reclaimed
        // directly rather than routed through a Terminated -> Dormant
        // transition, which the table no longer (and per spec, never did)
        // permit.
        self.tasks.delete_task(task);
        Ok(())
    }

    /// Peek at whichever task the active scheduler would hand out right
    /// now, without touching `current_task` or any TCB state. `schedule`
    /// is the entry point that actually commits a dispatch decision.
    pub fn select_next(&mut self) -> Option<TaskId> {
        self.schedulers.get_active_mut()?.select_next(&mut self.pool)
    }

    pub fn current_task(&self) -> Option<TaskId> {
        self.current_task
    }

    /// `schedule(reason)`: spec §4.G's dispatch contract. Validates the
    /// active scheduler, asks it for `select_next`, and — only if the
    /// selection differs from the currently running task and preemption
    /// is enabled (`sched_lock_nesting == 0`) — commits the switch: the
    /// outgoing task's accrued runtime is folded into its stats and it
    /// drops back to `Ready` (if it is still `Running`; a task that
    /// blocked/suspended/terminated itself before calling `schedule` has
    /// already left `Running` through its own transition), and the
    /// incoming task is moved `Ready -> Running` with a fresh activation
    /// timestamp. Otherwise the current task is returned unchanged.
    pub fn schedule(&mut self, reason: ScheduleReason) -> KernelResult<Option<TaskId>> {
        if !matches!(self.state, KernelState::Running) {
            return Err(KernelError::InvalidState);
        }
        let scheduler = self.active_scheduler_mut()?;
        if !scheduler.need_reschedule(reason) {
            return Ok(self.current_task);
        }
        let candidate = scheduler.select_next(&mut self.pool);

        if candidate == self.current_task {
            return Ok(self.current_task);
        }
        // Preemption gate: a nested `sched_lock` defers the switch until
        // the lock is fully unwound (spec §9 supplement).
        if self.sched_lock_nesting > 0 {
            return Ok(self.current_task);
        }

        if let Some(outgoing) = self.current_task {
            if self.tasks.get(outgoing).state == TaskState::Running {
                let activation = self.tasks.get(outgoing).timing.activation_time;
                let runtime = self.tick_count.wrapping_sub(activation) as u32;
                crate::core::stats::record_task_runtime(&mut self.tasks, outgoing, runtime);
                self.run_transition(outgoing, TaskState::Ready)?;
            }
        }

        if let Some(incoming) = candidate {
            self.tasks.get_mut(incoming).timing.activation_time = self.tick_count;
            self.run_transition(incoming, TaskState::Running)?;
        }

        self.current_task = candidate;
        Ok(candidate)
    }

    /// Voluntary yield (spec §4.G vtable `yield`): rotate `task` to the
    /// back of its scheduler's eligibility class, then run `schedule`
    /// with `ScheduleReason::Yield` so an equal-or-higher-priority peer
    /// (or the same task again, if nothing else is eligible) is dispatched.
    pub fn yield_task(&mut self, task: TaskId) -> KernelResult<Option<TaskId>> {
        let priority = self.tasks.get(task).effective_priority;
        let now = self.tick_count;
        self.active_scheduler_mut()?.yield_task(&mut self.pool, task, priority, now)?;
        self.schedule(ScheduleReason::Yield)
    }

    /// Advance the kernel one tick: wake matured delayed tasks, run the
    /// periodic integrity check, sample system stats, and invoke the tick
    /// hook chain.
    pub fn tick(&mut self, busy_ticks: u32) -> KernelResult<()> {
        self.tick_count = self.tick_count.wrapping_add(1);

        let matured = self.delayed.process_delayed(&mut self.pool, &self.tasks, self.tick_count);
        for task in matured {
            self.unblock_task(task)?;
        }

        if busy_ticks == 0 {
            self.window_idle += 1;
        } else {
            self.window_busy += busy_ticks;
        }
        if (self.window_busy + self.window_idle) >= crate::core::config::CFG_SAMPLE_PERIOD_MS {
            self.stats.record_window(self.tick_count, self.window_busy, self.window_idle);
            self.monitor.observe_cpu_load(self.stats.cpu_load_pct());
            self.window_busy = 0;
            self.window_idle = 0;
        }

        self.hooks.invoke(HookType::Tick, self.tick_count);
        Ok(())
    }

    /// Run a (possibly escalating) integrity check/repair pass against a
    /// `Priority`-scheduler-backed ready queue, if one is active. Other
    /// scheduler kinds are validated structurally via
    /// `SchedulerRegistry::validate` instead.
    pub fn check_integrity(&mut self, escalate_on_failure: bool) -> IntegrityStatus {
        if !self.schedulers.validate() {
            if escalate_on_failure {
                let _ = panic::capture(1, "scheduler registry corrupted", file!(), line!(), self.state);
            }
            return IntegrityStatus::MagicFail;
        }
        match self.schedulers.active_priority_queue_mut() {
            Some(queue) => integrity::check(queue, &self.pool),
            None => IntegrityStatus::Ok,
        }
    }

    pub fn stats(&self) -> &SystemStats {
        &self.stats
    }

    pub fn monitor(&self) -> &Monitor {
        &self.monitor
    }

    pub fn hooks_mut(&mut self) -> &mut HookTable {
        &mut self.hooks
    }

    pub fn services_mut(&mut self) -> &mut ServiceRegistry {
        &mut self.services
    }

    pub fn tasks(&self) -> &TaskTable {
        &self.tasks
    }

    pub fn tick_count(&self) -> Tick {
        self.tick_count
    }

    /// Escalate a repair attempt up through the tiers until one succeeds
    /// or `Rebuild` itself fails, in which case the failure is routed to
    /// the panic channel (spec §4.I "REBUILD failing is not recoverable
    /// by this module").
    pub fn repair_escalating(&mut self) -> IntegrityStatus {
        for tier in [
            RepairTier::Minimal,
            RepairTier::Moderate,
            RepairTier::Aggressive,
            RepairTier::Rebuild,
        ] {
            let Some(queue) = self.schedulers.active_priority_queue_mut() else {
                return IntegrityStatus::Ok;
            };
            let status = integrity::repair(tier, queue, &mut self.pool);
            if status == IntegrityStatus::Ok {
                return status;
            }
            if tier == RepairTier::Rebuild {
                let action = panic::capture(2, "ready queue unrecoverable", file!(), line!(), self.state);
                if action == RecoveryAction::AutoRestart {
                    crate::port::system_reset();
                }
                return status;
            }
        }
        IntegrityStatus::Ok
    }
}

/// Linear scan shared by `unblock_task`'s blocked-list and delayed-list
/// lookups; both lists are small (bounded by `CFG_MAX_TASKS`) doubly-linked
/// FIFOs/sorted-lists over the same node pool.
fn find_in_list(head: &impl HasHead, pool: &NodePool, task: TaskId) -> Option<crate::core::pool::NodeHandle> {
    let mut current = head.head();
    while let Some(h) = current {
        if pool.get(h).tcb == task {
            return Some(h);
        }
        current = pool.get(h).next;
    }
    None
}

trait HasHead {
    fn head(&self) -> Option<crate::core::pool::NodeHandle>;
}

impl HasHead for BlockedList {
    fn head(&self) -> Option<crate::core::pool::NodeHandle> {
        PriorityList::head(self)
    }
}

impl HasHead for DelayedList {
    fn head(&self) -> Option<crate::core::pool::NodeHandle> {
        DelayedList::head(self)
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_reaches_ready_with_an_idle_task() {
        let mut k = Kernel::new();
        k.init().unwrap();
        assert_eq!(k.state(), KernelState::Ready);
        assert!(k.idle_task.is_some());
    }

    #[test]
    fn start_moves_ready_to_running() {
        let mut k = Kernel::new();
        k.init().unwrap();
        k.start().unwrap();
        assert_eq!(k.state(), KernelState::Running);
    }

    #[test]
    fn double_init_is_rejected() {
        let mut k = Kernel::new();
        k.init().unwrap();
        assert_eq!(k.init(), Err(KernelError::AlreadyInitialized));
    }

    #[test]
    fn create_and_select_highest_priority_task() {
        let mut k = Kernel::new();
        k.init().unwrap();
        k.start().unwrap();
        let low = k.create_task("low", 10).unwrap();
        let high = k.create_task("high", 200).unwrap();
        assert_eq!(k.schedule(ScheduleReason::Preemption).unwrap(), Some(high));
        assert_eq!(k.current_task(), Some(high));
        assert_eq!(k.tasks().get(high).state, TaskState::Running);
        k.terminate_task(high).unwrap();
        assert_eq!(k.schedule(ScheduleReason::TaskExit).unwrap(), Some(low));
        assert_eq!(k.tasks().get(low).state, TaskState::Running);
    }

    #[test]
    fn yield_rotates_to_the_next_equal_priority_peer() {
        let mut k = Kernel::new();
        k.init().unwrap();
        k.start().unwrap();
        let a = k.create_task("a", 50).unwrap();
        let b = k.create_task("b", 50).unwrap();

        assert_eq!(k.schedule(ScheduleReason::Preemption).unwrap(), Some(a));
        assert_eq!(k.tasks().get(a).state, TaskState::Running);

        assert_eq!(k.yield_task(a).unwrap(), Some(b));
        assert_eq!(k.current_task(), Some(b));
        assert_eq!(k.tasks().get(b).state, TaskState::Running);
        assert_eq!(k.tasks().get(a).state, TaskState::Ready);

        // `a` is back at the tail of its own class, not lost.
        assert_eq!(k.yield_task(b).unwrap(), Some(a));
        assert_eq!(k.tasks().get(a).state, TaskState::Running);
    }

    #[test]
    fn block_with_timeout_wakes_on_tick() {
        let mut k = Kernel::new();
        k.init().unwrap();
        k.start().unwrap();
        let t = k.create_task("sleeper", 50).unwrap();
        k.block_task(t, Some(5)).unwrap();
        assert_eq!(k.tasks().get(t).state, TaskState::Blocked);

        for _ in 0..4 {
            k.tick(1).unwrap();
            assert_eq!(k.tasks().get(t).state, TaskState::Blocked);
        }
        // wake_time = tick at block (0) + 5 = 5; the 5th tick matures the
        // delayed-list entry and the kernel's own tick() routes it through
        // unblock_task automatically, with no caller intervention needed.
        k.tick(1).unwrap();
        assert_eq!(k.tasks().get(t).state, TaskState::Ready);
    }

    #[test]
    fn unblock_before_timeout_cancels_the_pending_wake() {
        let mut k = Kernel::new();
        k.init().unwrap();
        k.start().unwrap();
        let t = k.create_task("sleeper", 50).unwrap();
        k.block_task(t, Some(100)).unwrap();
        k.unblock_task(t).unwrap();
        assert_eq!(k.tasks().get(t).state, TaskState::Ready);

        // The delayed-list entry was cancelled by the early unblock, so
        // ticking past the original timeout must not touch the task again
        // (it's already back in the ready queue under the scheduler).
        for _ in 0..200 {
            k.tick(1).unwrap();
        }
        assert_eq!(k.tasks().get(t).state, TaskState::Ready);
    }

    #[test]
    fn suspending_a_blocked_task_cancels_its_pending_wake() {
        let mut k = Kernel::new();
        k.init().unwrap();
        k.start().unwrap();
        let t = k.create_task("sleeper", 50).unwrap();
        k.block_task(t, Some(10)).unwrap();
        k.suspend_task(t).unwrap();
        assert_eq!(k.tasks().get(t).state, TaskState::Suspended);

        // Ticking past the original timeout must not resurrect the task
        // out from under the suspend — it stays suspended until resumed.
        for _ in 0..20 {
            k.tick(1).unwrap();
        }
        assert_eq!(k.tasks().get(t).state, TaskState::Suspended);

        k.resume_task(t).unwrap();
        assert_eq!(k.tasks().get(t).state, TaskState::Ready);
    }

    #[test]
    fn terminating_a_blocked_task_cancels_its_pending_wake() {
        let mut k = Kernel::new();
        k.init().unwrap();
        k.start().unwrap();
        let t = k.create_task("sleeper", 50).unwrap();
        k.block_task(t, Some(10)).unwrap();
        k.terminate_task(t).unwrap();

        // The delayed-list entry referencing the now-freed task slot must
        // not surface again on a later tick.
        for _ in 0..20 {
            k.tick(1).unwrap();
        }
    }
}
