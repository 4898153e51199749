//! Pluggable scheduler subsystem (components G + H, spec §4.G/§4.H).

pub mod priority;
pub mod registry;
pub mod round_robin;
pub mod traits;

#[cfg(feature = "edf")]
pub mod edf;
#[cfg(feature = "rms")]
pub mod rms;

pub use traits::Scheduler;

use crate::core::error::KernelResult;
use crate::core::pool::NodePool;
use crate::core::types::{Priority, ScheduleReason, SchedulerKind, TaskId, Tick};

/// Sum type over every compiled-in scheduler algorithm so the registry can
/// store concrete, `Sized` schedulers in a fixed array instead of needing
/// a heap allocator for `dyn Scheduler` (spec Non-goals: no heap).
pub enum AnyScheduler {
    RoundRobin(round_robin::RoundRobinScheduler),
    Priority(priority::PriorityScheduler),
    #[cfg(feature = "edf")]
    Edf(edf::EdfScheduler),
    #[cfg(feature = "rms")]
    Rms(rms::RmsScheduler),
}

impl AnyScheduler {
    pub fn new(kind: SchedulerKind) -> Option<Self> {
        match kind {
            SchedulerKind::RoundRobin => Some(Self::RoundRobin(round_robin::RoundRobinScheduler::new())),
            SchedulerKind::Priority => Some(Self::Priority(priority::PriorityScheduler::new())),
            #[cfg(feature = "edf")]
            SchedulerKind::Edf => Some(Self::Edf(edf::EdfScheduler::new())),
            #[cfg(not(feature = "edf"))]
            SchedulerKind::Edf => None,
            #[cfg(feature = "rms")]
            SchedulerKind::Rms => Some(Self::Rms(rms::RmsScheduler::new())),
            #[cfg(not(feature = "rms"))]
            SchedulerKind::Rms => None,
        }
    }
}

impl Scheduler for AnyScheduler {
    fn kind(&self) -> SchedulerKind {
        match self {
            Self::RoundRobin(s) => s.kind(),
            Self::Priority(s) => s.kind(),
            #[cfg(feature = "edf")]
            Self::Edf(s) => s.kind(),
            #[cfg(feature = "rms")]
            Self::Rms(s) => s.kind(),
        }
    }

    fn init(&mut self) {
        match self {
            Self::RoundRobin(s) => s.init(),
            Self::Priority(s) => s.init(),
            #[cfg(feature = "edf")]
            Self::Edf(s) => s.init(),
            #[cfg(feature = "rms")]
            Self::Rms(s) => s.init(),
        }
    }

    fn deinit(&mut self, pool: &mut NodePool) {
        match self {
            Self::RoundRobin(s) => s.deinit(pool),
            Self::Priority(s) => s.deinit(pool),
            #[cfg(feature = "edf")]
            Self::Edf(s) => s.deinit(pool),
            #[cfg(feature = "rms")]
            Self::Rms(s) => s.deinit(pool),
        }
    }

    fn enqueue(&mut self, pool: &mut NodePool, task: TaskId, priority: Priority, now: Tick) -> KernelResult<()> {
        match self {
            Self::RoundRobin(s) => s.enqueue(pool, task, priority, now),
            Self::Priority(s) => s.enqueue(pool, task, priority, now),
            #[cfg(feature = "edf")]
            Self::Edf(s) => s.enqueue(pool, task, priority, now),
            #[cfg(feature = "rms")]
            Self::Rms(s) => s.enqueue(pool, task, priority, now),
        }
    }

    fn dequeue(&mut self, pool: &mut NodePool, task: TaskId) -> KernelResult<()> {
        match self {
            Self::RoundRobin(s) => s.dequeue(pool, task),
            Self::Priority(s) => s.dequeue(pool, task),
            #[cfg(feature = "edf")]
            Self::Edf(s) => s.dequeue(pool, task),
            #[cfg(feature = "rms")]
            Self::Rms(s) => s.dequeue(pool, task),
        }
    }

    fn select_next(&mut self, pool: &mut NodePool) -> Option<TaskId> {
        match self {
            Self::RoundRobin(s) => s.select_next(pool),
            Self::Priority(s) => s.select_next(pool),
            #[cfg(feature = "edf")]
            Self::Edf(s) => s.select_next(pool),
            #[cfg(feature = "rms")]
            Self::Rms(s) => s.select_next(pool),
        }
    }

    fn requeue(&mut self, pool: &mut NodePool, task: TaskId, priority: Priority, now: Tick) -> KernelResult<()> {
        match self {
            Self::RoundRobin(s) => s.requeue(pool, task, priority, now),
            Self::Priority(s) => s.requeue(pool, task, priority, now),
            #[cfg(feature = "edf")]
            Self::Edf(s) => s.requeue(pool, task, priority, now),
            #[cfg(feature = "rms")]
            Self::Rms(s) => s.requeue(pool, task, priority, now),
        }
    }

    fn yield_task(&mut self, pool: &mut NodePool, task: TaskId, priority: Priority, now: Tick) -> KernelResult<()> {
        match self {
            Self::RoundRobin(s) => s.yield_task(pool, task, priority, now),
            Self::Priority(s) => s.yield_task(pool, task, priority, now),
            #[cfg(feature = "edf")]
            Self::Edf(s) => s.yield_task(pool, task, priority, now),
            #[cfg(feature = "rms")]
            Self::Rms(s) => s.yield_task(pool, task, priority, now),
        }
    }

    fn count(&self) -> u32 {
        match self {
            Self::RoundRobin(s) => s.count(),
            Self::Priority(s) => s.count(),
            #[cfg(feature = "edf")]
            Self::Edf(s) => s.count(),
            #[cfg(feature = "rms")]
            Self::Rms(s) => s.count(),
        }
    }

    fn need_reschedule(&self, reason: ScheduleReason) -> bool {
        match self {
            Self::RoundRobin(s) => s.need_reschedule(reason),
            Self::Priority(s) => s.need_reschedule(reason),
            #[cfg(feature = "edf")]
            Self::Edf(s) => s.need_reschedule(reason),
            #[cfg(feature = "rms")]
            Self::Rms(s) => s.need_reschedule(reason),
        }
    }

    fn change_priority(
        &mut self,
        pool: &mut NodePool,
        task: TaskId,
        old: Priority,
        new: Priority,
        now: Tick,
    ) -> KernelResult<()> {
        match self {
            Self::RoundRobin(s) => s.change_priority(pool, task, old, new, now),
            Self::Priority(s) => s.change_priority(pool, task, old, new, now),
            #[cfg(feature = "edf")]
            Self::Edf(s) => s.change_priority(pool, task, old, new, now),
            #[cfg(feature = "rms")]
            Self::Rms(s) => s.change_priority(pool, task, old, new, now),
        }
    }

    fn get_effective_priority(&self, task: TaskId) -> Option<Priority> {
        match self {
            Self::RoundRobin(s) => s.get_effective_priority(task),
            Self::Priority(s) => s.get_effective_priority(task),
            #[cfg(feature = "edf")]
            Self::Edf(s) => s.get_effective_priority(task),
            #[cfg(feature = "rms")]
            Self::Rms(s) => s.get_effective_priority(task),
        }
    }
}
