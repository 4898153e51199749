//! Scheduler-core manager (component H, spec §4.H).
//!
//! Holds up to `CFG_MAX_SCHEDULERS` registered scheduler descriptors and
//! tracks which one is active. Exactly one scheduler may be `Active` at a
//! time; the rest sit `Inactive` ready to be swapped in (spec §4.H:
//! "switching the active scheduler is itself a scheduling decision and
//! must happen with the ready queue empty or fully migrated").

use crate::core::config::CFG_MAX_SCHEDULERS;
use crate::core::error::{KernelError, KernelResult};
use crate::core::pool::NodePool;
use crate::core::types::{SchedulerKind, SchedulerState};

use super::{AnyScheduler, Scheduler};

struct Slot {
    kind: SchedulerKind,
    state: SchedulerState,
    scheduler: AnyScheduler,
}

/// Descriptor snapshot returned to callers inspecting the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerDescriptor {
    pub id: usize,
    pub kind: SchedulerKind,
    pub state: SchedulerState,
}

pub struct SchedulerRegistry {
    slots: [Option<Slot>; CFG_MAX_SCHEDULERS],
    active: Option<usize>,
}

impl SchedulerRegistry {
    pub const fn new() -> Self {
        const NONE_SLOT: Option<Slot> = None;
        Self {
            slots: [NONE_SLOT; CFG_MAX_SCHEDULERS],
            active: None,
        }
    }

    pub fn init(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
        self.active = None;
    }

    /// Register a scheduler of `kind`, returning its slot id. `kind`s
    /// gated behind a disabled cargo feature return `NotEnabled`.
    pub fn register(&mut self, kind: SchedulerKind) -> KernelResult<usize> {
        let scheduler = AnyScheduler::new(kind).ok_or(KernelError::NotEnabled)?;
        for (id, slot) in self.slots.iter_mut().enumerate() {
            if slot.is_none() {
                let mut scheduler = scheduler;
                scheduler.init();
                *slot = Some(Slot {
                    kind,
                    state: SchedulerState::Inactive,
                    scheduler,
                });
                return Ok(id);
            }
        }
        Err(KernelError::NoResource)
    }

    /// Unregister `id`. Refuses to remove the active scheduler.
    pub fn unregister(&mut self, id: usize) -> KernelResult<()> {
        if Some(id) == self.active {
            return Err(KernelError::InvalidState);
        }
        match self.slots.get_mut(id) {
            Some(slot @ Some(_)) => {
                *slot = None;
                Ok(())
            }
            Some(None) => Err(KernelError::InvalidParameter),
            None => Err(KernelError::InvalidParameter),
        }
    }

    /// Activate `id`. The previously active scheduler (if any) is
    /// deinitialized and its tasks released back to `pool`; the caller is
    /// responsible for having already migrated any runnable tasks before
    /// calling this (spec §4.H).
    pub fn set_active(&mut self, id: usize, pool: &mut NodePool) -> KernelResult<()> {
        if id >= CFG_MAX_SCHEDULERS || self.slots[id].is_none() {
            return Err(KernelError::InvalidParameter);
        }
        if let Some(old) = self.active.take() {
            if let Some(slot) = self.slots[old].as_mut() {
                slot.scheduler.deinit(pool);
                slot.state = SchedulerState::Inactive;
            }
        }
        let slot = self.slots[id].as_mut().unwrap();
        slot.state = SchedulerState::Active;
        self.active = Some(id);
        Ok(())
    }

    pub fn get_active(&self) -> Option<&dyn Scheduler> {
        self.active
            .and_then(|id| self.slots[id].as_ref())
            .map(|s| &s.scheduler as &dyn Scheduler)
    }

    pub fn get_active_mut(&mut self) -> Option<&mut dyn Scheduler> {
        let id = self.active?;
        self.slots[id].as_mut().map(|s| &mut s.scheduler as &mut dyn Scheduler)
    }

    pub fn get_by_id(&self, id: usize) -> Option<SchedulerDescriptor> {
        self.slots.get(id)?.as_ref().map(|s| SchedulerDescriptor {
            id,
            kind: s.kind,
            state: s.state,
        })
    }

    pub fn active_id(&self) -> Option<usize> {
        self.active
    }

    /// When the active scheduler is the `Priority` algorithm, expose its
    /// backing ready queue directly so the kernel's integrity/repair path
    /// (spec §4.I) can operate on it. Other algorithms own a queue shape
    /// `core::integrity` doesn't know how to validate, so they are out of
    /// scope for this path by construction.
    pub fn active_priority_queue_mut(&mut self) -> Option<&mut crate::core::queue::ReadyQueue> {
        let id = self.active?;
        match self.slots[id].as_mut()?.scheduler {
            super::AnyScheduler::Priority(ref mut p) => Some(p.queue_mut()),
            _ => None,
        }
    }

    /// Structural sanity check: at most one `Active` slot, and it must
    /// match `self.active` (spec §4.H self-check).
    pub fn validate(&self) -> bool {
        let mut active_count = 0;
        for (id, slot) in self.slots.iter().enumerate() {
            if let Some(s) = slot {
                if s.state == SchedulerState::Active {
                    active_count += 1;
                    if self.active != Some(id) {
                        return false;
                    }
                }
            }
        }
        if active_count > 1 {
            return false;
        }
        if active_count == 0 && self.active.is_some() {
            return false;
        }
        true
    }
}

impl Default for SchedulerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_activate_round_robin() {
        let mut pool = NodePool::new();
        let mut reg = SchedulerRegistry::new();
        reg.init();
        let id = reg.register(SchedulerKind::RoundRobin).unwrap();
        reg.set_active(id, &mut pool).unwrap();
        assert_eq!(reg.active_id(), Some(id));
        assert!(reg.validate());
        assert_eq!(reg.get_active().unwrap().kind(), SchedulerKind::RoundRobin);
    }

    #[test]
    fn cannot_unregister_the_active_scheduler() {
        let mut pool = NodePool::new();
        let mut reg = SchedulerRegistry::new();
        reg.init();
        let id = reg.register(SchedulerKind::Priority).unwrap();
        reg.set_active(id, &mut pool).unwrap();
        assert_eq!(reg.unregister(id), Err(KernelError::InvalidState));
    }

    #[test]
    fn switching_active_deactivates_the_previous_one() {
        let mut pool = NodePool::new();
        let mut reg = SchedulerRegistry::new();
        reg.init();
        let a = reg.register(SchedulerKind::Priority).unwrap();
        let b = reg.register(SchedulerKind::RoundRobin).unwrap();
        reg.set_active(a, &mut pool).unwrap();
        reg.set_active(b, &mut pool).unwrap();
        assert_eq!(reg.get_by_id(a).unwrap().state, SchedulerState::Inactive);
        assert_eq!(reg.get_by_id(b).unwrap().state, SchedulerState::Active);
        assert!(reg.validate());
    }
}
