//! Well-known service registry (component L, spec §4.L).
//!
//! A fixed `CFG_SERVICE_SLOTS`-entry table keyed by [`ServiceId`]. Slots
//! may only be filled while the kernel is `Initializing` (spec §4.L:
//! "the service table is closed for registration once the kernel leaves
//! bring-up"); after that it is read-only and liveness is tracked by a
//! bitmap so a lookup never needs to branch on an `Option` in the hot
//! path.

use crate::core::config::CFG_SERVICE_SLOTS;
use crate::core::error::{KernelError, KernelResult};
use crate::core::types::{KernelState, ServiceId};

/// Opaque handle a service implementation registers: a function pointer
/// plus a raw context pointer it controls the meaning of. Kept minimal
/// since the kernel only ever forwards calls, never introspects payloads.
#[derive(Clone, Copy)]
pub struct ServiceHandle {
    pub call: fn(*mut (), u32),
    pub context: *mut (),
}

unsafe impl Send for ServiceHandle {}
unsafe impl Sync for ServiceHandle {}

pub struct ServiceRegistry {
    slots: [Option<ServiceHandle>; CFG_SERVICE_SLOTS],
    liveness: u32,
}

impl ServiceRegistry {
    pub const fn new() -> Self {
        const NONE: Option<ServiceHandle> = None;
        Self {
            slots: [NONE; CFG_SERVICE_SLOTS],
            liveness: 0,
        }
    }

    pub fn init(&mut self) {
        *self = Self::new();
    }

    /// Register `handle` under `id`. Only permitted during
    /// `KernelState::Initializing`.
    pub fn register(&mut self, id: ServiceId, handle: ServiceHandle, kernel_state: KernelState) -> KernelResult<()> {
        if kernel_state != KernelState::Initializing {
            return Err(KernelError::NotPermitted);
        }
        let idx = id as usize;
        self.slots[idx] = Some(handle);
        self.liveness |= 1 << idx;
        Ok(())
    }

    pub fn is_live(&self, id: ServiceId) -> bool {
        (self.liveness & (1 << id as usize)) != 0
    }

    pub fn get(&self, id: ServiceId) -> Option<&ServiceHandle> {
        self.slots[id as usize].as_ref()
    }

    /// Invoke the registered service with `arg`; a no-op if the slot is
    /// not live (spec §4.L: callers never need to branch on liveness
    /// themselves).
    pub fn invoke(&self, id: ServiceId, arg: u32) {
        if let Some(handle) = self.slots[id as usize] {
            (handle.call)(handle.context, arg);
        }
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicU32, Ordering};

    static SEEN: AtomicU32 = AtomicU32::new(0);

    fn recorder(_ctx: *mut (), arg: u32) {
        SEEN.store(arg, Ordering::SeqCst);
    }

    #[test]
    fn registration_is_rejected_outside_initializing() {
        let mut reg = ServiceRegistry::new();
        reg.init();
        let handle = ServiceHandle {
            call: recorder,
            context: core::ptr::null_mut(),
        };
        assert_eq!(
            reg.register(ServiceId::Logger, handle, KernelState::Running),
            Err(KernelError::NotPermitted)
        );
        assert!(reg
            .register(ServiceId::Logger, handle, KernelState::Initializing)
            .is_ok());
        assert!(reg.is_live(ServiceId::Logger));
    }

    #[test]
    fn invoke_is_a_no_op_for_unregistered_services() {
        let mut reg = ServiceRegistry::new();
        reg.init();
        reg.invoke(ServiceId::WatchdogFeeder, 7); // must not panic
        assert!(!reg.is_live(ServiceId::WatchdogFeeder));
    }

    #[test]
    fn invoke_forwards_the_argument() {
        SEEN.store(0, Ordering::SeqCst);
        let mut reg = ServiceRegistry::new();
        reg.init();
        let handle = ServiceHandle {
            call: recorder,
            context: core::ptr::null_mut(),
        };
        reg.register(ServiceId::AppService, handle, KernelState::Initializing).unwrap();
        reg.invoke(ServiceId::AppService, 99);
        assert_eq!(SEEN.load(Ordering::SeqCst), 99);
    }
}
