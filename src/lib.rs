//! Vigil RTOS: a scheduling substrate for deeply embedded Cortex-M targets
//!
//! Provides:
//! - A pluggable, priority-based preemptive scheduler core (fixed-priority,
//!   round-robin, and optionally EDF/RMS)
//! - A fixed-capacity task-state machine with transition history
//! - Self-checking ready-queue structures with escalating repair tiers
//! - A panic channel that survives reset and a system health monitor

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]

// ============ Critical Section ============

#[cfg(target_arch = "arm")]
mod cs_impl {
    use cortex_m::interrupt;
    use cortex_m::register::primask;
    use critical_section::{set_impl, Impl, RawRestoreState};

    struct SingleCoreCriticalSection;
    set_impl!(SingleCoreCriticalSection);

    unsafe impl Impl for SingleCoreCriticalSection {
        unsafe fn acquire() -> RawRestoreState {
            let was_active = primask::read().is_active();
            interrupt::disable();
            was_active
        }

        unsafe fn release(was_active: RawRestoreState) {
            if was_active {
                unsafe { interrupt::enable() }
            }
        }
    }
}

// ============ Modules ============

pub mod log;
mod lang_items;

pub mod core;
pub mod port;

// ============ Re-exports ============

pub use core::config;
pub use core::config::*;
pub use core::critical;
pub use core::error;
pub use core::error::{KernelError, KernelResult};
pub use core::kernel;
pub use core::kernel::Kernel;
pub use core::types;
pub use core::types::*;
pub use core::task;
pub use core::sched;
pub use core::panic as panic_channel;

#[cfg(feature = "pac")]
pub use stm32_metapac as pac;
