//! Platform abstraction layer.
//!
//! Everything boot/clock/SoC-specific is out of scope for this crate (spec
//! §1): this module is the narrow seam the core crosses to reach it. A real
//! board brings up its own linker script, vector table, and clock tree and
//! need only satisfy the functions below.
//!
//! The reference implementation inlines these concerns directly into
//! `src/port/cortex_m4/mod.rs` (PendSV-based context switching, SysTick
//! programming) and into ad-hoc `asm!` blocks in `core::critical`. This
//! module generalizes that into an explicit, documented contract so the
//! core crate compiles and tests identically on the host and on target.

#[cfg(target_arch = "arm")]
pub mod cortex_m4;

#[cfg(target_arch = "arm")]
pub use cortex_m4::*;

#[cfg(not(target_arch = "arm"))]
mod host;

#[cfg(not(target_arch = "arm"))]
pub use host::*;

/// Opaque saved interrupt-mask value, returned by [`mask_preempting_interrupts`]
/// and consumed by [`restore_interrupt_mask`]. Callers must treat this as
/// opaque and pass it back unchanged (spec §4.A `exit_from_isr`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterruptMask(pub u32);
