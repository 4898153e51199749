//! Cortex-M4 platform implementation.
//!
//! Grounded on the reference's `src/port/cortex_m4/mod.rs`: BASEPRI-based
//! preempting-interrupt masking, SysTick programming, and a free-running
//! cycle counter (DWT) used for timing critical sections and transitions.
//! Context switching itself (PendSV) belongs to the architecture-traps
//! layer named out of scope in spec §1 ("supply fault notifications to the
//! panic channel") and is not reproduced here; boards wire their own
//! `PendSV`/`SysTick` handlers to call back into `core::kernel`.

use cortex_m::peripheral::syst::SystClkSource;

use crate::port::InterruptMask;

/// Mask all interrupts with priority numerically >= `ceiling` using BASEPRI
/// (spec §4.A: "mask all priorities numerically ≥ the configured syscall
/// ceiling"). Returns the previous BASEPRI value.
#[inline]
pub fn mask_preempting_interrupts(ceiling: u8) -> InterruptMask {
    let prev = get_basepri();
    data_barrier();
    set_basepri(ceiling);
    instr_barrier();
    InterruptMask(prev as u32)
}

/// Restore a previously saved BASEPRI value, with the barrier pairing
/// spec §4.A requires around any mask change.
#[inline]
pub fn restore_interrupt_mask(mask: InterruptMask) {
    data_barrier();
    set_basepri(mask.0 as u8);
    instr_barrier();
}

#[inline]
fn set_basepri(priority: u8) {
    unsafe {
        core::arch::asm!(
            "msr BASEPRI, {0}",
            in(reg) priority as u32,
            options(nomem, nostack, preserves_flags)
        );
    }
}

#[inline]
fn get_basepri() -> u8 {
    let basepri: u32;
    unsafe {
        core::arch::asm!(
            "mrs {0}, BASEPRI",
            out(reg) basepri,
            options(nomem, nostack, preserves_flags)
        );
    }
    basepri as u8
}

/// Data memory barrier.
#[inline(always)]
pub fn data_barrier() {
    cortex_m::asm::dmb();
}

/// Instruction synchronization barrier.
#[inline(always)]
pub fn instr_barrier() {
    cortex_m::asm::isb();
}

/// Whether the CPU is currently executing in an exception/ISR context.
#[inline]
pub fn is_isr_context() -> bool {
    let ipsr: u32;
    unsafe {
        core::arch::asm!(
            "mrs {0}, IPSR",
            out(reg) ipsr,
            options(nomem, nostack, preserves_flags)
        );
    }
    ipsr != 0
}

/// Free-running cycle counter, used for critical-section and transition
/// timing. Requires the DWT cycle counter to have been enabled during
/// board bring-up (out of scope here).
#[inline]
pub fn cycle_counter() -> u32 {
    cortex_m::peripheral::DWT::cycle_count()
}

/// Milliseconds since boot, derived from the tick counter maintained by
/// `core::kernel`. Boards are expected to drive the tick via their own
/// SysTick handler calling `core::kernel::os_tick_handler`.
pub fn system_time_ms(tick_count: u32, tick_rate_hz: u32) -> u32 {
    tick_count / (tick_rate_hz / 1000).max(1)
}

/// Program SysTick for the configured tick rate.
pub fn systick_init(cpu_freq_hz: u32, tick_rate_hz: u32) {
    let mut p = unsafe { cortex_m::Peripherals::steal() };
    let reload = cpu_freq_hz / tick_rate_hz;
    p.SYST.set_reload(reload.saturating_sub(1));
    p.SYST.clear_current();
    p.SYST.set_clock_source(SystClkSource::Core);
    p.SYST.enable_interrupt();
    p.SYST.enable_counter();
}

/// Disable all maskable interrupts unconditionally (panic channel entry,
/// spec §4.J).
#[inline]
pub fn disable_all_interrupts() {
    cortex_m::interrupt::disable();
}

/// Trigger a system reset (panic channel double-fault / auto-restart path).
#[inline]
pub fn system_reset() -> ! {
    cortex_m::peripheral::SCB::sys_reset();
}

/// Enter a low-power wait state until the next interrupt (panic channel
/// halt path, and the idle task's blocking point per spec §5).
#[inline]
pub fn wait_for_interrupt() {
    cortex_m::asm::wfi();
}
