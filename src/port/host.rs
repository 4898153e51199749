//! Host stand-in for the platform layer, used when running the test suite
//! off-target (the reference's `port::stub` serves the same purpose).
//!
//! Interrupt masking becomes a plain counter since there is no real
//! interrupt controller to program; `cycle_counter` is backed by a software
//! counter advanced on each call so critical-section duration tests still
//! observe monotonically increasing values.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::port::InterruptMask;

static HOST_BASEPRI: AtomicU32 = AtomicU32::new(0);
static HOST_CYCLES: AtomicU32 = AtomicU32::new(0);

#[inline]
pub fn mask_preempting_interrupts(ceiling: u8) -> InterruptMask {
    let prev = HOST_BASEPRI.swap(ceiling as u32, Ordering::SeqCst);
    InterruptMask(prev)
}

#[inline]
pub fn restore_interrupt_mask(mask: InterruptMask) {
    HOST_BASEPRI.store(mask.0, Ordering::SeqCst);
}

#[inline(always)]
pub fn data_barrier() {}

#[inline(always)]
pub fn instr_barrier() {}

#[inline]
pub fn is_isr_context() -> bool {
    false
}

#[inline]
pub fn cycle_counter() -> u32 {
    HOST_CYCLES.fetch_add(1, Ordering::Relaxed)
}

pub fn system_time_ms(tick_count: u32, tick_rate_hz: u32) -> u32 {
    tick_count / (tick_rate_hz / 1000).max(1)
}

pub fn systick_init(_cpu_freq_hz: u32, _tick_rate_hz: u32) {}

#[inline]
pub fn disable_all_interrupts() {}

#[inline]
pub fn system_reset() -> ! {
    panic!("system_reset: host stub has no reset vector");
}

#[inline]
pub fn wait_for_interrupt() {}
