//! Critical-section gate (component A).
//!
//! Grounded on the reference's `critical_section`-crate-backed
//! `CriticalSection` RAII guard, generalized with the nesting counter,
//! timing accounting, and ISR-variant entry points spec §4.A requires and
//! the reference does not track.

use portable_atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

use crate::core::error::{KernelError, KernelResult};
use crate::port::{self, InterruptMask};

/// Interrupt priority ceiling above which preempting interrupts are masked
/// while a critical section is held. Interrupts at or above this numeric
/// priority may still run (so e.g. a NMI-class fault handler stays live).
const SYSCALL_CEILING: u8 = 0x80;

/// Critical-section control block (spec §3).
pub struct CriticalSectionGate {
    nesting_level: AtomicU8,
    saved_mask: AtomicU32,
    active: AtomicBool,
    enter_count: AtomicU32,
    exit_count: AtomicU32,
    cumulative_cycles: AtomicU32,
    peak_cycles: AtomicU32,
    timeout_cycles: AtomicU32,
    violations: AtomicU32,
    entry_cycle: AtomicU32,
}

/// Point-in-time snapshot of the gate's statistics (spec §4.A `stats()`).
#[derive(Debug, Clone, Copy, Default)]
pub struct CriticalSectionStats {
    pub enter_count: u32,
    pub exit_count: u32,
    pub cumulative_cycles: u32,
    pub peak_cycles: u32,
    pub violations: u32,
}

impl CriticalSectionGate {
    pub const fn new() -> Self {
        Self {
            nesting_level: AtomicU8::new(0),
            saved_mask: AtomicU32::new(0),
            active: AtomicBool::new(false),
            enter_count: AtomicU32::new(0),
            exit_count: AtomicU32::new(0),
            cumulative_cycles: AtomicU32::new(0),
            peak_cycles: AtomicU32::new(0),
            // Cycle-budget equivalent of CFG_CRITICAL_SECTION_TIMEOUT_MS at
            // bring-up's configured CPU frequency; recomputed by `set_timeout`.
            timeout_cycles: AtomicU32::new(
                crate::core::config::CFG_CPU_FREQ_HZ / 1000
                    * crate::core::config::CFG_CRITICAL_SECTION_TIMEOUT_MS,
            ),
            violations: AtomicU32::new(0),
            entry_cycle: AtomicU32::new(0),
        }
    }

    /// Enter the critical section, masking preempting interrupts on first
    /// nest. Panics if nesting would exceed 255 (spec §4.A).
    #[inline]
    pub fn enter(&self) {
        let level = self.nesting_level.load(Ordering::Acquire);
        if level == 0 {
            let mask = port::mask_preempting_interrupts(SYSCALL_CEILING);
            self.saved_mask.store(mask.0, Ordering::Release);
            self.active.store(true, Ordering::Release);
            self.entry_cycle.store(port::cycle_counter(), Ordering::Relaxed);
        } else if level == 255 {
            panic!("critical section nesting overflow");
        }
        self.nesting_level.store(level + 1, Ordering::Release);
        self.enter_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Exit the critical section, restoring the saved mask when nesting
    /// reaches zero. Panics on underflow (spec §4.A).
    #[inline]
    pub fn exit(&self) {
        let level = self.nesting_level.load(Ordering::Acquire);
        if level == 0 {
            panic!("critical section exit underflow");
        }
        let new_level = level - 1;
        self.nesting_level.store(new_level, Ordering::Release);
        self.exit_count.fetch_add(1, Ordering::Relaxed);

        if new_level == 0 {
            let now = port::cycle_counter();
            let entry = self.entry_cycle.load(Ordering::Relaxed);
            let duration = now.wrapping_sub(entry);

            self.cumulative_cycles.fetch_add(duration, Ordering::Relaxed);
            self.peak_cycles.fetch_max(duration, Ordering::Relaxed);

            if duration > self.timeout_cycles.load(Ordering::Relaxed) {
                self.violations.fetch_add(1, Ordering::Relaxed);
            }

            let mask = InterruptMask(self.saved_mask.load(Ordering::Acquire));
            self.active.store(false, Ordering::Release);
            port::restore_interrupt_mask(mask);
        }
    }

    /// Mask interrupts for an ISR-context critical section. Stateless: no
    /// nesting counter is kept, matching spec §4.A's "ISR variant" contract.
    /// The caller must pass the returned value back to
    /// [`exit_from_isr`](Self::exit_from_isr) unchanged.
    #[inline]
    pub fn enter_from_isr(&self) -> InterruptMask {
        port::mask_preempting_interrupts(SYSCALL_CEILING)
    }

    /// Restore the mask captured by [`enter_from_isr`](Self::enter_from_isr).
    #[inline]
    pub fn exit_from_isr(&self, saved: InterruptMask) {
        port::restore_interrupt_mask(saved);
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    #[inline]
    pub fn nesting(&self) -> u8 {
        self.nesting_level.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> CriticalSectionStats {
        CriticalSectionStats {
            enter_count: self.enter_count.load(Ordering::Relaxed),
            exit_count: self.exit_count.load(Ordering::Relaxed),
            cumulative_cycles: self.cumulative_cycles.load(Ordering::Relaxed),
            peak_cycles: self.peak_cycles.load(Ordering::Relaxed),
            violations: self.violations.load(Ordering::Relaxed),
        }
    }

    /// Reset accumulated statistics. Refuses while the gate is held (spec
    /// §4.A).
    pub fn reset_stats(&self) -> KernelResult<()> {
        if self.is_active() {
            return Err(KernelError::InvalidState);
        }
        self.enter_count.store(0, Ordering::Relaxed);
        self.exit_count.store(0, Ordering::Relaxed);
        self.cumulative_cycles.store(0, Ordering::Relaxed);
        self.peak_cycles.store(0, Ordering::Relaxed);
        self.violations.store(0, Ordering::Relaxed);
        Ok(())
    }

    /// Reconfigure the timeout budget, in milliseconds. Refuses while the
    /// gate is held (spec §4.A).
    pub fn set_timeout(&self, ms: u32) -> KernelResult<()> {
        if self.is_active() {
            return Err(KernelError::InvalidState);
        }
        let cycles = (crate::core::config::CFG_CPU_FREQ_HZ / 1000).saturating_mul(ms);
        self.timeout_cycles.store(cycles, Ordering::Relaxed);
        Ok(())
    }

    /// Whether violations have exceeded the configured budget relative to
    /// `enter_count` (spec §9's conservative default; surfaced so callers
    /// can choose to escalate to a panic).
    pub fn violations_over_budget(&self) -> bool {
        let enters = self.enter_count.load(Ordering::Relaxed);
        if enters == 0 {
            return false;
        }
        let violations = self.violations.load(Ordering::Relaxed) as u64;
        let budget = (enters as u64 * crate::core::config::CFG_CRITICAL_SECTION_VIOLATION_BUDGET_PPM as u64)
            / 10_000;
        violations > budget
    }
}

impl Default for CriticalSectionGate {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl Sync for CriticalSectionGate {}

/// Global critical-section gate instance.
pub static GATE: CriticalSectionGate = CriticalSectionGate::new();

/// RAII guard returned by [`enter`]. Exits the gate when dropped.
pub struct CriticalSection {
    _private: (),
}

impl CriticalSection {
    #[inline]
    pub fn enter() -> Self {
        GATE.enter();
        CriticalSection { _private: () }
    }
}

impl Drop for CriticalSection {
    #[inline]
    fn drop(&mut self) {
        GATE.exit();
    }
}

/// Execute a closure with the gate held, matching the reference's
/// `critical_section(|cs| ...)` call shape.
#[inline]
pub fn critical_section<F, R>(f: F) -> R
where
    F: FnOnce(&CriticalSection) -> R,
{
    let cs = CriticalSection::enter();
    f(&cs)
}

/// Whether the CPU is currently executing in ISR context.
#[inline]
pub fn is_isr_context() -> bool {
    port::is_isr_context()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairing_restores_nesting_and_mask() {
        let gate = CriticalSectionGate::new();
        assert_eq!(gate.nesting(), 0);
        gate.enter();
        gate.enter();
        gate.enter();
        assert_eq!(gate.nesting(), 3);
        assert!(gate.is_active());
        gate.exit();
        gate.exit();
        gate.exit();
        assert_eq!(gate.nesting(), 0);
        assert!(!gate.is_active());
    }

    #[test]
    #[should_panic(expected = "underflow")]
    fn exit_without_enter_panics() {
        let gate = CriticalSectionGate::new();
        gate.exit();
    }

    #[test]
    fn stats_are_monotonic() {
        let gate = CriticalSectionGate::new();
        for _ in 0..10 {
            gate.enter();
            gate.exit();
        }
        let stats = gate.stats();
        assert_eq!(stats.enter_count, 10);
        assert_eq!(stats.exit_count, 10);
    }

    #[test]
    fn reset_stats_refuses_while_active() {
        let gate = CriticalSectionGate::new();
        gate.enter();
        assert_eq!(gate.reset_stats(), Err(KernelError::InvalidState));
        gate.exit();
        assert!(gate.reset_stats().is_ok());
    }

    #[test]
    fn isr_variant_composes() {
        let gate = CriticalSectionGate::new();
        let saved = gate.enter_from_isr();
        gate.exit_from_isr(saved);
    }
}
