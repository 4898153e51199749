//! Compile-time configuration for the kernel
//!
//! These constants control the resource limits and timing behavior of the
//! scheduling substrate. All bounds are checked at compile time via
//! `static_assertions` so an out-of-range configuration fails the build
//! rather than the certification audit.

use static_assertions::const_assert;

/// Maximum number of tasks the kernel can track simultaneously (TCB pool
/// size, node pool size). Bounded to 256 by the 256-bit priority bitmap.
pub const CFG_MAX_TASKS: usize = 64;

/// Number of priority levels. 255 is the highest urgency, 0 the lowest.
pub const CFG_PRIO_LEVELS: usize = 256;

/// System tick rate in Hz.
pub const CFG_TICK_RATE_HZ: u32 = 1000;

/// CPU core clock frequency in Hz, used to derive the SysTick reload value.
pub const CFG_CPU_FREQ_HZ: u32 = 16_000_000;

/// Default round-robin time-slice quantum, in ticks.
pub const CFG_TIME_SLICE_DEFAULT: u32 = 10;

/// Minimum permitted task stack size, in stack words.
pub const CFG_STACK_SIZE_MIN: usize = 64;

/// Default task stack size, in stack words, when none is specified.
pub const CFG_STACK_SIZE_DEFAULT: usize = 256;

/// Idle task stack size, in stack words.
pub const CFG_STACK_SIZE_IDLE: usize = 128;

/// 32-bit canary word written just inside the stack limit to detect
/// stack-overflow by corruption.
pub const CFG_STACK_CANARY: u32 = 0xDEAD_C0DE;

/// Fill pattern used to paint unused stack for high-water-mark analysis.
pub const CFG_STACK_FILL: u32 = 0xA5A5_A5A5;

/// Number of MPU regions reserved per task (0 disables MPU usage).
pub const CFG_MPU_REGIONS: usize = 0;

/// Default scheduler kind selected at kernel bring-up.
pub const CFG_DEFAULT_SCHEDULER: crate::core::types::SchedulerKind =
    crate::core::types::SchedulerKind::Priority;

/// Maximum number of schedulers the scheduler-core manager can register.
pub const CFG_MAX_SCHEDULERS: usize = 4;

/// Critical-section timeout budget, in milliseconds, before a violation is
/// counted (spec §4.A).
pub const CFG_CRITICAL_SECTION_TIMEOUT_MS: u32 = 5;

/// Fraction of `enter_count`, expressed in parts-per-10000, that
/// accumulated critical-section timeout violations may reach within the
/// current statistics sampling window before the kernel panics (spec §9,
/// "conservative default ... panic when violations exceed 0.1% of
/// enter_count").
pub const CFG_CRITICAL_SECTION_VIOLATION_BUDGET_PPM: u32 = 10; // 0.1% = 10/10_000

/// Integrity check interval, in ticks, between automatic MODERATE passes.
pub const CFG_INTEGRITY_INTERVAL_TICKS: u32 = 1000;

/// Statistics sampling period, in milliseconds.
pub const CFG_SAMPLE_PERIOD_MS: u32 = 100;

/// Monitor trend-computation period, in milliseconds.
pub const CFG_MONITOR_PERIOD_MS: u32 = 10;

/// CPU-load EWMA smoothing factor (alpha), as a fixed-point fraction of 1000.
pub const CFG_EWMA_ALPHA_MILLI: u32 = 200; // alpha = 0.2

/// CPU-load anomaly threshold, as a percentage.
pub const CFG_ANOMALY_CPU_PCT: u32 = 95;

/// Scheduling-decision latency anomaly threshold, in microseconds.
pub const CFG_ANOMALY_LATENCY_US: u32 = 10;

/// Number of anomalies of a given class that must accumulate before an
/// alert is raised.
pub const CFG_ANOMALY_ALERT_THRESHOLD: u32 = 3;

/// Depth of the per-task state-transition history ring (spec §4.F).
pub const CFG_STATE_HISTORY_DEPTH: usize = 8;

/// Depth of the panic history ring that survives reset in `noinit` storage.
pub const CFG_PANIC_HISTORY_DEPTH: usize = 3;

/// Depth of the statistics circular sample history.
pub const CFG_STATS_HISTORY_DEPTH: usize = 60;

/// Depth of the monitor's retained sample window.
pub const CFG_MONITOR_HISTORY_DEPTH: usize = 100;

/// Number of slots reserved in the well-known service registry.
pub const CFG_SERVICE_SLOTS: usize = 8;

const_assert!(CFG_MAX_TASKS > 0 && CFG_MAX_TASKS <= 256);
const_assert!(CFG_PRIO_LEVELS > 0 && CFG_PRIO_LEVELS <= 256);
const_assert!(CFG_STACK_SIZE_MIN > 0);
const_assert!(CFG_MAX_SCHEDULERS > 0);
const_assert!(CFG_STATE_HISTORY_DEPTH.is_power_of_two());
