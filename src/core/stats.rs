//! System and per-task statistics (component K, spec §4.K).
//!
//! CPU load is tracked as an exponentially-weighted moving average
//! (`alpha = CFG_EWMA_ALPHA_MILLI / 1000`) sampled every
//! `CFG_SAMPLE_PERIOD_MS`, with a bounded circular history of the last
//! `CFG_STATS_HISTORY_DEPTH` samples kept in a `heapless::Vec` acting as a
//! ring (push-and-rotate, no heap).

use crate::core::config::{CFG_EWMA_ALPHA_MILLI, CFG_STATS_HISTORY_DEPTH};
use crate::core::task::TaskTable;
use crate::core::types::{TaskId, Tick};

/// One sample of system-wide load.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadSample {
    pub tick: Tick,
    pub cpu_load_pct: u32,
    pub idle_ticks: u32,
    pub busy_ticks: u32,
}

/// Circular history of load samples.
pub struct LoadHistory {
    samples: [LoadSample; CFG_STATS_HISTORY_DEPTH],
    next: usize,
    filled: usize,
}

impl LoadHistory {
    pub const fn new() -> Self {
        Self {
            samples: [LoadSample {
                tick: 0,
                cpu_load_pct: 0,
                idle_ticks: 0,
                busy_ticks: 0,
            }; CFG_STATS_HISTORY_DEPTH],
            next: 0,
            filled: 0,
        }
    }

    pub fn push(&mut self, sample: LoadSample) {
        self.samples[self.next] = sample;
        self.next = (self.next + 1) % CFG_STATS_HISTORY_DEPTH;
        if self.filled < CFG_STATS_HISTORY_DEPTH {
            self.filled += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    /// Most recent `n` samples, oldest first.
    pub fn recent(&self, n: usize) -> heapless::Vec<LoadSample, CFG_STATS_HISTORY_DEPTH> {
        let n = n.min(self.filled);
        let mut out = heapless::Vec::new();
        for i in 0..n {
            let idx = (self.next + CFG_STATS_HISTORY_DEPTH - n + i) % CFG_STATS_HISTORY_DEPTH;
            let _ = out.push(self.samples[idx]);
        }
        out
    }
}

impl Default for LoadHistory {
    fn default() -> Self {
        Self::new()
    }
}

/// Rolling system statistics: EWMA CPU load plus raw tick accounting and
/// retained history.
pub struct SystemStats {
    ewma_milli: u32,
    window_busy: u32,
    window_idle: u32,
    history: LoadHistory,
}

impl SystemStats {
    pub const fn new() -> Self {
        Self {
            ewma_milli: 0,
            window_busy: 0,
            window_idle: 0,
            history: LoadHistory::new(),
        }
    }

    pub fn init(&mut self) {
        *self = Self::new();
    }

    /// Record one sampling-period window's busy/idle tick counts and fold
    /// them into the EWMA (spec §4.K): `ewma' = alpha*sample + (1-alpha)*ewma`.
    pub fn record_window(&mut self, now: Tick, busy_ticks: u32, idle_ticks: u32) {
        let total = busy_ticks + idle_ticks;
        let sample_pct_milli = if total == 0 { 0 } else { (busy_ticks * 100_000) / total };
        self.ewma_milli = (CFG_EWMA_ALPHA_MILLI * sample_pct_milli
            + (1000 - CFG_EWMA_ALPHA_MILLI) * self.ewma_milli)
            / 1000;
        self.window_busy = busy_ticks;
        self.window_idle = idle_ticks;
        self.history.push(LoadSample {
            tick: now,
            cpu_load_pct: self.cpu_load_pct(),
            idle_ticks,
            busy_ticks,
        });
    }

    /// Current CPU load, as a whole percentage (0..=100).
    pub fn cpu_load_pct(&self) -> u32 {
        self.ewma_milli / 1000
    }

    pub fn history(&self) -> &LoadHistory {
        &self.history
    }
}

impl Default for SystemStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Update per-task runtime statistics after a task has run for
/// `runtime_ticks` (spec §4.K: min/max runtime, context-switch count).
pub fn record_task_runtime(tasks: &mut TaskTable, task: TaskId, runtime_ticks: u32) {
    let tcb = tasks.get_mut(task);
    tcb.stats.context_switches = tcb.stats.context_switches.wrapping_add(1);
    tcb.stats.runtime_min = tcb.stats.runtime_min.min(runtime_ticks);
    tcb.stats.runtime_max = tcb.stats.runtime_max.max(runtime_ticks);
    tcb.timing.last_runtime = runtime_ticks;
    tcb.timing.total_runtime = tcb.timing.total_runtime.wrapping_add(runtime_ticks as u64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ewma_converges_toward_a_steady_load() {
        let mut stats = SystemStats::new();
        stats.init();
        for _ in 0..50 {
            stats.record_window(0, 80, 20);
        }
        let load = stats.cpu_load_pct();
        assert!((78..=82).contains(&load), "load={load}");
    }

    #[test]
    fn history_keeps_only_the_configured_depth() {
        let mut stats = SystemStats::new();
        stats.init();
        for i in 0..(CFG_STATS_HISTORY_DEPTH as u32 + 5) {
            stats.record_window(i, 1, 1);
        }
        assert_eq!(stats.history().len(), CFG_STATS_HISTORY_DEPTH);
    }

    #[test]
    fn task_runtime_tracks_min_and_max() {
        let mut tasks = TaskTable::new();
        let t = tasks.create_task("t", 1).unwrap();
        record_task_runtime(&mut tasks, t, 10);
        record_task_runtime(&mut tasks, t, 30);
        record_task_runtime(&mut tasks, t, 5);
        let tcb = tasks.get(t);
        assert_eq!(tcb.stats.runtime_min, 5);
        assert_eq!(tcb.stats.runtime_max, 30);
        assert_eq!(tcb.stats.context_switches, 3);
    }
}
