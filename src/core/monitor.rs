//! Trend and anomaly monitor (component K, spec §4.K monitor layer).
//!
//! Runs over a retained window of the last `CFG_MONITOR_HISTORY_DEPTH`
//! samples, computed every `CFG_MONITOR_PERIOD_MS`. Trend compares the
//! mean of the first and second half of the window with a ±10% dead-band
//! to avoid flapping between `Increasing`/`Decreasing` on noise. Each
//! [`AnomalyClass`] has its own hysteresis counter; an alert fires once
//! `CFG_ANOMALY_ALERT_THRESHOLD` consecutive anomalous samples accumulate,
//! and resets the moment a sample is not anomalous.

use crate::core::config::{CFG_ANOMALY_ALERT_THRESHOLD, CFG_ANOMALY_CPU_PCT, CFG_MONITOR_HISTORY_DEPTH};
use crate::core::types::{AnomalyClass, Trend};

/// Retained window of raw scalar samples for trend analysis.
pub struct SampleWindow {
    samples: [u32; CFG_MONITOR_HISTORY_DEPTH],
    next: usize,
    filled: usize,
}

impl SampleWindow {
    pub const fn new() -> Self {
        Self {
            samples: [0; CFG_MONITOR_HISTORY_DEPTH],
            next: 0,
            filled: 0,
        }
    }

    pub fn push(&mut self, value: u32) {
        self.samples[self.next] = value;
        self.next = (self.next + 1) % CFG_MONITOR_HISTORY_DEPTH;
        if self.filled < CFG_MONITOR_HISTORY_DEPTH {
            self.filled += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.filled
    }

    fn ordered(&self) -> heapless::Vec<u32, CFG_MONITOR_HISTORY_DEPTH> {
        let mut out = heapless::Vec::new();
        for i in 0..self.filled {
            let idx = (self.next + CFG_MONITOR_HISTORY_DEPTH - self.filled + i) % CFG_MONITOR_HISTORY_DEPTH;
            let _ = out.push(self.samples[idx]);
        }
        out
    }

    /// Compare the mean of the window's first half against its second
    /// half. Needs at least 2 samples to say anything but `Stable`.
    pub fn trend(&self) -> Trend {
        if self.filled < 2 {
            return Trend::Stable;
        }
        let values = self.ordered();
        let mid = values.len() / 2;
        let (first, second) = values.split_at(mid);
        let mean = |s: &[u32]| -> u64 {
            if s.is_empty() {
                0
            } else {
                s.iter().map(|&v| v as u64).sum::<u64>() / s.len() as u64
            }
        };
        let first_mean = mean(first);
        let second_mean = mean(second);
        if first_mean == 0 {
            return if second_mean == 0 { Trend::Stable } else { Trend::Increasing };
        }
        // ±10% dead-band around the first-half mean.
        let band = first_mean / 10;
        if second_mean > first_mean + band {
            Trend::Increasing
        } else if second_mean + band < first_mean {
            Trend::Decreasing
        } else {
            Trend::Stable
        }
    }
}

impl Default for SampleWindow {
    fn default() -> Self {
        Self::new()
    }
}

/// Hysteresis counter for one anomaly class.
#[derive(Debug, Clone, Copy, Default)]
struct Hysteresis {
    consecutive: u32,
    alerted: bool,
}

impl Hysteresis {
    /// Feed one sample's anomalous/not-anomalous verdict. Returns `true`
    /// exactly on the edge where the alert threshold is first crossed.
    fn feed(&mut self, anomalous: bool) -> bool {
        if anomalous {
            self.consecutive += 1;
        } else {
            self.consecutive = 0;
            self.alerted = false;
        }
        if !self.alerted && self.consecutive >= CFG_ANOMALY_ALERT_THRESHOLD {
            self.alerted = true;
            return true;
        }
        false
    }
}

/// Per-class anomaly tracking plus the CPU-load trend window.
pub struct Monitor {
    load_window: SampleWindow,
    counters: [Hysteresis; AnomalyClass::COUNT],
}

impl Monitor {
    pub const fn new() -> Self {
        Self {
            load_window: SampleWindow::new(),
            counters: [Hysteresis {
                consecutive: 0,
                alerted: false,
            }; AnomalyClass::COUNT],
        }
    }

    pub fn init(&mut self) {
        *self = Self::new();
    }

    pub fn observe_cpu_load(&mut self, load_pct: u32) -> Option<AnomalyClass> {
        self.load_window.push(load_pct);
        let anomalous = load_pct >= CFG_ANOMALY_CPU_PCT;
        if self.counters[AnomalyClass::CpuLoad as usize].feed(anomalous) {
            Some(AnomalyClass::CpuLoad)
        } else {
            None
        }
    }

    pub fn observe(&mut self, class: AnomalyClass, anomalous: bool) -> Option<AnomalyClass> {
        if self.counters[class as usize].feed(anomalous) {
            Some(class)
        } else {
            None
        }
    }

    pub fn load_trend(&self) -> Trend {
        self.load_window.trend()
    }
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trend_detects_a_clear_rise() {
        let mut w = SampleWindow::new();
        for v in [10, 10, 10, 10, 90, 90, 90, 90] {
            w.push(v);
        }
        assert_eq!(w.trend(), Trend::Increasing);
    }

    #[test]
    fn trend_stays_stable_within_the_dead_band() {
        let mut w = SampleWindow::new();
        for v in [50, 51, 49, 50, 52, 48, 50, 51] {
            w.push(v);
        }
        assert_eq!(w.trend(), Trend::Stable);
    }

    #[test]
    fn alert_fires_once_after_threshold_and_resets_on_recovery() {
        let mut m = Monitor::new();
        m.init();
        assert!(m.observe_cpu_load(99).is_none());
        assert!(m.observe_cpu_load(99).is_none());
        assert_eq!(m.observe_cpu_load(99), Some(AnomalyClass::CpuLoad));
        // Already alerted: no repeat alert while it stays anomalous.
        assert!(m.observe_cpu_load(99).is_none());
        assert!(m.observe_cpu_load(10).is_none());
        assert!(m.observe_cpu_load(99).is_none());
        assert!(m.observe_cpu_load(99).is_none());
        assert_eq!(m.observe_cpu_load(99), Some(AnomalyClass::CpuLoad));
    }
}
