//! Core RTOS modules.
//!
//! Scheduling substrate: critical-section gate, priority bitmap, node pool,
//! ready queue, blocked/suspended/delayed lists, task table and state
//! machine, pluggable scheduler, integrity repair, panic channel,
//! stats/monitor, hooks/services, and kernel bring-up.

pub mod bitmap;
pub mod checksum;
pub mod config;
pub mod critical;
pub mod cs_cell;
pub mod error;
pub mod hooks;
pub mod integrity;
pub mod kernel;
pub mod lists;
pub mod monitor;
pub mod panic;
pub mod pool;
pub mod queue;
pub mod sched;
pub mod services;
pub mod stats;
pub mod task;
pub mod types;
