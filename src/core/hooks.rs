//! Hook chains (component L, spec §4.L).
//!
//! Each [`HookType`] has its own priority-sorted singly-linked chain of
//! callbacks. Registration inserts in priority order (ties broken by
//! insertion order); "disabling" a hook flips a bit rather than unlinking
//! it, so re-enabling is O(1) and doesn't disturb the chain's relative
//! order.

use crate::core::config::CFG_MAX_TASKS;
use crate::core::error::{KernelError, KernelResult};
use crate::core::types::HookType;

/// Hook callback signature: receives an opaque per-call argument (the
/// task id, tick count, or error code the call site has in hand) and
/// optionally returns a result word. Hooks observe, they do not veto, but
/// a chain's combined result is still meaningful (spec §4.L: "combine
/// non-null results, last non-null wins").
pub type HookFn = fn(u32) -> Option<u32>;

struct HookEntry {
    callback: HookFn,
    priority: u8,
    enabled: bool,
    calls: u32,
    total_cycles: u32,
    max_cycles: u32,
}

/// Fixed-capacity chain for one hook type. Capacity is bounded by
/// `CFG_MAX_TASKS` as a generous ceiling (spec doesn't fix a hook-chain
/// depth, so this reuses the task-count bound already audited for size).
pub struct HookChain {
    entries: heapless::Vec<HookEntry, CFG_MAX_TASKS>,
}

impl HookChain {
    pub const fn new() -> Self {
        Self {
            entries: heapless::Vec::new(),
        }
    }

    pub fn register(&mut self, callback: HookFn, priority: u8) -> KernelResult<()> {
        let insert_at = self
            .entries
            .iter()
            .position(|e| e.priority < priority)
            .unwrap_or(self.entries.len());
        self.entries
            .insert(
                insert_at,
                HookEntry {
                    callback,
                    priority,
                    enabled: true,
                    calls: 0,
                    total_cycles: 0,
                    max_cycles: 0,
                },
            )
            .map_err(|_| KernelError::LimitExceeded)
    }

    /// Disable every registered instance of `callback`. Does not unlink
    /// it (spec §4.L: "disabling flips a bit, it does not remove the
    /// node").
    pub fn disable(&mut self, callback: HookFn) {
        for entry in self.entries.iter_mut() {
            if core::ptr::eq(entry.callback as *const (), callback as *const ()) {
                entry.enabled = false;
            }
        }
    }

    pub fn enable(&mut self, callback: HookFn) {
        for entry in self.entries.iter_mut() {
            if core::ptr::eq(entry.callback as *const (), callback as *const ()) {
                entry.enabled = true;
            }
        }
    }

    /// Invoke every enabled entry in priority order, timing each call, and
    /// fold their results: the last non-null result wins (spec §4.L), and
    /// an entry returning `None` leaves the running result untouched.
    pub fn invoke(&mut self, arg: u32) -> Option<u32> {
        let mut result = None;
        for entry in self.entries.iter_mut() {
            if !entry.enabled {
                continue;
            }
            let start = crate::port::cycle_counter();
            let out = (entry.callback)(arg);
            let elapsed = crate::port::cycle_counter().wrapping_sub(start);
            entry.calls += 1;
            entry.total_cycles = entry.total_cycles.wrapping_add(elapsed);
            entry.max_cycles = entry.max_cycles.max(elapsed);
            if out.is_some() {
                result = out;
            }
        }
        result
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for HookChain {
    fn default() -> Self {
        Self::new()
    }
}

/// One chain per hook type.
pub struct HookTable {
    chains: [HookChain; HookType::COUNT],
}

impl HookTable {
    pub const fn new() -> Self {
        const EMPTY: HookChain = HookChain::new();
        Self {
            chains: [EMPTY; HookType::COUNT],
        }
    }

    pub fn init(&mut self) {
        *self = Self::new();
    }

    pub fn register(&mut self, hook: HookType, callback: HookFn, priority: u8) -> KernelResult<()> {
        self.chains[hook as usize].register(callback, priority)
    }

    pub fn invoke(&mut self, hook: HookType, arg: u32) -> Option<u32> {
        self.chains[hook as usize].invoke(arg)
    }

    pub fn chain(&self, hook: HookType) -> &HookChain {
        &self.chains[hook as usize]
    }

    pub fn chain_mut(&mut self, hook: HookType) -> &mut HookChain {
        &mut self.chains[hook as usize]
    }
}

impl Default for HookTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicU32, Ordering};

    static CALLS: AtomicU32 = AtomicU32::new(0);
    static LOW_FIRST: AtomicU32 = AtomicU32::new(0);
    static ORDER: AtomicU32 = AtomicU32::new(0);

    fn bump(_arg: u32) -> Option<u32> {
        CALLS.fetch_add(1, Ordering::SeqCst);
        None
    }

    fn record_first(_arg: u32) -> Option<u32> {
        ORDER.compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst).ok();
        LOW_FIRST.store(1, Ordering::SeqCst);
        None
    }

    fn record_second(_arg: u32) -> Option<u32> {
        ORDER.compare_exchange(1, 2, Ordering::SeqCst, Ordering::SeqCst).ok();
        None
    }

    fn returns_one(_arg: u32) -> Option<u32> {
        Some(1)
    }

    fn returns_two(_arg: u32) -> Option<u32> {
        Some(2)
    }

    fn returns_none(_arg: u32) -> Option<u32> {
        None
    }

    #[test]
    fn higher_priority_runs_first() {
        let mut chain = HookChain::new();
        chain.register(record_second, 10).unwrap();
        chain.register(record_first, 200).unwrap();
        chain.invoke(0);
        assert_eq!(ORDER.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn disable_skips_without_unlinking() {
        CALLS.store(0, Ordering::SeqCst);
        let mut chain = HookChain::new();
        chain.register(bump, 1).unwrap();
        chain.disable(bump);
        chain.invoke(0);
        assert_eq!(CALLS.load(Ordering::SeqCst), 0);
        assert_eq!(chain.len(), 1);
        chain.enable(bump);
        chain.invoke(0);
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn invoke_combines_results_last_non_null_wins() {
        // Priority order: returns_one (highest) runs first, then
        // returns_none, then returns_two (lowest) runs last. The final
        // combined result is the last non-null one seen in that order.
        let mut chain = HookChain::new();
        chain.register(returns_two, 1).unwrap();
        chain.register(returns_none, 50).unwrap();
        chain.register(returns_one, 200).unwrap();
        assert_eq!(chain.invoke(0), Some(2));
    }

    #[test]
    fn invoke_returns_none_when_every_entry_is_null() {
        let mut chain = HookChain::new();
        chain.register(bump, 1).unwrap();
        assert_eq!(chain.invoke(0), None);
    }

    #[test]
    fn table_dispatches_by_hook_type() {
        CALLS.store(0, Ordering::SeqCst);
        let mut table = HookTable::new();
        table.init();
        table.register(HookType::Tick, bump, 5).unwrap();
        table.invoke(HookType::Tick, 0);
        table.invoke(HookType::Idle, 0);
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }
}
