//! Blocked, suspended and delayed task lists (component E, spec §4.E).
//!
//! Blocked and suspended lists are unordered FIFOs with exactly the shape
//! of a single ready-queue priority level, so they reuse
//! [`crate::core::queue::PriorityList`] directly rather than duplicating
//! its linkage code. The delayed list needs order (ascending wake time,
//! ties broken by insertion order) that a plain FIFO cannot give, so it
//! gets its own small sorted-insert structure built on the same node pool.

use crate::core::checksum::checksum_bytes;
use crate::core::config::CFG_MAX_TASKS;
use crate::core::pool::{NodeHandle, NodePool};
use crate::core::queue::PriorityList;
use crate::core::task::TaskTable;
use crate::core::types::{TaskId, Tick};

/// Doubly-linked FIFO of blocked tasks. A task inserted here may also have
/// a wake time set on its TCB (a blocking call with a timeout); the kernel
/// tick handler is responsible for scanning it alongside [`DelayedList`]
/// and unblocking anything whose timeout has matured.
pub type BlockedList = PriorityList;

/// Doubly-linked FIFO of suspended tasks.
pub type SuspendedList = PriorityList;

/// Delayed-task list: doubly-linked, kept sorted ascending by wake time,
/// ties broken by insertion order (spec §4.E). `wake_time` is read from
/// each member's TCB rather than duplicated on the node, so the list
/// never goes stale relative to the TCB that owns the timeout.
#[derive(Clone, Copy)]
pub struct DelayedList {
    head: Option<NodeHandle>,
    tail: Option<NodeHandle>,
    count: u16,
    checksum: u32,
}

impl DelayedList {
    pub const fn new() -> Self {
        Self {
            head: None,
            tail: None,
            count: 0,
            checksum: 0,
        }
    }

    pub fn init(&mut self) {
        *self = Self::new();
        self.recompute_checksum();
    }

    #[inline]
    pub fn head(&self) -> Option<NodeHandle> {
        self.head
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    #[inline]
    pub fn count(&self) -> u16 {
        self.count
    }

    /// Insert `task`, waking at `wake_time`. Stores `wake_time` on the
    /// task's TCB and links a freshly allocated node into sorted position.
    pub fn insert(
        &mut self,
        pool: &mut NodePool,
        tasks: &mut TaskTable,
        task: TaskId,
        wake_time: Tick,
    ) -> crate::core::error::KernelResult<NodeHandle> {
        tasks.get_mut(task).wake_time = wake_time;
        let handle = pool.allocate(task, wake_time)?;

        // Find the first node whose wake time is strictly greater than the
        // new entry's; insert immediately before it. Ties keep existing
        // entries ahead of the new one (earlier insertion first).
        let mut before = None;
        let mut current = self.head;
        while let Some(h) = current {
            let other_task = pool.get(h).tcb;
            if tasks.get(other_task).wake_time > wake_time {
                before = Some(h);
                break;
            }
            current = pool.get(h).next;
        }

        match before {
            None => self.link_at_tail(pool, handle),
            Some(b) => self.link_before(pool, handle, b),
        }

        self.count += 1;
        self.recompute_checksum();
        Ok(handle)
    }

    fn link_at_tail(&mut self, pool: &mut NodePool, handle: NodeHandle) {
        let node = pool.get_mut(handle);
        node.next = None;
        node.prev = self.tail;
        node.recompute_checksum();
        if let Some(tail) = self.tail {
            let tail_node = pool.get_mut(tail);
            tail_node.next = Some(handle);
            tail_node.recompute_checksum();
        } else {
            self.head = Some(handle);
        }
        self.tail = Some(handle);
    }

    fn link_before(&mut self, pool: &mut NodePool, handle: NodeHandle, before: NodeHandle) {
        let prev = pool.get(before).prev;
        {
            let node = pool.get_mut(handle);
            node.next = Some(before);
            node.prev = prev;
            node.recompute_checksum();
        }
        {
            let before_node = pool.get_mut(before);
            before_node.prev = Some(handle);
            before_node.recompute_checksum();
        }
        match prev {
            Some(p) => {
                let p_node = pool.get_mut(p);
                p_node.next = Some(handle);
                p_node.recompute_checksum();
            }
            None => self.head = Some(handle),
        }
    }

    /// Unlink `handle` and free it back to the pool.
    pub fn remove(&mut self, pool: &mut NodePool, handle: NodeHandle) {
        let (prev, next) = {
            let node = pool.get(handle);
            (node.prev, node.next)
        };
        match prev {
            Some(p) => {
                let p_node = pool.get_mut(p);
                p_node.next = next;
                p_node.recompute_checksum();
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                let n_node = pool.get_mut(n);
                n_node.prev = prev;
                n_node.recompute_checksum();
            }
            None => self.tail = prev,
        }
        pool.free(handle);
        self.count = self.count.saturating_sub(1);
        self.recompute_checksum();
    }

    /// Scan from the head, removing and returning every task whose wake
    /// time is `<= now`. Stops at the first entry still in the future
    /// (spec §4.E `process_delayed`), since the list is sorted.
    pub fn process_delayed(
        &mut self,
        pool: &mut NodePool,
        tasks: &TaskTable,
        now: Tick,
    ) -> heapless::Vec<TaskId, CFG_MAX_TASKS> {
        let mut matured = heapless::Vec::new();
        loop {
            let Some(handle) = self.head else { break };
            let task = pool.get(handle).tcb;
            if tasks.get(task).wake_time > now {
                break;
            }
            self.remove(pool, handle);
            let _ = matured.push(task);
        }
        matured
    }

    fn recompute_checksum(&mut self) {
        let mut bytes = [0u8; 6];
        bytes[0..2].copy_from_slice(&encode(self.head).to_le_bytes());
        bytes[2..4].copy_from_slice(&encode(self.tail).to_le_bytes());
        bytes[4..6].copy_from_slice(&self.count.to_le_bytes());
        self.checksum = checksum_bytes(0x0E1A_0004, &bytes);
    }

    pub fn checksum_valid(&self) -> bool {
        let mut probe = *self;
        probe.recompute_checksum();
        probe.checksum == self.checksum
    }
}

fn encode(h: Option<NodeHandle>) -> u16 {
    match h {
        Some(NodeHandle(idx)) => idx.wrapping_add(1),
        None => 0,
    }
}

impl Default for DelayedList {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delayed_wakes_come_back_in_ascending_time_order() {
        let mut pool = NodePool::new();
        let mut tasks = TaskTable::new();
        let mut delayed = DelayedList::new();
        delayed.init();

        let a = tasks.create_task("a", 1).unwrap();
        let b = tasks.create_task("b", 1).unwrap();
        let c = tasks.create_task("c", 1).unwrap();

        delayed.insert(&mut pool, &mut tasks, b, 50).unwrap();
        delayed.insert(&mut pool, &mut tasks, a, 10).unwrap();
        delayed.insert(&mut pool, &mut tasks, c, 30).unwrap();

        let woken = delayed.process_delayed(&mut pool, &tasks, 30);
        assert_eq!(woken.as_slice(), &[a, c]);
        assert_eq!(delayed.count(), 1);

        let woken = delayed.process_delayed(&mut pool, &tasks, 100);
        assert_eq!(woken.as_slice(), &[b]);
        assert!(delayed.is_empty());
    }

    #[test]
    fn ties_on_wake_time_preserve_insertion_order() {
        let mut pool = NodePool::new();
        let mut tasks = TaskTable::new();
        let mut delayed = DelayedList::new();
        delayed.init();

        let first = tasks.create_task("first", 1).unwrap();
        let second = tasks.create_task("second", 1).unwrap();

        delayed.insert(&mut pool, &mut tasks, first, 20).unwrap();
        delayed.insert(&mut pool, &mut tasks, second, 20).unwrap();

        let woken = delayed.process_delayed(&mut pool, &tasks, 20);
        assert_eq!(woken.as_slice(), &[first, second]);
    }

    #[test]
    fn blocked_list_is_a_plain_fifo() {
        let mut pool = NodePool::new();
        let mut blocked = BlockedList::new();
        blocked.init();
        let h1 = pool.allocate(1, 0).unwrap();
        let h2 = pool.allocate(2, 0).unwrap();
        blocked.insert_tail(&mut pool, h1);
        blocked.insert_tail(&mut pool, h2);
        assert_eq!(pool.get(blocked.head().unwrap()).tcb, 1);
        blocked.remove(&mut pool, h1);
        assert_eq!(pool.get(blocked.head().unwrap()).tcb, 2);
    }
}
