//! A single priority level's FIFO list of queue nodes.
//!
//! Generalizes the reference's `core::sched::rdy_list::ReadyList`
//! (intrusive doubly-linked list via raw `NonNull<OsTcb>`) into an
//! index-addressed list over the node pool (component C), per the
//! arena-of-indices design note in spec §9. Strictly FIFO: insert at the
//! tail, schedule from the head (spec §4.D).

use crate::core::checksum::checksum_bytes;
use crate::core::pool::{NodeHandle, NodePool};

/// One priority level's list (spec §3 "Priority list").
#[derive(Clone, Copy)]
pub struct PriorityList {
    head: Option<NodeHandle>,
    tail: Option<NodeHandle>,
    count: u16,
    checksum: u32,
}

impl PriorityList {
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
    pub fn tail(&self) -> Option<NodeHandle> {
        self.tail
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    #[inline]
    pub fn count(&self) -> u16 {
        self.count
    }

    /// Insert `handle` at the tail (FIFO order, spec §4.D).
    pub fn insert_tail(&mut self, pool: &mut NodePool, handle: NodeHandle) {
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
        self.count += 1;
        self.recompute_checksum();
    }

    /// Remove `handle` from the list. Caller guarantees `handle` is a
    /// member of this list (spec §4.D `remove`).
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

        let node = pool.get_mut(handle);
        node.next = None;
        node.prev = None;
        node.recompute_checksum();

        self.count = self.count.saturating_sub(1);
        self.recompute_checksum();
    }

    /// Re-derive `count` and relink head/tail by walking from `head`,
    /// dropping any node that fails its magic/checksum check. Used by the
    /// AGGRESSIVE repair tier (spec §4.I).
    pub fn rebuild(&mut self, pool: &mut NodePool, bound: usize) -> u16 {
        let mut kept_head = None;
        let mut kept_tail: Option<NodeHandle> = None;
        let mut count = 0u16;
        let mut current = self.head;
        let mut steps = 0;

        while let Some(handle) = current {
            steps += 1;
            if steps > bound {
                break;
            }
            let next = pool.get(handle).next;
            let valid = pool.is_allocated(handle)
                && pool.get(handle).magics_valid()
                && pool.get(handle).checksum_valid();

            if valid {
                let node = pool.get_mut(handle);
                node.prev = kept_tail;
                node.next = None;
                node.recompute_checksum();

                if let Some(tail) = kept_tail {
                    let tail_node = pool.get_mut(tail);
                    tail_node.next = Some(handle);
                    tail_node.recompute_checksum();
                } else {
                    kept_head = Some(handle);
                }
                kept_tail = Some(handle);
                count += 1;
            } else {
                pool.free(handle);
            }
            current = next;
        }

        self.head = kept_head;
        self.tail = kept_tail;
        self.count = count;
        self.recompute_checksum();
        count
    }

    /// Count the number of reachable nodes by traversal, bounded at
    /// `bound` steps to detect cycles (spec §4.D `validate`).
    pub fn traverse_count(&self, pool: &NodePool, bound: usize) -> Option<u16> {
        let mut count = 0u16;
        let mut current = self.head;
        let mut steps = 0;
        while let Some(handle) = current {
            steps += 1;
            if steps > bound {
                return None; // cycle or corruption
            }
            count += 1;
            current = pool.get(handle).next;
        }
        Some(count)
    }

    /// Floyd's tortoise-and-hare cycle check (spec §4.I).
    pub fn has_cycle(&self, pool: &NodePool) -> bool {
        let mut slow = self.head;
        let mut fast = self.head;
        loop {
            fast = match fast.and_then(|h| pool.get(h).next) {
                Some(h) => pool.get(h).next,
                None => return false,
            };
            slow = slow.and_then(|h| pool.get(h).next);
            match (slow, fast) {
                (Some(s), Some(f)) if s == f => return true,
                (None, _) | (_, None) => return false,
                _ => {}
            }
        }
    }

    fn recompute_checksum(&mut self) {
        let mut bytes = [0u8; 2 + 2 + 2];
        bytes[0..2].copy_from_slice(&encode(self.head).to_le_bytes());
        bytes[2..4].copy_from_slice(&encode(self.tail).to_le_bytes());
        bytes[4..6].copy_from_slice(&self.count.to_le_bytes());
        self.checksum = checksum_bytes(0x715E_0002, &bytes);
    }

    pub fn checksum_valid(&self) -> bool {
        let mut probe = *self;
        probe.recompute_checksum();
        probe.checksum == self.checksum
    }

    /// Force `count` to an inconsistent value without touching the chain,
    /// for exercising the integrity checker's `COUNT_MISMATCH` path.
    #[cfg(test)]
    pub fn force_count_for_test(&mut self, count: u16) {
        self.count = count;
        self.recompute_checksum();
    }
}

fn encode(h: Option<NodeHandle>) -> u16 {
    match h {
        Some(NodeHandle(idx)) => idx.wrapping_add(1),
        None => 0,
    }
}

impl Default for PriorityList {
    fn default() -> Self {
        Self::new()
    }
}
