//! Ready-queue node pool (component C).
//!
//! A compile-time array of `CFG_MAX_TASKS` queue nodes plus a bit-array of
//! occupancy, exactly as spec §4.C specifies. No heap is ever touched.
//! Grounded on the reference's node/TCB fixed-array pattern
//! (`static mut IDLE_TCB`, `static mut IDLE_STK`) generalized into an
//! explicit arena allocator, per the arena-of-indices design note in
//! spec §9.
//!
//! The pool is accessed only under the critical-section gate (spec §5), so
//! its "single-producer/single-consumer by virtue of being gated" property
//! from spec §4.C holds without additional synchronization here.

use crate::core::checksum::checksum_bytes;
use crate::core::config::CFG_MAX_TASKS;
use crate::core::error::{KernelError, KernelResult};
use crate::core::types::{TaskId, Tick};

const START_MAGIC: u32 = 0x4E4F4453; // "NODS"
const END_MAGIC: u32 = 0x53444F4E; // "SDON"
const OCC_WORDS: usize = (CFG_MAX_TASKS + 31) / 32;

/// Handle to a node in the pool. Stands in for the raw pointer the
/// reference threads through `next_ptr`/`prev_ptr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct NodeHandle(pub u16);

/// A single queue node (spec §3 "Queue node").
#[derive(Clone, Copy)]
pub struct Node {
    start_magic: u32,
    pub tcb: TaskId,
    pub next: Option<NodeHandle>,
    pub prev: Option<NodeHandle>,
    pub insertion_tick: Tick,
    checksum: u32,
    end_magic: u32,
}

impl Node {
    const fn empty() -> Self {
        Self {
            start_magic: START_MAGIC,
            tcb: 0,
            next: None,
            prev: None,
            insertion_tick: 0,
            checksum: 0,
            end_magic: END_MAGIC,
        }
    }

    /// Recompute the checksum over every field preceding it (spec §3: "a
    /// node is in at most one list" invariant is enforced by callers;
    /// this just keeps the checksum honest after any field write).
    pub fn recompute_checksum(&mut self) {
        let mut bytes = [0u8; 4 + 2 + 2 + 2 + 4];
        let mut off = 0;
        bytes[off..off + 4].copy_from_slice(&self.start_magic.to_le_bytes());
        off += 4;
        bytes[off..off + 2].copy_from_slice(&self.tcb.to_le_bytes());
        off += 2;
        bytes[off..off + 2].copy_from_slice(&encode_handle(self.next).to_le_bytes());
        off += 2;
        bytes[off..off + 2].copy_from_slice(&encode_handle(self.prev).to_le_bytes());
        off += 2;
        bytes[off..off + 4].copy_from_slice(&self.insertion_tick.to_le_bytes());
        self.checksum = checksum_bytes(0x5EED_0001, &bytes);
    }

    pub fn magics_valid(&self) -> bool {
        self.start_magic == START_MAGIC && self.end_magic == END_MAGIC
    }

    pub fn checksum_valid(&self) -> bool {
        let mut probe = *self;
        probe.recompute_checksum();
        probe.checksum == self.checksum
    }

    pub fn rewrite_magics(&mut self) {
        self.start_magic = START_MAGIC;
        self.end_magic = END_MAGIC;
    }
}

fn encode_handle(h: Option<NodeHandle>) -> u16 {
    match h {
        Some(NodeHandle(idx)) => idx.wrapping_add(1),
        None => 0,
    }
}

/// Fixed-capacity node arena with first-zero-bit allocation.
pub struct NodePool {
    nodes: [Node; CFG_MAX_TASKS],
    occupancy: [u32; OCC_WORDS],
}

impl NodePool {
    pub const fn new() -> Self {
        Self {
            nodes: [Node::empty(); CFG_MAX_TASKS],
            occupancy: [0; OCC_WORDS],
        }
    }

    pub fn init(&mut self) {
        self.nodes = [Node::empty(); CFG_MAX_TASKS];
        self.occupancy = [0; OCC_WORDS];
    }

    /// Allocate a node for `tcb`, returning its handle. `NO_RESOURCE` when
    /// the pool is exhausted (spec §4.C, §4.D).
    pub fn allocate(&mut self, tcb: TaskId, insertion_tick: Tick) -> KernelResult<NodeHandle> {
        for word_idx in 0..OCC_WORDS {
            let word = self.occupancy[word_idx];
            if word != u32::MAX {
                let bit = (!word).trailing_zeros();
                let idx = word_idx * 32 + bit as usize;
                if idx >= CFG_MAX_TASKS {
                    break;
                }
                self.occupancy[word_idx] |= 1 << bit;
                let node = &mut self.nodes[idx];
                *node = Node::empty();
                node.tcb = tcb;
                node.insertion_tick = insertion_tick;
                node.recompute_checksum();
                return Ok(NodeHandle(idx as u16));
            }
        }
        Err(KernelError::NoResource)
    }

    /// Free a node back to the pool, zeroing it first.
    pub fn free(&mut self, handle: NodeHandle) {
        let idx = handle.0 as usize;
        debug_assert!(idx < CFG_MAX_TASKS);
        self.nodes[idx] = Node::empty();
        self.occupancy[idx / 32] &= !(1 << (idx % 32));
    }

    #[inline]
    pub fn get(&self, handle: NodeHandle) -> &Node {
        &self.nodes[handle.0 as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, handle: NodeHandle) -> &mut Node {
        &mut self.nodes[handle.0 as usize]
    }

    pub fn is_allocated(&self, handle: NodeHandle) -> bool {
        let idx = handle.0 as usize;
        if idx >= CFG_MAX_TASKS {
            return false;
        }
        (self.occupancy[idx / 32] & (1 << (idx % 32))) != 0
    }

    pub fn allocated_count(&self) -> usize {
        self.occupancy.iter().map(|w| w.count_ones() as usize).sum()
    }
}

impl Default for NodePool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_and_free_round_trips() {
        let mut pool = NodePool::new();
        let h = pool.allocate(3, 10).unwrap();
        assert!(pool.is_allocated(h));
        assert_eq!(pool.get(h).tcb, 3);
        assert!(pool.get(h).checksum_valid());
        pool.free(h);
        assert!(!pool.is_allocated(h));
    }

    #[test]
    fn exhaustion_returns_no_resource() {
        let mut pool = NodePool::new();
        let mut handles = heapless::Vec::<NodeHandle, { CFG_MAX_TASKS }>::new();
        for i in 0..CFG_MAX_TASKS {
            handles.push(pool.allocate(i as TaskId, 0).unwrap()).unwrap();
        }
        assert_eq!(pool.allocate(0, 0), Err(KernelError::NoResource));
    }

    #[test]
    fn checksum_detects_corruption() {
        let mut pool = NodePool::new();
        let h = pool.allocate(1, 5).unwrap();
        assert!(pool.get(h).checksum_valid());
        pool.get_mut(h).tcb = 99; // corrupt without recomputing checksum
        assert!(!pool.get(h).checksum_valid());
    }
}
