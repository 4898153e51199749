//! Escalating integrity repair (component I, spec §4.I).
//!
//! Each tier is strictly more invasive than the last. `repair` always
//! re-validates afterward and reports whatever [`IntegrityStatus`] that
//! produced, so a caller attempting `Minimal` first and escalating on
//! failure needs no extra bookkeeping.

use crate::core::config::CFG_MAX_TASKS;
use crate::core::pool::NodePool;
use crate::core::queue::ReadyQueue;
use crate::core::types::{IntegrityStatus, RepairTier, Tick};

/// Run a full structural validation without attempting repair.
pub fn check(queue: &mut ReadyQueue, pool: &NodePool) -> IntegrityStatus {
    queue.validate(pool)
}

/// Attempt repair at `tier`, re-validate, and report the resulting status.
/// A `Rebuild` that still fails to validate indicates corruption beyond
/// what this module can recover and is the caller's cue to route through
/// the panic channel (spec §4.I, §4.J).
pub fn repair(tier: RepairTier, queue: &mut ReadyQueue, pool: &mut NodePool) -> IntegrityStatus {
    queue.record_repair_attempt();

    match tier {
        RepairTier::Minimal => {
            // Cheapest possible fix: rewrite queue magics (spec §4.I).
            queue.rewrite_magics();
        }
        RepairTier::Moderate => {
            queue.rewrite_magics();
            if !queue.bitmap().mirrors_agree() {
                queue.bitmap_mut().resync_mirror();
            }
            queue.recompute_total_from_lists();
        }
        RepairTier::Aggressive => {
            queue.rewrite_magics();
            for prio in 0..crate::core::config::CFG_PRIO_LEVELS {
                let kept = queue.list_mut(prio as u8).rebuild(pool, CFG_MAX_TASKS);
                if kept > 0 {
                    queue.bitmap_mut().set(prio as u8);
                } else {
                    queue.bitmap_mut().clear(prio as u8);
                }
            }
            queue.bitmap_mut().resync_mirror();
            queue.recompute_total_from_lists();
        }
        RepairTier::Rebuild => {
            // The bitmap itself is no longer trusted, so wipe it outright
            // rather than resyncing the mirror against a primary that may
            // be the corrupt half. Magics and per-list structure are then
            // rebuilt exactly as `Aggressive` does; any node that still
            // passes its magic/checksum check survives.
            queue.bitmap_mut().wipe();
            queue.rewrite_magics();
            for prio in 0..crate::core::config::CFG_PRIO_LEVELS {
                let kept = queue.list_mut(prio as u8).rebuild(pool, CFG_MAX_TASKS);
                if kept > 0 {
                    queue.bitmap_mut().set(prio as u8);
                }
            }
            queue.recompute_total_from_lists();
        }
    }

    let status = queue.validate(pool);
    if status == IntegrityStatus::Ok {
        queue.record_repair_success();
    } else {
        queue.record_corruption();
    }
    status
}

/// Periodic automatic check driven by `CFG_INTEGRITY_INTERVAL_TICKS`.
/// Returns `Some(status)` when `now` has crossed the next scheduled check
/// (and advances `next_check` to the following interval), `None`
/// otherwise.
pub fn maybe_periodic_check(
    next_check: &mut Tick,
    now: Tick,
    queue: &mut ReadyQueue,
    pool: &NodePool,
) -> Option<IntegrityStatus> {
    if now < *next_check {
        return None;
    }
    *next_check = now.wrapping_add(crate::core::config::CFG_INTEGRITY_INTERVAL_TICKS);
    Some(check(queue, pool))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_repairs_a_bitmap_mirror_mismatch() {
        let mut pool = NodePool::new();
        let mut queue = ReadyQueue::new();
        queue.init();
        queue.insert(&mut pool, 1, 5, 0, false).unwrap();
        // Force only the mirror stale; primary/mirror now disagree.
        queue.bitmap_mut().clear(5);
        queue.bitmap_mut().set(5);
        assert_eq!(
            repair(RepairTier::Minimal, &mut queue, &mut pool),
            IntegrityStatus::Ok
        );
    }

    #[test]
    fn aggressive_drops_corrupt_nodes_and_recovers() {
        let mut pool = NodePool::new();
        let mut queue = ReadyQueue::new();
        queue.init();
        queue.insert(&mut pool, 1, 9, 0, false).unwrap();
        queue.insert(&mut pool, 2, 9, 0, false).unwrap();
        queue.list_mut(9).force_count_for_test(99);
        assert_eq!(check(&mut queue, &pool), IntegrityStatus::CountMismatch);
        assert_eq!(
            repair(RepairTier::Aggressive, &mut queue, &mut pool),
            IntegrityStatus::Ok
        );
    }

    #[test]
    fn rebuild_preserves_tasks_whose_nodes_are_still_valid() {
        let mut pool = NodePool::new();
        let mut queue = ReadyQueue::new();
        queue.init();
        queue.insert(&mut pool, 1, 3, 0, false).unwrap();
        queue.insert(&mut pool, 2, 3, 0, false).unwrap();
        // Desync the bitmap mirror, the corruption this tier is meant to
        // recover from without discarding intact nodes.
        queue.bitmap_mut().clear(3);
        assert_eq!(
            repair(RepairTier::Rebuild, &mut queue, &mut pool),
            IntegrityStatus::Ok
        );
        assert_eq!(queue.stats().total_tasks, 2);
        assert!(queue.bitmap().is_set(3));
    }

    #[test]
    fn rebuild_drops_only_nodes_that_fail_their_checksum() {
        let mut pool = NodePool::new();
        let mut queue = ReadyQueue::new();
        queue.init();
        queue.insert(&mut pool, 1, 3, 0, false).unwrap();
        let bad = queue.insert(&mut pool, 2, 3, 0, false).unwrap();
        // Corrupt one node's payload without updating its checksum; the
        // other node at the same priority is untouched.
        pool.get_mut(bad).tcb = 77;
        assert_eq!(
            repair(RepairTier::Rebuild, &mut queue, &mut pool),
            IntegrityStatus::Ok
        );
        assert_eq!(queue.stats().total_tasks, 1);
        assert!(!pool.is_allocated(bad));
    }

    #[test]
    fn periodic_check_fires_once_per_interval() {
        let mut pool = NodePool::new();
        let mut queue = ReadyQueue::new();
        queue.init();
        let mut next = 0;
        assert!(maybe_periodic_check(&mut next, 0, &mut queue, &pool).is_some());
        assert!(maybe_periodic_check(&mut next, 1, &mut queue, &pool).is_none());
        assert!(maybe_periodic_check(&mut next, crate::core::config::CFG_INTEGRITY_INTERVAL_TICKS, &mut queue, &pool).is_some());
    }
}
