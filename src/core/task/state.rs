//! Task-state transition table and validated transition execution
//! (component F, spec §4.F).
//!
//! The reference encodes transition legality ad hoc inside
//! `core::task::mod::os_task_change_state` with scattered `if` chains. Here
//! the rule set is a single static table, checked once by `is_allowed` and
//! reused by every caller, matching the spec's "static transition table"
//! requirement.

use crate::core::critical::critical_section;
use crate::core::task::tcb::Tcb;
use crate::core::types::{TaskState, Tick};
use crate::port;

/// Allowed destinations for each source state, indexed by
/// [`TaskState::index`]. Matches spec §4.F's table verbatim for the seven
/// rows it lists (`Invalid`, `Ready`, `Running`, `Blocked`, `Suspended`,
/// `Dormant`, `Terminated`). `Created` has no row in that table (spec §3
/// lists it among the eight legal states but §4.F's transition table never
/// names it); this crate treats it as the TCB's actual post-allocation
/// state (`TaskTable::create_task`/`Tcb::init` set it directly, bypassing
/// `transition()`, matching spec §3's "TCBs are allocated... at create
/// time") and gives it the same two destinations `Invalid` itself would
/// need to reach a running task: `Ready` and `Terminated`.
const ALLOWED: [&[TaskState]; TaskState::COUNT] = [
    /* Invalid    */ &[TaskState::Ready, TaskState::Dormant],
    /* Created    */ &[TaskState::Ready, TaskState::Terminated],
    /* Ready      */ &[
        TaskState::Running,
        TaskState::Blocked,
        TaskState::Suspended,
        TaskState::Terminated,
    ],
    /* Running    */ &[
        TaskState::Ready,
        TaskState::Blocked,
        TaskState::Suspended,
        TaskState::Terminated,
    ],
    /* Blocked    */ &[TaskState::Ready, TaskState::Suspended, TaskState::Terminated],
    /* Suspended  */ &[TaskState::Ready, TaskState::Terminated],
    /* Terminated */ &[],
    /* Dormant    */ &[TaskState::Ready, TaskState::Terminated],
];

/// Whether `to` is a legal destination from `from`.
pub fn is_allowed(from: TaskState, to: TaskState) -> bool {
    ALLOWED[from.index()].contains(&to)
}

/// Error returned when a caller requests an illegal transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IllegalTransition {
    pub from: TaskState,
    pub to: TaskState,
}

/// Validate and apply a state transition on `tcb`, recording it in the
/// task's history ring and updating the max-transition-time watermark
/// (spec §4.F: "the kernel tracks the longest time any transition has
/// taken"). Does not touch queue membership; callers in `core::task` are
/// responsible for moving the task between ready queue / blocked list /
/// suspended list to match the new state.
pub fn transition(tcb: &mut Tcb, to: TaskState, tick: Tick) -> Result<(), IllegalTransition> {
    let from = tcb.state;
    if from == to {
        // spec §4.F: a transition to the task's current state is a no-op,
        // not an illegal one — `ALLOWED` has no self-edges to express this.
        return Ok(());
    }
    if !is_allowed(from, to) {
        return Err(IllegalTransition { from, to });
    }
    critical_section(|_cs| {
        let start = port::cycle_counter();
        tcb.prev_state = from;
        tcb.state = to;
        tcb.record_transition(from, to, tick);
        tcb.recompute_checksum();
        let elapsed = port::cycle_counter().wrapping_sub(start);
        if elapsed > tcb.max_transition_cycles {
            tcb.max_transition_cycles = elapsed;
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_happy_path_is_allowed() {
        let mut tcb = Tcb::new();
        tcb.init(1, "t", 10);
        assert!(transition(&mut tcb, TaskState::Ready, 0).is_ok());
        assert!(transition(&mut tcb, TaskState::Running, 1).is_ok());
        assert!(transition(&mut tcb, TaskState::Blocked, 2).is_ok());
        assert!(transition(&mut tcb, TaskState::Ready, 3).is_ok());
        assert!(transition(&mut tcb, TaskState::Running, 4).is_ok());
        assert!(transition(&mut tcb, TaskState::Terminated, 5).is_ok());
        // Terminated is absorbing (spec §4.F / §8): nothing is a legal
        // destination from it, not even Dormant.
        assert!(transition(&mut tcb, TaskState::Dormant, 6).is_err());
        assert_eq!(tcb.state, TaskState::Terminated);
    }

    #[test]
    fn ready_can_block_directly() {
        // spec §4.F: READY -> BLOCKED is allowed without passing through
        // RUNNING first (e.g. a task blocking on a resource the instant
        // it's scheduled, before it has produced any observable runtime).
        let mut tcb = Tcb::new();
        tcb.init(1, "t", 10);
        transition(&mut tcb, TaskState::Ready, 0).unwrap();
        assert!(transition(&mut tcb, TaskState::Blocked, 1).is_ok());
    }

    #[test]
    fn suspended_cannot_go_directly_to_blocked() {
        // spec §4.F: SUSPENDED's only destinations are READY and
        // TERMINATED.
        let mut tcb = Tcb::new();
        tcb.init(1, "t", 10);
        transition(&mut tcb, TaskState::Ready, 0).unwrap();
        transition(&mut tcb, TaskState::Suspended, 1).unwrap();
        let err = transition(&mut tcb, TaskState::Blocked, 2).unwrap_err();
        assert_eq!(err, IllegalTransition {
            from: TaskState::Suspended,
            to: TaskState::Blocked,
        });
        assert_eq!(tcb.state, TaskState::Suspended);
    }

    #[test]
    fn dormant_reaches_ready_and_terminated_directly() {
        // spec §4.F's table lists DORMANT -> READY, TERMINATED as one-hop
        // transitions, not routed through any other state.
        let mut tcb = Tcb::new();
        tcb.init(1, "t", 10);
        tcb.state = TaskState::Dormant;
        assert!(transition(&mut tcb, TaskState::Ready, 0).is_ok());

        let mut tcb2 = Tcb::new();
        tcb2.init(2, "t2", 10);
        tcb2.state = TaskState::Dormant;
        assert!(transition(&mut tcb2, TaskState::Terminated, 0).is_ok());
    }

    #[test]
    fn same_state_transition_is_a_no_op() {
        // spec §4.F: "if same state, no-op succeeds" — not an illegal
        // transition, even for a state with no self-edge in `ALLOWED`.
        let mut tcb = Tcb::new();
        tcb.init(1, "t", 10);
        transition(&mut tcb, TaskState::Ready, 0).unwrap();
        transition(&mut tcb, TaskState::Running, 1).unwrap();
        assert!(transition(&mut tcb, TaskState::Running, 2).is_ok());
        assert_eq!(tcb.state, TaskState::Running);
    }

    #[test]
    fn terminated_is_absorbing() {
        let mut tcb = Tcb::new();
        tcb.init(1, "t", 10);
        transition(&mut tcb, TaskState::Ready, 0).unwrap();
        transition(&mut tcb, TaskState::Terminated, 1).unwrap();
        for to in [
            TaskState::Invalid,
            TaskState::Created,
            TaskState::Ready,
            TaskState::Running,
            TaskState::Blocked,
            TaskState::Suspended,
            TaskState::Dormant,
        ] {
            assert!(transition(&mut tcb, to, 2).is_err());
        }
        assert_eq!(tcb.state, TaskState::Terminated);
    }

    #[test]
    fn history_ring_records_each_hop() {
        let mut tcb = Tcb::new();
        tcb.init(1, "t", 10);
        transition(&mut tcb, TaskState::Ready, 100).unwrap();
        transition(&mut tcb, TaskState::Running, 101).unwrap();
        assert_eq!(tcb.history[0].from, Some(TaskState::Created));
        assert_eq!(tcb.history[0].to, Some(TaskState::Ready));
        assert_eq!(tcb.history[1].from, Some(TaskState::Ready));
        assert_eq!(tcb.history[1].to, Some(TaskState::Running));
    }
}
