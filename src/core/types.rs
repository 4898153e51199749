//! Core type definitions shared across the scheduling substrate.

/// Task priority. 0 is the lowest urgency, 255 the highest (spec GLOSSARY).
pub type Priority = u8;

/// Tick counter type.
pub type Tick = u32;

/// Small integer index identifying a task/TCB slot (component C, F).
pub type TaskId = u16;

/// Task lifecycle state (spec §3, §4.F). `Invalid` is the value a freshly
/// allocated-but-uninitialized TCB holds; it is not itself reachable via a
/// state transition once a task has been created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TaskState {
    Invalid = 0,
    Created = 1,
    Ready = 2,
    Running = 3,
    Blocked = 4,
    Suspended = 5,
    Terminated = 6,
    Dormant = 7,
}

impl TaskState {
    pub const COUNT: usize = 8;

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Reason a scheduling decision is being (re)evaluated (spec §4.G).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ScheduleReason {
    Tick,
    Yield,
    Block,
    Unblock,
    PriorityChange,
    TaskExit,
    Preemption,
    Migration,
    ErrorRecovery,
}

/// Scheduler algorithm family (spec §3 "Scheduler descriptor").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SchedulerKind {
    RoundRobin = 0,
    Priority = 1,
    Edf = 2,
    Rms = 3,
}

/// Scheduler descriptor lifecycle state (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SchedulerState {
    Inactive,
    Active,
    Suspended,
    Error,
}

/// Integrity-check result taxonomy (spec §4.I).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IntegrityStatus {
    Ok,
    MagicFail,
    BitmapMismatch,
    NodeCorrupted,
    ListCorrupted,
    CycleDetected,
    CountMismatch,
}

/// Escalating repair tier (spec §4.I).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum RepairTier {
    Minimal = 0,
    Moderate = 1,
    Aggressive = 2,
    Rebuild = 3,
}

/// Overall kernel lifecycle FSM (spec §4.L).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum KernelState {
    Uninitialized,
    Initializing,
    Ready,
    Running,
    Suspended,
    Shutdown,
    Error,
}

/// Named hook invocation points (spec §4.L).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HookType {
    KernelPreStart,
    KernelPostStart,
    KernelPreShutdown,
    KernelPostShutdown,
    Idle,
    Tick,
    TaskCreate,
    TaskDelete,
    TaskSwitchIn,
    TaskSwitchOut,
    StackOverflow,
    MemoryAlloc,
    MemoryFree,
    MemoryCorruption,
    ErrorFatal,
    ErrorAssert,
    ErrorDeadlineMiss,
    AppLifecycle,
    Debug,
    CustomBase,
}

impl HookType {
    pub const COUNT: usize = 20;
}

/// Trend direction computed by the monitor over a half/half window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Trend {
    Increasing,
    Stable,
    Decreasing,
}

/// Anomaly class tracked by the monitor's hysteresis counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AnomalyClass {
    CpuLoad,
    DeadlineMiss,
    SchedulingLatency,
}

impl AnomalyClass {
    pub const COUNT: usize = 3;
}

/// Well-known service identifiers for the fixed service table (spec §4.L).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ServiceId {
    Logger = 0,
    FlashPersistence = 1,
    StatsExporter = 2,
    FaultReporter = 3,
    WatchdogFeeder = 4,
    TimeSource = 5,
    DebugConsole = 6,
    AppService = 7,
}

impl ServiceId {
    pub const COUNT: usize = 8;
}
