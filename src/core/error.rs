//! Kernel error type.
//!
//! Mirrors the reference's `OsError` in spirit (a flat `repr` enum plus a
//! `Result` alias, no `std::error::Error`) but maps the variants onto the
//! boundary taxonomy fixed by the specification (§6, §7) rather than the
//! reference's μC/OS-III-flavoured code list.

/// Error codes returned at the kernel boundary (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum KernelError {
    /// A required parameter was out of range or otherwise invalid.
    InvalidParameter = 1,
    /// A fixed-capacity pool or table has no free slot.
    NoMemory = 2,
    /// A resource (node, scheduler slot, queue entry) was unavailable.
    NoResource = 3,
    /// The operation is not valid for the object's current state.
    InvalidState = 4,
    /// A blocking operation's timeout elapsed.
    Timeout = 5,
    /// The caller is not permitted to perform this operation (e.g. from ISR).
    NotPermitted = 6,
    /// The kernel or object has not been initialized.
    NotInitialized = 7,
    /// The kernel or object has already been initialized.
    AlreadyInitialized = 8,
    /// Multitasking has already been started.
    AlreadyStarted = 9,
    /// A structural invariant was violated and automatic repair did not
    /// (or could not) restore it.
    Corrupted = 10,
    /// A task's stack canary was found overwritten.
    StackOverflow = 11,
    /// A bounded resource (priority list, history ring) is at capacity.
    LimitExceeded = 12,
    /// The referenced feature/service/scheduler is registered but disabled.
    NotEnabled = 13,
    /// A resource is below a configured low-water mark.
    LowResource = 14,
    /// An internal invariant failed in a way that does not fit another code.
    Internal = 15,
}

/// Result type alias for kernel operations.
pub type KernelResult<T> = Result<T, KernelError>;

impl KernelError {
    /// Severity class per the error taxonomy (spec §7).
    #[inline]
    pub fn is_contract_violation(self) -> bool {
        matches!(self, KernelError::InvalidParameter)
    }

    #[inline]
    pub fn is_resource_exhaustion(self) -> bool {
        matches!(
            self,
            KernelError::NoMemory | KernelError::NoResource | KernelError::LimitExceeded
        )
    }

    #[inline]
    pub fn is_corruption_suspicion(self) -> bool {
        matches!(self, KernelError::Corrupted)
    }
}
