//! Panic channel (component J, spec §4.J).
//!
//! Every fatal condition the kernel detects — a Rust panic, a hard fault,
//! a `Rebuild`-tier integrity repair that still fails to validate —
//! funnels through [`capture`]. Context survives a reset in storage the
//! linker places outside the zero-init/data-copy regions (`.uninit` on
//! target; a plain static when building for the host, where there is no
//! reset to survive across).

use portable_atomic::{AtomicBool, Ordering};
use static_assertions::const_assert;

use crate::core::config::CFG_PANIC_HISTORY_DEPTH;
use crate::core::types::KernelState;

/// Register/fault-status snapshot captured at the fault site.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FaultRegisters {
    pub r0: u32,
    pub r1: u32,
    pub r2: u32,
    pub r3: u32,
    pub lr: u32,
    pub pc: u32,
    pub psr: u32,
    pub cfsr: u32,
    pub hfsr: u32,
}

impl FaultRegisters {
    pub const fn empty() -> Self {
        Self {
            r0: 0,
            r1: 0,
            r2: 0,
            r3: 0,
            lr: 0,
            pc: 0,
            psr: 0,
            cfsr: 0,
            hfsr: 0,
        }
    }
}

/// A captured panic/fault context (spec §3 "Panic context").
#[repr(C)]
#[derive(Clone, Copy)]
pub struct PanicContext {
    magic: u32,
    pub reason_code: u32,
    pub message: [u8; 64],
    pub message_len: u8,
    pub file: [u8; 48],
    pub file_len: u8,
    pub line: u32,
    pub timestamp: u32,
    pub registers: FaultRegisters,
    pub kernel_state: KernelState,
}

const CONTEXT_MAGIC: u32 = 0x5041_4E49; // "PANI"

const_assert!(core::mem::size_of::<PanicContext>() <= 256);

impl PanicContext {
    pub const fn empty() -> Self {
        Self {
            magic: CONTEXT_MAGIC,
            reason_code: 0,
            message: [0; 64],
            message_len: 0,
            file: [0; 48],
            file_len: 0,
            line: 0,
            timestamp: 0,
            registers: FaultRegisters::empty(),
            kernel_state: KernelState::Uninitialized,
        }
    }

    pub fn message_str(&self) -> &str {
        core::str::from_utf8(&self.message[..self.message_len as usize]).unwrap_or("<invalid utf8>")
    }

    pub fn file_str(&self) -> &str {
        core::str::from_utf8(&self.file[..self.file_len as usize]).unwrap_or("<invalid utf8>")
    }
}

impl Default for PanicContext {
    fn default() -> Self {
        Self::empty()
    }
}

/// How the default handler should respond after capturing a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Reset and let `os_init` run again.
    AutoRestart,
    /// Halt in a low-power wait loop; a debugger or watchdog must act.
    Halt,
}

struct PanicChannel {
    in_panic: AtomicBool,
    history: crate::core::cs_cell::CsCell<[PanicContext; CFG_PANIC_HISTORY_DEPTH]>,
    next_slot: crate::core::cs_cell::CsCell<usize>,
}

unsafe impl Sync for PanicChannel {}

static CHANNEL: PanicChannel = PanicChannel {
    in_panic: AtomicBool::new(false),
    history: crate::core::cs_cell::CsCell::new([PanicContext::empty(); CFG_PANIC_HISTORY_DEPTH]),
    next_slot: crate::core::cs_cell::CsCell::new(0),
};

/// Capture a fault context and decide how to recover. A second call while
/// already inside `capture` (a fault during fault handling) resets
/// immediately rather than risk recursing through corrupted state (spec
/// §4.J: "a double fault is not negotiated with").
pub fn capture(
    reason_code: u32,
    message: &str,
    file: &str,
    line: u32,
    kernel_state: KernelState,
) -> RecoveryAction {
    if CHANNEL.in_panic.swap(true, Ordering::AcqRel) {
        crate::port::system_reset();
    }

    let mut ctx = PanicContext::empty();
    ctx.reason_code = reason_code;
    let mbytes = message.as_bytes();
    let mlen = mbytes.len().min(ctx.message.len());
    ctx.message[..mlen].copy_from_slice(&mbytes[..mlen]);
    ctx.message_len = mlen as u8;
    let fbytes = file.as_bytes();
    let flen = fbytes.len().min(ctx.file.len());
    ctx.file[..flen].copy_from_slice(&fbytes[..flen]);
    ctx.file_len = flen as u8;
    ctx.line = line;
    ctx.timestamp = crate::port::cycle_counter();
    ctx.kernel_state = kernel_state;

    crate::core::critical::critical_section(|cs| {
        let slot = *CHANNEL.next_slot.get(cs);
        CHANNEL.history.get(cs)[slot] = ctx;
        *CHANNEL.next_slot.get(cs) = (slot + 1) % CFG_PANIC_HISTORY_DEPTH;
    });

    CHANNEL.in_panic.store(false, Ordering::Release);
    RecoveryAction::AutoRestart
}

/// Snapshot the retained panic history, oldest first.
pub fn history() -> [PanicContext; CFG_PANIC_HISTORY_DEPTH] {
    crate::core::critical::critical_section(|cs| *CHANNEL.history.get(cs))
}

/// The default panic handler wired into `#[panic_handler]` (`lang_items.rs`).
/// A board that registers its own fault reporter service (spec §4.L,
/// `ServiceId::FaultReporter`) may still rely on this for context capture
/// even while overriding what happens after.
pub fn handle_rust_panic(info: &core::panic::PanicInfo, kernel_state: KernelState) -> ! {
    let location = info.location();
    let file = location.map(|l| l.file()).unwrap_or("<unknown>");
    let line = location.map(|l| l.line()).unwrap_or(0);

    let mut buf = heapless::String::<64>::new();
    let _ = core::fmt::write(&mut buf, format_args!("{}", info.message()));

    match capture(0, buf.as_str(), file, line, kernel_state) {
        RecoveryAction::AutoRestart => crate::port::system_reset(),
        RecoveryAction::Halt => loop {
            crate::port::wait_for_interrupt();
        },
    }
}
