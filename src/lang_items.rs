//! Language items and default exception handlers
//!
//! The panic handler and `HardFault` vector both funnel into
//! [`crate::core::panic::handle_rust_panic`] / [`crate::core::panic::capture`]
//! so a fault survives as a retained [`crate::core::panic::PanicContext`]
//! rather than just `udf()`-looping blind. A board that owns a live
//! `Kernel` and wants the real `KernelState` at fault time should call
//! `core::panic::capture` itself before reaching here; without that wiring
//! the state is reported as `Error`, which is the conservative default for
//! "a fault happened and nothing establishes otherwise".

#[cfg(all(feature = "defmt", target_arch = "arm"))]
use defmt_rtt as _;

#[cfg(all(feature = "defmt", target_arch = "arm"))]
use panic_probe as _;

#[cfg(all(feature = "defmt", target_arch = "arm"))]
#[defmt::panic_handler]
fn defmt_panic() -> ! {
    let _ = crate::core::panic::capture(
        0xDEF7,
        "rust panic (defmt path)",
        file!(),
        line!(),
        crate::core::types::KernelState::Error,
    );
    cortex_m::asm::udf()
}

#[cfg(not(feature = "defmt"))]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    crate::core::panic::handle_rust_panic(info, crate::core::types::KernelState::Error)
}

/// Default `HardFault` handler: captures what the exception frame offers
/// and routes it through the same channel as a Rust panic (spec §4.J: the
/// panic channel is the one place every fatal condition converges on).
#[cfg(target_arch = "arm")]
#[cortex_m_rt::exception]
unsafe fn HardFault(ef: &cortex_m_rt::ExceptionFrame) -> ! {
    let action = crate::core::panic::capture(
        0xFA17,
        "HardFault",
        file!(),
        line!(),
        crate::core::types::KernelState::Error,
    );
    let _ = ef;
    match action {
        crate::core::panic::RecoveryAction::AutoRestart => crate::port::system_reset(),
        crate::core::panic::RecoveryAction::Halt => loop {
            crate::port::wait_for_interrupt();
        },
    }
}

#[cfg(all(feature = "defmt", target_arch = "arm"))]
defmt::timestamp!("{=u32}", crate::port::cycle_counter());
