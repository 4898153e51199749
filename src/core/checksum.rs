//! Deterministic structural checksum.
//!
//! Spec §9 permits "any deterministic word-at-a-time hash with the same
//! detection strength" in place of the reference implementation's
//! XOR-with-rotate; this is that hash. It is used over the preceding bytes
//! of a TCB, queue node, priority list, and the ready queue itself, so that
//! corruption of any field is detectable by the integrity checker
//! (component I) without needing a CRC table.

/// Compute a rotate-XOR checksum over a byte slice, seeded with `seed`.
///
/// Each byte is folded in after rotating the running checksum left by 5
/// bits, so that byte position (not just byte value) affects the result —
/// a straight XOR fold would be blind to transposed bytes.
#[inline]
pub fn checksum_bytes(seed: u32, bytes: &[u8]) -> u32 {
    let mut acc = seed;
    for &b in bytes {
        acc = acc.rotate_left(5) ^ (b as u32);
    }
    acc
}

/// Convenience wrapper for hashing a `#[repr(C)]` value's raw bytes.
///
/// # Safety
/// `T` must not contain padding bytes that vary between otherwise-equal
/// values, or the checksum will be unstable across copies. All checksummed
/// structures in this crate are `#[repr(C)]` with explicitly sized fields.
#[inline]
pub unsafe fn checksum_of<T>(seed: u32, value: &T) -> u32 {
    let bytes =
        unsafe { core::slice::from_raw_parts(value as *const T as *const u8, core::mem::size_of::<T>()) };
    checksum_bytes(seed, bytes)
}
