//! Numeric utilities: safe and centralized integer conversions.
//!
//! Prefer fallible conversions (returning `Option<T>`) when an out-of-range
//! value should stop the operation, and saturating ones for logging.

#[inline]
#[must_use]
pub fn i64_to_usize(v: i64) -> Option<usize> {
    usize::try_from(v).ok()
}

#[inline]
#[must_use]
pub fn usize_to_u64(v: usize) -> u64 {
    v as u64
}

#[inline]
#[must_use]
pub fn u128_to_u64_saturating(v: u128) -> u64 {
    if v > u128::from(u64::MAX) { u64::MAX } else { v as u64 }
}
