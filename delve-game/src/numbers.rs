//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Floor a f64 and clamp it to the i32 range, returning 0 for NaN values.
#[must_use]
pub fn floor_f64_to_i32(value: f64) -> i32 {
    if value.is_nan() {
        return 0;
    }
    let min = f64::from(i32::MIN);
    let max = f64::from(i32::MAX);
    let clamped = value.floor().clamp(min, max);
    cast::<f64, i32>(clamped).unwrap_or(0)
}

/// Ceil a f64 and clamp it to the i32 range, returning 0 for NaN values.
#[must_use]
pub fn ceil_f64_to_i32(value: f64) -> i32 {
    if value.is_nan() {
        return 0;
    }
    let min = f64::from(i32::MIN);
    let max = f64::from(i32::MAX);
    let clamped = value.ceil().clamp(min, max);
    cast::<f64, i32>(clamped).unwrap_or(0)
}

/// Convert a collection length to i32, saturating on overflow.
#[must_use]
pub fn usize_to_i32(value: usize) -> i32 {
    cast::<usize, i32>(value).unwrap_or(i32::MAX)
}

/// Convert a non-negative i32 to usize, mapping negatives to 0.
#[must_use]
pub fn i32_to_usize(value: i32) -> usize {
    cast::<i32, usize>(value).unwrap_or(0)
}

/// Convert a 32-bit unsigned value into the unit interval `[0, 1)`.
#[must_use]
pub fn u32_to_unit(value: u32) -> f64 {
    f64::from(value) / 4_294_967_296.0
}
