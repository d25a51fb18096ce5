//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Floor a f64 and clamp it to the i32 range, returning 0 for NaN values.
#[must_use]
pub fn floor_f64_to_i32(value: f64) -> i32 {
    if value.is_nan() {
        return 0;
    }
    let min = cast::<i32, f64>(i32::MIN).unwrap_or(f64::MIN);
    let max = cast::<i32, f64>(i32::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(min, max).floor();
    cast::<f64, i32>(clamped).unwrap_or(0)
}

/// Arithmetic mean of a slice of integers, 0.0 when empty.
#[must_use]
pub fn mean_i32(values: &[i32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let total: f64 = values.iter().copied().map(f64::from).sum();
    let count = cast::<usize, f64>(values.len()).unwrap_or(1.0);
    total / count
}
