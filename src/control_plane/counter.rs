//! 64-bit counter reconstruction.
//!
//! The control plane reports large counters as two signed 32-bit halves in
//! two's complement. Each negative half is folded back into its unsigned range
//! before the halves are combined.

const HALF_RANGE: i64 = 1 << 32;

/// Fold a signed 32-bit half into `0..2^32`.
fn fold_half(half: i32) -> i64 {
    let mut value = i64::from(half);
    if value < 0 {
        value += HALF_RANGE;
    }
    value
}

/// Combine two signed 32-bit halves into the unsigned 64-bit counter.
///
/// # Panics
/// Panics if a folded half falls outside `0..2^32`, which can only happen if
/// the folding itself is broken.
pub fn reconstruct_u64(high: i32, low: i32) -> u64 {
    let high = fold_half(high);
    let low = fold_half(low);
    assert!(
        (0..HALF_RANGE).contains(&high) && (0..HALF_RANGE).contains(&low),
        "counter halves out of range after fold: high={high} low={low}"
    );

    ((high as u64) << 32) | (low as u64)
}

/// Split an unsigned counter back into the signed halves the control plane uses.
pub fn split_u64(value: u64) -> (i32, i32) {
    ((value >> 32) as u32 as i32, value as u32 as i32)
}
