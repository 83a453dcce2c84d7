//! Seed normalization and per-growth seed derivation.

use crate::error::{NetworkError, Result};

/// Smallest value with twelve decimal digits.
const MIN_NORMALIZED_SEED: u128 = 100_000_000_000;

/// Stretch a raw user seed until it has at least twelve decimal digits.
///
/// Each pass appends the current value to itself as a decimal string, so
/// the digit count doubles: `42` becomes `4242424242424242`. A seed of zero
/// can never grow and is rejected.
pub fn normalize_seed(raw: u64) -> Result<u128> {
    if raw == 0 {
        return Err(NetworkError::invalid(
            "seed must be non-zero; 0 cannot be stretched to twelve digits",
        ));
    }

    let mut seed = u128::from(raw);
    while seed < MIN_NORMALIZED_SEED {
        let width = decimal_width(seed);
        seed = seed * 10u128.pow(width) + seed;
    }
    Ok(seed)
}

/// Combine the fixed primary seed with a growth index into a fresh seed.
///
/// The result is `floor((primary - index) / index)` evaluated in floating
/// point. It is a mixing step and cannot be inverted.
pub fn derive(primary: u128, growth_index: u64) -> Result<i128> {
    if growth_index == 0 {
        return Err(NetworkError::invalid(
            "growth index must be non-zero to derive a seed",
        ));
    }

    let primary = primary as f64;
    let index = growth_index as f64;
    Ok(((primary - index) / index).floor() as i128)
}

fn decimal_width(mut value: u128) -> u32 {
    let mut width = 1;
    while value >= 10 {
        value /= 10;
        width += 1;
    }
    width
}
