//! Fixed-point helpers for reward accounting.
//!
//! All reward math multiplies before it divides. [`mul_div`] widens the
//! product to 256 bits, so `a * b / d` only fails when the quotient itself
//! does not fit in a `u128`.

use crate::constants::SCALE;
use crate::error::MathError;

const LOW_MASK: u128 = u64::MAX as u128;

/// Full 256-bit product of two `u128` values as `(high, low)` halves.
fn widening_mul(a: u128, b: u128) -> (u128, u128) {
    let (a_hi, a_lo) = (a >> 64, a & LOW_MASK);
    let (b_hi, b_lo) = (b >> 64, b & LOW_MASK);

    let ll = a_lo * b_lo;
    let lh = a_lo * b_hi;
    let hl = a_hi * b_lo;
    let hh = a_hi * b_hi;

    let mid = (ll >> 64) + (lh & LOW_MASK) + (hl & LOW_MASK);
    let low = (ll & LOW_MASK) | (mid << 64);
    let high = hh + (lh >> 64) + (hl >> 64) + (mid >> 64);
    (high, low)
}

/// Compute `floor(a * b / denominator)` with a 256-bit intermediate.
///
/// ```
/// use stakeflow_core::math::mul_div;
/// assert_eq!(mul_div(u128::MAX, 6, 3).unwrap_err().to_string(), "arithmetic overflow");
/// assert_eq!(mul_div(u128::MAX, 3, 6).unwrap(), u128::MAX / 2);
/// ```
pub fn mul_div(a: u128, b: u128, denominator: u128) -> Result<u128, MathError> {
    if denominator == 0 {
        return Err(MathError::DivisionByZero);
    }
    if let Some(product) = a.checked_mul(b) {
        return Ok(product / denominator);
    }

    let (high, low) = widening_mul(a, b);
    // Quotient >= 2^128 whenever the high half reaches the denominator.
    if high >= denominator {
        return Err(MathError::Overflow);
    }

    // Restoring long division of (high:low) by denominator. The remainder
    // stays below the denominator; `carry` holds its shifted-out top bit.
    let mut rem = high;
    let mut quotient: u128 = 0;
    for bit in (0..128).rev() {
        let carry = rem >> 127;
        rem = (rem << 1) | ((low >> bit) & 1);
        quotient <<= 1;
        if carry == 1 || rem >= denominator {
            rem = rem.wrapping_sub(denominator);
            quotient |= 1;
        }
    }
    Ok(quotient)
}

/// `value * SCALE`.
pub fn to_scaled(value: u128) -> Result<u128, MathError> {
    value.checked_mul(SCALE).ok_or(MathError::Overflow)
}

/// `scaled / SCALE`, truncating.
pub fn from_scaled(scaled: u128) -> u128 {
    scaled / SCALE
}

/// `per_share_scaled * amount / SCALE`: unscaled reward owed on `amount`.
pub fn scaled_share(per_share_scaled: u128, amount: u128) -> Result<u128, MathError> {
    mul_div(per_share_scaled, amount, SCALE)
}

pub fn checked_add(a: u128, b: u128) -> Result<u128, MathError> {
    a.checked_add(b).ok_or(MathError::Overflow)
}

pub fn checked_sub(a: u128, b: u128) -> Result<u128, MathError> {
    a.checked_sub(b).ok_or(MathError::Overflow)
}

pub fn checked_mul(a: u128, b: u128) -> Result<u128, MathError> {
    a.checked_mul(b).ok_or(MathError::Overflow)
}
