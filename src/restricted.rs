//! Restricted digit set rendering.
//!
//! Some devices only have four input keys. For those, a token is written in base 4 using the
//! digits `0`, `1`, `2` and `3`, left-padded to a fixed width: 15 digits cover the nine-digit
//! standard space (4^15 > 10^9) and 20 digits cover the twelve-digit extended space
//! (4^20 > 10^12).

use crate::domain::Domain;
use crate::error::{Result, TokenError};

const RADIX: u64 = 4;

/// Renders `value` as `D::RESTRICTED_DIGITS` base-4 digits.
///
/// ```
/// use openpaygo_token::{restricted, Standard};
///
/// assert_eq!(restricted::encode::<Standard>(27), "000000000000123");
/// assert_eq!(restricted::decode("000000000000123").unwrap(), 27);
/// ```
#[must_use]
pub fn encode<D: Domain>(value: u64) -> String {
    debug_assert!(value <= D::MAX_CODE);
    let mut digits = vec![b'0'; D::RESTRICTED_DIGITS];
    let mut rest = value;
    for digit in digits.iter_mut().rev() {
        // Remainder is below RADIX
        *digit = b'0' + (rest % RADIX) as u8;
        rest /= RADIX;
    }
    digits.into_iter().map(char::from).collect()
}

/// Parses a base-4 digit string.
///
/// # Errors
///
/// Returns [`TokenError::TokenMalformed`] if `digits` is empty, contains anything other than
/// `0`-`3`, or is too long to fit a token.
pub fn decode(digits: &str) -> Result<u64> {
    if digits.is_empty() {
        return Err(TokenError::TokenMalformed);
    }
    digits.bytes().try_fold(0u64, |acc, digit| match digit {
        b'0'..=b'3' => acc
            .checked_mul(RADIX)
            .map(|acc| acc + u64::from(digit - b'0'))
            .ok_or(TokenError::TokenMalformed),
        _ => Err(TokenError::TokenMalformed),
    })
}
