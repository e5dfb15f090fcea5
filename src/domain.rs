//! Type-level encoding of the two token code spaces.
//!
//! Standard tokens are nine decimal digits and carry their value in a three-digit base; extended
//! tokens are twelve digits with a six-digit base. The two spaces hash differently and must never
//! be mixed, so each is a distinct type implementing the sealed [`Domain`] trait.

use crate::digest::{keyed_hash, reduce_extended, reduce_standard};
use crate::key::SecretKey;

mod private {
    /// Marks a trait as being for crate-internal use only.
    pub trait Sealed {}

    impl Sealed for super::Standard {}
    impl Sealed for super::Extended {}
}

/// Raw value carried by a standard DISABLE_PAYG token.
pub const PAYG_DISABLE_VALUE: u32 = 998;
/// Raw value carried by a standard COUNTER_SYNC token.
pub const COUNTER_SYNC_VALUE: u32 = 999;

/// A token code space.
///
/// The base of a code is its `RING_SIZE` low-order part (the last three or six decimal digits);
/// values are added onto the starting code's base modulo `RING_SIZE`, and the remaining
/// high-order digits anchor the token to a position in the chain.
pub trait Domain: private::Sealed {
    /// Human-readable name, used in logs.
    const NAME: &'static str;
    /// Number of distinct bases.
    const RING_SIZE: u64;
    /// Largest code in this space.
    const MAX_CODE: u64;
    /// Decimal width of a rendered token.
    const DIGITS: usize;
    /// Width of a token rendered with the restricted digit set.
    const RESTRICTED_DIGITS: usize;
    /// Largest value a time token can carry.
    const MAX_ACTIVATION_VALUE: u32;
    /// Whether DISABLE_PAYG and COUNTER_SYNC commands exist in this space.
    const HAS_SENTINELS: bool;

    /// Advances a code by one position in the chain.
    fn step(code: u64, key: &SecretKey) -> u64;

    /// Extracts the base of a code.
    fn base(code: u64) -> u64 {
        code % Self::RING_SIZE
    }

    /// Replaces the base of a code, leaving the high-order digits untouched.
    fn put_base(code: u64, base: u64) -> u64 {
        debug_assert!(base < Self::RING_SIZE);
        code - Self::base(code) + base
    }

    /// Adds `value` onto a starting base.
    fn encode_base(starting_base: u64, value: u32) -> u64 {
        (starting_base + u64::from(value)) % Self::RING_SIZE
    }

    /// Recovers the value added onto `starting_base`.
    fn decode_base(starting_base: u64, token_base: u64) -> u32 {
        // Both bases are below RING_SIZE, which fits in a u32
        ((token_base + Self::RING_SIZE - starting_base) % Self::RING_SIZE) as u32
    }

    /// Whether `value` is the COUNTER_SYNC sentinel of this space.
    fn is_counter_sync(value: u32) -> bool {
        Self::HAS_SENTINELS && value == COUNTER_SYNC_VALUE
    }

    /// Whether `value` is one of the reserved sentinels of this space.
    fn is_sentinel(value: u32) -> bool {
        Self::HAS_SENTINELS && (value == COUNTER_SYNC_VALUE || value == PAYG_DISABLE_VALUE)
    }
}

/// Nine-digit token space with a three-digit base.
#[derive(Debug)]
pub enum Standard {}

/// Twelve-digit token space with a six-digit base.
#[derive(Debug)]
pub enum Extended {}

impl Domain for Standard {
    const NAME: &'static str = "standard";
    const RING_SIZE: u64 = 1_000;
    const MAX_CODE: u64 = 999_999_999;
    const DIGITS: usize = 9;
    const RESTRICTED_DIGITS: usize = 15;
    const MAX_ACTIVATION_VALUE: u32 = 995;
    const HAS_SENTINELS: bool = true;

    fn step(code: u64, key: &SecretKey) -> u64 {
        // Standard codes are below 10^9 and fit in four bytes, sent twice
        let word = (code as u32).to_be_bytes();
        let mut msg = [0u8; 8];
        msg[..4].copy_from_slice(&word);
        msg[4..].copy_from_slice(&word);
        reduce_standard(keyed_hash(key, &msg))
    }
}

impl Domain for Extended {
    const NAME: &'static str = "extended";
    const RING_SIZE: u64 = 1_000_000;
    const MAX_CODE: u64 = 999_999_999_999;
    const DIGITS: usize = 12;
    const RESTRICTED_DIGITS: usize = 20;
    const MAX_ACTIVATION_VALUE: u32 = 999_999;
    const HAS_SENTINELS: bool = false;

    fn step(code: u64, key: &SecretKey) -> u64 {
        reduce_extended(keyed_hash(key, &code.to_be_bytes()))
    }
}

/// Runtime selector between the two token spaces.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TokenFormat {
    /// See [`Standard`].
    Standard,
    /// See [`Extended`].
    Extended,
}

impl TokenFormat {
    /// Picks the token space from the length of an entered token.
    ///
    /// Returns `None` when the token is longer than any supported format.
    #[must_use]
    pub const fn from_len(len: usize, restricted_digit_set: bool) -> Option<Self> {
        let (standard, extended) = if restricted_digit_set {
            (Standard::RESTRICTED_DIGITS, Extended::RESTRICTED_DIGITS)
        } else {
            (Standard::DIGITS, Extended::DIGITS)
        };
        if len <= standard {
            Some(Self::Standard)
        } else if len <= extended {
            Some(Self::Extended)
        } else {
            None
        }
    }

    /// Longest token accepted for the given digit set.
    #[must_use]
    pub const fn max_len(restricted_digit_set: bool) -> usize {
        if restricted_digit_set {
            Extended::RESTRICTED_DIGITS
        } else {
            Extended::DIGITS
        }
    }
}
