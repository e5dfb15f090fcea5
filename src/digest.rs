//! Keyed hash and digest reduction.
//!
//! The token chain is driven by SipHash-2-4 keyed with the device's [`SecretKey`]. Every message
//! hashed by the protocol is exactly eight bytes long, and the 64-bit digest is then reduced
//! into one of the two decimal code spaces:
//!
//! | Domain   | Bits kept                              | Range                  |
//! |----------|----------------------------------------|------------------------|
//! | standard | bits 2..32 of `hi ^ lo` (30 bits)      | `0..=999_999_999`      |
//! | extended | bits 24..64 of the digest (40 bits)    | `0..=999_999_999_999`  |
//!
//! Reduced values that overflow the decimal range are folded back by a fixed offset rather than
//! by a modulo, matching deployed devices.

use core::hash::Hasher as _;

use siphasher::sip::SipHasher24;

use crate::key::SecretKey;

const STANDARD_MAX: u64 = 999_999_999;
const STANDARD_FOLD: u64 = 73_741_825;
const EXTENDED_MAX: u64 = 999_999_999_999;
const EXTENDED_FOLD: u64 = 99_511_627_777;

/// SipHash-2-4 of `msg` under `key`.
///
/// The digest is returned in the byte order deployed devices read it in: the eight output bytes
/// interpreted as a big-endian integer.
pub(crate) fn keyed_hash(key: &SecretKey, msg: &[u8]) -> u64 {
    let mut hasher = SipHasher24::new_with_key(key.as_bytes());
    hasher.write(msg);
    hasher.finish().swap_bytes()
}

/// Reduces a digest to a standard (nine-digit) code.
pub(crate) fn reduce_standard(digest: u64) -> u64 {
    let hi = digest >> 32;
    let lo = digest & 0xffff_ffff;
    // Drop the two lowest-order bits, keeping 30
    let code = ((hi ^ lo) >> 2) & 0x3fff_ffff;
    if code > STANDARD_MAX {
        code - STANDARD_FOLD
    } else {
        code
    }
}

/// Reduces a digest to an extended (twelve-digit) code.
pub(crate) fn reduce_extended(digest: u64) -> u64 {
    // Keep the 40 highest-order bits
    let code = digest >> 24;
    if code > EXTENDED_MAX {
        code - EXTENDED_FOLD
    } else {
        code
    }
}
