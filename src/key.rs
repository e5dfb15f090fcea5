//! Shared secret between a backend and a device.

use core::fmt;
use core::str::FromStr;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::digest::{keyed_hash, reduce_standard};
use crate::error::{Result, TokenError};

/// Length of a secret key in bytes.
pub const SECRET_KEY_BYTES: usize = 16;

/// 128-bit secret shared between the token issuer and a single device.
///
/// Keys are exchanged as 32 hexadecimal characters (case-insensitive, no separators). The raw
/// bytes are zeroized on drop and never printed by `Debug`.
///
/// ```
/// use openpaygo_token::SecretKey;
///
/// let key: SecretKey = "bc41ec9530f6dac86b1a29ab82edc5fb".parse().unwrap();
/// assert!("bc41ec95".parse::<SecretKey>().is_err());
/// # let _ = key;
/// ```
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; SECRET_KEY_BYTES]);

impl SecretKey {
    /// Wraps raw key bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; SECRET_KEY_BYTES]) -> Self {
        Self(bytes)
    }

    /// Parses a key from its 32-character hexadecimal form.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::KeyFormatInvalid`] if the input is not valid hex or does not decode
    /// to exactly 16 bytes.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let mut bytes = [0u8; SECRET_KEY_BYTES];
        hex::decode_to_slice(hex, &mut bytes).map_err(|_| TokenError::KeyFormatInvalid)?;
        Ok(Self(bytes))
    }

    /// The raw key bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; SECRET_KEY_BYTES] {
        &self.0
    }

    /// Derives the device's starting code: the key hashed with itself, reduced into the
    /// standard nine-digit code space.
    ///
    /// Devices are usually provisioned with this value, but callers may also store and pass an
    /// explicit starting code instead.
    #[must_use]
    pub fn starting_code(&self) -> u64 {
        reduce_standard(keyed_hash(self, &self.0))
    }
}

impl FromStr for SecretKey {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl AsRef<[u8]> for SecretKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SecretKey").field(&"[REDACTED]").finish()
    }
}
