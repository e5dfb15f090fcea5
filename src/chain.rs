//! Position-indexed chain of codes derived from a secret key.

use core::fmt;
use core::marker::PhantomData;

use crate::domain::Domain;
use crate::error::{Result, TokenError};
use crate::key::SecretKey;

/// A code at some position of a device's chain, in token space `D`.
///
/// The chain is anchored at the device's starting code with the token's base substituted in,
/// and each position is the keyed hash of the previous one. Stepping forward requires the key
/// and there is no way to step backward, so tokens can only be located by walking from the
/// anchor.
pub struct ChainCode<D: Domain> {
    code: u64,
    _domain: PhantomData<D>,
}

impl<D: Domain> ChainCode<D> {
    /// Anchors a chain at `starting_code` carrying `base`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::StartingCodeOutOfRange`] if the starting code does not fit in
    /// token space `D`.
    pub fn anchor(starting_code: u64, base: u64) -> Result<Self> {
        if starting_code > D::MAX_CODE {
            return Err(TokenError::StartingCodeOutOfRange { max: D::MAX_CODE });
        }
        Ok(Self::new(D::put_base(starting_code, base)))
    }

    const fn new(code: u64) -> Self {
        Self {
            code,
            _domain: PhantomData,
        }
    }

    /// The raw code.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.code
    }

    /// The base of this code.
    #[must_use]
    pub fn base(&self) -> u64 {
        D::base(self.code)
    }

    /// This code with its base replaced.
    #[must_use]
    pub fn with_base(&self, base: u64) -> Self {
        Self::new(D::put_base(self.code, base))
    }

    /// The code at the next chain position.
    #[must_use]
    pub fn next(&self, key: &SecretKey) -> Self {
        Self::new(D::step(self.code, key))
    }

    /// The code `steps` positions further along the chain.
    #[must_use]
    pub fn advance(&self, key: &SecretKey, steps: u32) -> Self {
        (0..steps).fold(*self, |code, _| code.next(key))
    }
}

impl<D: Domain> Clone for ChainCode<D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D: Domain> Copy for ChainCode<D> {}

impl<D: Domain> PartialEq for ChainCode<D> {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl<D: Domain> Eq for ChainCode<D> {}

impl<D: Domain> fmt::Debug for ChainCode<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainCode")
            .field("domain", &D::NAME)
            .field("code", &self.code)
            .finish()
    }
}
