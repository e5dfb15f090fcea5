//! Device-side token state.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::decode::{decode_token, DecodeOptions, DecodeOutcome};
use crate::error::Result;
use crate::key::SecretKey;
use crate::window::UsedCounts;

/// The token state a device persists: its count and its used-counts window.
///
/// Both are updated together by [`DeviceState::enter_token`] and only when a token is accepted,
/// so storing the whole value after each entry keeps them consistent.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceState {
    count: u32,
    used_counts: UsedCounts,
}

impl DeviceState {
    /// State of a freshly provisioned device at `count`.
    #[must_use]
    pub fn new(count: u32) -> Self {
        Self {
            count,
            used_counts: UsedCounts::new(),
        }
    }

    /// Restores persisted state.
    #[must_use]
    pub const fn from_parts(count: u32, used_counts: UsedCounts) -> Self {
        Self { count, used_counts }
    }

    /// Last accepted count.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Used-counts window.
    #[must_use]
    pub const fn used_counts(&self) -> &UsedCounts {
        &self.used_counts
    }

    /// Decodes a token entered on the device and, if accepted, records it.
    ///
    /// The count only moves forward, except for COUNTER_SYNC tokens which set it to the position
    /// they were issued at. Rejected tokens and errors leave the state untouched.
    ///
    /// # Errors
    ///
    /// See [`decode_token`].
    pub fn enter_token(
        &mut self,
        token: &str,
        key: &SecretKey,
        options: &DecodeOptions,
    ) -> Result<DecodeOutcome> {
        let outcome = decode_token(token, key, self.count, Some(&self.used_counts), options)?;
        if let DecodeOutcome::Accepted(decoded) = &outcome {
            if decoded.count > self.count || decoded.command == Command::CounterSync {
                self.count = decoded.count;
            }
            if let Some(used_counts) = &decoded.used_counts {
                self.used_counts = used_counts.clone();
            }
        }
        Ok(outcome)
    }
}
