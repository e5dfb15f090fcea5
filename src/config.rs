//! Decoder search and replay bounds.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, TokenError};

/// Upper bound on every search window, keeping a decode bounded in time.
pub const MAX_SEARCH_WINDOW: u32 = 1_000;

/// How far the decoder searches past the device's count and how far back it tolerates tokens.
///
/// The defaults are what deployed devices use; changing them only makes sense when every device
/// of a fleet is configured the same way.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawDecoderConfig"))]
pub struct DecoderConfig {
    max_token_jump: u32,
    max_token_jump_counter_sync: u32,
    max_unused_older_tokens: u32,
}

impl DecoderConfig {
    /// Positions searched past the device's count for ordinary tokens.
    pub const DEFAULT_MAX_TOKEN_JUMP: u32 = 64;
    /// Positions searched past the device's count for COUNTER_SYNC tokens.
    pub const DEFAULT_MAX_TOKEN_JUMP_COUNTER_SYNC: u32 = 100;
    /// Positions below the device's count where unused ADD_TIME tokens are still accepted.
    pub const DEFAULT_MAX_UNUSED_OLDER_TOKENS: u32 = 16;

    /// Creates a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidConfig`] unless
    /// `1 <= max_unused_older_tokens <= max_token_jump <= max_token_jump_counter_sync <=`
    /// [`MAX_SEARCH_WINDOW`].
    pub const fn new(
        max_token_jump: u32,
        max_token_jump_counter_sync: u32,
        max_unused_older_tokens: u32,
    ) -> Result<Self> {
        if max_unused_older_tokens == 0 {
            return Err(TokenError::InvalidConfig("max_unused_older_tokens must be positive"));
        }
        if max_unused_older_tokens > max_token_jump {
            return Err(TokenError::InvalidConfig(
                "max_unused_older_tokens exceeds max_token_jump",
            ));
        }
        if max_token_jump > max_token_jump_counter_sync {
            return Err(TokenError::InvalidConfig(
                "max_token_jump exceeds max_token_jump_counter_sync",
            ));
        }
        if max_token_jump_counter_sync > MAX_SEARCH_WINDOW {
            return Err(TokenError::InvalidConfig(
                "max_token_jump_counter_sync exceeds the search window bound",
            ));
        }
        Ok(Self {
            max_token_jump,
            max_token_jump_counter_sync,
            max_unused_older_tokens,
        })
    }

    /// Positions searched past the device's count for ordinary tokens.
    #[must_use]
    pub const fn max_token_jump(&self) -> u32 {
        self.max_token_jump
    }

    /// Positions searched past the device's count for COUNTER_SYNC tokens.
    #[must_use]
    pub const fn max_token_jump_counter_sync(&self) -> u32 {
        self.max_token_jump_counter_sync
    }

    /// Width of the used-counts window below the highest count seen.
    #[must_use]
    pub const fn max_unused_older_tokens(&self) -> u32 {
        self.max_unused_older_tokens
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_token_jump: Self::DEFAULT_MAX_TOKEN_JUMP,
            max_token_jump_counter_sync: Self::DEFAULT_MAX_TOKEN_JUMP_COUNTER_SYNC,
            max_unused_older_tokens: Self::DEFAULT_MAX_UNUSED_OLDER_TOKENS,
        }
    }
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawDecoderConfig {
    max_token_jump: u32,
    max_token_jump_counter_sync: u32,
    max_unused_older_tokens: u32,
}

#[cfg(feature = "serde")]
impl TryFrom<RawDecoderConfig> for DecoderConfig {
    type Error = TokenError;

    fn try_from(raw: RawDecoderConfig) -> Result<Self> {
        Self::new(
            raw.max_token_jump,
            raw.max_token_jump_counter_sync,
            raw.max_unused_older_tokens,
        )
    }
}
