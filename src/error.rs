//! Error type shared by the encoder, decoder and key parsing.

use thiserror::Error;

use crate::TokenType;

/// Token protocol error type.
///
/// These are caller or provisioning mistakes. A token that simply does not match the device's
/// chain, or that was already consumed, is not an error: see [`DecodeOutcome`].
///
/// [`DecodeOutcome`]: crate::DecodeOutcome
#[derive(Clone, Debug, Error, PartialEq)]
pub enum TokenError {
    /// The secret key was not 32 hexadecimal characters.
    #[error("secret key must be 32 hexadecimal characters")]
    KeyFormatInvalid,
    /// The token string is longer than any supported token format.
    #[error("token has {len} digits, at most {max} are supported")]
    TokenTooLong {
        /// Length of the rejected token.
        len: usize,
        /// Longest accepted length for the requested digit set.
        max: usize,
    },
    /// The token string is empty or contains a character outside its digit set.
    #[error("token contains characters outside of its digit set")]
    TokenMalformed,
    /// The scaled value does not fit in the token's value range.
    #[error("value {value} is outside of the allowed range 0..={max}")]
    ValueOutOfRange {
        /// The value after scaling by the value divider.
        value: f64,
        /// Largest activation value of the token domain.
        max: u32,
    },
    /// A value was supplied for a command that carries its own fixed value.
    #[error("a value is not allowed for {0:?} tokens")]
    ValueNotAllowed(TokenType),
    /// No value was supplied for a time command.
    #[error("a value is required for {0:?} tokens")]
    ValueRequired(TokenType),
    /// The token type cannot be encoded in the requested token format.
    #[error("token type {0:?} is not supported")]
    UnsupportedTokenType(TokenType),
    /// The starting code does not fit in the token's code space.
    #[error("starting code is larger than {max}")]
    StartingCodeOutOfRange {
        /// Largest code of the token domain.
        max: u64,
    },
    /// The value divider is zero, negative or not finite.
    #[error("value divider must be a finite, positive number")]
    InvalidValueDivider,
    /// The decoder bounds are inconsistent.
    #[error("invalid decoder configuration: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = std::result::Result<T, TokenError>;
