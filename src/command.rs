//! Token types and decoded commands.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Kind of a token.
///
/// The first four variants are commands an issuer can encode. [`TokenType::AlreadyUsed`] and
/// [`TokenType::Invalid`] only ever describe decode outcomes.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum TokenType {
    /// Adds the token's value to the remaining credit.
    AddTime,
    /// Replaces the remaining credit with the token's value.
    SetTime,
    /// Unlocks the device permanently.
    DisablePayg,
    /// Moves the device's counter forward without changing its credit.
    CounterSync,
    /// The token matches the device's chain but may not be used again.
    AlreadyUsed,
    /// The token does not match the device's chain.
    Invalid,
}

impl TokenType {
    /// Whether the command lives on odd chain positions.
    ///
    /// Even positions are reserved for ADD_TIME so that time can be added out of order without
    /// reopening any other command.
    #[must_use]
    pub const fn uses_odd_count(self) -> bool {
        matches!(self, Self::SetTime | Self::DisablePayg | Self::CounterSync)
    }

    /// Whether an issuer can encode this type.
    #[must_use]
    pub const fn is_command(self) -> bool {
        !matches!(self, Self::AlreadyUsed | Self::Invalid)
    }
}

/// Computes the chain position a new token of `token_type` must use, given the last issued count.
///
/// The result is always greater than `count` and its parity matches the token type: even for
/// ADD_TIME, odd for everything else.
///
/// ```
/// use openpaygo_token::{advance_count, TokenType};
///
/// assert_eq!(advance_count(1, TokenType::AddTime), 2);
/// assert_eq!(advance_count(2, TokenType::AddTime), 4);
/// assert_eq!(advance_count(2, TokenType::SetTime), 3);
/// assert_eq!(advance_count(3, TokenType::CounterSync), 5);
/// ```
#[must_use]
pub const fn advance_count(count: u32, token_type: TokenType) -> u32 {
    let next_is_odd = count % 2 == 0;
    if next_is_odd == token_type.uses_odd_count() {
        count + 1
    } else {
        count + 2
    }
}

/// A decoded and accepted command.
///
/// Time values are already divided by the decoder's value divider.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    /// Add this much time to the device's credit.
    AddTime(f64),
    /// Set the device's credit to this much time.
    SetTime(f64),
    /// Disable pay-as-you-go; the device stays unlocked.
    DisablePayg,
    /// The device's counter was resynchronized; nothing else changes.
    CounterSync,
}

impl Command {
    /// The token type this command was decoded from.
    #[must_use]
    pub const fn token_type(&self) -> TokenType {
        match self {
            Self::AddTime(_) => TokenType::AddTime,
            Self::SetTime(_) => TokenType::SetTime,
            Self::DisablePayg => TokenType::DisablePayg,
            Self::CounterSync => TokenType::CounterSync,
        }
    }

    /// The time value carried by ADD_TIME and SET_TIME commands.
    #[must_use]
    pub const fn value(&self) -> Option<f64> {
        match self {
            Self::AddTime(value) | Self::SetTime(value) => Some(*value),
            Self::DisablePayg | Self::CounterSync => None,
        }
    }
}
