//! Token generation.

use tracing::debug;

use crate::chain::ChainCode;
use crate::command::{advance_count, TokenType};
use crate::domain::{Domain, Extended, Standard, COUNTER_SYNC_VALUE, PAYG_DISABLE_VALUE};
use crate::error::{Result, TokenError};
use crate::key::SecretKey;
use crate::restricted;

/// Options for [`generate_token`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EncodeOptions {
    /// Starting code of the device; derived from the key when `None`.
    pub starting_code: Option<u64>,
    /// Time values are multiplied by this before encoding, allowing fractional units.
    pub value_divider: f64,
    /// Render the token with the four-symbol digit set.
    pub restricted_digit_set: bool,
    /// Generate a twelve-digit extended token.
    pub extended: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            starting_code: None,
            value_divider: 1.0,
            restricted_digit_set: false,
            extended: false,
        }
    }
}

/// Generates the token for a command, returning the chain position it was issued at along with
/// the token digits.
///
/// `count` is the last count issued to the device. The returned count must be stored by the
/// issuer and passed as `count` for the next token.
///
/// Time values are scaled by `options.value_divider` and rounded half to even.
///
/// # Errors
///
/// - [`TokenError::ValueRequired`] if a time command has no value;
/// - [`TokenError::ValueOutOfRange`] if a scaled time value is negative or too large;
/// - [`TokenError::ValueNotAllowed`] if DISABLE_PAYG or COUNTER_SYNC are given a value;
/// - [`TokenError::UnsupportedTokenType`] for decode-only types, and for DISABLE_PAYG and
///   COUNTER_SYNC in the extended format;
/// - [`TokenError::InvalidValueDivider`] and [`TokenError::StartingCodeOutOfRange`] for bad
///   options.
///
/// ```
/// use openpaygo_token::{generate_token, EncodeOptions, SecretKey, TokenType};
///
/// let key: SecretKey = "bc41ec9530f6dac86b1a29ab82edc5fb".parse().unwrap();
/// let options = EncodeOptions {
///     starting_code: Some(516_959_010),
///     ..EncodeOptions::default()
/// };
/// let (count, token) = generate_token(&key, 1, Some(5.0), TokenType::AddTime, &options).unwrap();
/// assert_eq!(count, 2);
/// assert_eq!(token.len(), 9);
/// ```
pub fn generate_token(
    key: &SecretKey,
    count: u32,
    value: Option<f64>,
    token_type: TokenType,
    options: &EncodeOptions,
) -> Result<(u32, String)> {
    if !(options.value_divider.is_finite() && options.value_divider > 0.0) {
        return Err(TokenError::InvalidValueDivider);
    }
    let max = if options.extended {
        Extended::MAX_ACTIVATION_VALUE
    } else {
        Standard::MAX_ACTIVATION_VALUE
    };
    let value = match token_type {
        TokenType::AddTime | TokenType::SetTime => {
            let value = value.ok_or(TokenError::ValueRequired(token_type))?;
            scale_value(value, options.value_divider, max)?
        }
        TokenType::DisablePayg | TokenType::CounterSync if options.extended => {
            return Err(TokenError::UnsupportedTokenType(token_type));
        }
        TokenType::DisablePayg | TokenType::CounterSync if value.is_some() => {
            return Err(TokenError::ValueNotAllowed(token_type));
        }
        TokenType::DisablePayg => PAYG_DISABLE_VALUE,
        TokenType::CounterSync => COUNTER_SYNC_VALUE,
        TokenType::AlreadyUsed | TokenType::Invalid => {
            return Err(TokenError::UnsupportedTokenType(token_type));
        }
    };
    let starting_code = options
        .starting_code
        .unwrap_or_else(|| key.starting_code());
    let new_count = advance_count(count, token_type);

    let token = if options.extended {
        encode::<Extended>(key, starting_code, value, new_count, options.restricted_digit_set)?
    } else {
        encode::<Standard>(key, starting_code, value, new_count, options.restricted_digit_set)?
    };
    debug!(
        count,
        new_count,
        ?token_type,
        extended = options.extended,
        restricted = options.restricted_digit_set,
        "generated token"
    );
    Ok((new_count, token))
}

fn scale_value(value: f64, value_divider: f64, max: u32) -> Result<u32> {
    let scaled = (value * value_divider).round_ties_even();
    if !scaled.is_finite() || scaled < 0.0 || scaled > f64::from(max) {
        return Err(TokenError::ValueOutOfRange { value: scaled, max });
    }
    // In 0..=max after the check above
    Ok(scaled as u32)
}

/// Encodes `value` at chain position `count` in token space `D`.
fn encode<D: Domain>(
    key: &SecretKey,
    starting_code: u64,
    value: u32,
    count: u32,
    restricted_digit_set: bool,
) -> Result<String> {
    let token_base = D::encode_base(D::base(starting_code), value);
    let code = ChainCode::<D>::anchor(starting_code, token_base)?
        .advance(key, count)
        .with_base(token_base)
        .value();
    Ok(render::<D>(code, restricted_digit_set))
}

fn render<D: Domain>(code: u64, restricted_digit_set: bool) -> String {
    if restricted_digit_set {
        restricted::encode::<D>(code)
    } else {
        format!("{:0width$}", code, width = D::DIGITS)
    }
}
