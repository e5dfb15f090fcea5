//! Token validation against a device's chain position.
//!
//! A device only knows its last accepted count. Since the chain cannot be stepped backwards,
//! locating an entered token means walking the chain forward from its anchor and comparing each
//! position with the token, up to a bounded distance past the device's count. The first position
//! that matches and passes the replay rules wins.

use tracing::{debug, trace};

use crate::chain::ChainCode;
use crate::command::{Command, TokenType};
use crate::config::DecoderConfig;
use crate::domain::{Domain, Extended, Standard, TokenFormat, PAYG_DISABLE_VALUE};
use crate::error::{Result, TokenError};
use crate::key::SecretKey;
use crate::restricted;
use crate::window::UsedCounts;

/// Options for [`decode_token`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecodeOptions {
    /// Starting code of the device; derived from the key when `None`.
    pub starting_code: Option<u64>,
    /// Decoded time values are divided by this.
    pub value_divider: f64,
    /// The token was entered with the four-symbol digit set.
    pub restricted_digit_set: bool,
    /// Search and replay bounds.
    pub config: DecoderConfig,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            starting_code: None,
            value_divider: 1.0,
            restricted_digit_set: false,
            config: DecoderConfig::default(),
        }
    }
}

/// An accepted token.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedToken {
    /// What the token asks the device to do.
    pub command: Command,
    /// Chain position the token was found at.
    pub count: u32,
    /// The device's new used-counts window, or `None` if the caller does not track one.
    pub used_counts: Option<UsedCounts>,
}

/// Result of checking a token against a device.
#[derive(Clone, Debug, PartialEq)]
pub enum DecodeOutcome {
    /// The token is valid for this device and may be applied.
    Accepted(DecodedToken),
    /// The token belongs to this device but was already used, or is too old.
    AlreadyUsed,
    /// The token does not belong to this device, or is too far ahead of its count.
    Invalid,
}

impl DecodeOutcome {
    /// The outcome as a [`TokenType`].
    #[must_use]
    pub const fn token_type(&self) -> TokenType {
        match self {
            Self::Accepted(decoded) => decoded.command.token_type(),
            Self::AlreadyUsed => TokenType::AlreadyUsed,
            Self::Invalid => TokenType::Invalid,
        }
    }

    /// The accepted token, if any.
    #[must_use]
    pub const fn accepted(&self) -> Option<&DecodedToken> {
        match self {
            Self::Accepted(decoded) => Some(decoded),
            Self::AlreadyUsed | Self::Invalid => None,
        }
    }
}

/// Decodes a token entered on a device whose last accepted count is `last_count`.
///
/// The token format is picked from the token's length. `used_counts` is the device's
/// used-counts window; pass `None` to disable out-of-order ADD_TIME tokens, in which case the
/// returned window is `None` as well.
///
/// Nothing is mutated: on [`DecodeOutcome::Accepted`], the caller stores the new count and
/// window together. See [`DeviceState`](crate::DeviceState) for a ready-made holder.
///
/// # Errors
///
/// [`TokenError::TokenTooLong`] and [`TokenError::TokenMalformed`] for unparsable tokens,
/// [`TokenError::InvalidValueDivider`] and [`TokenError::StartingCodeOutOfRange`] for bad
/// options. A token that is merely wrong or stale is reported through [`DecodeOutcome`].
///
/// ```
/// use openpaygo_token::{
///     decode_token, generate_token, Command, DecodeOptions, EncodeOptions, SecretKey, TokenType,
///     UsedCounts,
/// };
///
/// let key: SecretKey = "bc41ec9530f6dac86b1a29ab82edc5fb".parse().unwrap();
/// let starting_code = Some(516_959_010);
/// let encode = EncodeOptions { starting_code, ..EncodeOptions::default() };
/// let (_, token) = generate_token(&key, 1, Some(5.0), TokenType::AddTime, &encode).unwrap();
///
/// let decode = DecodeOptions { starting_code, ..DecodeOptions::default() };
/// let outcome = decode_token(&token, &key, 1, Some(&UsedCounts::new()), &decode).unwrap();
/// let decoded = outcome.accepted().unwrap();
/// assert_eq!(decoded.command, Command::AddTime(5.0));
/// assert_eq!(decoded.count, 2);
/// ```
pub fn decode_token(
    token: &str,
    key: &SecretKey,
    last_count: u32,
    used_counts: Option<&UsedCounts>,
    options: &DecodeOptions,
) -> Result<DecodeOutcome> {
    if !(options.value_divider.is_finite() && options.value_divider > 0.0) {
        return Err(TokenError::InvalidValueDivider);
    }
    let format = TokenFormat::from_len(token.len(), options.restricted_digit_set).ok_or(
        TokenError::TokenTooLong {
            len: token.len(),
            max: TokenFormat::max_len(options.restricted_digit_set),
        },
    )?;
    let code = parse(token, options.restricted_digit_set)?;
    let starting_code = options
        .starting_code
        .unwrap_or_else(|| key.starting_code());
    let decoder = Decoder {
        key,
        starting_code,
        last_count,
        used_counts,
        config: &options.config,
    };
    let outcome = match format {
        TokenFormat::Standard => decoder.decode::<Standard>(code)?,
        TokenFormat::Extended => decoder.decode::<Extended>(code)?,
    };
    Ok(match outcome {
        RawOutcome::Accepted {
            token_type,
            value,
            count,
            used_counts,
        } => DecodeOutcome::Accepted(DecodedToken {
            command: command(token_type, value, options.value_divider),
            count,
            used_counts,
        }),
        RawOutcome::AlreadyUsed => DecodeOutcome::AlreadyUsed,
        RawOutcome::Invalid => DecodeOutcome::Invalid,
    })
}

fn parse(token: &str, restricted_digit_set: bool) -> Result<u64> {
    if restricted_digit_set {
        return restricted::decode(token);
    }
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TokenError::TokenMalformed);
    }
    // At most twelve digits, which always fits
    token.parse().map_err(|_| TokenError::TokenMalformed)
}

fn command(token_type: TokenType, value: u32, value_divider: f64) -> Command {
    match token_type {
        TokenType::AddTime => Command::AddTime(f64::from(value) / value_divider),
        TokenType::DisablePayg => Command::DisablePayg,
        TokenType::CounterSync => Command::CounterSync,
        _ => Command::SetTime(f64::from(value) / value_divider),
    }
}

enum RawOutcome {
    Accepted {
        token_type: TokenType,
        value: u32,
        count: u32,
        used_counts: Option<UsedCounts>,
    },
    AlreadyUsed,
    Invalid,
}

/// Device state a single decode is checked against.
struct Decoder<'a> {
    key: &'a SecretKey,
    starting_code: u64,
    last_count: u32,
    used_counts: Option<&'a UsedCounts>,
    config: &'a DecoderConfig,
}

impl Decoder<'_> {
    fn decode<D: Domain>(&self, token: u64) -> Result<RawOutcome> {
        let token_base = D::base(token);
        let value = D::decode_base(D::base(self.starting_code), token_base);
        let jump = if D::is_counter_sync(value) {
            self.config.max_token_jump_counter_sync()
        } else {
            self.config.max_token_jump()
        };
        let max_count = self.last_count.saturating_add(jump);
        trace!(domain = D::NAME, last_count = self.last_count, max_count, "searching chain");

        let mut code = ChainCode::<D>::anchor(self.starting_code, token_base)?;
        let mut seen_older = false;
        for count in 0..=max_count {
            if code.with_base(token_base).value() == token {
                let token_type = token_type::<D>(count, value);
                if self.count_is_valid::<D>(count, value, token_type) {
                    debug!(domain = D::NAME, count, ?token_type, "token accepted");
                    let used_counts = self.used_counts.map(|used| {
                        used.updated(
                            count,
                            token_type != TokenType::AddTime || D::is_sentinel(value),
                            self.config.max_unused_older_tokens(),
                        )
                    });
                    return Ok(RawOutcome::Accepted {
                        token_type,
                        value,
                        count,
                        used_counts,
                    });
                }
                // Keep looking: the same token may also match a later position
                trace!(domain = D::NAME, count, "stale match");
                seen_older = true;
            }
            code = code.next(self.key);
        }

        if seen_older {
            debug!(domain = D::NAME, last_count = self.last_count, "token already used");
            Ok(RawOutcome::AlreadyUsed)
        } else {
            debug!(domain = D::NAME, last_count = self.last_count, "token invalid");
            Ok(RawOutcome::Invalid)
        }
    }

    fn count_is_valid<D: Domain>(&self, count: u32, value: u32, token_type: TokenType) -> bool {
        // `a > b - c` is written `a + c > b` to stay unsigned
        let count = u64::from(count);
        let last_count = u64::from(self.last_count);
        if D::is_counter_sync(value) {
            return count + u64::from(self.config.max_token_jump()) > last_count;
        }
        if count > last_count {
            return true;
        }
        match self.used_counts {
            Some(used) => {
                count + u64::from(self.config.max_unused_older_tokens()) > last_count
                    && token_type == TokenType::AddTime
                    // Below last_count, so it fits in a u32
                    && !used.contains(count as u32)
            }
            None => false,
        }
    }
}

fn token_type<D: Domain>(count: u32, value: u32) -> TokenType {
    if count % 2 == 0 {
        TokenType::AddTime
    } else if D::is_counter_sync(value) {
        TokenType::CounterSync
    } else if D::HAS_SENTINELS && value == PAYG_DISABLE_VALUE {
        TokenType::DisablePayg
    } else {
        TokenType::SetTime
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{generate_token, EncodeOptions};

    const KEY_HEX: &str = "bc41ec9530f6dac86b1a29ab82edc5fb";
    const STARTING_CODE: u64 = 516_959_010;

    fn key() -> SecretKey {
        SecretKey::from_hex(KEY_HEX).unwrap()
    }

    fn encode(count: u32, value: Option<f64>, token_type: TokenType) -> (u32, String) {
        let options = EncodeOptions {
            starting_code: Some(STARTING_CODE),
            ..EncodeOptions::default()
        };
        generate_token(&key(), count, value, token_type, &options).unwrap()
    }

    fn decode(token: &str, last_count: u32, used_counts: Option<&UsedCounts>) -> DecodeOutcome {
        let options = DecodeOptions {
            starting_code: Some(STARTING_CODE),
            ..DecodeOptions::default()
        };
        decode_token(token, &key(), last_count, used_counts, &options).unwrap()
    }

    #[test]
    fn decodes_add_time() {
        let (count, token) = encode(1, Some(5.0), TokenType::AddTime);
        let outcome = decode(&token, 1, None);
        assert_eq!(
            outcome,
            DecodeOutcome::Accepted(DecodedToken {
                command: Command::AddTime(5.0),
                count,
                used_counts: None,
            })
        );
        assert_eq!(count, 2);
    }

    #[test]
    fn decodes_every_command() {
        let cases = [
            (Some(995.0), TokenType::SetTime, Command::SetTime(995.0)),
            (None, TokenType::DisablePayg, Command::DisablePayg),
            (None, TokenType::CounterSync, Command::CounterSync),
            (Some(0.0), TokenType::AddTime, Command::AddTime(0.0)),
        ];
        for (value, token_type, command) in cases {
            let (count, token) = encode(10, value, token_type);
            let decoded = decode(&token, 10, Some(&UsedCounts::new()));
            let decoded = decoded.accepted().unwrap();
            assert_eq!(decoded.command, command);
            assert_eq!(decoded.count, count);
        }
    }

    #[test]
    fn wrong_key_is_invalid() {
        let (_, token) = encode(1, Some(5.0), TokenType::AddTime);
        let other = SecretKey::from_hex("dac86b1a29ab82edc5fbbc41ec9530f6").unwrap();
        let options = DecodeOptions {
            starting_code: Some(STARTING_CODE),
            ..DecodeOptions::default()
        };
        assert_eq!(
            decode_token(&token, &other, 1, None, &options).unwrap(),
            DecodeOutcome::Invalid
        );
    }

    #[test]
    fn replayed_set_time_is_already_used() {
        let (count, token) = encode(4, Some(30.0), TokenType::SetTime);
        let used = decode(&token, 4, Some(&UsedCounts::new()))
            .accepted()
            .unwrap()
            .used_counts
            .clone()
            .unwrap();
        assert_eq!(decode(&token, count, Some(&used)), DecodeOutcome::AlreadyUsed);
        assert_eq!(decode(&token, count, None), DecodeOutcome::AlreadyUsed);
    }

    #[test]
    fn older_add_time_is_accepted_once() {
        let (first_count, first) = encode(2, Some(1.0), TokenType::AddTime);
        let (second_count, second) = encode(first_count, Some(2.0), TokenType::AddTime);

        let after_second = decode(&second, 2, Some(&UsedCounts::new()));
        let used = after_second.accepted().unwrap().used_counts.clone().unwrap();
        assert!(used.contains(second_count));

        let after_first = decode(&first, second_count, Some(&used));
        let decoded = after_first.accepted().unwrap();
        assert_eq!(decoded.command, Command::AddTime(1.0));
        assert_eq!(decoded.count, first_count);
        let used = decoded.used_counts.clone().unwrap();
        assert!(used.contains(first_count));

        assert_eq!(
            decode(&first, second_count, Some(&used)),
            DecodeOutcome::AlreadyUsed
        );
    }

    #[test]
    fn older_add_time_needs_a_window() {
        let (first_count, first) = encode(2, Some(1.0), TokenType::AddTime);
        let (second_count, _) = encode(first_count, Some(2.0), TokenType::AddTime);
        assert_eq!(decode(&first, second_count, None), DecodeOutcome::AlreadyUsed);
    }

    #[test]
    fn set_time_closes_older_add_time() {
        let (add_count, add) = encode(2, Some(1.0), TokenType::AddTime);
        let (set_count, set) = encode(add_count, Some(3.0), TokenType::SetTime);
        let used = decode(&set, 2, Some(&UsedCounts::new()))
            .accepted()
            .unwrap()
            .used_counts
            .clone()
            .unwrap();
        assert!(used.contains(add_count));
        assert_eq!(decode(&add, set_count, Some(&used)), DecodeOutcome::AlreadyUsed);
    }

    #[test]
    fn add_time_too_far_back_is_already_used() {
        let (count, token) = encode(0, Some(1.0), TokenType::AddTime);
        let last_count = count + DecoderConfig::DEFAULT_MAX_UNUSED_OLDER_TOKENS;
        assert_eq!(
            decode(&token, last_count, Some(&UsedCounts::new())),
            DecodeOutcome::AlreadyUsed
        );
        let outcome = decode(&token, last_count - 1, Some(&UsedCounts::new()));
        assert_eq!(outcome.token_type(), TokenType::AddTime);
    }

    #[test]
    fn search_window_bound() {
        // Position 65 is one past the default window of a device at count 0
        let (count, token) = encode(64, Some(1.0), TokenType::SetTime);
        assert_eq!(count, 65);
        assert_eq!(decode(&token, 0, None), DecodeOutcome::Invalid);

        let (count, token) = encode(62, Some(1.0), TokenType::SetTime);
        assert_eq!(count, 63);
        assert_eq!(decode(&token, 0, None).accepted().unwrap().count, 63);
    }

    #[test]
    fn counter_sync_searches_further() {
        let (count, token) = encode(98, None, TokenType::CounterSync);
        assert_eq!(count, 99);
        assert_eq!(
            decode(&token, 0, None).accepted().unwrap().command,
            Command::CounterSync
        );
        let (count, token) = encode(100, None, TokenType::CounterSync);
        assert_eq!(count, 101);
        assert_eq!(decode(&token, 0, None), DecodeOutcome::Invalid);
    }

    #[test]
    fn counter_sync_tolerates_older_counts() {
        let (count, token) = encode(40, None, TokenType::CounterSync);
        assert_eq!(count, 41);
        let outcome = decode(&token, 100, Some(&UsedCounts::new()));
        let decoded = outcome.accepted().unwrap();
        assert_eq!(decoded.command, Command::CounterSync);
        assert_eq!(decoded.count, 41);

        let (count, token) = encode(34, None, TokenType::CounterSync);
        assert_eq!(count, 35);
        assert_eq!(
            decode(&token, 100, Some(&UsedCounts::new())),
            DecodeOutcome::AlreadyUsed
        );
    }

    #[test]
    fn custom_config_narrows_the_window() {
        let (_, token) = encode(20, Some(1.0), TokenType::SetTime);
        let options = DecodeOptions {
            starting_code: Some(STARTING_CODE),
            config: DecoderConfig::new(16, 16, 8).unwrap(),
            ..DecodeOptions::default()
        };
        assert_eq!(
            decode_token(&token, &key(), 0, None, &options).unwrap(),
            DecodeOutcome::Invalid
        );
        assert_eq!(
            decode_token(&token, &key(), 10, None, &options)
                .unwrap()
                .token_type(),
            TokenType::SetTime
        );
    }

    #[test]
    fn value_divider_is_applied() {
        let encode_options = EncodeOptions {
            starting_code: Some(STARTING_CODE),
            value_divider: 10.0,
            ..EncodeOptions::default()
        };
        let (_, token) =
            generate_token(&key(), 0, Some(1.5), TokenType::AddTime, &encode_options).unwrap();
        let options = DecodeOptions {
            starting_code: Some(STARTING_CODE),
            value_divider: 10.0,
            ..DecodeOptions::default()
        };
        let outcome = decode_token(&token, &key(), 0, None, &options).unwrap();
        assert_eq!(outcome.accepted().unwrap().command, Command::AddTime(1.5));
    }

    #[test]
    fn decodes_extended_and_restricted_tokens() {
        for (restricted_digit_set, extended) in [(true, false), (false, true), (true, true)] {
            let encode_options = EncodeOptions {
                starting_code: Some(STARTING_CODE),
                restricted_digit_set,
                extended,
                ..EncodeOptions::default()
            };
            let (count, token) =
                generate_token(&key(), 3, Some(995.0), TokenType::SetTime, &encode_options)
                    .unwrap();
            let options = DecodeOptions {
                starting_code: Some(STARTING_CODE),
                restricted_digit_set,
                ..DecodeOptions::default()
            };
            let outcome = decode_token(&token, &key(), 3, None, &options).unwrap();
            let decoded = outcome.accepted().unwrap();
            assert_eq!(decoded.command, Command::SetTime(995.0));
            assert_eq!(decoded.count, count);
        }
    }

    #[test]
    fn extended_tokens_carry_large_values() {
        let encode_options = EncodeOptions {
            starting_code: Some(STARTING_CODE),
            extended: true,
            ..EncodeOptions::default()
        };
        // 999 is a sentinel only in the standard space
        for value in [999.0, 999_999.0] {
            let (_, token) =
                generate_token(&key(), 1, Some(value), TokenType::AddTime, &encode_options)
                    .unwrap();
            let options = DecodeOptions {
                starting_code: Some(STARTING_CODE),
                ..DecodeOptions::default()
            };
            let outcome = decode_token(&token, &key(), 1, None, &options).unwrap();
            assert_eq!(outcome.accepted().unwrap().command, Command::AddTime(value));
        }
    }

    #[test]
    fn rejects_long_tokens() {
        let options = DecodeOptions::default();
        assert_eq!(
            decode_token("1234567890123", &key(), 0, None, &options),
            Err(TokenError::TokenTooLong { len: 13, max: 12 })
        );
        let restricted = DecodeOptions {
            restricted_digit_set: true,
            ..options
        };
        assert_eq!(
            decode_token(&"1".repeat(21), &key(), 0, None, &restricted),
            Err(TokenError::TokenTooLong { len: 21, max: 20 })
        );
    }

    #[test]
    fn rejects_malformed_tokens() {
        let options = DecodeOptions::default();
        for token in ["", "12345678a", "+12345678", " 12345678"] {
            assert_eq!(
                decode_token(token, &key(), 0, None, &options),
                Err(TokenError::TokenMalformed)
            );
        }
        let restricted = DecodeOptions {
            restricted_digit_set: true,
            ..options
        };
        assert_eq!(
            decode_token("000000000000004", &key(), 0, None, &restricted),
            Err(TokenError::TokenMalformed)
        );
    }
}
