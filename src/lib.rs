//! Implementation of the [OpenPAYGO Token][opaygo] protocol.
//!
//! OpenPAYGO tokens let a pay-as-you-go device be credited, disabled or resynchronized by typing
//! a short numeric code, with no connectivity at the point of entry. The issuer and the device
//! share a 128-bit [`SecretKey`]; the issuer computes tokens with [`generate_token`] and the
//! device checks them locally with [`decode_token`] (or [`DeviceState::enter_token`]).
//!
//! Each token is anchored at a position (the *count*) in a chain of codes derived from the key.
//! Even counts carry ADD_TIME tokens and odd counts carry every other command, so time can be
//! added out of order without reopening any other command. The device searches a bounded window
//! ahead of its own count and tracks recently used counts to reject replays.
//!
//! | Format                       | Digits | Value range              |
//! |------------------------------|--------|--------------------------|
//! | standard                     | 9      | 0..=995, plus sentinels  |
//! | standard, restricted digits  | 15     | same                     |
//! | extended                     | 12     | 0..=999,999              |
//! | extended, restricted digits  | 20     | same                     |
//!
//! ```
//! use openpaygo_token::{
//!     generate_token, Command, DecodeOptions, DeviceState, EncodeOptions, SecretKey, TokenType,
//! };
//!
//! let key: SecretKey = "bc41ec9530f6dac86b1a29ab82edc5fb".parse()?;
//!
//! // Issuer side: the last issued count is 1
//! let (count, token) = generate_token(&key, 1, Some(7.0), TokenType::AddTime, &EncodeOptions::default())?;
//!
//! // Device side
//! let mut device = DeviceState::new(1);
//! let outcome = device.enter_token(&token, &key, &DecodeOptions::default())?;
//! assert_eq!(outcome.accepted().map(|decoded| decoded.command), Some(Command::AddTime(7.0)));
//! assert_eq!(device.count(), count);
//! # Ok::<(), openpaygo_token::TokenError>(())
//! ```
//!
//! [opaygo]: https://github.com/openpaygo/openpaygo-python

mod chain;
mod command;
mod config;
mod decode;
mod device;
mod digest;
mod domain;
mod encode;
mod error;
mod key;
pub mod restricted;
mod window;

pub use chain::ChainCode;
pub use command::{advance_count, Command, TokenType};
pub use config::{DecoderConfig, MAX_SEARCH_WINDOW};
pub use decode::{decode_token, DecodeOptions, DecodeOutcome, DecodedToken};
pub use device::DeviceState;
pub use domain::{Domain, Extended, Standard, TokenFormat, COUNTER_SYNC_VALUE, PAYG_DISABLE_VALUE};
pub use encode::{generate_token, EncodeOptions};
pub use error::{Result, TokenError};
pub use key::{SecretKey, SECRET_KEY_BYTES};
pub use window::UsedCounts;
