//! A pay-as-you-go device driven by entered tokens, on a virtual clock.

use openpaygo_token::{
    Command, DecodeOptions, DecodeOutcome, DeviceState, SecretKey, TokenError, TokenType,
};

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_DAY: u64 = 24 * 60 * SECONDS_PER_MINUTE;

/// What the device shows after a token is entered.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Entry {
    Valid(TokenType),
    OldToken,
    Invalid,
    Blocked,
}

pub struct DeviceSimulator {
    key: SecretKey,
    options: DecodeOptions,
    state: DeviceState,
    waiting_period_enabled: bool,
    payg_enabled: bool,
    now: u64,
    expiration: u64,
    invalid_token_count: u32,
    blocked_until: u64,
}

impl DeviceSimulator {
    pub fn new(key: SecretKey, starting_code: u64, starting_count: u32) -> Self {
        Self {
            key,
            options: DecodeOptions {
                starting_code: Some(starting_code),
                ..DecodeOptions::default()
            },
            state: DeviceState::new(starting_count),
            waiting_period_enabled: true,
            payg_enabled: true,
            now: 0,
            expiration: 0,
            invalid_token_count: 0,
            blocked_until: 0,
        }
    }

    pub fn with_time_divider(mut self, time_divider: f64) -> Self {
        self.options.value_divider = time_divider;
        self
    }

    pub fn with_restricted_digit_set(mut self) -> Self {
        self.options.restricted_digit_set = true;
        self
    }

    pub fn without_waiting_period(mut self) -> Self {
        self.waiting_period_enabled = false;
        self
    }

    pub fn count(&self) -> u32 {
        self.state.count()
    }

    pub fn payg_enabled(&self) -> bool {
        self.payg_enabled
    }

    pub fn is_active(&self) -> bool {
        !self.payg_enabled || self.expiration > self.now
    }

    pub fn days_remaining(&self) -> f64 {
        self.expiration.saturating_sub(self.now) as f64 / SECONDS_PER_DAY as f64
    }

    pub fn advance_days(&mut self, days: u64) {
        self.now += days * SECONDS_PER_DAY;
    }

    pub fn advance_minutes(&mut self, minutes: u64) {
        self.now += minutes * SECONDS_PER_MINUTE;
    }

    pub fn enter_token(&mut self, token: &str) -> Result<Entry, TokenError> {
        if self.waiting_period_enabled && self.blocked_until > self.now {
            return Ok(Entry::Blocked);
        }
        match self.state.enter_token(token, &self.key, &self.options)? {
            DecodeOutcome::Accepted(decoded) => {
                self.invalid_token_count = 0;
                self.apply(decoded.command);
                Ok(Entry::Valid(decoded.command.token_type()))
            }
            DecodeOutcome::AlreadyUsed => Ok(Entry::OldToken),
            DecodeOutcome::Invalid => {
                self.invalid_token_count += 1;
                self.blocked_until =
                    self.now + (1u64 << self.invalid_token_count) * SECONDS_PER_MINUTE;
                Ok(Entry::Invalid)
            }
        }
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::SetTime(days) => {
                self.payg_enabled = true;
                self.expiration = self.now + days_to_seconds(days);
            }
            Command::AddTime(days) if self.payg_enabled => {
                self.expiration = self.expiration.max(self.now) + days_to_seconds(days);
            }
            Command::AddTime(_) | Command::CounterSync => {}
            Command::DisablePayg => self.payg_enabled = false,
        }
    }
}

fn days_to_seconds(days: f64) -> u64 {
    (days * SECONDS_PER_DAY as f64).round() as u64
}
