//! The withdrawal draft and the events published when it changes

use crate::catalog::{format_balance, TokenOption};
use crate::i18n::{keys, Translator};

use super::otp::OtpAssembler;

/// Inline error on the amount field
#[derive(Debug, Clone, PartialEq)]
pub enum AmountError {
    /// Parsed amount is above the live balance of the selected token
    ExceedsBalance { balance: f64 },
}

impl AmountError {
    pub fn message_key(&self) -> &'static str {
        match self {
            AmountError::ExceedsBalance { .. } => keys::AMOUNT_EXCEEDS_BALANCE,
        }
    }

    pub fn describe(&self, translator: &dyn Translator) -> String {
        match self {
            AmountError::ExceedsBalance { balance } => translator.lookup(
                self.message_key(),
                &[("balance", format_balance(*balance).as_str())],
            ),
        }
    }
}

/// Inline error on the recipient field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipientError {
    Required,
}

impl RecipientError {
    pub fn message_key(&self) -> &'static str {
        keys::RECIPIENT_REQUIRED
    }

    pub fn describe(&self, translator: &dyn Translator) -> String {
        translator.lookup(self.message_key(), &[])
    }
}

/// Inline error on the one-time code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpError {
    /// Fewer than six digits entered while two-factor is required
    Incomplete,
    /// The service rejected the code
    Invalid,
}

impl OtpError {
    pub fn message_key(&self) -> &'static str {
        match self {
            OtpError::Incomplete => keys::OTP_REQUIRED,
            OtpError::Invalid => keys::INVALID_OTP,
        }
    }

    pub fn describe(&self, translator: &dyn Translator) -> String {
        translator.lookup(self.message_key(), &[])
    }
}

/// In-progress withdrawal request
#[derive(Debug, Clone)]
pub struct WithdrawalDraft {
    pub selected_token: Option<TokenOption>,
    /// Always matches the amount text pattern
    pub amount: String,
    pub recipient_address: String,
    pub otp: OtpAssembler,
    pub amount_error: Option<AmountError>,
    pub recipient_error: Option<RecipientError>,
    pub otp_error: Option<OtpError>,
    /// True only while a submission is in flight
    pub is_sending: bool,
}

/// Amount value of a fresh draft
pub const DEFAULT_AMOUNT: &str = "0";

impl WithdrawalDraft {
    pub fn new(otp: OtpAssembler) -> Self {
        Self {
            selected_token: None,
            amount: DEFAULT_AMOUNT.to_string(),
            recipient_address: String::new(),
            otp,
            amount_error: None,
            recipient_error: None,
            otp_error: None,
            is_sending: false,
        }
    }

    pub fn otp_digits(&self) -> &[String] {
        self.otp.slots()
    }

    pub fn selected_symbol(&self) -> Option<&str> {
        self.selected_token.as_ref().map(|t| t.token_symbol.as_str())
    }
}

/// Where a recipient value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipientOrigin {
    /// Typed into the recipient input
    Typed,
    /// Picked from the address book candidates
    Chosen,
}

/// Published by the composer after every draft mutation
#[derive(Debug, Clone, PartialEq)]
pub enum DraftEvent {
    TokenSelected { symbol: String },
    AmountChanged { amount: String },
    RecipientChanged { value: String, origin: RecipientOrigin },
    OtpChanged,
    ErrorsChanged,
    SendingChanged { is_sending: bool },
    /// Amount, recipient and code went back to defaults after a successful send
    Reset,
}

/// Derived disablement of the withdraw form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisabledState {
    pub send: bool,
    pub input: bool,
    pub copy: bool,
}

/// Everything [`DisabledState::compute`] depends on
#[derive(Debug, Clone, Copy)]
pub struct DisabledInputs {
    pub token_selected: bool,
    pub has_own_address: bool,
    pub is_sending: bool,
    pub has_amount_error: bool,
    pub amount: Option<f64>,
    pub live_balance: f64,
}

impl DisabledState {
    pub fn compute(inputs: DisabledInputs) -> Self {
        let exceeds = inputs
            .amount
            .map_or(false, |amount| amount > inputs.live_balance);

        Self {
            send: !inputs.token_selected
                || inputs.is_sending
                || !inputs.has_own_address
                || exceeds
                || inputs.has_amount_error,
            input: inputs.is_sending,
            copy: inputs.is_sending || !inputs.has_own_address,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::EnglishTranslator;

    fn ready() -> DisabledInputs {
        DisabledInputs {
            token_selected: true,
            has_own_address: true,
            is_sending: false,
            has_amount_error: false,
            amount: Some(1.0),
            live_balance: 5.0,
        }
    }

    #[test]
    fn test_nothing_disabled_when_ready() {
        assert_eq!(DisabledState::compute(ready()), DisabledState::default());
    }

    #[test]
    fn test_sending_locks_everything() {
        let state = DisabledState::compute(DisabledInputs {
            is_sending: true,
            ..ready()
        });
        assert!(state.send && state.input && state.copy);
    }

    #[test]
    fn test_missing_own_address() {
        let state = DisabledState::compute(DisabledInputs {
            has_own_address: false,
            ..ready()
        });
        assert!(state.send);
        assert!(!state.input);
        assert!(state.copy);
    }

    #[test]
    fn test_amount_over_balance() {
        let state = DisabledState::compute(DisabledInputs {
            amount: Some(5.5),
            ..ready()
        });
        assert!(state.send);
        assert!(!state.input && !state.copy);

        let state = DisabledState::compute(DisabledInputs {
            amount: None,
            ..ready()
        });
        assert!(!state.send);
    }

    #[test]
    fn test_no_token_or_error_blocks_send() {
        assert!(DisabledState::compute(DisabledInputs {
            token_selected: false,
            ..ready()
        })
        .send);
        assert!(DisabledState::compute(DisabledInputs {
            has_amount_error: true,
            ..ready()
        })
        .send);
    }

    #[test]
    fn test_error_descriptions() {
        let err = AmountError::ExceedsBalance { balance: 2.5 };
        assert_eq!(
            err.describe(&EnglishTranslator),
            "Amount cannot exceed your balance of 2.5"
        );
        assert_eq!(OtpError::Invalid.message_key(), keys::INVALID_OTP);
        assert_eq!(
            RecipientError::Required.describe(&EnglishTranslator),
            "Recipient address is required"
        );
    }
}
