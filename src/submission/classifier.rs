//! Submission failure classification
//!
//! Maps the raw failure signal of the transaction service onto a fixed set of
//! categories. Rules are tried in priority order; the first match wins.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::i18n::{keys, Translator};

/// Transport-level failure code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportCode {
    /// The service could not be reached at all
    Unreachable,
    /// The request was sent but no answer arrived in time
    Timeout,
}

/// Raw failure reported by the transaction service
#[derive(Debug, Clone, Default, PartialEq, Error)]
#[error("withdrawal failed (transport: {transport_code:?}, status: {http_status:?}): {}", .message.as_deref().unwrap_or("-"))]
pub struct FailureSignal {
    pub transport_code: Option<TransportCode>,
    pub http_status: Option<u16>,
    pub message: Option<String>,
}

impl FailureSignal {
    pub fn unreachable() -> Self {
        Self {
            transport_code: Some(TransportCode::Unreachable),
            ..Default::default()
        }
    }

    pub fn status(http_status: u16, message: Option<String>) -> Self {
        Self {
            http_status: Some(http_status),
            message,
            ..Default::default()
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Default::default()
        }
    }
}

/// Canonical failure categories, in rule priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCategory {
    NetworkUnreachable,
    Unauthorized,
    WalletNotFound,
    InvalidOtp,
    InsufficientFeeBalance,
    SourceAccountMissing,
    SameSenderReceiver,
    InsufficientBalanceForFee,
    MissingMintAddress,
    OtpRequired,
    GenericTransactionError,
    InsufficientSolForAccountCreation,
    InvalidAddress,
    Unclassified,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::NetworkUnreachable => "network-unreachable",
            ErrorCategory::Unauthorized => "unauthorized",
            ErrorCategory::WalletNotFound => "wallet-not-found",
            ErrorCategory::InvalidOtp => "invalid-otp",
            ErrorCategory::InsufficientFeeBalance => "insufficient-fee-balance",
            ErrorCategory::SourceAccountMissing => "source-account-missing",
            ErrorCategory::SameSenderReceiver => "same-sender-receiver",
            ErrorCategory::InsufficientBalanceForFee => "insufficient-balance-for-fee",
            ErrorCategory::MissingMintAddress => "missing-mint-address",
            ErrorCategory::OtpRequired => "otp-required",
            ErrorCategory::GenericTransactionError => "generic-transaction-error",
            ErrorCategory::InsufficientSolForAccountCreation => {
                "insufficient-sol-for-account-creation"
            }
            ErrorCategory::InvalidAddress => "invalid-address",
            ErrorCategory::Unclassified => "unclassified",
        }
    }

    /// Translator key of the display text
    pub fn message_key(&self) -> &'static str {
        match self {
            ErrorCategory::NetworkUnreachable => keys::NETWORK_ERROR,
            ErrorCategory::Unauthorized => keys::UNAUTHORIZED,
            ErrorCategory::WalletNotFound => keys::WALLET_NOT_FOUND,
            ErrorCategory::InvalidOtp => keys::INVALID_OTP,
            ErrorCategory::InsufficientFeeBalance => keys::INSUFFICIENT_FEE_BALANCE,
            ErrorCategory::SourceAccountMissing => keys::SOURCE_ACCOUNT_MISSING,
            ErrorCategory::SameSenderReceiver => keys::SAME_SENDER_RECEIVER,
            ErrorCategory::InsufficientBalanceForFee => keys::INSUFFICIENT_BALANCE_FOR_FEE,
            ErrorCategory::MissingMintAddress => keys::MISSING_MINT_ADDRESS,
            ErrorCategory::OtpRequired => keys::OTP_REQUIRED_BY_SERVER,
            ErrorCategory::GenericTransactionError => keys::GENERIC_TRANSACTION_ERROR,
            ErrorCategory::InsufficientSolForAccountCreation => keys::INSUFFICIENT_SOL_FOR_ACCOUNT,
            ErrorCategory::InvalidAddress => keys::INVALID_ADDRESS,
            ErrorCategory::Unclassified => keys::TRANSACTION_FAILED,
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure ready for display
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedFailure {
    pub category: ErrorCategory,
    pub raw_message: Option<String>,
}

impl ClassifiedFailure {
    /// Text shown to the user
    ///
    /// Unclassified failures surface the upstream message, or the generic
    /// fallback when there is none.
    pub fn display_text(&self, translator: &dyn Translator) -> String {
        match (self.category, self.raw_message.as_deref()) {
            (ErrorCategory::Unclassified, Some(raw)) if !raw.is_empty() => raw.to_string(),
            (category, _) => translator.lookup(category.message_key(), &[]),
        }
    }
}

const INSUFFICIENT_FEE_BALANCE: &str = "Insufficient SOL balance for transaction fee";
const SOURCE_ACCOUNT_MISSING: &str = "Source token account not found";
const SAME_SENDER_RECEIVER: &str = "Sender and receiver wallet addresses must be different";
const INSUFFICIENT_BALANCE_FOR_FEE: &str = "Insufficient wallet balance for transaction fee";
const MISSING_MINT_ADDRESS: &str = "Token mint address is required for SPL tokens";
const OTP_REQUIRED: &str = "Google Auth token is required for withdrawal";
const GENERIC_TRANSACTION_ERROR: &str = "Error creating multi-token deposit/withdraw";
const INSUFFICIENT_SOL_FOR_ACCOUNT: &str = "Insufficient SOL for ATA creation";
const INVALID_ADDRESS: &str = "Invalid Solana wallet address";

/// Default backend message for a missing custodial wallet
pub const DEFAULT_WALLET_NOT_FOUND: &str = "User wallet not found";
/// Default substring marking a rejected two-factor code
pub const DEFAULT_TWO_FACTOR_MARKER: &str = "Google Authenticator";

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Priority-ordered failure classifier
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    wallet_not_found: String,
    two_factor_marker: String,
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_WALLET_NOT_FOUND, DEFAULT_TWO_FACTOR_MARKER)
    }
}

impl ErrorClassifier {
    pub fn new(wallet_not_found: impl Into<String>, two_factor_marker: impl Into<String>) -> Self {
        Self {
            wallet_not_found: wallet_not_found.into(),
            two_factor_marker: two_factor_marker.into(),
        }
    }

    pub fn classify(&self, signal: &FailureSignal) -> ClassifiedFailure {
        ClassifiedFailure {
            category: self.category_of(signal),
            raw_message: signal.message.clone(),
        }
    }

    fn category_of(&self, signal: &FailureSignal) -> ErrorCategory {
        if signal.transport_code == Some(TransportCode::Unreachable) {
            return ErrorCategory::NetworkUnreachable;
        }
        if signal.http_status == Some(401) {
            return ErrorCategory::Unauthorized;
        }

        let Some(message) = signal.message.as_deref().map(str::trim) else {
            return ErrorCategory::Unclassified;
        };
        let is = |expected: &str| message.eq_ignore_ascii_case(expected);

        if !self.wallet_not_found.is_empty() && is(&self.wallet_not_found) {
            ErrorCategory::WalletNotFound
        } else if !self.two_factor_marker.is_empty()
            && contains_ignore_case(message, &self.two_factor_marker)
        {
            ErrorCategory::InvalidOtp
        } else if is(INSUFFICIENT_FEE_BALANCE) {
            ErrorCategory::InsufficientFeeBalance
        } else if is(SOURCE_ACCOUNT_MISSING) {
            ErrorCategory::SourceAccountMissing
        } else if is(SAME_SENDER_RECEIVER) {
            ErrorCategory::SameSenderReceiver
        } else if is(INSUFFICIENT_BALANCE_FOR_FEE) {
            ErrorCategory::InsufficientBalanceForFee
        } else if is(MISSING_MINT_ADDRESS) {
            ErrorCategory::MissingMintAddress
        } else if is(OTP_REQUIRED) {
            ErrorCategory::OtpRequired
        } else if is(GENERIC_TRANSACTION_ERROR) {
            ErrorCategory::GenericTransactionError
        } else if contains_ignore_case(message, INSUFFICIENT_SOL_FOR_ACCOUNT) {
            ErrorCategory::InsufficientSolForAccountCreation
        } else if is(INVALID_ADDRESS) {
            ErrorCategory::InvalidAddress
        } else {
            ErrorCategory::Unclassified
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::EnglishTranslator;

    fn category(signal: FailureSignal) -> ErrorCategory {
        ErrorClassifier::default().classify(&signal).category
    }

    #[test]
    fn test_exact_messages() {
        let cases = [
            ("Insufficient SOL balance for transaction fee", ErrorCategory::InsufficientFeeBalance),
            ("Source token account not found", ErrorCategory::SourceAccountMissing),
            (
                "Sender and receiver wallet addresses must be different",
                ErrorCategory::SameSenderReceiver,
            ),
            (
                "Insufficient wallet balance for transaction fee",
                ErrorCategory::InsufficientBalanceForFee,
            ),
            ("Token mint address is required for SPL tokens", ErrorCategory::MissingMintAddress),
            ("Google Auth token is required for withdrawal", ErrorCategory::OtpRequired),
            ("Error creating multi-token deposit/withdraw", ErrorCategory::GenericTransactionError),
            ("Invalid Solana wallet address", ErrorCategory::InvalidAddress),
            ("User wallet not found", ErrorCategory::WalletNotFound),
        ];
        for (message, expected) in cases {
            assert_eq!(category(FailureSignal::message(message)), expected, "{}", message);
        }
    }

    #[test]
    fn test_case_insensitive_equality() {
        assert_eq!(
            category(FailureSignal::message("insufficient SOL balance for transaction fee")),
            ErrorCategory::InsufficientFeeBalance
        );
    }

    #[test]
    fn test_contains_rules() {
        assert_eq!(
            category(FailureSignal::message("Insufficient SOL for ATA creation: need 0.002")),
            ErrorCategory::InsufficientSolForAccountCreation
        );
        assert_eq!(
            category(FailureSignal::message("Invalid Google Authenticator code")),
            ErrorCategory::InvalidOtp
        );
    }

    #[test]
    fn test_priority_order() {
        // 401 wins over any message
        assert_eq!(
            category(FailureSignal::status(401, Some("Invalid Solana wallet address".to_string()))),
            ErrorCategory::Unauthorized
        );
        // Transport wins over status
        assert_eq!(
            category(FailureSignal {
                transport_code: Some(TransportCode::Unreachable),
                http_status: Some(401),
                message: None,
            }),
            ErrorCategory::NetworkUnreachable
        );
        // Two-factor marker wins over the "code required" exact message
        let classifier = ErrorClassifier::new("User wallet not found", "google auth");
        assert_eq!(
            classifier
                .classify(&FailureSignal::message("Google Auth token is required for withdrawal"))
                .category,
            ErrorCategory::InvalidOtp
        );
    }

    #[test]
    fn test_other_statuses_fall_through_to_message() {
        assert_eq!(
            category(FailureSignal::status(
                400,
                Some("Source token account not found".to_string())
            )),
            ErrorCategory::SourceAccountMissing
        );
        assert_eq!(
            category(FailureSignal {
                transport_code: Some(TransportCode::Timeout),
                ..Default::default()
            }),
            ErrorCategory::Unclassified
        );
    }

    #[test]
    fn test_unclassified_display() {
        let classifier = ErrorClassifier::default();
        let raw = classifier.classify(&FailureSignal::message("Rate limit exceeded"));
        assert_eq!(raw.category, ErrorCategory::Unclassified);
        assert_eq!(raw.display_text(&EnglishTranslator), "Rate limit exceeded");

        let empty = classifier.classify(&FailureSignal::status(500, None));
        assert_eq!(
            empty.display_text(&EnglishTranslator),
            "Transaction failed. Please try again."
        );
    }

    #[test]
    fn test_category_strings() {
        assert_eq!(ErrorCategory::SameSenderReceiver.to_string(), "same-sender-receiver");
        let json =
            serde_json::to_string(&ErrorCategory::InsufficientSolForAccountCreation).unwrap();
        assert_eq!(json, "\"insufficient-sol-for-account-creation\"");
    }
}
