//! User-facing text lookup
//!
//! The composer never builds display strings itself; it asks a [`Translator`]
//! for the text of a message key. [`EnglishTranslator`] is the built-in
//! fallback catalog.

/// Message keys used by the composer and submission pipeline
pub mod keys {
    pub const SELECT_TOKEN_FIRST: &str = "withdraw.select_token_first";
    pub const AMOUNT_EXCEEDS_BALANCE: &str = "withdraw.amount_cannot_exceed_balance";
    pub const RECIPIENT_REQUIRED: &str = "withdraw.recipient_address_required";
    pub const OTP_REQUIRED: &str = "withdraw.google_auth_required";
    pub const NOT_AVAILABLE: &str = "withdraw.not_available";
    pub const ADDRESS_COPIED: &str = "withdraw.address_copied";
    pub const TRANSACTION_SUCCESS: &str = "withdraw.transaction_success";

    pub const NETWORK_ERROR: &str = "errors.network_error";
    pub const UNAUTHORIZED: &str = "errors.unauthorized";
    pub const WALLET_NOT_FOUND: &str = "errors.user_wallet_not_found";
    pub const INVALID_OTP: &str = "errors.invalid_google_auth";
    pub const INSUFFICIENT_FEE_BALANCE: &str = "errors.insufficient_sol_balance";
    pub const SOURCE_ACCOUNT_MISSING: &str = "errors.source_token_account_not_found";
    pub const SAME_SENDER_RECEIVER: &str = "errors.same_sender_receiver";
    pub const INSUFFICIENT_BALANCE_FOR_FEE: &str = "errors.insufficient_wallet_balance_for_fee";
    pub const MISSING_MINT_ADDRESS: &str = "errors.token_mint_address_required";
    pub const OTP_REQUIRED_BY_SERVER: &str = "errors.google_auth_required";
    pub const GENERIC_TRANSACTION_ERROR: &str = "errors.transaction_failed_multi_token";
    pub const INSUFFICIENT_SOL_FOR_ACCOUNT: &str = "errors.insufficient_sol_for_ata_creation";
    pub const INVALID_ADDRESS: &str = "errors.invalid_solana_wallet_address";
    pub const TRANSACTION_FAILED: &str = "errors.transaction_failed";
}

/// Supplies the text for every user-facing message
pub trait Translator: Send + Sync {
    /// Text for `key` with `{name}` placeholders replaced from `params`
    fn lookup(&self, key: &str, params: &[(&str, &str)]) -> String;
}

const ENGLISH: &[(&str, &str)] = &[
    (keys::SELECT_TOKEN_FIRST, "Please select a token first"),
    (keys::AMOUNT_EXCEEDS_BALANCE, "Amount cannot exceed your balance of {balance}"),
    (keys::RECIPIENT_REQUIRED, "Recipient address is required"),
    (keys::OTP_REQUIRED, "Please enter the 6-digit Google Authenticator code"),
    (keys::NOT_AVAILABLE, "N/A"),
    (keys::ADDRESS_COPIED, "Wallet address copied to clipboard!"),
    (keys::TRANSACTION_SUCCESS, "Withdrawal submitted successfully"),
    (keys::NETWORK_ERROR, "Cannot reach the wallet service. Check your connection."),
    (keys::UNAUTHORIZED, "Your session has expired. Please sign in again."),
    (keys::WALLET_NOT_FOUND, "Your wallet could not be found"),
    (keys::INVALID_OTP, "Invalid Google Authenticator code"),
    (keys::INSUFFICIENT_FEE_BALANCE, "Insufficient SOL balance for the transaction fee"),
    (keys::SOURCE_ACCOUNT_MISSING, "Source token account not found"),
    (keys::SAME_SENDER_RECEIVER, "Sender and receiver wallet addresses must be different"),
    (keys::INSUFFICIENT_BALANCE_FOR_FEE, "Insufficient wallet balance for the transaction fee"),
    (keys::MISSING_MINT_ADDRESS, "Token mint address is required for SPL tokens"),
    (keys::OTP_REQUIRED_BY_SERVER, "A Google Authenticator code is required for withdrawals"),
    (keys::GENERIC_TRANSACTION_ERROR, "Error creating the withdrawal transaction"),
    (keys::INSUFFICIENT_SOL_FOR_ACCOUNT, "Not enough SOL to create the recipient token account"),
    (keys::INVALID_ADDRESS, "Invalid Solana wallet address"),
    (keys::TRANSACTION_FAILED, "Transaction failed. Please try again."),
];

/// Built-in English catalog
///
/// Unknown keys are returned verbatim so a missing entry is visible rather
/// than blank.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnglishTranslator;

impl Translator for EnglishTranslator {
    fn lookup(&self, key: &str, params: &[(&str, &str)]) -> String {
        let template = ENGLISH
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, text)| *text)
            .unwrap_or(key);
        interpolate(template, params)
    }
}

/// Replace `{name}` placeholders
pub fn interpolate(template: &str, params: &[(&str, &str)]) -> String {
    params
        .iter()
        .fold(template.to_string(), |text, (name, value)| {
            text.replace(&format!("{{{}}}", name), value)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_with_params() {
        let text = EnglishTranslator.lookup(keys::AMOUNT_EXCEEDS_BALANCE, &[("balance", "5")]);
        assert_eq!(text, "Amount cannot exceed your balance of 5");
    }

    #[test]
    fn test_unknown_key_falls_through() {
        assert_eq!(EnglishTranslator.lookup("nope.key", &[]), "nope.key");
    }

    #[test]
    fn test_every_key_has_text() {
        for (key, text) in ENGLISH {
            assert!(!text.is_empty(), "empty text for {}", key);
        }
        let mut keys: Vec<_> = ENGLISH.iter().map(|(k, _)| *k).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), ENGLISH.len());
    }
}
