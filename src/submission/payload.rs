//! Request body sent to the transaction service

use serde::{Deserialize, Serialize};

use crate::catalog::TokenOption;

/// Transaction type of a withdrawal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Withdraw,
    Deposit,
}

/// Withdrawal request payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WithdrawPayload {
    pub wallet_address_to: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub token_symbol: String,
    /// Omitted for tokens without a mint address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_mint_address: Option<String>,
    /// Present only when the account requires two-factor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_auth_token: Option<String>,
}

impl WithdrawPayload {
    /// Build the payload for `token`
    ///
    /// `not_available` replaces an empty token symbol.
    pub fn withdraw(
        token: &TokenOption,
        recipient: &str,
        amount: f64,
        otp_code: Option<String>,
        not_available: &str,
    ) -> Self {
        let token_symbol = if token.token_symbol.is_empty() {
            not_available.to_string()
        } else {
            token.token_symbol.clone()
        };
        let token_mint_address = if token.token_address.is_empty() {
            None
        } else {
            Some(token.token_address.clone())
        };

        Self {
            wallet_address_to: recipient.to_string(),
            amount,
            kind: TransactionKind::Withdraw,
            token_symbol,
            token_mint_address,
            google_auth_token: otp_code,
        }
    }
}

/// Successful answer of the transaction service
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SubmitReceipt {
    #[serde(default)]
    pub message: Option<String>,
    /// Transaction signature, when the backend reports one
    #[serde(default, alias = "signature", alias = "tx_hash")]
    pub transaction_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::token;

    #[test]
    fn test_payload_serialization() {
        let payload = WithdrawPayload::withdraw(
            &token("USDC", 10.0, 10.0),
            "Addr1",
            3.0,
            Some("123456".to_string()),
            "N/A",
        );
        let json: serde_json::Value = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "withdraw");
        assert_eq!(json["amount"], 3.0);
        assert_eq!(json["token_symbol"], "USDC");
        assert_eq!(json["google_auth_token"], "123456");
        assert!(json["token_mint_address"].as_str().unwrap().starts_with("USDC"));
    }

    #[test]
    fn test_optional_fields_omitted() {
        let mut sol = token("", 5.0, 750.0);
        sol.token_address.clear();
        let payload = WithdrawPayload::withdraw(&sol, "Addr1", 1.5, None, "N/A");
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"token_symbol\":\"N/A\""));
        assert!(!json.contains("token_mint_address"));
        assert!(!json.contains("google_auth_token"));
    }

    #[test]
    fn test_receipt_aliases() {
        let receipt: SubmitReceipt =
            serde_json::from_str(r#"{"message":"ok","signature":"5xSig"}"#).unwrap();
        assert_eq!(receipt.transaction_id.as_deref(), Some("5xSig"));
        let empty: SubmitReceipt = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, SubmitReceipt::default());
    }
}
