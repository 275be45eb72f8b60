//! Token catalog snapshot
//!
//! The catalog is the most recently fetched list of withdrawable tokens with
//! their live balances. It is replaced wholesale on every refresh; nothing in
//! the composer caches balances out of it.

use serde::{Deserialize, Serialize};

/// One withdrawable token as reported by the wallet backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenOption {
    /// Mint address (empty for native SOL on some backends)
    #[serde(default)]
    pub token_address: String,
    #[serde(default)]
    pub token_name: String,
    /// Unique within one catalog snapshot
    pub token_symbol: String,
    #[serde(default)]
    pub token_logo_url: String,
    #[serde(default)]
    pub token_decimals: u8,
    #[serde(default)]
    pub token_balance: f64,
    #[serde(default)]
    pub token_balance_usd: f64,
    #[serde(default)]
    pub token_price_usd: f64,
    #[serde(default)]
    pub token_price_sol: f64,
    #[serde(default)]
    pub is_verified: bool,
}

/// Which quantity the selection threshold is compared against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMeasure {
    /// Raw token balance
    Tokens,
    /// Balance value in USD
    Usd,
}

impl std::fmt::Display for ThresholdMeasure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThresholdMeasure::Tokens => write!(f, "tokens"),
            ThresholdMeasure::Usd => write!(f, "usd"),
        }
    }
}

/// Minimum holding for a token to be offered for withdrawal
///
/// A token is selectable when its measured balance is strictly greater than
/// `minimum`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionThreshold {
    pub measure: ThresholdMeasure,
    pub minimum: f64,
}

impl Default for SelectionThreshold {
    fn default() -> Self {
        Self {
            measure: ThresholdMeasure::Tokens,
            minimum: 0.0,
        }
    }
}

impl SelectionThreshold {
    /// Threshold used by the dust-hiding variant of the withdraw screen
    pub fn usd(minimum: f64) -> Self {
        Self {
            measure: ThresholdMeasure::Usd,
            minimum,
        }
    }

    pub fn admits(&self, token: &TokenOption) -> bool {
        let measured = match self.measure {
            ThresholdMeasure::Tokens => token.token_balance,
            ThresholdMeasure::Usd => token.token_balance_usd,
        };
        measured > self.minimum
    }
}

/// Snapshot of the token catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenCatalog {
    #[serde(default)]
    pub tokens: Vec<TokenOption>,
}

impl TokenCatalog {
    pub fn new(tokens: Vec<TokenOption>) -> Self {
        Self { tokens }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Look up a token by its symbol
    pub fn find_by_symbol(&self, symbol: &str) -> Option<&TokenOption> {
        self.tokens.iter().find(|t| t.token_symbol == symbol)
    }

    /// Live balance of `symbol`, zero when the token is not in this snapshot
    pub fn balance_of(&self, symbol: &str) -> f64 {
        self.find_by_symbol(symbol)
            .map(|t| t.token_balance)
            .unwrap_or(0.0)
    }

    /// Tokens offered for selection under `threshold`, in catalog order
    pub fn selectable(&self, threshold: &SelectionThreshold) -> Vec<&TokenOption> {
        self.tokens.iter().filter(|t| threshold.admits(t)).collect()
    }

    /// First selectable token, used as the default selection
    pub fn default_selection(&self, threshold: &SelectionThreshold) -> Option<&TokenOption> {
        self.tokens.iter().find(|t| threshold.admits(t))
    }
}

/// Render a balance the way it is written into the amount field
///
/// Never produces exponent notation, so the result always satisfies the
/// amount input pattern.
pub fn format_balance(balance: f64) -> String {
    if !balance.is_finite() || balance <= 0.0 {
        return "0".to_string();
    }
    balance.to_string()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn token(symbol: &str, balance: f64, balance_usd: f64) -> TokenOption {
        TokenOption {
            token_address: format!("{}Mint1111111111111111111111111111111", symbol),
            token_name: symbol.to_string(),
            token_symbol: symbol.to_string(),
            token_logo_url: String::new(),
            token_decimals: 9,
            token_balance: balance,
            token_balance_usd: balance_usd,
            token_price_usd: 0.0,
            token_price_sol: 0.0,
            is_verified: true,
        }
    }

    #[test]
    fn test_balance_of_missing_token_is_zero() {
        let catalog = TokenCatalog::new(vec![token("SOL", 5.0, 750.0)]);
        assert_eq!(catalog.balance_of("SOL"), 5.0);
        assert_eq!(catalog.balance_of("USDC"), 0.0);
    }

    #[test]
    fn test_selectable_by_token_balance() {
        let catalog = TokenCatalog::new(vec![
            token("SOL", 5.0, 750.0),
            token("BONK", 0.0, 0.0),
            token("DUST", 0.5, 0.01),
        ]);
        let symbols: Vec<_> = catalog
            .selectable(&SelectionThreshold::default())
            .iter()
            .map(|t| t.token_symbol.as_str())
            .collect();
        assert_eq!(symbols, vec!["SOL", "DUST"]);
    }

    #[test]
    fn test_selectable_by_usd_value() {
        let catalog = TokenCatalog::new(vec![
            token("DUST", 0.5, 0.01),
            token("SOL", 5.0, 750.0),
            token("EDGE", 1.0, 0.05),
        ]);
        let selectable = catalog.selectable(&SelectionThreshold::usd(0.05));
        assert_eq!(selectable.len(), 1);
        assert_eq!(selectable[0].token_symbol, "SOL");
        assert_eq!(
            catalog
                .default_selection(&SelectionThreshold::usd(0.05))
                .map(|t| t.token_symbol.as_str()),
            Some("SOL")
        );
    }

    #[test]
    fn test_catalog_deserialize_with_missing_fields() {
        let json = r#"{"tokens":[{"token_symbol":"SOL","token_balance":1.25}]}"#;
        let catalog: TokenCatalog = serde_json::from_str(json).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.tokens[0].token_balance, 1.25);
        assert!(catalog.tokens[0].token_address.is_empty());
    }

    #[test]
    fn test_format_balance() {
        assert_eq!(format_balance(5.0), "5");
        assert_eq!(format_balance(0.125), "0.125");
        assert_eq!(format_balance(0.0000001), "0.0000001");
        assert_eq!(format_balance(-1.0), "0");
    }
}
