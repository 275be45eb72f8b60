//! Account information of the signed-in user

use serde::{Deserialize, Serialize};

use crate::snapshot::SnapshotCell;

/// What the wallet backend reports about the signed-in account
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    /// The user's own custodial Solana address
    #[serde(default)]
    pub solana_address: Option<String>,
    /// Account requires a two-factor code for withdrawals
    #[serde(default, alias = "isGGAuth")]
    pub two_factor_enabled: bool,
}

impl AccountInfo {
    pub fn own_address(&self) -> Option<&str> {
        self.solana_address.as_deref().filter(|a| !a.trim().is_empty())
    }
}

/// Answers whether the user has a resolvable source wallet address
pub trait OwnAddressProvider: Send + Sync {
    fn has_own_address(&self) -> bool;
}

impl OwnAddressProvider for SnapshotCell<AccountInfo> {
    fn has_own_address(&self) -> bool {
        self.get()
            .as_loaded()
            .map_or(false, |info| info.own_address().is_some())
    }
}

/// Two-factor flag of the latest account snapshot; false until it loads
pub fn two_factor_required(account: &SnapshotCell<AccountInfo>) -> bool {
    account
        .get()
        .as_loaded()
        .map_or(false, |info| info.two_factor_enabled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_backend_flag() {
        let info: AccountInfo =
            serde_json::from_str(r#"{"solana_address":"Own1","isGGAuth":true}"#).unwrap();
        assert!(info.two_factor_enabled);
        assert_eq!(info.own_address(), Some("Own1"));
    }

    #[test]
    fn test_own_address_provider() {
        let cell = SnapshotCell::new();
        assert!(!cell.has_own_address());
        assert!(!two_factor_required(&cell));

        cell.set(AccountInfo {
            solana_address: Some("  ".to_string()),
            two_factor_enabled: true,
        });
        assert!(!cell.has_own_address());
        assert!(two_factor_required(&cell));

        cell.set(AccountInfo {
            solana_address: Some("Own1".to_string()),
            two_factor_enabled: false,
        });
        assert!(cell.has_own_address());
    }
}
