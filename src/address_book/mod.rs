//! Address book of the user's known wallets
//!
//! Entries are read-only reference data fetched page by page from the wallet
//! backend. The [`resolver`] turns free-text recipient input into candidates.

pub mod resolver;

use serde::{Deserialize, Serialize};

pub use resolver::RecipientResolver;

/// Kind of a wallet in the address book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletKind {
    /// The account's primary wallet
    Main,
    /// A secondary wallet linked to the account
    Sub,
}

impl std::fmt::Display for WalletKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WalletKind::Main => write!(f, "main"),
            WalletKind::Sub => write!(f, "sub"),
        }
    }
}

/// One address book entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressBookEntry {
    pub wallet_id: u64,
    #[serde(default)]
    pub wallet_nick_name: String,
    #[serde(default)]
    pub wallet_name: String,
    #[serde(default)]
    pub solana_address: String,
    #[serde(default)]
    pub eth_address: String,
    pub wallet_type: WalletKind,
    #[serde(default)]
    pub wallet_country: String,
}

impl AddressBookEntry {
    /// Case-insensitive substring match over nick name, name and both addresses
    ///
    /// `needle` must already be lowercased.
    pub fn matches(&self, needle: &str) -> bool {
        [
            &self.wallet_nick_name,
            &self.wallet_name,
            &self.solana_address,
            &self.eth_address,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
    }

    /// Short label for listings: nick name, else wallet name, else address
    pub fn label(&self) -> &str {
        if !self.wallet_nick_name.is_empty() {
            &self.wallet_nick_name
        } else if !self.wallet_name.is_empty() {
            &self.wallet_name
        } else {
            &self.solana_address
        }
    }
}

/// Snapshot of the address book
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressBook {
    #[serde(default)]
    pub entries: Vec<AddressBookEntry>,
}

impl AddressBook {
    pub fn new(entries: Vec<AddressBookEntry>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
