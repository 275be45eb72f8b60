//! External collaborators of the composer
//!
//! The composer and submission pipeline only see these traits. The
//! [`http`] module implements the data adapters and the transaction service
//! against the wallet REST API; [`notify`] holds the notification sinks.
//!
//! # Architecture
//!
//! ```text
//! TokenCatalogAdapter ──┐
//! AddressBookAdapter  ──┼──→ SnapshotCell<…> ──→ WithdrawSession
//! AccountAdapter      ──┘                            │
//!                                                    ├──→ TransactionService
//! TransactionHistoryAdapter ←── refresh on success ──┤
//!                                  Notifier ←────────┘
//! ```

pub mod http;
pub mod notify;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::account::AccountInfo;
use crate::address_book::AddressBookEntry;
use crate::catalog::TokenOption;
use crate::error::Result;
use crate::submission::{FailureSignal, SubmitReceipt, WithdrawPayload};

pub use http::HttpWalletApi;
pub use notify::{ConsoleNotifier, Notifier};

/// Source of the token catalog
#[async_trait]
pub trait TokenCatalogAdapter: Send + Sync {
    async fn fetch(&self) -> Result<Vec<TokenOption>>;
}

/// Source of the address book, one page at a time
#[async_trait]
pub trait AddressBookAdapter: Send + Sync {
    async fn fetch(&self, page: u32, page_size: u32) -> Result<Vec<AddressBookEntry>>;
}

/// Source of the signed-in account's info
#[async_trait]
pub trait AccountAdapter: Send + Sync {
    async fn fetch(&self) -> Result<AccountInfo>;
}

/// Transaction history; the composer only asks it to refresh
#[async_trait]
pub trait TransactionHistoryAdapter: Send + Sync {
    async fn refresh(&self) -> Result<()>;
}

/// Remote service that executes withdrawals
#[async_trait]
pub trait TransactionService: Send + Sync {
    async fn submit(
        &self,
        payload: &WithdrawPayload,
    ) -> std::result::Result<SubmitReceipt, FailureSignal>;
}

/// One row of the transaction history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    #[serde(default)]
    pub id: u64,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub token_symbol: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub wallet_address_to: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
