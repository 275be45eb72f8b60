//! Wallet REST API client
//!
//! One bearer-authenticated JSON client implementing every data adapter and
//! the transaction service. Paths are relative to the configured base URL.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::account::AccountInfo;
use crate::address_book::AddressBookEntry;
use crate::catalog::{TokenCatalog, TokenOption};
use crate::error::{Error, Result};
use crate::snapshot::SnapshotCell;
use crate::submission::{FailureSignal, SubmitReceipt, TransportCode, WithdrawPayload};

use super::{
    AccountAdapter, AddressBookAdapter, TokenCatalogAdapter, TransactionHistoryAdapter,
    TransactionRecord, TransactionService,
};

/// Withdrawable tokens with live balances
pub const TOKENS_PATH: &str = "telegram-wallets/tokens";
/// Signed-in account info
pub const ACCOUNT_PATH: &str = "telegram-wallets/info";
/// Address book, paged
pub const ADDRESS_BOOK_PATH: &str = "telegram-wallets/address-book";
/// Multi-token transactions: GET lists history, POST creates a withdrawal
pub const TRANSACTIONS_PATH: &str = "multi-token/transactions";

/// Error body of the wallet API; `message` is a string or a list of strings
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<ApiMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiMessage {
    One(String),
    Many(Vec<String>),
}

impl ApiMessage {
    fn into_text(self) -> Option<String> {
        match self {
            ApiMessage::One(text) => Some(text),
            ApiMessage::Many(list) => list.into_iter().next(),
        }
    }
}

/// Extract the human-readable message from an error response body
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .and_then(ApiMessage::into_text)
        .filter(|m| !m.is_empty())
}

/// List endpoints answer either a bare array or `{ "data": [...] }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListBody<T> {
    Wrapped { data: Vec<T> },
    Bare(Vec<T>),
}

impl<T> ListBody<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            ListBody::Wrapped { data } => data,
            ListBody::Bare(items) => items,
        }
    }
}

/// Ensure `base` ends with a slash so relative joins append to its path
fn normalize_base(base: &str) -> Result<Url> {
    let mut url = Url::parse(base)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Wallet REST API client
pub struct HttpWalletApi {
    client: Client,
    base_url: Url,
    access_token: Option<String>,
    timeout_ms: u64,
    history: Arc<SnapshotCell<Vec<TransactionRecord>>>,
}

impl HttpWalletApi {
    /// Create a client for `base_url`
    ///
    /// # Arguments
    /// * `base_url` - API root, e.g. `https://api.example.com/api/v1`
    /// * `access_token` - Bearer token of the signed-in user
    /// * `timeout_ms` - Per-request timeout
    pub fn new(base_url: &str, access_token: Option<String>, timeout_ms: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: normalize_base(base_url)?,
            access_token: access_token.filter(|t| !t.is_empty()),
            timeout_ms,
            history: Arc::new(SnapshotCell::new()),
        })
    }

    /// Latest transaction history fetched by [`TransactionHistoryAdapter::refresh`]
    pub fn history(&self) -> Arc<SnapshotCell<Vec<TransactionRecord>>> {
        Arc::clone(&self.history)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn map_send_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::ApiTimeout(self.timeout_ms)
        } else {
            Error::ApiUnreachable(e.to_string())
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self.endpoint(path)?;
        debug!("GET {}", url);

        let response = self
            .authorized(self.client.get(url).query(query))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ApiStatus {
                status: status.as_u16(),
                message: error_message(&body).unwrap_or_else(|| status.to_string()),
            });
        }

        response.json::<T>().await.map_err(|e| {
            Error::Deserialization(format!("Failed to parse {} response: {}", path, e))
        })
    }

    /// Fetch the transaction history
    pub async fn fetch_history(&self) -> Result<Vec<TransactionRecord>> {
        let body: ListBody<TransactionRecord> = self.get_json(TRANSACTIONS_PATH, &[]).await?;
        Ok(body.into_vec())
    }
}

#[async_trait]
impl TokenCatalogAdapter for HttpWalletApi {
    async fn fetch(&self) -> Result<Vec<TokenOption>> {
        let catalog: TokenCatalog = self.get_json(TOKENS_PATH, &[]).await?;
        debug!("Fetched {} tokens", catalog.len());
        Ok(catalog.tokens)
    }
}

#[async_trait]
impl AddressBookAdapter for HttpWalletApi {
    async fn fetch(&self, page: u32, page_size: u32) -> Result<Vec<AddressBookEntry>> {
        let query = [("page", page.to_string()), ("limit", page_size.to_string())];
        let body: ListBody<AddressBookEntry> = self.get_json(ADDRESS_BOOK_PATH, &query).await?;
        Ok(body.into_vec())
    }
}

#[async_trait]
impl AccountAdapter for HttpWalletApi {
    async fn fetch(&self) -> Result<AccountInfo> {
        self.get_json(ACCOUNT_PATH, &[]).await
    }
}

#[async_trait]
impl TransactionHistoryAdapter for HttpWalletApi {
    async fn refresh(&self) -> Result<()> {
        let records = self.fetch_history().await?;
        debug!("Transaction history refreshed: {} records", records.len());
        self.history.set(records);
        Ok(())
    }
}

#[async_trait]
impl TransactionService for HttpWalletApi {
    async fn submit(
        &self,
        payload: &WithdrawPayload,
    ) -> std::result::Result<SubmitReceipt, FailureSignal> {
        let url = self
            .endpoint(TRANSACTIONS_PATH)
            .map_err(|e| FailureSignal::message(e.to_string()))?;

        info!(
            "Submitting withdrawal: {} {} to {}",
            payload.amount, payload.token_symbol, payload.wallet_address_to
        );

        let response = self
            .authorized(self.client.post(url).json(payload))
            .send()
            .await
            .map_err(|e| {
                warn!("Withdrawal request did not complete: {}", e);
                FailureSignal {
                    transport_code: Some(if e.is_timeout() {
                        TransportCode::Timeout
                    } else {
                        TransportCode::Unreachable
                    }),
                    http_status: None,
                    message: None,
                }
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let message = error_message(&body);
            warn!("Withdrawal rejected with {}: {:?}", status, message);
            return Err(FailureSignal::status(status.as_u16(), message));
        }

        if status == StatusCode::NO_CONTENT || body.trim().is_empty() {
            return Ok(SubmitReceipt::default());
        }

        // A 2xx with an unexpected body still means the withdrawal was accepted
        Ok(serde_json::from_str(&body).unwrap_or_default())
    }
}
