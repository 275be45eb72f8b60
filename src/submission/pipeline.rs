//! Withdraw session: snapshots, composer and submission pipeline
//!
//! The session owns the three snapshot cells, the composer and the recipient
//! resolver. Every operation takes the state lock, mutates, then drains the
//! composer's draft events into the resolver and recomputes the disabled
//! state. The lock is released while the transaction service call is
//! awaited; `is_sending` keeps a second submit out.
//!
//! ```text
//!   Idle ──guard ok──→ Sending ──ok──→ Succeeded ──→ Idle
//!    ↑                    └────err──→ Failed ─────────┘
//!    └── guard rejected (BlockReason)
//! ```

use std::sync::Arc;

use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::account::{two_factor_required, AccountInfo, OwnAddressProvider};
use crate::address_book::{AddressBook, AddressBookEntry, RecipientResolver};
use crate::catalog::{SelectionThreshold, TokenCatalog, TokenOption};
use crate::composer::amount::parse_amount;
use crate::composer::{
    BalanceView, CatalogStatus, DisabledState, DraftEvent, FocusController, OtpError,
    RecipientError, RecipientOrigin, WithdrawalComposer, WithdrawalDraft,
};
use crate::error::{Error, Result};
use crate::i18n::{keys, Translator};
use crate::services::{
    AccountAdapter, AddressBookAdapter, Notifier, TokenCatalogAdapter, TransactionHistoryAdapter,
    TransactionService,
};
use crate::snapshot::SnapshotCell;

use super::{ErrorCategory, ErrorClassifier, SubmissionOutcome, WithdrawPayload};

/// External collaborators of a session
#[derive(Clone)]
pub struct Collaborators {
    pub catalog: Arc<dyn TokenCatalogAdapter>,
    pub address_book: Arc<dyn AddressBookAdapter>,
    pub account: Arc<dyn AccountAdapter>,
    pub history: Arc<dyn TransactionHistoryAdapter>,
    pub transactions: Arc<dyn TransactionService>,
    pub notifier: Arc<dyn Notifier>,
    pub translator: Arc<dyn Translator>,
    pub focus: Arc<dyn FocusController>,
}

/// Tunables of a session
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub threshold: SelectionThreshold,
    /// Address book page to fetch
    pub page: u32,
    pub page_size: u32,
    pub classifier: ErrorClassifier,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            threshold: SelectionThreshold::default(),
            page: 1,
            page_size: 100,
            classifier: ErrorClassifier::default(),
        }
    }
}

/// Submission pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Sending,
    Succeeded,
    Failed,
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineState::Idle => write!(f, "idle"),
            PipelineState::Sending => write!(f, "sending"),
            PipelineState::Succeeded => write!(f, "succeeded"),
            PipelineState::Failed => write!(f, "failed"),
        }
    }
}

/// Why the entry guard refused a submit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    NoTokenSelected,
    /// Another submission is in flight
    AlreadySending,
    /// Send is disabled or the form is incomplete
    SendDisabled,
    RecipientRequired,
    OtpIncomplete,
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockReason::NoTokenSelected => write!(f, "no token selected"),
            BlockReason::AlreadySending => write!(f, "a withdrawal is already in flight"),
            BlockReason::SendDisabled => write!(f, "send is disabled"),
            BlockReason::RecipientRequired => write!(f, "recipient address required"),
            BlockReason::OtpIncomplete => write!(f, "two-factor code incomplete"),
        }
    }
}

/// Result of a submit call
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitResult {
    /// Rejected by the entry guard; no network call was made
    Blocked(BlockReason),
    /// The transaction service answered
    Completed(SubmissionOutcome),
}

struct SessionState {
    composer: WithdrawalComposer,
    resolver: RecipientResolver,
    events: broadcast::Receiver<DraftEvent>,
    disabled: DisabledState,
    phase: PipelineState,
}

/// One withdraw screen's worth of state
#[derive(Clone)]
pub struct WithdrawSession {
    collaborators: Collaborators,
    settings: SessionSettings,
    catalog: Arc<SnapshotCell<TokenCatalog>>,
    address_book: Arc<SnapshotCell<AddressBook>>,
    account: Arc<SnapshotCell<AccountInfo>>,
    state: Arc<Mutex<SessionState>>,
}

impl WithdrawSession {
    pub fn new(collaborators: Collaborators, settings: SessionSettings) -> Self {
        let catalog = Arc::new(SnapshotCell::new());
        let address_book = Arc::new(SnapshotCell::new());
        let account = Arc::new(SnapshotCell::new());

        let composer = WithdrawalComposer::new(
            Arc::clone(&catalog),
            settings.threshold,
            Arc::clone(&collaborators.focus),
        );
        let events = composer.subscribe();
        let resolver = RecipientResolver::new(Arc::clone(&address_book));

        let state = SessionState {
            composer,
            resolver,
            events,
            disabled: DisabledState::default(),
            phase: PipelineState::Idle,
        };

        let session = Self {
            collaborators,
            settings,
            catalog,
            address_book,
            account,
            state: Arc::new(Mutex::new(state)),
        };

        // Nothing is loaded yet: start from the computed (fully disabled) send state
        if let Ok(mut state) = session.state.try_lock() {
            session.sync(&mut state);
        }
        session
    }

    pub fn catalog(&self) -> Arc<SnapshotCell<TokenCatalog>> {
        Arc::clone(&self.catalog)
    }

    pub fn address_book(&self) -> Arc<SnapshotCell<AddressBook>> {
        Arc::clone(&self.address_book)
    }

    pub fn account(&self) -> Arc<SnapshotCell<AccountInfo>> {
        Arc::clone(&self.account)
    }

    /// Drain pending draft events into dependents and recompute derived state
    fn sync(&self, state: &mut SessionState) {
        loop {
            match state.events.try_recv() {
                Ok(event) => state.resolver.apply(&event),
                Err(TryRecvError::Lagged(skipped)) => {
                    debug!("Draft event receiver lagged by {} events", skipped);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        state.disabled = state
            .composer
            .compute_disabled_state(self.account.has_own_address());
    }

    fn text(&self, key: &str) -> String {
        self.collaborators.translator.lookup(key, &[])
    }

    // ---------------------------------------------------------------------
    // Snapshot refreshes
    // ---------------------------------------------------------------------

    /// Fetch catalog, address book and account concurrently
    ///
    /// All three are attempted; the first error is returned.
    pub async fn load_all(&self) -> Result<()> {
        let (catalog, address_book, account) = futures::join!(
            self.refresh_catalog(),
            self.refresh_address_book(),
            self.refresh_account()
        );
        catalog.and(address_book).and(account)
    }

    pub async fn refresh_catalog(&self) -> Result<()> {
        let tokens = self.collaborators.catalog.fetch().await.map_err(|e| {
            warn!("Token catalog refresh failed: {}", e);
            e
        })?;
        info!("Token catalog refreshed: {} tokens", tokens.len());
        self.catalog.set(TokenCatalog::new(tokens));

        let mut state = self.state.lock().await;
        state.composer.on_catalog_refreshed();
        self.sync(&mut state);
        Ok(())
    }

    /// Refresh the catalog in the background
    pub fn spawn_catalog_refresh(&self) -> JoinHandle<()> {
        let session = self.clone();
        tokio::spawn(async move {
            // Failure already logged; the previous snapshot stays in place
            let _ = session.refresh_catalog().await;
        })
    }

    pub async fn refresh_address_book(&self) -> Result<()> {
        let entries = self
            .collaborators
            .address_book
            .fetch(self.settings.page, self.settings.page_size)
            .await
            .map_err(|e| {
                warn!("Address book refresh failed: {}", e);
                e
            })?;
        info!("Address book refreshed: {} entries", entries.len());
        self.address_book.set(AddressBook::new(entries));

        let mut state = self.state.lock().await;
        state.resolver.on_address_book_changed();
        self.sync(&mut state);
        Ok(())
    }

    pub async fn refresh_account(&self) -> Result<()> {
        let info = self.collaborators.account.fetch().await.map_err(|e| {
            warn!("Account info refresh failed: {}", e);
            e
        })?;
        info!(
            "Account info refreshed (own address: {}, two-factor: {})",
            info.own_address().is_some(),
            info.two_factor_enabled
        );
        self.account.set(info);

        let mut state = self.state.lock().await;
        self.sync(&mut state);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------

    /// Copy of the current draft
    pub async fn draft(&self) -> WithdrawalDraft {
        self.state.lock().await.composer.draft().clone()
    }

    pub async fn disabled_state(&self) -> DisabledState {
        self.state.lock().await.disabled
    }

    /// Whether the submit button is disabled
    pub async fn submit_disabled(&self) -> bool {
        let state = self.state.lock().await;
        state.composer.submit_disabled(&state.disabled)
    }

    pub async fn phase(&self) -> PipelineState {
        self.state.lock().await.phase
    }

    pub async fn catalog_status(&self) -> CatalogStatus {
        self.state.lock().await.composer.catalog_status()
    }

    pub async fn selectable_tokens(&self) -> Vec<TokenOption> {
        self.state.lock().await.composer.selectable_tokens()
    }

    pub async fn balance_view(&self) -> Option<BalanceView> {
        self.state.lock().await.composer.balance_view()
    }

    /// Candidates as the view shows them; empty while the list is hidden
    pub async fn visible_candidates(&self) -> Vec<AddressBookEntry> {
        self.state.lock().await.resolver.visible_candidates().to_vec()
    }

    /// Candidates for the current recipient text, shown or not
    pub async fn candidates(&self) -> Vec<AddressBookEntry> {
        self.state.lock().await.resolver.candidates().to_vec()
    }

    pub fn two_factor_required(&self) -> bool {
        two_factor_required(&self.account)
    }

    // ---------------------------------------------------------------------
    // Edits
    // ---------------------------------------------------------------------

    pub async fn select_token(&self, symbol: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        let result = state.composer.select_symbol(symbol);
        self.sync(&mut state);
        result
    }

    pub async fn set_amount(&self, raw: &str) -> bool {
        let mut state = self.state.lock().await;
        let accepted = state.composer.set_amount(raw);
        self.sync(&mut state);
        accepted
    }

    pub async fn max_amount(&self) -> bool {
        let mut state = self.state.lock().await;
        let accepted = state.composer.max_amount();
        self.sync(&mut state);
        accepted
    }

    /// The user typed into the recipient input
    pub async fn edit_recipient(&self, text: &str) -> bool {
        let mut state = self.state.lock().await;
        let accepted = state.composer.set_recipient(text, RecipientOrigin::Typed);
        self.sync(&mut state);
        accepted
    }

    pub async fn focus_recipient(&self) {
        self.state.lock().await.resolver.focus();
    }

    pub async fn dismiss_candidates(&self) {
        self.state.lock().await.resolver.dismiss();
    }

    /// Pick the candidate at `index` as recipient
    pub async fn choose_candidate(&self, index: usize) -> Option<AddressBookEntry> {
        let mut state = self.state.lock().await;
        if state.composer.draft().is_sending {
            return None;
        }
        let entry = state.resolver.choose(index)?;
        state
            .composer
            .set_recipient(&entry.solana_address, RecipientOrigin::Chosen);
        self.sync(&mut state);
        Some(entry)
    }

    /// Use the address book entry with `wallet_id` as recipient
    pub async fn choose_contact(&self, wallet_id: u64) -> Result<AddressBookEntry> {
        let book = self
            .address_book
            .get()
            .into_loaded()
            .ok_or(Error::AddressBookNotLoaded)?;
        let entry = book
            .entries
            .iter()
            .find(|e| e.wallet_id == wallet_id)
            .cloned()
            .ok_or_else(|| Error::ContactNotFound(wallet_id.to_string()))?;

        let mut state = self.state.lock().await;
        let accepted = state
            .composer
            .set_recipient(&entry.solana_address, RecipientOrigin::Chosen);
        self.sync(&mut state);
        if !accepted {
            return Err(Error::DraftLocked);
        }
        Ok(entry)
    }

    pub async fn set_otp_digit(&self, index: usize, value: &str) -> bool {
        let mut state = self.state.lock().await;
        let accepted = state.composer.set_otp_digit(index, value);
        self.sync(&mut state);
        accepted
    }

    pub async fn backspace_otp(&self, index: usize) {
        self.state.lock().await.composer.backspace_otp(index);
    }

    pub async fn paste_otp(&self, text: &str) -> bool {
        let mut state = self.state.lock().await;
        let accepted = state.composer.paste_otp(text);
        self.sync(&mut state);
        accepted
    }

    /// The user's own address, when copying is enabled
    pub async fn copy_own_address(&self) -> Option<String> {
        let disabled = self.state.lock().await.disabled;
        if disabled.copy {
            return None;
        }
        let address = self
            .account
            .get()
            .as_loaded()
            .and_then(|info| info.own_address().map(str::to_string))?;
        self.collaborators
            .notifier
            .success(&self.text(keys::ADDRESS_COPIED));
        Some(address)
    }

    // ---------------------------------------------------------------------
    // Submission
    // ---------------------------------------------------------------------

    /// Run the entry guard; on success the draft is locked and the payload built
    fn prepare(
        &self,
        state: &mut SessionState,
    ) -> std::result::Result<WithdrawPayload, BlockReason> {
        self.sync(state);

        let Some(token) = state.composer.draft().selected_token.clone() else {
            self.collaborators
                .notifier
                .error(&self.text(keys::SELECT_TOKEN_FIRST));
            return Err(BlockReason::NoTokenSelected);
        };

        if state.composer.draft().is_sending {
            return Err(BlockReason::AlreadySending);
        }

        if state.disabled.send || state.composer.submit_disabled(&state.disabled) {
            return Err(BlockReason::SendDisabled);
        }

        if state.composer.draft().recipient_address.trim().is_empty() {
            state
                .composer
                .set_recipient_error(Some(RecipientError::Required));
            return Err(BlockReason::RecipientRequired);
        }

        let two_factor = two_factor_required(&self.account);
        if two_factor && !state.composer.draft().otp.is_complete() {
            state.composer.set_otp_error(Some(OtpError::Incomplete));
            return Err(BlockReason::OtpIncomplete);
        }

        state.composer.set_recipient_error(None);
        state.composer.set_otp_error(None);

        let draft = state.composer.draft();
        let payload = WithdrawPayload::withdraw(
            &token,
            &draft.recipient_address,
            parse_amount(&draft.amount).unwrap_or(0.0),
            two_factor.then(|| draft.otp.join()),
            &self.text(keys::NOT_AVAILABLE),
        );

        state.composer.begin_sending();
        state.phase = PipelineState::Sending;
        Ok(payload)
    }

    /// Submit the draft
    pub async fn submit(&self) -> SubmitResult {
        let payload = {
            let mut state = self.state.lock().await;
            let prepared = self.prepare(&mut state);
            self.sync(&mut state);
            match prepared {
                Ok(payload) => payload,
                Err(reason) => {
                    debug!("Submit blocked: {}", reason);
                    return SubmitResult::Blocked(reason);
                }
            }
        };

        let result = self.collaborators.transactions.submit(&payload).await;

        let mut state = self.state.lock().await;
        let outcome = match result {
            Ok(receipt) => {
                info!(
                    "Withdrawal accepted: {} {} to {} (tx: {})",
                    payload.amount,
                    payload.token_symbol,
                    payload.wallet_address_to,
                    receipt.transaction_id.as_deref().unwrap_or("-")
                );
                state.phase = PipelineState::Succeeded;
                state.composer.finish_success();
                self.spawn_post_success_refresh();
                self.collaborators
                    .notifier
                    .success(&self.text(keys::TRANSACTION_SUCCESS));
                SubmissionOutcome::Success(receipt)
            }
            Err(signal) => {
                let failure = self.settings.classifier.classify(&signal);
                warn!("Withdrawal failed [{}]: {}", failure.category, signal);
                state.phase = PipelineState::Failed;
                self.collaborators
                    .notifier
                    .error(&failure.display_text(self.collaborators.translator.as_ref()));
                state
                    .composer
                    .finish_failure(failure.category == ErrorCategory::InvalidOtp);
                SubmissionOutcome::Failure(failure)
            }
        };

        debug!("Pipeline {} -> {}", state.phase, PipelineState::Idle);
        state.phase = PipelineState::Idle;
        self.sync(&mut state);
        SubmitResult::Completed(outcome)
    }

    fn spawn_post_success_refresh(&self) {
        let history = Arc::clone(&self.collaborators.history);
        tokio::spawn(async move {
            if let Err(e) = history.refresh().await {
                warn!("Transaction history refresh failed: {}", e);
            }
        });
        self.spawn_catalog_refresh();
    }
}
