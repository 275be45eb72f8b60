//! Withdrawal composer
//!
//! Owns the draft, validates every field edit against the live token catalog
//! and publishes a [`DraftEvent`] after each mutation. Dependents (the
//! disabled-state cache, the recipient resolver) recompute when they receive
//! the event.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::debug;

use crate::catalog::{format_balance, SelectionThreshold, TokenCatalog, TokenOption};
use crate::error::{Error, Result};
use crate::snapshot::SnapshotCell;

use super::amount::{is_amount_text, is_zero_amount, parse_amount};
use super::draft::{
    AmountError, DisabledInputs, DisabledState, DraftEvent, OtpError, RecipientError,
    RecipientOrigin, WithdrawalDraft, DEFAULT_AMOUNT,
};
use super::otp::{FocusController, OtpAssembler};

/// Capacity of the draft event channel
const EVENT_CAPACITY: usize = 64;

/// Loading state of the token catalog as seen by the form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogStatus {
    /// No snapshot has arrived yet
    Loading,
    /// Snapshot arrived with no tokens in it
    Empty,
    Ready,
}

/// Live balance figures of the selected token
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceView {
    pub symbol: String,
    pub balance: f64,
    pub balance_usd: f64,
    pub price_usd: f64,
}

/// Stateful owner of the withdrawal draft
pub struct WithdrawalComposer {
    draft: WithdrawalDraft,
    catalog: Arc<SnapshotCell<TokenCatalog>>,
    threshold: SelectionThreshold,
    events: broadcast::Sender<DraftEvent>,
}

impl WithdrawalComposer {
    pub fn new(
        catalog: Arc<SnapshotCell<TokenCatalog>>,
        threshold: SelectionThreshold,
        focus: Arc<dyn FocusController>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            draft: WithdrawalDraft::new(OtpAssembler::new(focus)),
            catalog,
            threshold,
            events,
        }
    }

    /// Subscribe to draft-changed events
    pub fn subscribe(&self) -> broadcast::Receiver<DraftEvent> {
        self.events.subscribe()
    }

    pub fn draft(&self) -> &WithdrawalDraft {
        &self.draft
    }

    pub fn threshold(&self) -> &SelectionThreshold {
        &self.threshold
    }

    fn publish(&self, event: DraftEvent) {
        // No subscribers is fine: the event simply has no audience yet
        let _ = self.events.send(event);
    }

    fn locked(&self, field: &str) -> bool {
        if self.draft.is_sending {
            debug!("Ignoring {} edit while a withdrawal is in flight", field);
        }
        self.draft.is_sending
    }

    // ---------------------------------------------------------------------
    // Catalog reads
    // ---------------------------------------------------------------------

    pub fn catalog_status(&self) -> CatalogStatus {
        match self.catalog.get().into_loaded() {
            None => CatalogStatus::Loading,
            Some(catalog) if catalog.is_empty() => CatalogStatus::Empty,
            Some(_) => CatalogStatus::Ready,
        }
    }

    /// Tokens offered for selection, in catalog order
    pub fn selectable_tokens(&self) -> Vec<TokenOption> {
        self.catalog
            .get()
            .into_loaded()
            .map(|catalog| catalog.selectable(&self.threshold).into_iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Current balance of the selected token from the latest snapshot
    ///
    /// `None` without a selection or without a snapshot; zero when the
    /// selected token is missing from the snapshot.
    pub fn live_balance(&self) -> Option<f64> {
        let symbol = self.draft.selected_symbol()?;
        let catalog = self.catalog.get().into_loaded()?;
        Some(catalog.balance_of(symbol))
    }

    pub fn balance_view(&self) -> Option<BalanceView> {
        let symbol = self.draft.selected_symbol()?;
        let catalog = self.catalog.get().into_loaded()?;
        let view = match catalog.find_by_symbol(symbol) {
            Some(token) => BalanceView {
                symbol: symbol.to_string(),
                balance: token.token_balance,
                balance_usd: token.token_balance_usd,
                price_usd: token.token_price_usd,
            },
            None => BalanceView {
                symbol: symbol.to_string(),
                balance: 0.0,
                balance_usd: 0.0,
                price_usd: 0.0,
            },
        };
        Some(view)
    }

    // ---------------------------------------------------------------------
    // Field operations
    // ---------------------------------------------------------------------

    /// Replace the selected token; resets the amount to "0"
    pub fn select_token(&mut self, token: TokenOption) -> bool {
        if self.locked("token") {
            return false;
        }
        debug!("Selected token {}", token.token_symbol);
        let symbol = token.token_symbol.clone();
        self.draft.selected_token = Some(token);
        self.draft.amount = DEFAULT_AMOUNT.to_string();
        self.draft.amount_error = None;
        self.publish(DraftEvent::TokenSelected { symbol });
        true
    }

    /// Select a token from the current snapshot by symbol
    ///
    /// Only tokens the selection threshold admits can be selected.
    pub fn select_symbol(&mut self, symbol: &str) -> Result<()> {
        let catalog = self
            .catalog
            .get()
            .into_loaded()
            .ok_or(Error::CatalogNotLoaded)?;
        let token = catalog
            .find_by_symbol(symbol)
            .ok_or_else(|| Error::TokenNotFound(symbol.to_string()))?;
        if !self.threshold.admits(token) {
            return Err(Error::TokenNotSelectable(symbol.to_string()));
        }
        if !self.select_token(token.clone()) {
            return Err(Error::DraftLocked);
        }
        Ok(())
    }

    /// Store new amount text and revalidate it
    ///
    /// Text that does not match the amount pattern is ignored and the
    /// previous value is kept.
    pub fn set_amount(&mut self, raw: &str) -> bool {
        if self.locked("amount") {
            return false;
        }
        if !is_amount_text(raw) {
            debug!("Rejected amount text {:?}", raw);
            return false;
        }
        self.draft.amount = raw.to_string();
        self.revalidate_amount();
        self.publish(DraftEvent::AmountChanged {
            amount: self.draft.amount.clone(),
        });
        true
    }

    /// Fill the amount with the full live balance
    pub fn max_amount(&mut self) -> bool {
        if self.locked("amount") {
            return false;
        }
        let Some(balance) = self.live_balance() else {
            return false;
        };
        self.draft.amount = format_balance(balance);
        self.revalidate_amount();
        self.publish(DraftEvent::AmountChanged {
            amount: self.draft.amount.clone(),
        });
        true
    }

    /// Recheck the amount against the live balance
    ///
    /// Called after every amount edit and whenever a new catalog snapshot
    /// lands.
    pub fn revalidate_amount(&mut self) {
        let next = match (self.live_balance(), parse_amount(&self.draft.amount)) {
            (Some(balance), Some(amount)) if amount > balance => {
                Some(AmountError::ExceedsBalance { balance })
            }
            _ => None,
        };
        if next != self.draft.amount_error {
            self.draft.amount_error = next;
            self.publish(DraftEvent::ErrorsChanged);
        }
    }

    /// A new catalog snapshot landed
    ///
    /// Picks a default token when none is selected yet and revalidates the
    /// amount against the new balances.
    pub fn on_catalog_refreshed(&mut self) {
        if self.draft.selected_token.is_none() && !self.draft.is_sending {
            let first = self
                .catalog
                .get()
                .into_loaded()
                .and_then(|c| c.default_selection(&self.threshold).cloned());
            if let Some(token) = first {
                self.select_token(token);
            }
        }
        self.revalidate_amount();
    }

    pub fn set_recipient(&mut self, text: &str, origin: RecipientOrigin) -> bool {
        if self.locked("recipient") {
            return false;
        }
        self.draft.recipient_address = text.to_string();
        self.publish(DraftEvent::RecipientChanged {
            value: text.to_string(),
            origin,
        });
        true
    }

    pub fn set_otp_digit(&mut self, index: usize, value: &str) -> bool {
        if self.locked("code") {
            return false;
        }
        let accepted = self.draft.otp.set_digit(index, value);
        if accepted {
            self.publish(DraftEvent::OtpChanged);
        }
        accepted
    }

    pub fn backspace_otp(&self, index: usize) {
        if !self.draft.is_sending {
            self.draft.otp.backspace_at(index);
        }
    }

    pub fn paste_otp(&mut self, text: &str) -> bool {
        if self.locked("code") {
            return false;
        }
        let accepted = self.draft.otp.paste_sequence(text);
        if accepted {
            self.publish(DraftEvent::OtpChanged);
        }
        accepted
    }

    // ---------------------------------------------------------------------
    // Derived state
    // ---------------------------------------------------------------------

    pub fn compute_disabled_state(&self, has_own_address: bool) -> DisabledState {
        DisabledState::compute(DisabledInputs {
            token_selected: self.draft.selected_token.is_some(),
            has_own_address,
            is_sending: self.draft.is_sending,
            has_amount_error: self.draft.amount_error.is_some(),
            amount: parse_amount(&self.draft.amount),
            live_balance: self.live_balance().unwrap_or(0.0),
        })
    }

    /// Submit button disablement: `send` plus the form-level checks
    pub fn submit_disabled(&self, disabled: &DisabledState) -> bool {
        disabled.send
            || self.draft.recipient_address.is_empty()
            || self.draft.selected_token.is_none()
            || is_zero_amount(&self.draft.amount)
    }

    // ---------------------------------------------------------------------
    // Submission hooks
    // ---------------------------------------------------------------------

    pub(crate) fn set_recipient_error(&mut self, error: Option<RecipientError>) {
        if self.draft.recipient_error != error {
            self.draft.recipient_error = error;
            self.publish(DraftEvent::ErrorsChanged);
        }
    }

    pub(crate) fn set_otp_error(&mut self, error: Option<OtpError>) {
        if self.draft.otp_error != error {
            self.draft.otp_error = error;
            self.publish(DraftEvent::ErrorsChanged);
        }
    }

    pub(crate) fn begin_sending(&mut self) {
        self.draft.is_sending = true;
        self.publish(DraftEvent::SendingChanged { is_sending: true });
    }

    /// Successful submission: clear amount, recipient and code
    pub(crate) fn finish_success(&mut self) {
        self.draft.amount = DEFAULT_AMOUNT.to_string();
        self.draft.recipient_address.clear();
        self.draft.otp.clear();
        self.draft.amount_error = None;
        self.draft.is_sending = false;
        self.publish(DraftEvent::Reset);
        self.publish(DraftEvent::SendingChanged { is_sending: false });
    }

    /// Failed submission: unlock, keep every field for a retry
    pub(crate) fn finish_failure(&mut self, otp_rejected: bool) {
        if otp_rejected {
            self.set_otp_error(Some(OtpError::Invalid));
        }
        self.draft.is_sending = false;
        self.publish(DraftEvent::SendingChanged { is_sending: false });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::token;
    use crate::composer::otp::NoopFocus;

    type CatalogCell = Arc<SnapshotCell<TokenCatalog>>;

    fn composer_with(tokens: Vec<TokenOption>) -> (WithdrawalComposer, CatalogCell) {
        composer_with_threshold(tokens, SelectionThreshold::default())
    }

    fn composer_with_threshold(
        tokens: Vec<TokenOption>,
        threshold: SelectionThreshold,
    ) -> (WithdrawalComposer, CatalogCell) {
        let cell = Arc::new(SnapshotCell::with_value(TokenCatalog::new(tokens)));
        let composer = WithdrawalComposer::new(Arc::clone(&cell), threshold, Arc::new(NoopFocus));
        (composer, cell)
    }

    fn sol_composer() -> (WithdrawalComposer, CatalogCell) {
        let (mut composer, cell) = composer_with(vec![token("SOL", 5.0, 750.0)]);
        composer.select_symbol("SOL").unwrap();
        (composer, cell)
    }

    #[test]
    fn test_defaults() {
        let (composer, _) = composer_with(vec![]);
        let draft = composer.draft();
        assert!(draft.selected_token.is_none());
        assert_eq!(draft.amount, "0");
        assert_eq!(draft.recipient_address, "");
        assert_eq!(draft.otp_digits().len(), 6);
        assert!(!draft.is_sending);
        assert_eq!(composer.catalog_status(), CatalogStatus::Empty);
    }

    #[test]
    fn test_select_token_resets_amount() {
        let (mut composer, _) =
            composer_with(vec![token("SOL", 5.0, 750.0), token("USDC", 10.0, 10.0)]);
        composer.select_symbol("SOL").unwrap();
        composer.set_amount("9");
        assert!(composer.draft().amount_error.is_some());

        composer.select_symbol("USDC").unwrap();
        assert_eq!(composer.draft().amount, "0");
        assert!(composer.draft().amount_error.is_none());
        assert_eq!(composer.draft().selected_symbol(), Some("USDC"));
    }

    #[test]
    fn test_select_unknown_symbol() {
        let (mut composer, _) = composer_with(vec![token("SOL", 5.0, 750.0)]);
        assert!(matches!(
            composer.select_symbol("BONK"),
            Err(Error::TokenNotFound(_))
        ));
    }

    #[test]
    fn test_select_symbol_honors_usd_threshold() {
        let (mut composer, _) = composer_with_threshold(
            vec![token("SOL", 5.0, 750.0), token("DUST", 0.5, 0.01)],
            SelectionThreshold::usd(0.05),
        );
        let listed: Vec<String> = composer
            .selectable_tokens()
            .into_iter()
            .map(|t| t.token_symbol)
            .collect();
        assert_eq!(listed, vec!["SOL".to_string()]);

        assert!(matches!(
            composer.select_symbol("DUST"),
            Err(Error::TokenNotSelectable(_))
        ));
        assert!(composer.draft().selected_token.is_none());

        composer.select_symbol("SOL").unwrap();
        assert_eq!(composer.draft().selected_symbol(), Some("SOL"));
    }

    #[test]
    fn test_set_amount_rejects_non_numeric() {
        let (mut composer, _) = sol_composer();
        assert!(composer.set_amount("1.5"));
        for bad in ["abc", "1.2.3", "-2", "1e3"] {
            assert!(!composer.set_amount(bad));
            assert_eq!(composer.draft().amount, "1.5");
        }
    }

    #[test]
    fn test_set_amount_validates_against_balance() {
        let (mut composer, _) = sol_composer();
        composer.set_amount("5.01");
        assert_eq!(
            composer.draft().amount_error,
            Some(AmountError::ExceedsBalance { balance: 5.0 })
        );

        composer.set_amount("5");
        assert!(composer.draft().amount_error.is_none());

        composer.set_amount("6");
        composer.set_amount("");
        assert!(composer.draft().amount_error.is_none());
    }

    #[test]
    fn test_validation_reads_live_balance() {
        let (mut composer, cell) = sol_composer();
        cell.set(TokenCatalog::new(vec![token("SOL", 2.0, 300.0)]));
        composer.set_amount("3");
        assert_eq!(
            composer.draft().amount_error,
            Some(AmountError::ExceedsBalance { balance: 2.0 })
        );

        // Balance grows: refresh clears the error without a new edit
        cell.set(TokenCatalog::new(vec![token("SOL", 4.0, 600.0)]));
        composer.on_catalog_refreshed();
        assert!(composer.draft().amount_error.is_none());
    }

    #[test]
    fn test_max_amount_uses_current_snapshot() {
        let (mut composer, cell) = sol_composer();
        cell.set(TokenCatalog::new(vec![token("SOL", 7.25, 1000.0)]));
        assert!(composer.max_amount());
        assert_eq!(composer.draft().amount, "7.25");
        assert!(composer.draft().amount_error.is_none());
    }

    #[test]
    fn test_max_amount_noop_without_token_or_snapshot() {
        let (mut composer, _) = composer_with(vec![token("SOL", 5.0, 750.0)]);
        assert!(!composer.max_amount());
        assert_eq!(composer.draft().amount, "0");

        let cell = Arc::new(SnapshotCell::new());
        let mut composer =
            WithdrawalComposer::new(cell, SelectionThreshold::default(), Arc::new(NoopFocus));
        composer.select_token(token("SOL", 5.0, 750.0));
        assert!(!composer.max_amount());
        assert_eq!(composer.catalog_status(), CatalogStatus::Loading);
    }

    #[test]
    fn test_default_selection_on_refresh() {
        let cell = Arc::new(SnapshotCell::new());
        let mut composer = WithdrawalComposer::new(
            Arc::clone(&cell),
            SelectionThreshold::default(),
            Arc::new(NoopFocus),
        );
        composer.on_catalog_refreshed();
        assert!(composer.draft().selected_token.is_none());

        cell.set(TokenCatalog::new(vec![token("EMPTY", 0.0, 0.0), token("SOL", 1.0, 150.0)]));
        composer.on_catalog_refreshed();
        assert_eq!(composer.draft().selected_symbol(), Some("SOL"));
        assert_eq!(composer.selectable_tokens().len(), 1);
    }

    #[test]
    fn test_disabled_and_submit_button() {
        let (mut composer, _) = sol_composer();
        let disabled = composer.compute_disabled_state(true);
        assert!(!disabled.send);
        // amount "0" and empty recipient
        assert!(composer.submit_disabled(&disabled));

        composer.set_amount("3");
        composer.set_recipient("Addr1", RecipientOrigin::Typed);
        let disabled = composer.compute_disabled_state(true);
        assert!(!composer.submit_disabled(&disabled));

        let disabled = composer.compute_disabled_state(false);
        assert!(disabled.send && disabled.copy);
        assert!(composer.submit_disabled(&disabled));
    }

    #[test]
    fn test_edits_locked_while_sending() {
        let (mut composer, _) = sol_composer();
        composer.set_amount("1");
        composer.begin_sending();

        assert!(!composer.set_amount("2"));
        assert!(!composer.set_recipient("x", RecipientOrigin::Typed));
        assert!(!composer.paste_otp("123456"));
        assert!(!composer.max_amount());
        assert_eq!(composer.draft().amount, "1");

        composer.finish_failure(false);
        assert!(composer.set_amount("2"));
    }

    #[test]
    fn test_success_resets_and_failure_preserves() {
        let (mut composer, _) = sol_composer();
        composer.set_amount("3");
        composer.set_recipient("Addr1", RecipientOrigin::Typed);
        composer.paste_otp("123456");

        composer.begin_sending();
        composer.finish_failure(true);
        assert_eq!(composer.draft().amount, "3");
        assert_eq!(composer.draft().recipient_address, "Addr1");
        assert_eq!(composer.draft().otp.join(), "123456");
        assert_eq!(composer.draft().otp_error, Some(OtpError::Invalid));

        composer.begin_sending();
        composer.finish_success();
        assert_eq!(composer.draft().amount, "0");
        assert_eq!(composer.draft().recipient_address, "");
        assert_eq!(composer.draft().otp.join(), "");
        assert!(!composer.draft().is_sending);
        assert_eq!(composer.draft().selected_symbol(), Some("SOL"));
    }

    #[test]
    fn test_publishes_events() {
        let (mut composer, _) = sol_composer();
        let mut rx = composer.subscribe();

        composer.set_amount("9");
        composer.set_recipient("Addr1", RecipientOrigin::Typed);
        composer.set_otp_digit(0, "1");

        assert_eq!(rx.try_recv().unwrap(), DraftEvent::ErrorsChanged);
        assert_eq!(
            rx.try_recv().unwrap(),
            DraftEvent::AmountChanged {
                amount: "9".to_string()
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            DraftEvent::RecipientChanged {
                value: "Addr1".to_string(),
                origin: RecipientOrigin::Typed,
            }
        );
        assert_eq!(rx.try_recv().unwrap(), DraftEvent::OtpChanged);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_balance_view() {
        let (composer, _) = sol_composer();
        let view = composer.balance_view().unwrap();
        assert_eq!(view.symbol, "SOL");
        assert_eq!(view.balance, 5.0);
        assert_eq!(view.balance_usd, 750.0);
    }
}
