//! Recipient resolver
//!
//! Filters the address book against the recipient text the user is typing and
//! tracks whether the candidate list is shown.

use std::sync::Arc;

use tracing::debug;

use crate::composer::{DraftEvent, RecipientOrigin};
use crate::snapshot::SnapshotCell;

use super::{AddressBook, AddressBookEntry};

/// Filter `entries` by `query`
///
/// An empty (after trimming) query returns every entry. Otherwise an entry is
/// kept when any of its four searchable fields contains the query,
/// case-insensitively. Relative order is preserved.
pub fn resolve<'a>(entries: &'a [AddressBookEntry], query: &str) -> Vec<&'a AddressBookEntry> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return entries.iter().collect();
    }
    entries.iter().filter(|e| e.matches(&needle)).collect()
}

/// Stateful resolver bound to the shared address book snapshot
pub struct RecipientResolver {
    address_book: Arc<SnapshotCell<AddressBook>>,
    query: String,
    visible: bool,
    candidates: Vec<AddressBookEntry>,
}

impl RecipientResolver {
    pub fn new(address_book: Arc<SnapshotCell<AddressBook>>) -> Self {
        let mut resolver = Self {
            address_book,
            query: String::new(),
            visible: false,
            candidates: Vec::new(),
        };
        resolver.recompute();
        resolver
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// All candidates for the current query, regardless of visibility
    pub fn candidates(&self) -> &[AddressBookEntry] {
        &self.candidates
    }

    /// Candidates as exposed to the view: empty while the list is hidden
    pub fn visible_candidates(&self) -> &[AddressBookEntry] {
        if self.visible {
            &self.candidates
        } else {
            &[]
        }
    }

    /// The recipient input gained focus
    pub fn focus(&mut self) {
        self.visible = true;
    }

    /// The user edited the query text
    pub fn edit_query(&mut self, text: &str) {
        self.query = text.to_string();
        self.visible = true;
        self.recompute();
    }

    /// An interaction happened outside the input and candidate list
    pub fn dismiss(&mut self) {
        self.visible = false;
    }

    /// Choose the candidate at `index` of the current list
    ///
    /// Hides the list and returns the chosen entry; the caller writes its
    /// Solana address into the draft.
    pub fn choose(&mut self, index: usize) -> Option<AddressBookEntry> {
        let chosen = self.candidates.get(index).cloned()?;
        debug!(
            "Recipient chosen from address book: {} ({})",
            chosen.label(),
            chosen.solana_address
        );
        self.visible = false;
        Some(chosen)
    }

    /// The address book snapshot was replaced
    pub fn on_address_book_changed(&mut self) {
        self.recompute();
    }

    /// React to a draft change published by the composer
    pub fn apply(&mut self, event: &DraftEvent) {
        match event {
            DraftEvent::RecipientChanged { value, origin } => match origin {
                RecipientOrigin::Typed => self.edit_query(value),
                RecipientOrigin::Chosen => {
                    self.query = value.clone();
                    self.visible = false;
                    self.recompute();
                }
            },
            DraftEvent::Reset => {
                self.query.clear();
                self.visible = false;
                self.recompute();
            }
            _ => {}
        }
    }

    fn recompute(&mut self) {
        self.candidates = match self.address_book.get().into_loaded() {
            Some(book) => resolve(&book.entries, &self.query)
                .into_iter()
                .cloned()
                .collect(),
            None => Vec::new(),
        };
    }
}
