//! Withdrawal composer
//!
//! Tracks the draft request (token, amount, recipient, one-time code) and
//! enforces its invariants before anything reaches the network.
//!
//! # Architecture
//!
//! ```text
//! user event → WithdrawalComposer ──DraftEvent──→ disabled-state cache
//!                   │                         └──→ RecipientResolver
//!                   └── OtpAssembler ──→ FocusController
//! ```

pub mod amount;
pub mod draft;
pub mod otp;
pub mod withdraw;

pub use draft::{
    AmountError, DisabledInputs, DisabledState, DraftEvent, OtpError, RecipientError,
    RecipientOrigin, WithdrawalDraft,
};
pub use otp::{FocusController, NoopFocus, OtpAssembler, OTP_LENGTH};
pub use withdraw::{BalanceView, CatalogStatus, WithdrawalComposer};
