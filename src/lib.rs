//! Withdrawal Request Composer Library
//!
//! Composes, validates and submits withdrawal requests for a multi-token
//! custodial Solana wallet.

pub mod account;
pub mod address_book;
pub mod catalog;
pub mod cli;
pub mod composer;
pub mod config;
pub mod error;
pub mod i18n;
pub mod services;
pub mod snapshot;
pub mod submission;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use submission::WithdrawSession;
