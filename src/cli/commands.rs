//! CLI command implementations

use anyhow::{Context, Result};
use dialoguer::{Confirm, Input};
use std::sync::Arc;
use tracing::{error, info};

use crate::address_book::AddressBookEntry;
use crate::catalog::format_balance;
use crate::composer::NoopFocus;
use crate::config::Config;
use crate::i18n::EnglishTranslator;
use crate::services::{ConsoleNotifier, HttpWalletApi, TransactionHistoryAdapter};
use crate::submission::{SubmissionOutcome, SubmitResult, WithdrawSession};

/// Recipient of a `send`
#[derive(Debug, Clone)]
pub enum RecipientArg {
    Address(String),
    /// Address book entry by wallet id
    Contact(u64),
}

/// Amount of a `send`
#[derive(Debug, Clone)]
pub enum AmountArg {
    Exact(String),
    Max,
}

/// Arguments of the `send` command
#[derive(Debug, Clone)]
pub struct SendArgs {
    pub token: String,
    pub amount: AmountArg,
    pub recipient: RecipientArg,
    pub otp: Option<String>,
    pub force: bool,
}

fn build_api(config: &Config) -> Result<Arc<HttpWalletApi>> {
    let access_token = Some(config.api.access_token.clone());
    let api = HttpWalletApi::new(&config.api.base_url, access_token, config.api.timeout_ms)
        .map_err(|e| anyhow::anyhow!("Failed to create API client: {}", e))?;
    Ok(Arc::new(api))
}

fn build_session(config: &Config, api: &Arc<HttpWalletApi>) -> WithdrawSession {
    let collaborators = crate::submission::Collaborators {
        catalog: api.clone(),
        address_book: api.clone(),
        account: api.clone(),
        history: api.clone(),
        transactions: api.clone(),
        notifier: Arc::new(ConsoleNotifier),
        translator: Arc::new(EnglishTranslator),
        focus: Arc::new(NoopFocus),
    };
    WithdrawSession::new(collaborators, config.session_settings())
}

fn shorten(text: &str, keep: usize) -> String {
    if text.chars().count() > keep {
        format!("{}...", text.chars().take(keep).collect::<String>())
    } else {
        text.to_string()
    }
}

fn print_contacts(entries: &[AddressBookEntry]) {
    println!("{:<8} {:<20} {:<6} {}", "ID", "NAME", "TYPE", "SOLANA ADDRESS");
    println!("{}", "-".repeat(80));
    for entry in entries {
        println!(
            "{:<8} {:<20} {:<6} {}",
            entry.wallet_id,
            shorten(entry.label(), 18),
            entry.wallet_type,
            entry.solana_address
        );
    }
}

/// List withdrawable tokens and balances
pub async fn tokens(config: &Config) -> Result<()> {
    let api = build_api(config)?;
    let session = build_session(config, &api);
    session
        .refresh_catalog()
        .await
        .context("Failed to fetch token catalog")?;

    let catalog = session.catalog().get().into_loaded().unwrap_or_default();
    let threshold = config.threshold();

    println!("\n=== WITHDRAWABLE TOKENS ===\n");
    if catalog.is_empty() {
        println!("No tokens found.");
        println!();
        return Ok(());
    }

    println!(
        "{:<10} {:<20} {:>18} {:>12} {}",
        "SYMBOL", "NAME", "BALANCE", "USD", "SELECTABLE"
    );
    println!("{}", "-".repeat(75));
    for token in &catalog.tokens {
        println!(
            "{:<10} {:<20} {:>18} {:>12.2} {}",
            token.token_symbol,
            shorten(&token.token_name, 18),
            format_balance(token.token_balance),
            token.token_balance_usd,
            if threshold.admits(token) { "yes" } else { "no" }
        );
    }
    println!(
        "\nSelectable: balance > {} ({})",
        threshold.minimum, threshold.measure
    );
    println!();
    Ok(())
}

/// List the address book, optionally filtered like the recipient input
pub async fn contacts(config: &Config, query: Option<String>) -> Result<()> {
    let api = build_api(config)?;
    let session = build_session(config, &api);
    session
        .refresh_address_book()
        .await
        .context("Failed to fetch address book")?;

    if let Some(query) = &query {
        session.edit_recipient(query).await;
    }
    let entries = session.candidates().await;

    println!("\n=== ADDRESS BOOK ===\n");
    if entries.is_empty() {
        match query {
            Some(query) => println!("No entries match {:?}.", query),
            None => println!("Address book is empty."),
        }
    } else {
        print_contacts(&entries);
    }

    println!();
    Ok(())
}

/// Show the multi-token transaction history
pub async fn history(config: &Config, limit: usize) -> Result<()> {
    let api = build_api(config)?;
    api.refresh()
        .await
        .context("Failed to fetch transaction history")?;
    let records = api.history().get().into_loaded().unwrap_or_default();

    println!("\n=== TRANSACTION HISTORY ===\n");
    if records.is_empty() {
        println!("No transactions found.");
    } else {
        println!(
            "{:<12} {:<10} {:<8} {:>14} {:<10} {}",
            "DATE", "TYPE", "TOKEN", "AMOUNT", "STATUS", "TO"
        );
        println!("{}", "-".repeat(80));
        for record in records.iter().take(limit) {
            println!(
                "{:<12} {:<10} {:<8} {:>14} {:<10} {}",
                record
                    .created_at
                    .map(|t| t.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "-".to_string()),
                record.kind,
                record.token_symbol,
                format_balance(record.amount),
                record.status,
                shorten(&record.wallet_address_to, 16)
            );
        }
    }

    println!();
    Ok(())
}

/// Print the user's own deposit address
pub async fn address(config: &Config) -> Result<()> {
    let api = build_api(config)?;
    let session = build_session(config, &api);
    session
        .refresh_account()
        .await
        .context("Failed to fetch account info")?;

    match session.copy_own_address().await {
        Some(address) => println!("{}", address),
        None => anyhow::bail!("No wallet address available for this account"),
    }
    Ok(())
}

/// Compose and submit a withdrawal
pub async fn send(config: &Config, args: SendArgs) -> Result<()> {
    let translator = EnglishTranslator;
    let api = build_api(config)?;
    let session = build_session(config, &api);

    info!("Loading wallet data...");
    session
        .load_all()
        .await
        .context("Failed to load wallet data")?;

    session.select_token(&args.token).await?;

    match &args.amount {
        AmountArg::Max => {
            if !session.max_amount().await {
                anyhow::bail!("No balance available for {}", args.token);
            }
        }
        AmountArg::Exact(amount) => {
            if !session.set_amount(amount).await {
                anyhow::bail!("Invalid amount: {}", amount);
            }
        }
    }

    let recipient_label = match &args.recipient {
        RecipientArg::Address(address) => {
            session.edit_recipient(address).await;
            address.clone()
        }
        RecipientArg::Contact(wallet_id) => {
            let entry = session.choose_contact(*wallet_id).await?;
            format!("{} ({})", entry.label(), entry.solana_address)
        }
    };

    if session.two_factor_required() {
        let code = match &args.otp {
            Some(code) => code.clone(),
            None => Input::<String>::new()
                .with_prompt("Google Authenticator code")
                .interact_text()?,
        };
        if !session.paste_otp(code.trim()).await {
            anyhow::bail!("The code must be up to 6 digits");
        }
    }

    let draft = session.draft().await;
    if let Some(amount_error) = &draft.amount_error {
        anyhow::bail!("{}", amount_error.describe(&translator));
    }

    println!("\n=== WITHDRAWAL ===\n");
    println!("Token:  {}", args.token);
    println!("Amount: {}", draft.amount);
    println!("To:     {}", recipient_label);
    if let Some(view) = session.balance_view().await {
        println!(
            "Balance: {} {} (${:.2})",
            format_balance(view.balance),
            view.symbol,
            view.balance_usd
        );
    }
    println!();

    if config.cli.require_confirmation && !args.force {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Withdraw {} {} to {}? This cannot be undone.",
                draft.amount, args.token, recipient_label
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            info!("Withdrawal cancelled by user");
            return Ok(());
        }
    }

    match session.submit().await {
        SubmitResult::Blocked(reason) => {
            let draft = session.draft().await;
            let detail = draft
                .recipient_error
                .map(|e| e.describe(&translator))
                .or_else(|| draft.otp_error.map(|e| e.describe(&translator)))
                .unwrap_or_else(|| reason.to_string());
            anyhow::bail!("Withdrawal blocked: {}", detail);
        }
        SubmitResult::Completed(SubmissionOutcome::Success(receipt)) => {
            println!("\n=== WITHDRAWAL SUBMITTED ===");
            println!("Amount: {} {}", draft.amount, args.token);
            println!("To: {}", recipient_label);
            if let Some(signature) = receipt.transaction_id {
                println!("Signature: {}", signature);
                println!("View on Solscan: https://solscan.io/tx/{}", signature);
            }
        }
        SubmitResult::Completed(SubmissionOutcome::Failure(failure)) => {
            error!(
                "Withdrawal failed [{}]: {}",
                failure.category,
                failure.raw_message.as_deref().unwrap_or("-")
            );
            anyhow::bail!(
                "Withdrawal failed: {}",
                failure.display_text(&translator)
            );
        }
    }

    Ok(())
}

/// Show current configuration (secrets masked)
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", config.masked_display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorten() {
        assert_eq!(shorten("abc", 5), "abc");
        assert_eq!(shorten("abcdefgh", 4), "abcd...");
    }

    #[test]
    fn test_build_session_from_default_config() {
        let config = Config::default();
        let api = build_api(&config).unwrap();
        let session = build_session(&config, &api);
        assert!(!session.two_factor_required());
    }
}
