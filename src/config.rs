//! Configuration loading and validation

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::catalog::{SelectionThreshold, ThresholdMeasure};
use crate::submission::classifier::{DEFAULT_TWO_FACTOR_MARKER, DEFAULT_WALLET_NOT_FOUND};
use crate::submission::{ErrorClassifier, SessionSettings};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub address_book: AddressBookConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub cli: CliConfig,
}

/// Wallet REST API connection
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Bearer token of the signed-in user
    #[serde(default)]
    pub access_token: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            access_token: String::new(),
        }
    }
}

/// Which tokens are offered for withdrawal
#[derive(Debug, Clone, Deserialize)]
pub struct SelectionConfig {
    #[serde(default = "default_measure")]
    pub measure: ThresholdMeasure,
    /// Tokens need a measured balance strictly above this
    #[serde(default)]
    pub minimum: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            measure: default_measure(),
            minimum: 0.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddressBookConfig {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for AddressBookConfig {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

/// Backend messages the failure classifier keys on
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_wallet_not_found_message")]
    pub wallet_not_found_message: String,
    #[serde(default = "default_two_factor_marker")]
    pub two_factor_marker: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            wallet_not_found_message: default_wallet_not_found_message(),
            two_factor_marker: default_two_factor_marker(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CliConfig {
    /// Ask before sending a withdrawal
    #[serde(default = "default_true")]
    pub require_confirmation: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            require_confirmation: true,
        }
    }
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    std::env::var("WITHDRAW_API_URL").unwrap_or_else(|_| "http://localhost:8000/api/v1".into())
}

fn default_timeout_ms() -> u64 {
    30000
}

fn default_measure() -> ThresholdMeasure {
    ThresholdMeasure::Tokens
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    100
}

fn default_wallet_not_found_message() -> String {
    DEFAULT_WALLET_NOT_FOUND.into()
}

fn default_two_factor_marker() -> String {
    DEFAULT_TWO_FACTOR_MARKER.into()
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            // Start with defaults
            .set_default("api.base_url", default_base_url())?
            .set_default("api.timeout_ms", default_timeout_ms() as i64)?
            .set_default("address_book.page", default_page() as i64)?
            .set_default("address_book.page_size", default_page_size() as i64)?
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix WITHDRAW__)
            .add_source(
                config::Environment::with_prefix("WITHDRAW")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.api.base_url)
            .with_context(|| format!("Invalid api.base_url: {}", self.api.base_url))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            anyhow::bail!("api.base_url must be http or https, got {}", url.scheme());
        }

        if self.api.timeout_ms == 0 {
            anyhow::bail!("api.timeout_ms must be positive");
        }

        if !self.selection.minimum.is_finite() || self.selection.minimum < 0.0 {
            anyhow::bail!("selection.minimum must be a non-negative number");
        }

        if self.address_book.page == 0 {
            anyhow::bail!("address_book.page starts at 1");
        }

        if self.address_book.page_size == 0 || self.address_book.page_size > 1000 {
            anyhow::bail!("address_book.page_size must be between 1 and 1000");
        }

        if self.classifier.wallet_not_found_message.is_empty()
            || self.classifier.two_factor_marker.is_empty()
        {
            tracing::warn!("Empty classifier message disables the matching failure category");
        }

        if self.api.access_token.is_empty() {
            tracing::warn!("api.access_token is not set - authenticated endpoints will answer 401");
        }

        Ok(())
    }

    pub fn threshold(&self) -> SelectionThreshold {
        SelectionThreshold {
            measure: self.selection.measure,
            minimum: self.selection.minimum,
        }
    }

    /// Session tunables derived from this configuration
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            threshold: self.threshold(),
            page: self.address_book.page,
            page_size: self.address_book.page_size,
            classifier: ErrorClassifier::new(
                self.classifier.wallet_not_found_message.clone(),
                self.classifier.two_factor_marker.clone(),
            ),
        }
    }

    /// Get masked configuration for display (hide secrets)
    pub fn masked_display(&self) -> String {
        format!(
            r#"Configuration:
  API:
    base_url: {}
    timeout: {}ms
    access_token: {}
  Selection:
    balance > {} ({})
  Address book:
    page: {}
    page_size: {}
  Classifier:
    wallet_not_found_message: {}
    two_factor_marker: {}
  CLI:
    require_confirmation: {}
"#,
            mask_url(&self.api.base_url),
            self.api.timeout_ms,
            if self.api.access_token.is_empty() {
                "(not set)"
            } else {
                "***"
            },
            self.selection.minimum,
            self.selection.measure,
            self.address_book.page,
            self.address_book.page_size,
            self.classifier.wallet_not_found_message,
            self.classifier.two_factor_marker,
            self.cli.require_confirmation,
        )
    }
}

/// Mask URL for display (hide API keys in query params)
fn mask_url(url: &str) -> String {
    if let Some(idx) = url.find('?') {
        format!("{}?***", &url[..idx])
    } else {
        url.to_string()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            selection: SelectionConfig::default(),
            address_book: AddressBookConfig::default(),
            classifier: ClassifierConfig::default(),
            cli: CliConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.api.timeout_ms, 30000);
        assert_eq!(config.threshold(), SelectionThreshold::default());
        assert!(config.cli.require_confirmation);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[api]
base_url = "https://wallet.example.com/api/v1"
timeout_ms = 5000
access_token = "secret"

[address_book]
page_size = 20

[classifier]
two_factor_marker = "authenticator"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.api.base_url, "https://wallet.example.com/api/v1");
        assert_eq!(config.api.timeout_ms, 5000);
        assert_eq!(config.address_book.page, 1);
        assert_eq!(config.address_book.page_size, 20);

        let settings = config.session_settings();
        assert_eq!(settings.page_size, 20);
        assert!(config.masked_display().contains("access_token: ***"));
        assert!(!config.masked_display().contains("secret"));
    }

    #[test]
    fn test_env_overrides_selection() {
        std::env::set_var("WITHDRAW__SELECTION__MEASURE", "usd");
        std::env::set_var("WITHDRAW__SELECTION__MINIMUM", "0.05");
        let config = Config::load("does-not-exist.toml");
        std::env::remove_var("WITHDRAW__SELECTION__MEASURE");
        std::env::remove_var("WITHDRAW__SELECTION__MINIMUM");

        let config = config.unwrap();
        assert_eq!(config.threshold(), SelectionThreshold::usd(0.05));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.api.base_url = "ftp://wallet.example.com".into();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.selection.minimum = -1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.address_book.page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_measure_deserialize() {
        let measure: ThresholdMeasure = serde_json::from_str(r#""usd""#).unwrap();
        assert_eq!(measure, ThresholdMeasure::Usd);
    }

    #[test]
    fn test_mask_url() {
        assert_eq!(
            mask_url("https://api.example.com?key=secret"),
            "https://api.example.com?***"
        );
        assert_eq!(
            mask_url("https://api.example.com"),
            "https://api.example.com"
        );
    }
}
