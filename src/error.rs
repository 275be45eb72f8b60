//! Error types for the withdrawal composer

use thiserror::Error;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the withdrawal composer
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Wallet API errors
    #[error("Wallet API unreachable: {0}")]
    ApiUnreachable(String),

    #[error("Wallet API timeout after {0}ms")]
    ApiTimeout(u64),

    #[error("Wallet API returned {status}: {message}")]
    ApiStatus { status: u16, message: String },

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // Snapshot errors
    #[error("Token catalog not loaded yet")]
    CatalogNotLoaded,

    #[error("Address book not loaded yet")]
    AddressBookNotLoaded,

    #[error("Token not found in catalog: {0}")]
    TokenNotFound(String),

    #[error("Token not selectable under the current threshold: {0}")]
    TokenNotSelectable(String),

    #[error("Address book entry not found: {0}")]
    ContactNotFound(String),

    // Draft errors
    #[error("Draft is locked while a withdrawal is in flight")]
    DraftLocked,
}

impl Error {
    /// Check if this error is transient (worth refreshing again later)
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::ApiUnreachable(_) | Error::ApiTimeout(_))
    }
}

// Conversion from URL parse errors
impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::InvalidUrl(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(Error::ApiUnreachable("down".to_string()).is_transient());
        assert!(Error::ApiTimeout(5000).is_transient());
        assert!(!Error::CatalogNotLoaded.is_transient());
    }

    #[test]
    fn test_url_parse_error() {
        let err: Error = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, Error::InvalidUrl(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_status_display() {
        let err = Error::ApiStatus {
            status: 401,
            message: "Unauthorized".to_string(),
        };
        assert_eq!(err.to_string(), "Wallet API returned 401: Unauthorized");
    }
}
