use thiserror::Error;

/// Error types for catalog and transfer operations.
///
/// Provider implementations map their transport and API failures onto this
/// enum. The matcher uses [`BridgeError::is_fatal`] to decide whether a failed
/// search is a per-track miss or aborts the whole batch.
///
/// # Error Handling Examples
///
/// ```rust
/// use beatbridge::BridgeError;
///
/// fn describe(err: &BridgeError) -> &'static str {
///     match err {
///         BridgeError::Auth(_) => "log in again",
///         BridgeError::RateLimit { .. } => "slow down",
///         e if e.is_fatal() => "platform unreachable",
///         _ => "skip this track",
///     }
/// }
///
/// assert_eq!(describe(&BridgeError::Auth("expired".into())), "log in again");
/// assert_eq!(describe(&BridgeError::NotFound("x".into())), "skip this track");
/// ```
#[derive(Error, Debug)]
pub enum BridgeError {
    /// HTTP/network related errors for a single request.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication failures.
    ///
    /// Expired or missing tokens, revoked grants, or a provider that refuses
    /// the credentials it was constructed with.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The provider cannot be reached at all.
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// A playlist or track lookup by ID found nothing.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Failed to parse provider data, a URL, or configuration input.
    #[error("Failed to parse: {0}")]
    Parse(String),

    /// Rate limiting from the provider.
    ///
    /// The `retry_after` field indicates how many seconds to wait before
    /// the next request attempt.
    #[error("Rate limited, retry after {retry_after} seconds")]
    RateLimit {
        /// Number of seconds to wait before retrying
        retry_after: u64,
    },

    /// The destination platform rejected playlist creation.
    #[error("Playlist creation failed: {0}")]
    CreateFailed(String),

    /// The operation was cancelled or ran past its deadline.
    #[error("Operation cancelled")]
    Cancelled,

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// File system I/O errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BridgeError {
    /// Whether this error means the provider itself is unusable.
    ///
    /// Fatal errors abort a transfer. Any other error raised while searching
    /// for one track only routes that track to the unmatched list.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BridgeError::Auth(_) | BridgeError::ProviderUnavailable(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(BridgeError::Auth("token expired".to_string()).is_fatal());
        assert!(BridgeError::ProviderUnavailable("dns".to_string()).is_fatal());
        assert!(!BridgeError::Http("502".to_string()).is_fatal());
        assert!(!BridgeError::RateLimit { retry_after: 3 }.is_fatal());
        assert!(!BridgeError::NotFound("track".to_string()).is_fatal());
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            BridgeError::RateLimit { retry_after: 7 }.to_string(),
            "Rate limited, retry after 7 seconds"
        );
        assert_eq!(
            BridgeError::CreateFailed("quota".to_string()).to_string(),
            "Playlist creation failed: quota"
        );
    }
}
