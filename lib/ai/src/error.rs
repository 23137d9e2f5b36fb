//! Error types for external capability providers.

use std::fmt;

/// Errors from completion providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionError {
    /// Provider is unreachable.
    ProviderUnavailable {
        /// Provider or endpoint description.
        provider: String,
        /// Description of the failure.
        reason: String,
    },
    /// Request was rejected or failed mid-flight.
    RequestFailed {
        /// Description of the failure.
        reason: String,
    },
    /// Response could not be interpreted.
    ResponseUnusable {
        /// Description of the failure.
        reason: String,
    },
}

impl fmt::Display for CompletionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProviderUnavailable { provider, reason } => {
                write!(f, "completion provider '{provider}' unavailable: {reason}")
            }
            Self::RequestFailed { reason } => write!(f, "completion request failed: {reason}"),
            Self::ResponseUnusable { reason } => {
                write!(f, "completion response unusable: {reason}")
            }
        }
    }
}

impl std::error::Error for CompletionError {}

/// Errors from search providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// The search request failed.
    RequestFailed {
        /// Description of the failure.
        reason: String,
    },
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestFailed { reason } => write!(f, "search request failed: {reason}"),
        }
    }
}

impl std::error::Error for SearchError {}

/// Errors from HTTP action providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpActionError {
    /// The request could not be sent or the response was an error.
    RequestFailed {
        /// The requested URL.
        url: String,
        /// Description of the failure.
        reason: String,
    },
}

impl fmt::Display for HttpActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestFailed { url, reason } => {
                write!(f, "http request to {url} failed: {reason}")
            }
        }
    }
}

impl std::error::Error for HttpActionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_error_display() {
        let err = CompletionError::ProviderUnavailable {
            provider: "openai".to_string(),
            reason: "connection refused".to_string(),
        };
        assert!(err.to_string().contains("openai"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn search_error_display() {
        let err = SearchError::RequestFailed {
            reason: "timeout".to_string(),
        };
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn http_error_display() {
        let err = HttpActionError::RequestFailed {
            url: "https://example.com".to_string(),
            reason: "500".to_string(),
        };
        assert!(err.to_string().contains("example.com"));
    }
}
