//! Application error types.
//!
//! Provides unified error handling with actionable context for debugging.

use thiserror::Error;

/// Application result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types with specific context for actionable debugging
#[derive(Debug, Error)]
pub enum Error {
    /// IO error with path context
    #[error("IO error at {path:?}: {source}")]
    Io {
        /// The underlying IO error.
        source: std::io::Error,
        /// File path where the error occurred, if known.
        path: Option<std::path::PathBuf>,
    },

    /// Network error (connection, timeout, DNS)
    #[error("Network error: {0}")]
    Network(String),

    /// External platform API error with status context
    #[error("{service} API error: {message}")]
    Api {
        /// Which platform answered (e.g. "donation", "tip").
        service: &'static str,
        /// Human-readable error description.
        message: String,
        /// HTTP status code, if from an HTTP response.
        status: Option<u16>,
        /// Actionable suggestion for resolving the error.
        hint: Option<&'static str>,
    },

    /// Configuration error with guidance
    #[error("Configuration error: {message}. {hint}")]
    Config {
        /// Description of the configuration problem.
        message: String,
        /// Actionable guidance for fixing the issue.
        hint: &'static str,
    },

    /// Parsing error (persisted documents, API payloads, ingress lines)
    #[error("Parse error in {file:?}: {message}")]
    Parse {
        /// File that failed to parse, if known.
        file: Option<std::path::PathBuf>,
        /// Description of the parse failure.
        message: String,
    },

    /// Generic message error (escape hatch)
    #[error("{0}")]
    Msg(String),
}

impl Error {
    /// Create an IO error with path context
    pub fn io(source: std::io::Error, path: impl Into<Option<std::path::PathBuf>>) -> Self {
        Self::Io { source, path: path.into() }
    }

    /// Create an API error without HTTP status
    pub fn api(service: &'static str, message: impl Into<String>) -> Self {
        Self::Api {
            service,
            message: message.into(),
            status: None,
            hint: None,
        }
    }

    /// Create an API error with HTTP status
    pub fn api_status(service: &'static str, message: impl Into<String>, status: u16) -> Self {
        let hint = match status {
            401 => Some("Check the API token in your environment"),
            403 => Some("Your API token may lack required scopes"),
            404 => Some("The requested resource was not found - check the channel id"),
            429 => Some("Rate limited - increase the poll interval"),
            500..=599 => Some("Platform server error - will retry on the next poll"),
            _ => None,
        };
        Self::Api {
            service,
            message: message.into(),
            status: Some(status),
            hint,
        }
    }

    /// Create a config error with actionable hint
    pub fn config(message: impl Into<String>, hint: &'static str) -> Self {
        Self::Config { message: message.into(), hint }
    }

    /// Create a parse error with file context
    pub fn parse(message: impl Into<String>, file: impl Into<Option<std::path::PathBuf>>) -> Self {
        Self::Parse { file: file.into(), message: message.into() }
    }
}

// Convenience conversions
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io { source: e, path: None }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Self::Msg(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Self::Msg(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

    use super::*;

    #[test]
    fn api_status_provides_hints() {
        let err = Error::api_status("donation", "Unauthorized", 401);
        match err {
            Error::Api { hint: Some(h), status: Some(401), .. } => {
                assert!(h.contains("token"));
            }
            _ => panic!("Expected Api error with hint"),
        }
    }

    #[test]
    fn api_error_display_names_service() {
        let err = Error::api("tip", "bad payload");
        assert_eq!(err.to_string(), "tip API error: bad payload");
    }
}
