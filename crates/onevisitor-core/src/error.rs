// ── Core error types ──
//
// User-facing errors from onevisitor-core. Consumers never see raw HTTP
// or JSON failures; `From<onevisitor_api::Error>` translates them.

use thiserror::Error;

use crate::editor::EditorError;
use crate::wizard::WizardError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach OneVisitor at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request timed out")]
    Timeout,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Rejected by the server: {message}")]
    Rejected { message: String },

    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error(transparent)]
    Wizard(#[from] WizardError),

    #[error(transparent)]
    Editor(#[from] EditorError),

    #[error("Export failed: {message}")]
    Export { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn not_found(entity_type: &str, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.to_owned(),
            identifier: identifier.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<onevisitor_api::Error> for CoreError {
    fn from(err: onevisitor_api::Error) -> Self {
        use onevisitor_api::Error as ApiError;

        match err {
            ApiError::Authentication { message } => CoreError::AuthenticationFailed { message },
            ApiError::SessionExpired => CoreError::AuthenticationFailed {
                message: "Session expired -- log in again".into(),
            },
            ApiError::NoRefreshToken => CoreError::AuthenticationFailed {
                message: "Not logged in".into(),
            },
            ApiError::TokenStore(message) => CoreError::Config {
                message: format!("Token storage: {message}"),
            },
            ApiError::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(ToString::to_string)
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            ApiError::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ApiError::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            ApiError::InvalidHeader { name, reason } => CoreError::Config {
                message: format!("Invalid {name} header: {reason}"),
            },
            ApiError::Api { status, message } => match status {
                401 => CoreError::AuthenticationFailed { message },
                403 => CoreError::PermissionDenied { message },
                404 => CoreError::NotFound {
                    entity_type: "Resource".into(),
                    identifier: message,
                },
                400 | 409 | 422 => CoreError::Rejected { message },
                _ => CoreError::Api {
                    message,
                    status: Some(status),
                },
            },
            ApiError::Encode(e) => CoreError::Internal(format!("Encoding error: {e}")),
            ApiError::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
