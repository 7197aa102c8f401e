//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use onevisitor_config::ConfigError;
use onevisitor_core::{CoreError, EditorError, WizardError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to OneVisitor at {url}")]
    #[diagnostic(
        code(onevisitor::connection_failed),
        help(
            "Check that the backend is running and reachable.\n\
             URL: {url}\n\
             Self-signed certificate? Try: onevisitor whoami --insecure"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(onevisitor::auth_failed),
        help(
            "Log in again with: onevisitor login\n\
             Or store a password with: onevisitor config set-password --profile {profile}"
        )
    )]
    AuthFailed { profile: String, message: String },

    #[error("Permission denied: {message}")]
    #[diagnostic(
        code(onevisitor::permission_denied),
        help("Ask a site admin to grant you access: onevisitor permissions grant")
    )]
    PermissionDenied { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(onevisitor::not_found),
        help("Run: onevisitor {list_command} to see what exists")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    #[diagnostic(code(onevisitor::api_error))]
    ApiError { status: Option<u16>, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(onevisitor::validation))]
    Validation { field: String, reason: String },

    #[error("Check-in cannot continue: {0}")]
    #[diagnostic(
        code(onevisitor::check_in_incomplete),
        help("Supply the missing values with --field id=value, or run interactively.")
    )]
    CheckIn(#[from] WizardError),

    #[error(transparent)]
    #[diagnostic(code(onevisitor::site_edit))]
    SiteEdit(#[from] EditorError),

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(onevisitor::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: onevisitor config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration error: {0}")]
    #[diagnostic(
        code(onevisitor::config),
        help("Inspect the resolved configuration with: onevisitor config show")
    )]
    Config(#[from] ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(onevisitor::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(onevisitor::timeout),
        help("Increase timeout with --timeout or check backend responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Unexpected failure: {0}")]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::PermissionDenied { .. } => exit_code::PERMISSION,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. }
            | Self::CheckIn(_)
            | Self::SiteEdit(_)
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            Self::Config(ConfigError::NoCredentials { .. }) => exit_code::AUTH,
            _ => exit_code::GENERAL,
        }
    }

    /// Attach the timeout the request ran with.
    pub fn with_timeout(self, seconds: u64) -> Self {
        match self {
            Self::Timeout { .. } => Self::Timeout { seconds },
            other => other,
        }
    }

    /// Name the profile whose credentials were rejected.
    pub fn with_profile(self, profile: &str) -> Self {
        match self {
            Self::AuthFailed { message, .. } => Self::AuthFailed {
                profile: profile.to_owned(),
                message,
            },
            other => other,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

/// `list_command` hint for an entity kind.
fn list_command_for(entity_type: &str) -> String {
    match entity_type {
        "Site" => "sites list".into(),
        "Visitor" => "visitors list".into(),
        "Permission" => "permissions list --site <SITE>".into(),
        "Tenant" => "tenants list".into(),
        "Host" => "hosts list --site <SITE>".into(),
        other => format!("{}s list", other.to_lowercase()),
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed {
                profile: "default".into(),
                message,
            },

            CoreError::PermissionDenied { message } => CliError::PermissionDenied { message },

            CoreError::Timeout => CliError::Timeout { seconds: 0 },

            CoreError::NotFound {
                entity_type,
                identifier,
            } => CliError::NotFound {
                list_command: list_command_for(&entity_type),
                resource_type: entity_type,
                identifier,
            },

            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Wizard(e) => CliError::CheckIn(e),
            CoreError::Editor(e) => CliError::SiteEdit(e),

            CoreError::Rejected { message } | CoreError::Export { message } => {
                CliError::ApiError {
                    status: None,
                    message,
                }
            }

            CoreError::Api { message, status } => CliError::ApiError { status, message },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_points_at_the_list_command() {
        let err = CliError::from(CoreError::not_found("Site", "acme-hq-lobby"));
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
        match err {
            CliError::NotFound { list_command, .. } => assert_eq!(list_command, "sites list"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn exit_codes_follow_error_class() {
        let auth = CliError::from(CoreError::AuthenticationFailed {
            message: "expired".into(),
        });
        assert_eq!(auth.exit_code(), exit_code::AUTH);

        let timeout = CliError::from(CoreError::Timeout).with_timeout(30);
        assert_eq!(timeout.exit_code(), exit_code::TIMEOUT);
        assert_eq!(timeout.to_string(), "Request timed out after 30s");

        let invalid = CliError::from(CoreError::ValidationFailed {
            message: "bad".into(),
        });
        assert_eq!(invalid.exit_code(), exit_code::USAGE);
    }

    #[test]
    fn api_error_message_includes_status() {
        let err = CliError::ApiError {
            status: Some(500),
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "API error (HTTP 500): boom");
    }
}
