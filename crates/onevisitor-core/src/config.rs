// ── Runtime connection configuration ──
//
// These types describe *how* to reach a OneVisitor backend. They carry
// credential data and connection tuning, but never touch disk. The CLI
// constructs a `ClientConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::tenant::TenantResolverConfig;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// How to authenticate with the backend.
#[derive(Debug, Clone, Default)]
pub enum AuthCredentials {
    /// Reuse whatever tokens the token store already holds.
    #[default]
    Session,
    /// Log in with email and password when no access token is stored.
    Password { email: String, password: SecretString },
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed development backends).
    DangerAcceptInvalid,
}

/// Configuration for talking to one backend as one tenant.
///
/// Built by the CLI and passed to `Dashboard`; core never reads config files.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL (e.g., `http://localhost:8000/api`).
    pub url: Url,
    pub auth: AuthCredentials,
    /// Explicit tenant; otherwise derived from the URL's host.
    pub tenant: Option<String>,
    pub tls: TlsVerification,
    pub timeout: Duration,
    /// Minutes, UTC minus local. `None` uses the machine's offset.
    pub timezone_offset: Option<i32>,
    pub resolver: TenantResolverConfig,
}

impl ClientConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            auth: AuthCredentials::default(),
            tenant: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            timezone_offset: None,
            resolver: TenantResolverConfig::default(),
        }
    }
}
