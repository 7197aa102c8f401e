//! Shared configuration for the OneVisitor CLI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! keyring-backed token persistence, and translation to
//! `onevisitor_core::ClientConfig`. The CLI adds `GlobalOpts`-aware
//! wrappers on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use onevisitor_core::{
    AuthCredentials, ClientConfig, DEFAULT_API_URL, TenantResolverConfig, TlsVerification,
    TokenStore,
};

/// Keyring service name for every secret this tool stores.
pub const KEYRING_SERVICE: &str = "onevisitor";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named backend profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// API base URL (e.g., "https://api.onevisitor.app/api").
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Tenant to act as; otherwise resolved from the API host.
    pub tenant: Option<String>,

    /// Domains whose subdomains name tenants (e.g., "onevisitor.app").
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub apex_domains: Vec<String>,

    /// Login email.
    pub email: Option<String>,

    /// Password (plaintext -- prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Accept self-signed TLS certificates.
    pub insecure: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("app", "onevisitor", "onevisitor").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("onevisitor");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from `path` + environment.
///
/// `ONEVISITOR_DEFAULTS__TIMEOUT=60` overrides `defaults.timeout`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("ONEVISITOR_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

fn keyring_entry(profile_name: &str, key: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/{key}"))
}

/// Resolve the login password from the credential chain.
pub fn resolve_password(
    profile: &Profile,
    profile_name: &str,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env → env var lookup
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. Global env var
    if let Ok(pw) = std::env::var("ONEVISITOR_PASSWORD") {
        return Ok(SecretString::from(pw));
    }

    // 3. System keyring
    if let Ok(entry) = keyring_entry(profile_name, "password") {
        if let Ok(pw) = entry.get_password() {
            return Ok(SecretString::from(pw));
        }
    }

    // 4. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store a login password in the system keyring.
pub fn store_password(profile_name: &str, password: &SecretString) -> Result<(), ConfigError> {
    keyring_entry(profile_name, "password")?.set_password(password.expose_secret())?;
    Ok(())
}

/// Resolve `AuthCredentials` for a profile.
///
/// A profile with an email and a resolvable password logs in on demand;
/// anything else reuses the stored session.
pub fn resolve_auth(profile: &Profile, profile_name: &str) -> AuthCredentials {
    let email = profile
        .email
        .clone()
        .or_else(|| std::env::var("ONEVISITOR_EMAIL").ok());

    match email {
        Some(email) => match resolve_password(profile, profile_name) {
            Ok(password) => AuthCredentials::Password { email, password },
            Err(_) => AuthCredentials::Session,
        },
        None => AuthCredentials::Session,
    }
}

/// Translate profile TLS settings.
pub fn resolve_tls(profile: &Profile) -> TlsVerification {
    if profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    }
}

/// Tenant resolution settings, with the profile's apex domains if it lists any.
pub fn resolver_config(profile: &Profile) -> TenantResolverConfig {
    let mut resolver = TenantResolverConfig::default();
    if !profile.apex_domains.is_empty() {
        resolver.apex_domains.clone_from(&profile.apex_domains);
    }
    resolver
}

/// Build a `ClientConfig` from a profile with no CLI flag overrides.
pub fn profile_to_client_config(
    profile: &Profile,
    profile_name: &str,
) -> Result<ClientConfig, ConfigError> {
    let url: url::Url = profile
        .api_url
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "api_url".into(),
            reason: format!("invalid URL: {}", profile.api_url),
        })?;

    let mut config = ClientConfig::new(url);
    config.auth = resolve_auth(profile, profile_name);
    config.tenant.clone_from(&profile.tenant);
    config.tls = resolve_tls(profile);
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or_else(default_timeout));
    config.resolver = resolver_config(profile);
    Ok(config)
}

// ── Keyring token store ─────────────────────────────────────────────

#[derive(Default)]
struct CachedTokens {
    access: Option<SecretString>,
    refresh: Option<SecretString>,
}

/// Token store that persists the session in the system keyring.
///
/// Entries live under `onevisitor` / `{profile}/access-token` and
/// `{profile}/refresh-token`. Reads are served from memory after the first
/// keyring lookup.
pub struct KeyringTokenStore {
    profile: String,
    cache: RwLock<Option<CachedTokens>>,
}

impl KeyringTokenStore {
    pub fn new(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
            cache: RwLock::new(None),
        }
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    fn read_entry(&self, key: &str) -> Option<SecretString> {
        let entry = keyring_entry(&self.profile, key).ok()?;
        match entry.get_password() {
            Ok(secret) => Some(SecretString::from(secret)),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                tracing::debug!(profile = %self.profile, key, error = %e, "keyring read failed");
                None
            }
        }
    }

    fn write_entry(&self, key: &str, token: &SecretString) -> Result<(), onevisitor_api::Error> {
        keyring_entry(&self.profile, key)
            .and_then(|entry| entry.set_password(token.expose_secret()))
            .map_err(|e| onevisitor_api::Error::TokenStore(e.to_string()))
    }

    fn delete_entry(&self, key: &str) -> Result<(), onevisitor_api::Error> {
        let result = keyring_entry(&self.profile, key).and_then(|entry| entry.delete_credential());
        match result {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(onevisitor_api::Error::TokenStore(e.to_string())),
        }
    }

    fn with_cache<R>(&self, f: impl FnOnce(&CachedTokens) -> R) -> R {
        if let Some(cached) = self.cache.read().expect("token lock poisoned").as_ref() {
            return f(cached);
        }
        let loaded = CachedTokens {
            access: self.read_entry("access-token"),
            refresh: self.read_entry("refresh-token"),
        };
        let mut guard = self.cache.write().expect("token lock poisoned");
        f(guard.get_or_insert(loaded))
    }
}

impl TokenStore for KeyringTokenStore {
    fn access_token(&self) -> Option<SecretString> {
        self.with_cache(|tokens| tokens.access.clone())
    }

    fn refresh_token(&self) -> Option<SecretString> {
        self.with_cache(|tokens| tokens.refresh.clone())
    }

    fn set_access_token(&self, token: SecretString) -> Result<(), onevisitor_api::Error> {
        self.write_entry("access-token", &token)?;
        let refresh = self.refresh_token();
        *self.cache.write().expect("token lock poisoned") = Some(CachedTokens {
            access: Some(token),
            refresh,
        });
        Ok(())
    }

    fn set_refresh_token(&self, token: SecretString) -> Result<(), onevisitor_api::Error> {
        self.write_entry("refresh-token", &token)?;
        let access = self.access_token();
        *self.cache.write().expect("token lock poisoned") = Some(CachedTokens {
            access,
            refresh: Some(token),
        });
        Ok(())
    }

    fn clear(&self) -> Result<(), onevisitor_api::Error> {
        *self.cache.write().expect("token lock poisoned") = Some(CachedTokens::default());
        self.delete_entry("access-token")?;
        self.delete_entry("refresh-token")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn profile(url: &str) -> Profile {
        Profile {
            api_url: url.into(),
            ..Profile::default()
        }
    }

    #[test]
    fn load_reads_profiles_and_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_profile = "acme"

[profiles.acme]
api_url = "https://api.onevisitor.app/api"
tenant = "acme-corp"
email = "admin@acme.test"
"#,
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("acme"));
        assert_eq!(cfg.defaults.output, "table");
        assert_eq!(cfg.defaults.timeout, 30);

        let acme = &cfg.profiles["acme"];
        assert_eq!(acme.tenant.as_deref(), Some("acme-corp"));
        assert!(acme.apex_domains.is_empty());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn profile_api_url_defaults_to_local_backend() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[profiles.local]\nemail = \"a@b.test\"\n").unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.profiles["local"].api_url, DEFAULT_API_URL);
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        let mut globex = profile("https://globex.onevisitor.app/api");
        globex.apex_domains = vec!["onevisitor.app".into()];
        globex.timeout = Some(10);
        cfg.profiles.insert("globex".into(), globex.clone());
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profiles["globex"], globex);
    }

    #[test]
    fn password_env_takes_priority_over_plaintext() {
        let mut p = profile(DEFAULT_API_URL);
        p.password_env = Some("PATH".into());
        p.password = Some("plaintext".into());

        let pw = resolve_password(&p, "ov-test-password-env").unwrap();
        assert_eq!(pw.expose_secret(), std::env::var("PATH").unwrap());
    }

    #[test]
    fn plaintext_password_is_last_resort() {
        if std::env::var("ONEVISITOR_PASSWORD").is_ok() {
            return;
        }
        let mut p = profile(DEFAULT_API_URL);
        p.password_env = Some("ONEVISITOR_TEST_UNSET_VARIABLE".into());
        p.password = Some("hunter2".into());

        let pw = resolve_password(&p, "ov-test-plaintext").unwrap();
        assert_eq!(pw.expose_secret(), "hunter2");
    }

    #[test]
    fn auth_without_email_reuses_session() {
        if std::env::var("ONEVISITOR_EMAIL").is_ok() {
            return;
        }
        let p = profile(DEFAULT_API_URL);
        assert!(matches!(
            resolve_auth(&p, "ov-test-session"),
            AuthCredentials::Session
        ));
    }

    #[test]
    fn client_config_carries_profile_settings() {
        let mut p = profile("https://globex.example.com/api");
        p.tenant = Some("globex".into());
        p.apex_domains = vec!["example.com".into()];
        p.insecure = Some(true);
        p.timeout = Some(5);

        let cfg = profile_to_client_config(&p, "ov-test-client").unwrap();
        assert_eq!(cfg.url.as_str(), "https://globex.example.com/api");
        assert_eq!(cfg.tenant.as_deref(), Some("globex"));
        assert_eq!(cfg.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(cfg.timeout, Duration::from_secs(5));
        assert_eq!(cfg.resolver.apex_domains, vec!["example.com".to_string()]);
        assert_eq!(cfg.resolver.fallback_tenant, "acme-corp");
    }

    #[test]
    fn custom_ca_is_used_when_not_insecure() {
        let mut p = profile(DEFAULT_API_URL);
        p.ca_cert = Some(PathBuf::from("/etc/ssl/dev-ca.pem"));
        assert_eq!(
            resolve_tls(&p),
            TlsVerification::CustomCa(PathBuf::from("/etc/ssl/dev-ca.pem"))
        );
    }

    #[test]
    fn invalid_api_url_is_a_validation_error() {
        let p = profile("not a url");
        let err = profile_to_client_config(&p, "ov-test-invalid").unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "api_url"));
    }
}
