//! CLI configuration -- thin wrapper around `onevisitor_config`.
//!
//! Adds `GlobalOpts` flag overrides (--api-url, --tenant, --insecure, ...)
//! on top of profile resolution and picks the token store.

use std::sync::Arc;
use std::time::Duration;

use onevisitor_config::KeyringTokenStore;
use onevisitor_core::{
    ClientConfig, DEFAULT_API_URL, MemoryTokenStore, TlsVerification, TokenStore,
};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use onevisitor_config::{
    Config, Profile, config_path, load_config_or_default, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// "a, b, c" or "(none)".
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<&str> = config.profiles.keys().map(String::as_str).collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort_unstable();
    names.join(", ")
}

/// Translate a profile + global flags into a `ClientConfig`.
///
/// Flags take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    global: &GlobalOpts,
) -> Result<ClientConfig, CliError> {
    let mut config = onevisitor_config::profile_to_client_config(profile, profile_name)?;

    if let Some(ref url_str) = global.api_url {
        config.url = parse_url(url_str)?;
    }
    if let Some(ref tenant) = global.tenant {
        config.tenant = Some(tenant.clone());
    }
    if global.insecure {
        config.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        config.timeout = Duration::from_secs(secs);
    }
    Ok(config)
}

/// Build the `ClientConfig` for this invocation: the active profile if it
/// exists, otherwise flags and defaults alone.
pub fn build_client_config(global: &GlobalOpts) -> Result<(String, ClientConfig), CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    if let Some(profile) = cfg.profiles.get(&profile_name) {
        let config = resolve_profile(profile, &profile_name, global)?;
        return Ok((profile_name, config));
    }

    // A named profile that does not exist is a mistake; the implicit
    // default just means "no config file yet".
    if global.profile.is_some() {
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: available_profiles(&cfg),
        });
    }

    let url_str = global.api_url.as_deref().unwrap_or(DEFAULT_API_URL);
    let mut config = ClientConfig::new(parse_url(url_str)?);
    config.tenant.clone_from(&global.tenant);
    config.auth = onevisitor_config::resolve_auth(&Profile::default(), &profile_name);
    if let Some(secs) = global.timeout {
        config.timeout = Duration::from_secs(secs);
    }
    if global.insecure {
        config.tls = TlsVerification::DangerAcceptInvalid;
    }
    Ok((profile_name, config))
}

/// Session token storage for `profile_name`.
pub fn token_store(global: &GlobalOpts, profile_name: &str) -> Arc<dyn TokenStore> {
    if global.no_keyring {
        Arc::new(MemoryTokenStore::new())
    } else {
        Arc::new(KeyringTokenStore::new(profile_name))
    }
}

fn parse_url(raw: &str) -> Result<url::Url, CliError> {
    raw.parse().map_err(|_| CliError::Validation {
        field: "api_url".into(),
        reason: format!("invalid URL: {raw}"),
    })
}
