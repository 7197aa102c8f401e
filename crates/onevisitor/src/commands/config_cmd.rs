//! Config subcommand handlers.

use std::collections::BTreeMap;

use dialoguer::{Input, Select};
use secrecy::SecretString;

use onevisitor_core::DEFAULT_API_URL;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

use super::util::prompt_err;

const SETTABLE_KEYS: &str =
    "api_url, tenant, email, password_env, apex_domains, insecure, timeout, ca_cert";

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking the plaintext password.
fn format_config_redacted(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "api_url = \"{}\"", p.api_url);
        if let Some(ref t) = p.tenant {
            let _ = writeln!(out, "tenant = \"{t}\"");
        }
        if !p.apex_domains.is_empty() {
            let quoted: Vec<String> = p.apex_domains.iter().map(|d| format!("\"{d}\"")).collect();
            let _ = writeln!(out, "apex_domains = [{}]", quoted.join(", "));
        }
        if let Some(ref e) = p.email {
            let _ = writeln!(out, "email = \"{e}\"");
        }
        if p.password.is_some() {
            let _ = writeln!(out, "password = \"****\"");
        }
        if let Some(ref env) = p.password_env {
            let _ = writeln!(out, "password_env = \"{env}\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
    }

    out
}

fn save_config(cfg: &Config) -> Result<(), CliError> {
    config::save_config(cfg)?;
    Ok(())
}

fn profile_not_found(cfg: &Config, name: String) -> CliError {
    CliError::ProfileNotFound {
        name,
        available: config::available_profiles(cfg),
    }
}

/// Offer keyring or plaintext storage for a password.
///
/// Returns `Some(password)` for plaintext, `None` once stored in the keyring.
fn prompt_password_storage(profile_name: &str, password: String) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Where to store the password?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        onevisitor_config::store_password(profile_name, &SecretString::from(password))?;
        eprintln!("   ✓ Password stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(password))
    }
}

/// Apply `key = value` to a profile.
fn set_profile_key(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    let optional = |v: String| if v.is_empty() { None } else { Some(v) };

    match key {
        "api_url" | "api-url" => {
            if url::Url::parse(&value).is_err() {
                return Err(CliError::Validation {
                    field: "api_url".into(),
                    reason: format!("invalid URL: {value}"),
                });
            }
            profile.api_url = value;
        }
        "tenant" => profile.tenant = optional(value),
        "email" => profile.email = optional(value),
        "password_env" | "password-env" => profile.password_env = optional(value),
        "apex_domains" | "apex-domains" => {
            profile.apex_domains = value
                .split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_owned)
                .collect();
        }
        "insecure" => {
            profile.insecure = Some(value.parse().map_err(|_| CliError::Validation {
                field: "insecure".into(),
                reason: "must be 'true' or 'false'".into(),
            })?);
        }
        "timeout" => {
            profile.timeout = Some(value.parse().map_err(|_| CliError::Validation {
                field: "timeout".into(),
                reason: "must be a number (seconds)".into(),
            })?);
        }
        "ca_cert" | "ca-cert" => profile.ca_cert = optional(value).map(Into::into),
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!("unknown config key '{other}'. Valid keys: {SETTABLE_KEYS}"),
            });
        }
    }
    Ok(())
}

fn new_profile() -> Profile {
    Profile {
        api_url: DEFAULT_API_URL.into(),
        ..Profile::default()
    }
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("OneVisitor CLI configuration");
            eprintln!("   Config path: {}\n", config_path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let api_url: String = Input::new()
                .with_prompt("API URL")
                .default(DEFAULT_API_URL.into())
                .validate_with(|v: &String| url::Url::parse(v).map(drop).map_err(|e| e.to_string()))
                .interact_text()
                .map_err(prompt_err)?;

            let tenant: String = Input::new()
                .with_prompt("Tenant shortname (blank to resolve from the API host)")
                .allow_empty(true)
                .interact_text()
                .map_err(prompt_err)?;

            let email: String = Input::new()
                .with_prompt("Login email (blank to log in later)")
                .allow_empty(true)
                .interact_text()
                .map_err(prompt_err)?;

            let password = if email.is_empty() {
                None
            } else {
                let pass = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
                if pass.is_empty() {
                    None
                } else {
                    prompt_password_storage(&profile_name, pass)?
                }
            };

            let profile = Profile {
                api_url,
                tenant: Some(tenant).filter(|t| !t.is_empty()),
                email: Some(email).filter(|e| !e.is_empty()),
                password,
                ..Profile::default()
            };

            // Keep other profiles when re-running init.
            let mut cfg = config::load_config_or_default();
            cfg.profiles.insert(profile_name.clone(), profile);
            cfg.default_profile = Some(profile_name.clone());

            save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", config_path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: onevisitor sites list");

            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out = output::render_single(
                &global.output,
                &RedactedConfig(&cfg),
                |c| format_config_redacted(c.0),
                |_| "config".into(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg
                .profiles
                .entry(profile_name.clone())
                .or_insert_with(new_profile);

            set_profile_key(profile, &key, value)?;

            save_config(&cfg)?;
            eprintln!("✓ Set {key} on profile '{profile_name}'");
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: onevisitor config init");
            } else {
                let mut names: Vec<&String> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(profile_not_found(&cfg, name));
            }
            cfg.default_profile = Some(name.clone());
            save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }

        // ── SetPassword ─────────────────────────────────────────────
        ConfigCommand::SetPassword { profile } => {
            let cfg = config::load_config_or_default();
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));
            if !cfg.profiles.contains_key(&profile_name) {
                return Err(profile_not_found(&cfg, profile_name));
            }

            let secret = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
            if secret.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "value cannot be empty".into(),
                });
            }
            onevisitor_config::store_password(&profile_name, &SecretString::from(secret))?;

            eprintln!("✓ Password stored in system keyring for profile '{profile_name}'");
            Ok(())
        }
    }
}

/// Serializes like `Config` with the plaintext password masked.
struct RedactedConfig<'a>(&'a Config);

impl serde::Serialize for RedactedConfig<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let profiles: BTreeMap<&String, Profile> = self
            .0
            .profiles
            .iter()
            .map(|(name, p)| {
                let mut p = p.clone();
                if p.password.is_some() {
                    p.password = Some("****".into());
                }
                (name, p)
            })
            .collect();

        let mut s = serializer.serialize_struct("Config", 3)?;
        s.serialize_field("default_profile", &self.0.default_profile)?;
        s.serialize_field("defaults", &self.0.defaults)?;
        s.serialize_field("profiles", &profiles)?;
        s.end()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn set_splits_apex_domains() {
        let mut p = new_profile();
        set_profile_key(&mut p, "apex_domains", "onevisitor.app, visit.example.com,".into()).unwrap();
        assert_eq!(p.apex_domains, ["onevisitor.app", "visit.example.com"]);
    }

    #[test]
    fn set_rejects_unknown_keys_and_bad_values() {
        let mut p = new_profile();
        assert!(set_profile_key(&mut p, "controller", "x".into()).is_err());
        assert!(set_profile_key(&mut p, "timeout", "soon".into()).is_err());
        assert!(set_profile_key(&mut p, "api_url", "not a url".into()).is_err());
    }

    #[test]
    fn blank_value_clears_optional_keys() {
        let mut p = new_profile();
        set_profile_key(&mut p, "tenant", "globex".into()).unwrap();
        assert_eq!(p.tenant.as_deref(), Some("globex"));
        set_profile_key(&mut p, "tenant", String::new()).unwrap();
        assert_eq!(p.tenant, None);
    }

    #[test]
    fn redacted_output_masks_password() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                password: Some("hunter2".into()),
                email: Some("ada@acme.com".into()),
                ..new_profile()
            },
        );
        let text = format_config_redacted(&cfg);
        assert!(text.contains("password = \"****\""));
        assert!(!text.contains("hunter2"));

        let json = serde_json::to_string(&RedactedConfig(&cfg)).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(json.contains("ada@acme.com"));
    }
}
