//! Session commands: login, logout, whoami, password.

use std::io::IsTerminal;

use dialoguer::Input;
use secrecy::{ExposeSecret, SecretString};

use onevisitor_core::{Dashboard, UserProfile};

use crate::cli::{GlobalOpts, LoginArgs, PasswordArgs, PasswordCommand};
use crate::config::{self, Profile};
use crate::error::CliError;
use crate::output;

use super::util::prompt_err;

fn user_detail(u: &UserProfile) -> String {
    output::detail_block(&[
        ("ID", u.id.to_string()),
        ("Name", u.display_name()),
        ("Email", u.email.clone()),
    ])
}

/// The active profile, if one is configured.
fn active_profile(global: &GlobalOpts) -> (String, Option<Profile>) {
    let cfg = config::load_config_or_default();
    let name = config::active_profile_name(global, &cfg);
    let profile = cfg.profiles.get(&name).cloned();
    (name, profile)
}

fn prompt_secret(prompt: &str) -> Result<SecretString, CliError> {
    let raw = rpassword::prompt_password(prompt).map_err(prompt_err)?;
    if raw.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }
    Ok(SecretString::from(raw))
}

pub async fn login(
    dashboard: &Dashboard,
    args: LoginArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (profile_name, profile) = active_profile(global);
    let profile = profile.unwrap_or_default();
    let interactive = std::io::stdin().is_terminal();
    let explicit_email = args.email.is_some();

    let email = match args.email.or_else(|| profile.email.clone()) {
        Some(email) => email,
        None if interactive => Input::new()
            .with_prompt("Email")
            .interact_text()
            .map_err(prompt_err)?,
        None => {
            return Err(CliError::Validation {
                field: "email".into(),
                reason: "pass --email or set one on the profile".into(),
            });
        }
    };

    // Stored credentials belong to the profile's email; a different
    // --email always prompts.
    let stored = if explicit_email && interactive {
        None
    } else {
        Some(onevisitor_config::resolve_password(&profile, &profile_name))
    };
    let password = match stored {
        Some(Ok(pw)) => pw,
        None => prompt_secret("Password: ")?,
        Some(Err(_)) if interactive => prompt_secret("Password: ")?,
        Some(Err(e)) => return Err(e.into()),
    };

    let user = dashboard.login(&email, &password).await?;
    output::note(
        global,
        &format!("Logged in as {} <{}>", user.display_name(), user.email),
    );
    Ok(())
}

pub async fn logout(dashboard: &Dashboard, global: &GlobalOpts) -> Result<(), CliError> {
    // The local session is cleared even when the server call fails.
    if let Err(e) = dashboard.logout().await {
        tracing::warn!("server logout failed: {e}");
    }
    output::note(global, "Logged out");
    Ok(())
}

pub async fn whoami(dashboard: &Dashboard, global: &GlobalOpts) -> Result<(), CliError> {
    let user = dashboard.whoami().await?;
    let out = output::render_single(&global.output, &user, user_detail, |u| u.email.clone());
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn password(
    dashboard: &Dashboard,
    args: PasswordArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        PasswordCommand::Change => {
            let current = prompt_secret("Current password: ")?;
            let new = prompt_secret("New password: ")?;
            let confirm = prompt_secret("Confirm new password: ")?;
            if new.expose_secret() != confirm.expose_secret() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "new passwords do not match".into(),
                });
            }
            dashboard.change_password(&current, &new).await?;
            output::note(global, "Password changed");
            Ok(())
        }
        PasswordCommand::Reset { email } => {
            dashboard.request_password_reset(&email).await?;
            output::note(global, &format!("If {email} has an account, a reset link is on its way"));
            Ok(())
        }
    }
}
