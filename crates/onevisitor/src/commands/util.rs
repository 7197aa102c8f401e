//! Shared helpers for command handlers.

use std::io::IsTerminal;

use onevisitor_core::{Dashboard, EditorError, Keyed, OrderedList, SiteConfig, SiteDraft};

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.to_owned(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(prompt_err)
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// The `--site` a site-scoped command needs.
pub fn require_site(site: Option<&str>) -> Result<&str, CliError> {
    site.ok_or_else(|| CliError::Validation {
        field: "site".into(),
        reason: "this command needs --site <SITE> (id, URL path, or name)".into(),
    })
}

/// Load a site, apply `edit` to a draft of it, and save the result.
pub async fn edit_site<F>(dashboard: &Dashboard, key: &str, edit: F) -> Result<SiteConfig, CliError>
where
    F: FnOnce(&mut SiteDraft) -> Result<(), CliError>,
{
    let site = dashboard.find_site(key).await?;
    let mut draft = SiteDraft::new(site);
    edit(&mut draft)?;
    let site = draft.finish()?;
    Ok(dashboard.save_site(&site).await?)
}

/// Move entry `id` to 1-based `position`.
pub fn move_entry<T: Keyed>(
    list: &mut OrderedList<T>,
    entity: &'static str,
    id: &str,
    position: usize,
) -> Result<(), CliError> {
    let from = list.position(id).ok_or_else(|| EditorError::Missing {
        entity,
        id: id.to_owned(),
    })?;
    let to = position.checked_sub(1).ok_or(EditorError::OutOfRange {
        index: 0,
        len: list.len(),
    })?;
    list.move_item(from, to)?;
    Ok(())
}

/// Remove entry `id`, or fail naming it.
pub fn remove_entry<T: Keyed>(
    list: &mut OrderedList<T>,
    entity: &'static str,
    id: &str,
) -> Result<T, CliError> {
    list.remove(id).ok_or_else(|| {
        EditorError::Missing {
            entity,
            id: id.to_owned(),
        }
        .into()
    })
}

/// `-` for missing optional values in tables.
pub fn or_dash(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_owned(),
        _ => "-".into(),
    }
}
