//! Site access: who may manage a site and at what level.

use std::str::FromStr;

use tabled::Tabled;

use onevisitor_core::{AccessLevel, CoreError, Dashboard, PermissionRole, SitePermission};

use crate::cli::{GlobalOpts, PermissionsArgs, PermissionsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct PermissionRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Level")]
    level: String,
}

fn permission_row(p: &SitePermission) -> PermissionRow {
    PermissionRow {
        id: p.id.clone(),
        name: p.user_name.clone(),
        email: p.user_email.clone(),
        role: p.role.to_string(),
        level: p.level.to_string(),
    }
}

fn parse_role(raw: &str) -> Result<PermissionRole, CliError> {
    PermissionRole::from_str(raw).map_err(|_| CliError::Validation {
        field: "role".into(),
        reason: format!("unknown role '{raw}'"),
    })
}

fn parse_level(raw: &str) -> Result<AccessLevel, CliError> {
    AccessLevel::from_str(raw).map_err(|_| CliError::Validation {
        field: "level".into(),
        reason: format!("unknown access level '{raw}'"),
    })
}

pub async fn handle(
    dashboard: &Dashboard,
    args: PermissionsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let site_key = util::require_site(args.site.as_deref())?;
    let site = dashboard.find_site(site_key).await?;

    match args.command {
        PermissionsCommand::List => {
            let permissions = dashboard.permissions(&site.id).await?;
            let out = output::render_list(
                &global.output,
                &permissions,
                permission_row,
                |p| p.id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PermissionsCommand::Grant {
            name,
            email,
            role,
            level,
        } => {
            let permission = SitePermission {
                id: String::new(),
                user_name: name,
                user_email: email,
                role: parse_role(&role)?,
                level: parse_level(&level)?,
            };
            let saved = dashboard.upsert_permission(&site.id, &permission).await?;
            output::note(
                global,
                &format!(
                    "{} granted {} ({}) on '{}'",
                    saved.user_email, saved.role, saved.level, site.name
                ),
            );
            output::print_output(&saved.id, global.quiet);
            Ok(())
        }

        PermissionsCommand::Update { id, role, level } => {
            let mut permission = dashboard
                .permissions(&site.id)
                .await?
                .into_iter()
                .find(|p| p.id == id)
                .ok_or_else(|| CoreError::not_found("Permission", &id))?;
            if let Some(ref role) = role {
                permission.role = parse_role(role)?;
            }
            if let Some(ref level) = level {
                permission.level = parse_level(level)?;
            }
            let saved = dashboard.upsert_permission(&site.id, &permission).await?;
            output::note(
                global,
                &format!("{} is now {} ({})", saved.user_email, saved.role, saved.level),
            );
            Ok(())
        }

        PermissionsCommand::Revoke { id } => {
            if !util::confirm(&format!("Revoke permission {id} on '{}'?", site.name), global.yes)? {
                return Ok(());
            }
            dashboard.delete_permission(&site.id, &id).await?;
            output::note(global, &format!("Permission {id} revoked"));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_and_levels_parse_by_name() {
        assert_eq!(parse_role("SecurityOfficer").ok(), Some(PermissionRole::SecurityOfficer));
        assert_eq!(parse_level("Admin").ok(), Some(AccessLevel::Admin));
        assert!(matches!(parse_role("Janitor"), Err(CliError::Validation { .. })));
    }
}
