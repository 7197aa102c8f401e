//! Tenant administration.

use tabled::Tabled;

use onevisitor_core::text::is_hex_color;
use onevisitor_core::{Dashboard, Tenant, TenantBranding, TenantStatus, slugify};

use crate::cli::{GlobalOpts, TenantsArgs, TenantsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct TenantRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Shortname")]
    shortname: String,
    #[tabled(rename = "Domain")]
    domain: String,
    #[tabled(rename = "Status")]
    status: String,
}

fn tenant_row(t: &Tenant) -> TenantRow {
    TenantRow {
        id: t.id.clone(),
        name: t.name.clone(),
        shortname: util::or_dash(t.shortname.as_deref()),
        domain: t.domain.clone(),
        status: t.status.to_string(),
    }
}

fn tenant_detail(t: &Tenant) -> String {
    output::detail_block(&[
        ("ID", t.id.clone()),
        ("Name", t.name.clone()),
        ("Shortname", util::or_dash(t.shortname.as_deref())),
        ("Domain", t.domain.clone()),
        ("Status", t.status.to_string()),
        ("Brand name", t.branding.name.clone()),
        (
            "Colors",
            format!("{} / {}", t.branding.primary_color, t.branding.secondary_color),
        ),
        (
            "Created",
            t.created_at
                .map_or_else(|| "-".into(), |c| c.format("%Y-%m-%d").to_string()),
        ),
    ])
}

fn color_arg(field: &str, value: Option<String>, fallback: String) -> Result<String, CliError> {
    match value {
        Some(c) if is_hex_color(&c) => Ok(c),
        Some(c) => Err(CliError::Validation {
            field: field.into(),
            reason: format!("'{c}' is not a #rrggbb color"),
        }),
        None => Ok(fallback),
    }
}

pub async fn handle(
    dashboard: &Dashboard,
    args: TenantsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        TenantsCommand::List => {
            let tenants = dashboard.tenants().await?;
            let out = output::render_list(&global.output, &tenants, tenant_row, |t| t.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TenantsCommand::Get { shortname } => {
            let tenant = dashboard.tenant_by_shortname(&shortname).await?;
            let out = output::render_single(&global.output, &tenant, tenant_detail, |t| {
                t.id.clone()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TenantsCommand::Create {
            name,
            domain,
            shortname,
            primary_color,
            secondary_color,
        } => {
            let defaults = TenantBranding::default();
            let branding = TenantBranding {
                name: name.clone(),
                primary_color: color_arg("primary_color", primary_color, defaults.primary_color)?,
                secondary_color: color_arg(
                    "secondary_color",
                    secondary_color,
                    defaults.secondary_color,
                )?,
                ..TenantBranding::default()
            };
            let tenant = Tenant {
                id: String::new(),
                shortname: Some(shortname.unwrap_or_else(|| slugify(&name))),
                name,
                domain,
                logo: None,
                branding,
                status: TenantStatus::default(),
                created_at: None,
                updated_at: None,
            };
            let created = dashboard.create_tenant(&tenant).await?;
            output::note(global, &format!("Tenant '{}' created", created.name));
            output::print_output(&created.id, global.quiet);
            Ok(())
        }
    }
}
