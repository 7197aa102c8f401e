//! Site command handlers.

use tabled::Tabled;

use onevisitor_core::{Dashboard, SiteConfig, SiteDraft};

use crate::cli::{GlobalOpts, SiteSettings, SitesArgs, SitesCommand};
use crate::error::CliError;
use crate::output::{self, Painter};

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct SiteRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Path")]
    url: String,
    #[tabled(rename = "Published")]
    published: String,
    #[tabled(rename = "Visitors")]
    visitors: String,
}

fn site_row(s: &SiteConfig, painter: Painter) -> SiteRow {
    SiteRow {
        id: s.id.clone(),
        name: s.name.clone(),
        url: format!("/{}", s.url),
        published: painter.flag(s.published),
        visitors: s.visitor_count.map(|c| c.to_string()).unwrap_or_default(),
    }
}

fn site_detail(s: &SiteConfig) -> String {
    let types: Vec<&str> = s.visitor_types.iter().map(|t| t.name.as_str()).collect();
    let fields: Vec<String> = s
        .form_fields
        .iter()
        .map(|f| {
            if f.required {
                format!("{}*", f.id)
            } else {
                f.id.clone()
            }
        })
        .collect();

    output::detail_block(&[
        ("ID", s.id.clone()),
        ("Name", s.name.clone()),
        ("Tenant", s.tenant_id.clone()),
        ("Path", format!("/{}", s.url)),
        ("Published", s.published.to_string()),
        (
            "Last published",
            s.last_published
                .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
                .unwrap_or_else(|| "-".into()),
        ),
        ("Welcome", s.welcome_message.clone()),
        (
            "Colors",
            format!(
                "{} / {}",
                s.branding.primary_color, s.branding.secondary_color
            ),
        ),
        ("Visitor types", types.join(", ")),
        ("Fields", fields.join(", ")),
        ("Hosts", s.hosts.len().to_string()),
        ("Photo", s.check_in_policy.photo_required.to_string()),
        ("Signature", s.check_in_policy.signature_required.to_string()),
    ])
}

/// Apply optional settings flags to a draft.
fn apply_settings(draft: &mut SiteDraft, settings: &SiteSettings) -> Result<(), CliError> {
    if let Some(ref url) = settings.url {
        draft.set_url(url);
    }
    if let Some(ref message) = settings.welcome_message {
        draft.set_welcome_message(message);
    }
    if let Some(ref color) = settings.primary_color {
        draft.set_primary_color(color)?;
    }
    if let Some(ref color) = settings.secondary_color {
        draft.set_secondary_color(color)?;
    }
    if let Some(required) = settings.photo_required {
        draft.set_photo_required(required);
    }
    if let Some(required) = settings.signature_required {
        draft.set_signature_required(required);
    }
    Ok(())
}

fn print_site(global: &GlobalOpts, site: &SiteConfig) {
    let out = output::render_single(&global.output, site, site_detail, |s| s.id.clone());
    output::print_output(&out, global.quiet);
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    dashboard: &Dashboard,
    args: SitesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let painter = Painter::new(global);

    match args.command {
        SitesCommand::List => {
            let sites = dashboard.list_sites().await?;
            let out = output::render_list(
                &global.output,
                &sites,
                |s| site_row(s, painter),
                |s| s.id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SitesCommand::Get { site } => {
            let site = dashboard.find_site(&site).await?;
            print_site(global, &site);
            Ok(())
        }

        SitesCommand::Create {
            name,
            settings,
            publish,
        } => {
            let mut draft = SiteDraft::blank(&dashboard.tenant_id(), &name);
            apply_settings(&mut draft, &settings)?;
            draft.set_published(publish);
            let created = dashboard.create_site(&draft.finish()?).await?;
            output::note(global, &format!("Site created at /{}", created.url));
            print_site(global, &created);
            Ok(())
        }

        SitesCommand::Update {
            site,
            name,
            settings,
        } => {
            let saved = util::edit_site(dashboard, &site, |draft| {
                if let Some(ref name) = name {
                    draft.set_name(name);
                }
                apply_settings(draft, &settings)
            })
            .await?;
            output::note(global, &format!("Site '{}' saved", saved.name));
            Ok(())
        }

        SitesCommand::Publish { site } => set_published(dashboard, &site, true, global).await,
        SitesCommand::Unpublish { site } => set_published(dashboard, &site, false, global).await,
    }
}

async fn set_published(
    dashboard: &Dashboard,
    key: &str,
    published: bool,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let site = dashboard.find_site(key).await?;
    let updated = dashboard.publish_site(&site.id, published).await?;
    let state = if updated.published { "published" } else { "unpublished" };
    output::note(global, &format!("Site '{}' {state}", updated.name));
    Ok(())
}
