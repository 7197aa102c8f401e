//! `onevisitor tenant`: which tenant a hostname or kiosk path belongs to.
//!
//! Runs offline against the built-in branding catalog.

use std::sync::Arc;

use onevisitor_core::{
    DEFAULT_API_URL, ResolvedTenant, StaticCatalog, TenantContext, TenantResolverConfig,
};

use crate::cli::{GlobalOpts, TenantArgs};
use crate::config::{self, Profile};
use crate::error::CliError;
use crate::output;

fn tenant_detail(t: &ResolvedTenant) -> String {
    output::detail_block(&[
        ("Tenant", t.id.to_string()),
        ("Source", t.source.to_string()),
        ("Branding", t.recognition.to_string()),
        ("Name", t.branding.name.clone()),
        ("Primary", t.branding.primary_color.clone()),
        ("Secondary", t.branding.secondary_color.clone()),
        ("Font", t.branding.font.clone().unwrap_or_else(|| "-".into())),
    ])
}

/// Host portion of the configured API URL.
fn api_host(global: &GlobalOpts, profile: Option<&Profile>) -> Result<String, CliError> {
    let raw = global
        .api_url
        .as_deref()
        .or_else(|| profile.map(|p| p.api_url.as_str()))
        .unwrap_or(DEFAULT_API_URL);
    let url = url::Url::parse(raw).map_err(|_| CliError::Validation {
        field: "api_url".into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    Ok(url.host_str().unwrap_or_default().to_owned())
}

pub fn handle(args: &TenantArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load_config_or_default();
    let name = config::active_profile_name(global, &cfg);
    let profile = cfg.profiles.get(&name);

    let resolver = profile.map_or_else(TenantResolverConfig::default, onevisitor_config::resolver_config);
    let context = TenantContext::new(resolver, Arc::new(StaticCatalog::demo()));

    let resolved = match (&args.path, &args.host) {
        (Some(path), _) => context.resolve_site_path(path),
        (None, Some(host)) => context.resolve_hostname(host),
        (None, None) => context.resolve_hostname(&api_host(global, profile)?),
    };
    tracing::debug!(tenant = %resolved.id, source = %resolved.source, "tenant resolved");

    let out = output::render_single(&global.output, &resolved, tenant_detail, |t| t.id.to_string());
    output::print_output(&out, global.quiet);
    Ok(())
}
