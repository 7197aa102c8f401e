// ── Tenant resolution context ──
//
// Derives the active tenant from a hostname subdomain or a kiosk site
// path, resolves its branding, and publishes the result through a
// `watch` channel. One `TenantContext` is created per session and passed
// explicitly to whatever needs it.

use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::Display;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::model::TenantBranding;

// ── Identifiers ──────────────────────────────────────────────────────

/// Lowercased, non-empty tenant identifier (the org shortname).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(raw: &str) -> Option<Self> {
        let id = raw.trim().to_lowercase();
        if id.is_empty() { None } else { Some(Self(id)) }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TenantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Where a tenant identifier came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum TenantSource {
    Subdomain,
    SitePath,
    Explicit,
    Fallback,
}

/// Whether branding for the tenant was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Recognition {
    Recognized,
    Unrecognized,
}

/// Outcome of tenant resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTenant {
    pub id: TenantId,
    pub source: TenantSource,
    pub recognition: Recognition,
    /// Always renderable; the OneVisitor default when unrecognized.
    pub branding: TenantBranding,
}

// ── Branding catalog ─────────────────────────────────────────────────

/// Source of branding for known tenants.
pub trait BrandingCatalog: Send + Sync {
    fn lookup(&self, id: &TenantId) -> Option<TenantBranding>;
}

/// In-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    entries: HashMap<String, TenantBranding>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: &str, branding: TenantBranding) -> Self {
        self.entries.insert(id.to_lowercase(), branding);
        self
    }

    /// The demo organizations shipped with the kiosk.
    pub fn demo() -> Self {
        fn brand(name: &str, primary: &str, secondary: &str, font: &str) -> TenantBranding {
            TenantBranding {
                name: name.into(),
                logo: None,
                primary_color: primary.into(),
                secondary_color: secondary.into(),
                font: Some(font.into()),
                badge_template: None,
            }
        }

        let mut acme = brand("Acme Corporation", "#3498db", "#2980b9", "Inter, sans-serif");
        acme.logo = Some("https://placehold.co/200x200/3498db/FFFFFF/png?text=ACME".into());

        Self::new()
            .with("acme-corp", acme)
            .with(
                "globex",
                brand("Globex Industries", "#27ae60", "#2ecc71", "Roboto, sans-serif"),
            )
            .with(
                "wayne-ent",
                brand("Wayne Enterprises", "#34495e", "#2c3e50", "Montserrat, sans-serif"),
            )
            .with(
                "stark-ind",
                brand("Stark Industries", "#e74c3c", "#c0392b", "Poppins, sans-serif"),
            )
    }
}

impl BrandingCatalog for StaticCatalog {
    fn lookup(&self, id: &TenantId) -> Option<TenantBranding> {
        self.entries.get(id.as_str()).cloned()
    }
}

// ── Resolver ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantResolverConfig {
    /// Domains the platform is served from; the apex itself has no tenant.
    pub apex_domains: Vec<String>,
    pub fallback_tenant: String,
    /// Leftmost labels that never name a tenant.
    pub ignored_labels: Vec<String>,
}

impl Default for TenantResolverConfig {
    fn default() -> Self {
        Self {
            apex_domains: vec!["onevisitor.app".into()],
            fallback_tenant: "acme-corp".into(),
            ignored_labels: vec!["www".into()],
        }
    }
}

/// Strip an optional port (and IPv6 brackets) from a host string.
fn strip_port(host: &str) -> &str {
    if let Some(rest) = host.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest);
    }
    // A bare IPv6 literal has several colons; leave it intact.
    if host.matches(':').count() == 1 {
        return host.split(':').next().unwrap_or(host);
    }
    host
}

impl TenantResolverConfig {
    /// Extract the tenant label from `host`, if it has one.
    pub fn subdomain(&self, host: &str) -> Option<TenantId> {
        let host = strip_port(host.trim()).trim_end_matches('.').to_lowercase();
        if host.is_empty() || host.parse::<IpAddr>().is_ok() {
            return None;
        }

        let labels: Vec<&str> = host.split('.').collect();
        if labels.len() < 2 {
            return None;
        }

        let mut candidate = None;
        for apex in &self.apex_domains {
            let apex = apex.trim_matches('.').to_lowercase();
            if host == apex {
                return None;
            }
            if host.ends_with(&format!(".{apex}")) {
                candidate = labels.first().copied();
                break;
            }
        }

        let label = match candidate {
            Some(label) => label,
            None if labels.len() >= 3 => labels.first().copied()?,
            None => return None,
        };

        if self.ignored_labels.iter().any(|l| l.eq_ignore_ascii_case(label)) {
            return None;
        }
        TenantId::new(label)
    }

    /// Tenant prefix of a kiosk site path (`acme-corp-lobby` -> `acme`).
    pub fn site_path_tenant(&self, path: &str) -> Option<TenantId> {
        let path = path.trim().trim_matches('/');
        let segment = path.rsplit('/').next().unwrap_or(path);
        let prefix = segment.split('-').next().unwrap_or(segment);
        TenantId::new(prefix)
    }

    pub fn fallback_id(&self) -> TenantId {
        TenantId::new(&self.fallback_tenant).unwrap_or_else(|| TenantId("acme-corp".into()))
    }
}

// ── Context ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
struct ContextState {
    resolved: ResolvedTenant,
    current_tenant: Option<String>,
}

/// Observable tenant state, shared by clone.
#[derive(Clone)]
pub struct TenantContext {
    config: Arc<TenantResolverConfig>,
    catalog: Arc<dyn BrandingCatalog>,
    state: Arc<watch::Sender<ContextState>>,
}

impl fmt::Debug for TenantContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TenantContext")
            .field("config", &self.config)
            .field("resolved", &self.state.borrow().resolved)
            .finish_non_exhaustive()
    }
}

impl TenantContext {
    /// Start on the fallback tenant.
    pub fn new(config: TenantResolverConfig, catalog: Arc<dyn BrandingCatalog>) -> Self {
        let id = config.fallback_id();
        let resolved = resolve_with(&*catalog, id, TenantSource::Fallback);
        let (tx, _) = watch::channel(ContextState {
            current_tenant: Some(resolved.id.to_string()),
            resolved,
        });
        Self {
            config: Arc::new(config),
            catalog,
            state: Arc::new(tx),
        }
    }

    /// Context over the demo catalog with default resolver settings.
    pub fn demo() -> Self {
        Self::new(
            TenantResolverConfig::default(),
            Arc::new(StaticCatalog::demo()),
        )
    }

    pub fn config(&self) -> &TenantResolverConfig {
        &self.config
    }

    // ── Resolution ───────────────────────────────────────────────────

    /// Resolve `host` without touching the context.
    pub fn resolve_hostname(&self, host: &str) -> ResolvedTenant {
        match self.config.subdomain(host) {
            Some(id) => self.resolve(id, TenantSource::Subdomain),
            None => self.resolve(self.config.fallback_id(), TenantSource::Fallback),
        }
    }

    /// Resolve a kiosk site path without touching the context.
    pub fn resolve_site_path(&self, path: &str) -> ResolvedTenant {
        match self.config.site_path_tenant(path) {
            Some(id) => self.resolve(id, TenantSource::SitePath),
            None => self.resolve(self.config.fallback_id(), TenantSource::Fallback),
        }
    }

    fn resolve(&self, id: TenantId, source: TenantSource) -> ResolvedTenant {
        resolve_with(&*self.catalog, id, source)
    }

    /// Resolve and publish the tenant for `host`.
    ///
    /// Subscribers are only notified when the identifier changes.
    pub fn observe_hostname(&self, host: &str) -> bool {
        let resolved = self.resolve_hostname(host);
        self.publish_if_changed(resolved)
    }

    /// Follow a kiosk site path: its tenant becomes the current tenant and
    /// supplies branding. The request tenant ([`Self::tenant_id`]) is kept,
    /// and an explicitly pinned tenant ignores site paths entirely.
    pub fn observe_site_path(&self, path: &str) -> bool {
        let from_path = self.resolve_site_path(path);
        self.state.send_if_modified(|state| {
            let id = from_path.id.to_string();
            if state.resolved.source == TenantSource::Explicit
                || state.current_tenant.as_deref() == Some(id.as_str())
            {
                return false;
            }
            debug!(tenant = %state.resolved.id, current = %id, "site path selects tenant");
            state.current_tenant = Some(id);
            state.resolved.branding = from_path.branding;
            true
        })
    }

    /// Pin the tenant explicitly (e.g. `--tenant acme-corp`).
    pub fn set_explicit(&self, raw: &str) -> Option<TenantId> {
        let id = TenantId::new(raw)?;
        let resolved = self.resolve(id.clone(), TenantSource::Explicit);
        self.publish_if_changed(resolved);
        Some(id)
    }

    fn publish_if_changed(&self, resolved: ResolvedTenant) -> bool {
        self.state.send_if_modified(|state| {
            if state.resolved.id == resolved.id {
                return false;
            }
            state.current_tenant = Some(resolved.id.to_string());
            state.resolved = resolved;
            true
        })
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn resolved(&self) -> ResolvedTenant {
        self.state.borrow().resolved.clone()
    }

    pub fn tenant_id(&self) -> TenantId {
        self.state.borrow().resolved.id.clone()
    }

    pub fn branding(&self) -> TenantBranding {
        self.state.borrow().resolved.branding.clone()
    }

    /// Replace the active branding; `None` restores the default.
    pub fn set_branding(&self, branding: Option<TenantBranding>) {
        let branding =
            branding.map_or_else(TenantBranding::default, TenantBranding::or_default_parts);
        self.state.send_if_modified(|state| {
            if state.resolved.branding == branding {
                return false;
            }
            state.resolved.branding = branding;
            true
        });
    }

    /// Apply branding fetched from live tenant or site data.
    pub fn apply_live_branding(&self, branding: TenantBranding) {
        debug!(tenant = %self.tenant_id(), name = %branding.name, "applying live branding");
        self.set_branding(Some(branding));
    }

    /// Tenant the user is working in (the admin area can switch it).
    pub fn current_tenant(&self) -> Option<String> {
        self.state.borrow().current_tenant.clone()
    }

    pub fn set_current_tenant(&self, tenant: Option<String>) {
        self.state.send_if_modified(|state| {
            if state.current_tenant == tenant {
                return false;
            }
            state.current_tenant = tenant;
            true
        });
    }

    /// Watch for changes to the resolved tenant.
    pub fn subscribe(&self) -> TenantWatch {
        TenantWatch {
            rx: self.state.subscribe(),
        }
    }
}

fn resolve_with(
    catalog: &dyn BrandingCatalog,
    id: TenantId,
    source: TenantSource,
) -> ResolvedTenant {
    let (recognition, branding) = match catalog.lookup(&id) {
        Some(branding) => (Recognition::Recognized, branding.or_default_parts()),
        None => {
            info!(tenant = %id, %source, "unrecognized tenant, using default branding");
            (Recognition::Unrecognized, TenantBranding::default())
        }
    };
    debug!(tenant = %id, %source, %recognition, "tenant resolved");
    ResolvedTenant {
        id,
        source,
        recognition,
        branding,
    }
}

/// Subscription handle returned by [`TenantContext::subscribe`].
pub struct TenantWatch {
    rx: watch::Receiver<ContextState>,
}

impl TenantWatch {
    /// Latest value, marking it as seen.
    pub fn current(&mut self) -> ResolvedTenant {
        self.rx.borrow_and_update().resolved.clone()
    }

    /// `true` if the context changed since the last `current()`.
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Wait for the next change. Returns `None` once the context is dropped.
    pub async fn changed(&mut self) -> Option<ResolvedTenant> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().resolved.clone())
    }
}
