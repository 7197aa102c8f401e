// ── Dashboard facade ──
//
// One authenticated API client plus the tenant context it works in.
// Every management screen (sites, visitors, permissions, tenants, the
// kiosk) goes through here; raw API errors never escape.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use secrecy::SecretString;
use serde_json::json;
use tracing::{debug, info, warn};

use onevisitor_api::types::{PermissionDto, SiteDto, TenantDto};
use onevisitor_api::{ApiClient, TlsMode, TokenStore, TransportConfig};

use crate::config::{AuthCredentials, ClientConfig, TlsVerification};
use crate::error::CoreError;
use crate::export::{VisitorRow, visitor_csv};
use crate::model::{
    SiteConfig, SitePermission, Tenant, TenantBranding, UserProfile, Visitor, VisitorFilter,
    VisitorStatus,
};
use crate::tenant::{StaticCatalog, TenantContext};
use crate::wizard::CheckInWizard;

/// Cheaply cloneable handle over one backend session.
#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<DashboardInner>,
}

struct DashboardInner {
    config: ClientConfig,
    client: ApiClient,
    tenant: TenantContext,
}

impl Dashboard {
    /// Build the client and resolve the tenant. Does NOT authenticate --
    /// call [`connect()`](Self::connect) for that.
    pub fn new(config: ClientConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, CoreError> {
        let tenant = TenantContext::new(config.resolver.clone(), Arc::new(StaticCatalog::demo()));
        match config.tenant.as_deref() {
            Some(explicit) => {
                if tenant.set_explicit(explicit).is_none() {
                    return Err(CoreError::Config {
                        message: format!("invalid tenant identifier '{explicit}'"),
                    });
                }
            }
            None => {
                if let Some(host) = config.url.host_str() {
                    tenant.observe_hostname(host);
                }
            }
        }

        let transport = build_transport(&config);
        let mut client = ApiClient::new(config.url.as_str(), &transport, tokens)?
            .with_tenant(tenant.tenant_id().to_string());
        if let Some(offset) = config.timezone_offset {
            client = client.with_timezone_offset(offset);
        }

        Ok(Self {
            inner: Arc::new(DashboardInner {
                config,
                client,
                tenant,
            }),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn client(&self) -> &ApiClient {
        &self.inner.client
    }

    pub fn tenant(&self) -> &TenantContext {
        &self.inner.tenant
    }

    /// Tenant id sent with tenant-scoped requests. Kiosk site paths never
    /// change it; only the hostname, `--tenant`, or a tenant switch do.
    pub fn tenant_id(&self) -> String {
        self.inner.tenant.tenant_id().to_string()
    }

    /// Switch the working tenant (admin area).
    pub fn switch_tenant(&self, tenant: &str) -> Result<(), CoreError> {
        let id = self
            .inner
            .tenant
            .set_explicit(tenant)
            .ok_or_else(|| CoreError::Config {
                message: format!("invalid tenant identifier '{tenant}'"),
            })?;
        self.inner.tenant.set_current_tenant(Some(id.to_string()));
        self.inner.client.set_tenant(Some(id.to_string()));
        Ok(())
    }

    // ── Session ──────────────────────────────────────────────────────

    /// Authenticate if needed. With password credentials and no stored
    /// access token this logs in; with session auth a missing token is an
    /// error.
    pub async fn connect(&self) -> Result<(), CoreError> {
        let has_token = self.inner.client.tokens().access_token().is_some();
        match &self.inner.config.auth {
            _ if has_token => {
                debug!("reusing stored access token");
                Ok(())
            }
            AuthCredentials::Password { email, password } => {
                self.login(email, password).await?;
                Ok(())
            }
            AuthCredentials::Session => Err(CoreError::AuthenticationFailed {
                message: "Not logged in -- run `onevisitor login`".into(),
            }),
        }
    }

    pub async fn login(&self, email: &str, password: &SecretString) -> Result<UserProfile, CoreError> {
        let user = self.inner.client.login(email, password).await?;
        info!(email, "logged in");
        Ok(user.into())
    }

    pub async fn logout(&self) -> Result<(), CoreError> {
        self.inner.client.logout().await?;
        Ok(())
    }

    pub async fn whoami(&self) -> Result<UserProfile, CoreError> {
        Ok(self.inner.client.profile().await?.into())
    }

    pub async fn change_password(
        &self,
        old_password: &SecretString,
        new_password: &SecretString,
    ) -> Result<(), CoreError> {
        self.inner
            .client
            .change_password(old_password, new_password)
            .await?;
        Ok(())
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<(), CoreError> {
        self.inner.client.request_password_reset(email).await?;
        Ok(())
    }

    // ── Sites ────────────────────────────────────────────────────────

    pub async fn list_sites(&self) -> Result<Vec<SiteConfig>, CoreError> {
        let dtos = self.inner.client.list_sites(&self.tenant_id()).await?;
        Ok(dtos.into_iter().map(SiteConfig::from).collect())
    }

    pub async fn site(&self, site_id: &str) -> Result<SiteConfig, CoreError> {
        let dto = self
            .inner
            .client
            .get_site(site_id)
            .await
            .map_err(|e| not_found_as(e, "Site", site_id))?;
        Ok(dto.into())
    }

    /// Look a site up by its public path.
    pub async fn site_by_path(&self, path: &str) -> Result<SiteConfig, CoreError> {
        let path = path.trim().trim_matches('/');
        let dto = self
            .inner
            .client
            .site_by_url(path)
            .await
            .map_err(|e| not_found_as(e, "Site", path))?;
        Ok(dto.into())
    }

    /// Find a site of the current tenant by id, public path, or name.
    pub async fn find_site(&self, key: &str) -> Result<SiteConfig, CoreError> {
        self.list_sites()
            .await?
            .into_iter()
            .find(|s| s.id == key || s.url == key || s.name.eq_ignore_ascii_case(key))
            .ok_or_else(|| CoreError::not_found("Site", key))
    }

    pub async fn create_site(&self, site: &SiteConfig) -> Result<SiteConfig, CoreError> {
        let mut dto = SiteDto::from(site);
        if dto.tenant_id.is_empty() {
            dto.tenant_id = self.tenant_id();
        }
        let created = self.inner.client.create_site(&dto).await?;
        info!(site = %created.url, "site created");
        Ok(created.into())
    }

    /// Write the whole site configuration back.
    pub async fn save_site(&self, site: &SiteConfig) -> Result<SiteConfig, CoreError> {
        let patch = serde_json::to_value(SiteDto::from(site))
            .map_err(|e| CoreError::Internal(format!("encoding site: {e}")))?;
        let saved = self
            .inner
            .client
            .update_site(&site.id, &patch)
            .await
            .map_err(|e| not_found_as(e, "Site", &site.id))?;
        Ok(saved.into())
    }

    pub async fn publish_site(&self, site_id: &str, published: bool) -> Result<SiteConfig, CoreError> {
        let updated = self
            .inner
            .client
            .set_site_published(site_id, published)
            .await
            .map_err(|e| not_found_as(e, "Site", site_id))?;
        info!(site = site_id, published, "site publish state changed");
        Ok(updated.into())
    }

    // ── Kiosk ────────────────────────────────────────────────────────

    /// Resolve a kiosk path: the path's tenant becomes the current tenant,
    /// then the site is fetched and its branding applied. Requests keep the
    /// session's tenant header.
    pub async fn kiosk_site(&self, path: &str) -> Result<SiteConfig, CoreError> {
        self.inner.tenant.observe_site_path(path);
        let site = self.site_by_path(path).await?;
        if !site.published {
            warn!(site = %site.url, "kiosk site is not published");
        }
        self.inner.tenant.apply_live_branding(site_branding(&site));
        Ok(site)
    }

    /// Fresh check-in wizard for a kiosk path.
    pub async fn start_check_in(&self, path: &str) -> Result<CheckInWizard, CoreError> {
        Ok(CheckInWizard::new(self.kiosk_site(path).await?))
    }

    // ── Visitors ─────────────────────────────────────────────────────

    /// Visitors of the current tenant matching `filter`. The site narrows
    /// the request server-side; the rest is applied locally.
    pub async fn visitors(&self, filter: &VisitorFilter) -> Result<Vec<Visitor>, CoreError> {
        let dtos = self
            .inner
            .client
            .list_visitors(filter.site_id.as_deref(), &self.tenant_id())
            .await?;
        let visitors: Vec<Visitor> = dtos
            .into_iter()
            .map(Visitor::from)
            .filter(|v| filter.matches(v))
            .collect();
        debug!(count = visitors.len(), "visitors listed");
        Ok(visitors)
    }

    pub async fn check_out(&self, visitor_id: &str) -> Result<Visitor, CoreError> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let patch = json!({
            "status": VisitorStatus::CheckedOut.to_string(),
            "checkOutTime": now,
        });
        let dto = self
            .inner
            .client
            .update_visitor(visitor_id, &patch)
            .await
            .map_err(|e| not_found_as(e, "Visitor", visitor_id))?;
        info!(visitor = visitor_id, "visitor checked out");
        Ok(dto.into())
    }

    pub async fn delete_visitor(&self, visitor_id: &str) -> Result<(), CoreError> {
        self.inner
            .client
            .delete_visitor(visitor_id)
            .await
            .map_err(|e| not_found_as(e, "Visitor", visitor_id))?;
        Ok(())
    }

    /// CSV of the matching visitors with site names resolved.
    pub async fn export_visitors(&self, filter: &VisitorFilter) -> Result<String, CoreError> {
        let visitors = self.visitors(filter).await?;
        let site_names: HashMap<String, String> = self
            .list_sites()
            .await?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect();

        visitor_csv(visitors.iter().map(|v| VisitorRow {
            site_name: v
                .site_id
                .as_deref()
                .and_then(|id| site_names.get(id))
                .map_or("", String::as_str),
            visitor: v,
        }))
    }

    // ── Permissions ──────────────────────────────────────────────────

    pub async fn permissions(&self, site_id: &str) -> Result<Vec<SitePermission>, CoreError> {
        self.inner
            .client
            .list_permissions(&self.tenant_id(), site_id)
            .await?
            .into_iter()
            .map(SitePermission::try_from)
            .collect()
    }

    /// Create when `permission.id` is empty, update otherwise.
    pub async fn upsert_permission(
        &self,
        site_id: &str,
        permission: &SitePermission,
    ) -> Result<SitePermission, CoreError> {
        let dto = PermissionDto::from(permission);
        let tenant = self.tenant_id();
        let saved = if permission.id.is_empty() {
            self.inner
                .client
                .create_permission(&tenant, site_id, &dto)
                .await?
        } else {
            self.inner
                .client
                .update_permission(&tenant, site_id, &dto)
                .await
                .map_err(|e| not_found_as(e, "Permission", &permission.id))?
        };
        saved.try_into()
    }

    pub async fn delete_permission(&self, site_id: &str, permission_id: &str) -> Result<(), CoreError> {
        self.inner
            .client
            .delete_permission(&self.tenant_id(), site_id, permission_id)
            .await
            .map_err(|e| not_found_as(e, "Permission", permission_id))?;
        Ok(())
    }

    // ── Tenants (admin) ──────────────────────────────────────────────

    pub async fn tenants(&self) -> Result<Vec<Tenant>, CoreError> {
        let dtos = self.inner.client.list_tenants().await?;
        Ok(dtos.into_iter().map(Tenant::from).collect())
    }

    pub async fn tenant_by_shortname(&self, shortname: &str) -> Result<Tenant, CoreError> {
        let dto = self
            .inner
            .client
            .get_tenant(shortname)
            .await
            .map_err(|e| not_found_as(e, "Tenant", shortname))?;
        Ok(dto.into())
    }

    pub async fn create_tenant(&self, tenant: &Tenant) -> Result<Tenant, CoreError> {
        let created = self.inner.client.create_tenant(&TenantDto::from(tenant)).await?;
        info!(tenant = %created.name, "tenant created");
        Ok(created.into())
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

fn build_transport(config: &ClientConfig) -> TransportConfig {
    let tls = match &config.tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    };
    TransportConfig::default()
        .with_timeout(config.timeout)
        .with_tls(tls)
}

/// Tenant branding derived from a kiosk site's own colors.
fn site_branding(site: &SiteConfig) -> TenantBranding {
    TenantBranding {
        name: site.name.clone(),
        logo: Some(site.branding.logo.clone()).filter(|l| !l.is_empty()),
        primary_color: site.branding.primary_color.clone(),
        secondary_color: site.branding.secondary_color.clone(),
        ..TenantBranding::default()
    }
}

/// Name the entity when the backend answers 404.
fn not_found_as(err: onevisitor_api::Error, entity: &str, id: &str) -> CoreError {
    if err.is_not_found() {
        CoreError::not_found(entity, id)
    } else {
        err.into()
    }
}
