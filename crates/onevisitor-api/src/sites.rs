// Site configuration endpoints (`/sites/site/...`).

use serde_json::json;

use crate::client::ApiClient;
use crate::error::Error;
use crate::types::SiteDto;

impl ApiClient {
    pub async fn list_sites(&self, tenant_id: &str) -> Result<Vec<SiteDto>, Error> {
        self.get_with_params("sites/site", &[("tenantId", tenant_id.to_owned())])
            .await
    }

    /// Look a site up by its public path (the kiosk URL segment).
    pub async fn site_by_url(&self, url: &str) -> Result<SiteDto, Error> {
        self.get_with_params("sites/site/search_by_url/", &[("url", url.to_owned())])
            .await
    }

    pub async fn get_site(&self, site_id: &str) -> Result<SiteDto, Error> {
        self.get(&format!("sites/site/{site_id}/")).await
    }

    pub async fn create_site(&self, site: &SiteDto) -> Result<SiteDto, Error> {
        self.post("sites/site/", site).await
    }

    /// Partial update; `patch` holds only the changed keys.
    pub async fn update_site(
        &self,
        site_id: &str,
        patch: &serde_json::Value,
    ) -> Result<SiteDto, Error> {
        self.patch(&format!("sites/site/{site_id}/"), patch).await
    }

    pub async fn set_site_published(
        &self,
        site_id: &str,
        published: bool,
    ) -> Result<SiteDto, Error> {
        self.update_site(site_id, &json!({ "published": published }))
            .await
    }
}
