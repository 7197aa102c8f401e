// Visitor endpoints (`/sites/visitors/...`), including the kiosk check-in.

use crate::client::ApiClient;
use crate::error::Error;
use crate::types::{CheckInForm, VisitorDto};

impl ApiClient {
    /// List visitors for a tenant, optionally narrowed to one site.
    pub async fn list_visitors(
        &self,
        site_id: Option<&str>,
        tenant_id: &str,
    ) -> Result<Vec<VisitorDto>, Error> {
        let mut params = Vec::with_capacity(2);
        if let Some(site) = site_id {
            params.push(("site", site.to_owned()));
        }
        params.push(("tenantId", tenant_id.to_owned()));
        self.get_with_params("sites/visitors", &params).await
    }

    /// Submit a kiosk check-in as one multipart POST.
    pub async fn check_in(&self, form: &CheckInForm) -> Result<VisitorDto, Error> {
        self.post_multipart("sites/visitors/", form).await
    }

    pub async fn update_visitor(
        &self,
        visitor_id: &str,
        patch: &serde_json::Value,
    ) -> Result<VisitorDto, Error> {
        self.patch(&format!("sites/visitors/{visitor_id}/"), patch)
            .await
    }

    pub async fn delete_visitor(&self, visitor_id: &str) -> Result<(), Error> {
        self.delete(&format!("sites/visitors/{visitor_id}/")).await
    }
}
