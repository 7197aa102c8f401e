// Tenant administration endpoints (`/admin/tenants/...`).

use crate::client::ApiClient;
use crate::error::Error;
use crate::types::TenantDto;

impl ApiClient {
    pub async fn list_tenants(&self) -> Result<Vec<TenantDto>, Error> {
        self.get("admin/tenants/").await
    }

    pub async fn get_tenant(&self, shortname: &str) -> Result<TenantDto, Error> {
        self.get(&format!("admin/tenants/{shortname}/")).await
    }

    pub async fn create_tenant(&self, tenant: &TenantDto) -> Result<TenantDto, Error> {
        self.post("admin/tenants/", tenant).await
    }
}
