// Per-site permission endpoints (`/tenants/:tenant/sites/:site/permissions`).

use crate::client::ApiClient;
use crate::error::Error;
use crate::types::PermissionDto;

fn permissions_path(tenant_id: &str, site_id: &str) -> String {
    format!("tenants/{tenant_id}/sites/{site_id}/permissions")
}

impl ApiClient {
    pub async fn list_permissions(
        &self,
        tenant_id: &str,
        site_id: &str,
    ) -> Result<Vec<PermissionDto>, Error> {
        self.get(&permissions_path(tenant_id, site_id)).await
    }

    pub async fn create_permission(
        &self,
        tenant_id: &str,
        site_id: &str,
        permission: &PermissionDto,
    ) -> Result<PermissionDto, Error> {
        self.post(&permissions_path(tenant_id, site_id), permission)
            .await
    }

    pub async fn update_permission(
        &self,
        tenant_id: &str,
        site_id: &str,
        permission: &PermissionDto,
    ) -> Result<PermissionDto, Error> {
        let path = format!(
            "{}/{}",
            permissions_path(tenant_id, site_id),
            permission.id
        );
        self.put(&path, permission).await
    }

    pub async fn delete_permission(
        &self,
        tenant_id: &str,
        site_id: &str,
        permission_id: &str,
    ) -> Result<(), Error> {
        let path = format!("{}/{permission_id}", permissions_path(tenant_id, site_id));
        self.delete(&path).await
    }
}
