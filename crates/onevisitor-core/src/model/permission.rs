// ── Site permission and user types ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Role a user holds at a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum PermissionRole {
    Admin,
    Staff,
    Receptionist,
    SecurityOfficer,
}

/// How much of the site's data the user can change.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum AccessLevel {
    #[default]
    Viewer,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitePermission {
    pub id: String,
    pub user_name: String,
    pub user_email: String,
    pub role: PermissionRole,
    pub level: AccessLevel,
}

/// The logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: u64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl UserProfile {
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.email.clone()
        } else {
            full.to_owned()
        }
    }
}
