// ── Tenant domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogoPosition {
    #[default]
    Top,
    Left,
    None,
}

/// Badge printing layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeTemplate {
    /// Millimetres.
    pub width: u32,
    /// Millimetres.
    pub height: u32,
    pub logo_position: LogoPosition,
    pub show_photo: bool,
    pub fields: Vec<String>,
    pub expiration_hours: u32,
}

/// Visual identity of a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantBranding {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    pub primary_color: String,
    pub secondary_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge_template: Option<BadgeTemplate>,
}

impl Default for TenantBranding {
    /// The OneVisitor house style.
    fn default() -> Self {
        Self {
            name: "OneVisitor".into(),
            logo: None,
            primary_color: "#3B82F6".into(),
            secondary_color: "#2563EB".into(),
            font: Some("Inter, sans-serif".into()),
            badge_template: None,
        }
    }
}

impl TenantBranding {
    /// Fill empty name/colors from the default so the record is always renderable.
    pub fn or_default_parts(mut self) -> Self {
        let fallback = Self::default();
        if self.name.trim().is_empty() {
            self.name = fallback.name;
        }
        if self.primary_color.trim().is_empty() {
            self.primary_color = fallback.primary_color;
        }
        if self.secondary_color.trim().is_empty() {
            self.secondary_color = fallback.secondary_color;
        }
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TenantStatus {
    Active,
    #[default]
    Pending,
    Suspended,
}

/// An organization on the platform (admin area).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: String,
    pub name: String,
    pub domain: String,
    pub shortname: Option<String>,
    pub logo: Option<String>,
    pub branding: TenantBranding,
    pub status: TenantStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}
