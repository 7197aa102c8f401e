// Wire types for the OneVisitor REST backend.
//
// These mirror the JSON the backend sends and accepts. Enumerated values
// (field kinds, statuses, roles) stay as strings here; `onevisitor-core`
// converts them into closed domain enums.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Sites ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteBrandingDto {
    #[serde(default)]
    pub logo: String,
    #[serde(default)]
    pub primary_color: String,
    #[serde(default)]
    pub secondary_color: String,
    #[serde(default)]
    pub favicon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorTypeDto {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_fields: Option<Vec<String>>,
}

/// A configured form field. `field_type` is the raw `type` discriminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormFieldDto {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visitor_type_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostDto {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInPolicyDto {
    #[serde(default)]
    pub photo_required: bool,
    #[serde(default = "default_true")]
    pub signature_required: bool,
}

fn default_true() -> bool {
    true
}

fn default_url_type() -> String {
    "path".into()
}

/// Site (kiosk) configuration as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteDto {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub tenant_id: String,
    pub name: String,
    pub url: String,
    #[serde(default = "default_url_type")]
    pub url_type: String,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub branding: SiteBrandingDto,
    #[serde(default)]
    pub welcome_message: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub last_published: Option<String>,
    #[serde(default)]
    pub visitor_types: Vec<VisitorTypeDto>,
    #[serde(default)]
    pub form_fields: Vec<FormFieldDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosts: Option<Vec<HostDto>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visitor_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_in_policy: Option<CheckInPolicyDto>,
}

// ── Visitors ─────────────────────────────────────────────────────────

/// A visitor record. `status` is the raw status string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorDto {
    pub id: String,
    #[serde(default)]
    pub tenant_id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub host_id: Option<String>,
    #[serde(default)]
    pub host_name: String,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub expected_duration: Option<String>,
    #[serde(default)]
    pub check_in_time: String,
    #[serde(default)]
    pub check_out_time: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub badge_id: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub agreement_signed: bool,
    #[serde(default)]
    pub signature_url: Option<String>,
    #[serde(default)]
    pub custom_fields: Option<HashMap<String, String>>,
    #[serde(default)]
    pub door_access_granted: Option<bool>,
    #[serde(default)]
    pub last_door_access_time: Option<String>,
    #[serde(default)]
    pub visitor_type: Option<String>,
    #[serde(default)]
    pub site_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorInviteDto {
    pub id: String,
    pub tenant_id: String,
    #[serde(default)]
    pub visitor_id: Option<String>,
    pub visitor_name: String,
    pub visitor_email: String,
    #[serde(default)]
    pub visitor_company: Option<String>,
    pub host_id: String,
    pub host_name: String,
    #[serde(default)]
    pub purpose: Option<String>,
    pub invite_date: String,
    pub meeting_start: String,
    #[serde(default)]
    pub meeting_end: Option<String>,
    pub status: String,
    #[serde(default)]
    pub qr_code: Option<String>,
    #[serde(default)]
    pub invite_link: Option<String>,
    pub expiration_date: String,
    #[serde(default)]
    pub sent_notifications: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntryDto {
    pub id: String,
    pub tenant_id: String,
    pub timestamp: String,
    pub action: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub visitor_id: Option<String>,
    #[serde(default)]
    pub visitor_name: Option<String>,
    #[serde(default)]
    pub details: serde_json::Value,
    #[serde(default)]
    pub ip_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyEventDto {
    pub id: String,
    pub tenant_id: String,
    pub start_time: String,
    #[serde(default)]
    pub end_time: Option<String>,
    pub initiated_by: String,
    pub status: String,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub affected_visitor_count: u32,
    #[serde(default)]
    pub safe_visitor_count: u32,
    #[serde(default)]
    pub unknown_visitor_count: u32,
    #[serde(default)]
    pub notifications_sent: u32,
}

// ── Multipart check-in ───────────────────────────────────────────────

/// Photo attached to a check-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoPart {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Everything the kiosk sends in one multipart check-in POST.
///
/// `fields` become text parts in order, `photo` becomes the `photo` file
/// part, and `check_in` is sent as an RFC 3339 `checkIn` part.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckInForm {
    pub fields: Vec<(String, String)>,
    pub photo: Option<PhotoPart>,
    pub check_in: DateTime<Utc>,
}

impl CheckInForm {
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == name)
    }
}

// ── Permissions ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionDto {
    #[serde(default)]
    pub id: String,
    pub user_name: String,
    pub user_email: String,
    pub role: String,
    pub level: String,
}

// ── Tenants ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeTemplateDto {
    pub width: u32,
    pub height: u32,
    pub logo_position: String,
    pub show_photo: bool,
    #[serde(default)]
    pub fields: Vec<String>,
    pub expiration_hours: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantBrandingDto {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    pub primary_color: String,
    pub secondary_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge_template: Option<BadgeTemplateDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantDto {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    pub branding: TenantBrandingDto,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

// ── Users / auth (snake_case on the wire) ────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDto {
    pub id: u64,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub refresh_token: String,
    pub user: UserDto,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct RefreshResponse {
    pub token: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn site_defaults_fill_missing_fields() {
        let site: SiteDto = serde_json::from_value(json!({
            "name": "HQ Lobby",
            "url": "hq-lobby"
        }))
        .unwrap();

        assert_eq!(site.url_type, "path");
        assert!(site.form_fields.is_empty());
        assert!(site.hosts.is_none());
    }

    #[test]
    fn form_field_keeps_raw_type() {
        let field: FormFieldDto = serde_json::from_value(json!({
            "id": "host",
            "label": "Host",
            "type": "select",
            "required": true,
            "visitorTypeIds": ["contractor"]
        }))
        .unwrap();

        assert_eq!(field.field_type, "select");
        assert_eq!(field.visitor_type_ids, Some(vec!["contractor".to_string()]));
    }

    #[test]
    fn check_in_policy_defaults_to_signature_required() {
        let policy: CheckInPolicyDto = serde_json::from_value(json!({})).unwrap();
        assert!(!policy.photo_required);
        assert!(policy.signature_required);
    }
}
