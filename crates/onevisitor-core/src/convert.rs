// ── API-to-domain type conversions ──
//
// Bridges raw `onevisitor_api` wire types into `onevisitor_core::model`
// domain types and back. String discriminators become closed enums here;
// unknown values degrade to a default (an unknown form-field type renders
// as text).

use std::future::Future;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::warn;

use onevisitor_api::ApiClient;
use onevisitor_api::types::{
    BadgeTemplateDto, CheckInPolicyDto, FormFieldDto, HostDto, PermissionDto, SiteBrandingDto,
    SiteDto, TenantBrandingDto, TenantDto, UserDto, VisitorDto, VisitorTypeDto,
};
use onevisitor_api::{CheckInForm, PhotoPart};

use crate::error::CoreError;
use crate::model::{
    BadgeTemplate, CheckInPolicy, FieldKind, FormField, Host, SiteBranding, SiteConfig,
    SitePermission, Tenant, TenantBranding, TenantStatus, UrlType, UserProfile, Visitor,
    VisitorStatus, VisitorType,
};
use crate::wizard::{CheckInSubmission, CheckInSubmitter, PhotoUpload};

// ── Helpers ────────────────────────────────────────────────────────

/// Parse an RFC 3339 timestamp, dropping blanks and garbage.
fn parse_datetime(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.filter(|s| !s.trim().is_empty())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn format_datetime(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

fn non_empty(v: Option<Vec<String>>) -> Option<Vec<String>> {
    v.filter(|v| !v.is_empty())
}

// ── Sites ──────────────────────────────────────────────────────────

impl From<SiteBrandingDto> for SiteBranding {
    fn from(b: SiteBrandingDto) -> Self {
        Self {
            logo: b.logo,
            primary_color: b.primary_color,
            secondary_color: b.secondary_color,
            favicon: b.favicon,
        }
    }
}

impl From<&SiteBranding> for SiteBrandingDto {
    fn from(b: &SiteBranding) -> Self {
        Self {
            logo: b.logo.clone(),
            primary_color: b.primary_color.clone(),
            secondary_color: b.secondary_color.clone(),
            favicon: b.favicon.clone(),
        }
    }
}

impl From<VisitorTypeDto> for VisitorType {
    fn from(t: VisitorTypeDto) -> Self {
        Self {
            id: t.id,
            name: t.name,
            icon: t.icon,
            required_fields: t.required_fields.unwrap_or_default(),
        }
    }
}

impl From<&VisitorType> for VisitorTypeDto {
    fn from(t: &VisitorType) -> Self {
        Self {
            id: t.id.clone(),
            name: t.name.clone(),
            icon: t.icon.clone(),
            required_fields: non_empty(Some(t.required_fields.clone())),
        }
    }
}

impl From<FormFieldDto> for FormField {
    /// Unknown wire types render as plain text inputs.
    fn from(f: FormFieldDto) -> Self {
        let kind = FieldKind::from_wire(&f.field_type, f.options).unwrap_or_else(|| {
            warn!(field = %f.id, field_type = %f.field_type, "unknown field type, rendering as text");
            FieldKind::Text
        });
        Self {
            id: f.id,
            label: f.label,
            required: f.required,
            visitor_type_ids: f.visitor_type_ids.unwrap_or_default(),
            kind,
        }
    }
}

impl From<&FormField> for FormFieldDto {
    fn from(f: &FormField) -> Self {
        let options = match &f.kind {
            FieldKind::Select { options } => Some(options.clone()),
            FieldKind::Text
            | FieldKind::Email
            | FieldKind::Phone
            | FieldKind::Checkbox
            | FieldKind::Date
            | FieldKind::Time
            | FieldKind::Textarea
            | FieldKind::Signature => None,
        };
        Self {
            id: f.id.clone(),
            label: f.label.clone(),
            field_type: f.kind.wire_name().to_owned(),
            required: f.required,
            options,
            visitor_type_ids: non_empty(Some(f.visitor_type_ids.clone())),
        }
    }
}

impl From<HostDto> for Host {
    fn from(h: HostDto) -> Self {
        Self {
            id: h.id,
            name: h.name,
            email: h.email,
            phone: h.phone.filter(|s| !s.is_empty()),
            department: h.department.filter(|s| !s.is_empty()),
            active: h.active,
        }
    }
}

impl From<&Host> for HostDto {
    fn from(h: &Host) -> Self {
        Self {
            id: h.id.clone(),
            name: h.name.clone(),
            email: h.email.clone(),
            phone: h.phone.clone(),
            department: h.department.clone(),
            active: h.active,
        }
    }
}

impl From<CheckInPolicyDto> for CheckInPolicy {
    fn from(p: CheckInPolicyDto) -> Self {
        Self {
            photo_required: p.photo_required,
            signature_required: p.signature_required,
        }
    }
}

impl From<SiteDto> for SiteConfig {
    fn from(s: SiteDto) -> Self {
        Self {
            id: s.id,
            tenant_id: s.tenant_id,
            name: s.name,
            url: s.url,
            url_type: s.url_type.parse().unwrap_or_default(),
            published: s.published,
            branding: s.branding.into(),
            welcome_message: s.welcome_message,
            language: if s.language.is_empty() {
                "en".into()
            } else {
                s.language
            },
            last_published: parse_datetime(s.last_published.as_deref()),
            visitor_types: s.visitor_types.into_iter().map(Into::into).collect(),
            form_fields: s.form_fields.into_iter().map(Into::into).collect(),
            hosts: s
                .hosts
                .unwrap_or_default()
                .into_iter()
                .map(Into::into)
                .collect(),
            visitor_count: s.visitor_count,
            check_in_policy: s.check_in_policy.map(Into::into).unwrap_or_default(),
        }
    }
}

impl From<&SiteConfig> for SiteDto {
    fn from(s: &SiteConfig) -> Self {
        Self {
            id: s.id.clone(),
            tenant_id: s.tenant_id.clone(),
            name: s.name.clone(),
            url: s.url.clone(),
            url_type: match s.url_type {
                UrlType::Path => "path".into(),
                UrlType::Subdomain => "subdomain".into(),
            },
            published: s.published,
            branding: (&s.branding).into(),
            welcome_message: s.welcome_message.clone(),
            language: s.language.clone(),
            last_published: s.last_published.map(|t| format_datetime(Some(t))),
            visitor_types: s.visitor_types.iter().map(Into::into).collect(),
            form_fields: s.form_fields.iter().map(Into::into).collect(),
            hosts: Some(s.hosts.iter().map(Into::into).collect()),
            visitor_count: s.visitor_count,
            check_in_policy: Some(CheckInPolicyDto {
                photo_required: s.check_in_policy.photo_required,
                signature_required: s.check_in_policy.signature_required,
            }),
        }
    }
}

// ── Visitors ───────────────────────────────────────────────────────

impl From<VisitorDto> for Visitor {
    fn from(v: VisitorDto) -> Self {
        let status = v.status.parse().unwrap_or(VisitorStatus::Unknown);
        Self {
            check_in_time: parse_datetime(Some(&v.check_in_time)),
            check_out_time: parse_datetime(v.check_out_time.as_deref()),
            last_door_access_time: parse_datetime(v.last_door_access_time.as_deref()),
            custom_fields: v.custom_fields.unwrap_or_default().into_iter().collect(),
            id: v.id,
            tenant_id: v.tenant_id,
            name: v.name,
            email: v.email,
            company: v.company,
            phone: v.phone,
            host_id: v.host_id,
            host_name: v.host_name,
            purpose: v.purpose,
            expected_duration: v.expected_duration,
            photo_url: v.photo_url,
            badge_id: v.badge_id,
            status,
            location: v.location,
            agreement_signed: v.agreement_signed,
            signature_url: v.signature_url,
            door_access_granted: v.door_access_granted,
            visitor_type: v.visitor_type,
            site_id: v.site_id,
        }
    }
}

// ── Check-in submission ────────────────────────────────────────────

impl From<PhotoUpload> for PhotoPart {
    fn from(p: PhotoUpload) -> Self {
        Self {
            file_name: p.file_name,
            content_type: p.content_type,
            bytes: p.bytes,
        }
    }
}

impl From<&CheckInSubmission> for CheckInForm {
    fn from(s: &CheckInSubmission) -> Self {
        Self {
            fields: s.fields.clone(),
            photo: s.photo.clone().map(Into::into),
            check_in: s.check_in,
        }
    }
}

impl CheckInSubmitter for ApiClient {
    fn submit_check_in(
        &self,
        submission: &CheckInSubmission,
    ) -> impl Future<Output = Result<Visitor, CoreError>> + Send {
        let form = CheckInForm::from(submission);
        async move {
            let dto = self.check_in(&form).await?;
            Ok(Visitor::from(dto))
        }
    }
}

// ── Permissions ────────────────────────────────────────────────────

impl TryFrom<PermissionDto> for SitePermission {
    type Error = CoreError;

    fn try_from(p: PermissionDto) -> Result<Self, Self::Error> {
        let role = p.role.parse().map_err(|_| CoreError::ValidationFailed {
            message: format!("unknown permission role '{}'", p.role),
        })?;
        Ok(Self {
            id: p.id,
            user_name: p.user_name,
            user_email: p.user_email,
            role,
            level: p.level.parse().unwrap_or_default(),
        })
    }
}

impl From<&SitePermission> for PermissionDto {
    fn from(p: &SitePermission) -> Self {
        Self {
            id: p.id.clone(),
            user_name: p.user_name.clone(),
            user_email: p.user_email.clone(),
            role: p.role.to_string(),
            level: p.level.to_string(),
        }
    }
}

// ── Tenants ────────────────────────────────────────────────────────

impl From<BadgeTemplateDto> for BadgeTemplate {
    fn from(b: BadgeTemplateDto) -> Self {
        Self {
            width: b.width,
            height: b.height,
            logo_position: b.logo_position.parse().unwrap_or_default(),
            show_photo: b.show_photo,
            fields: b.fields,
            expiration_hours: b.expiration_hours,
        }
    }
}

impl From<&BadgeTemplate> for BadgeTemplateDto {
    fn from(b: &BadgeTemplate) -> Self {
        Self {
            width: b.width,
            height: b.height,
            logo_position: b.logo_position.to_string(),
            show_photo: b.show_photo,
            fields: b.fields.clone(),
            expiration_hours: b.expiration_hours,
        }
    }
}

impl From<TenantBrandingDto> for TenantBranding {
    fn from(b: TenantBrandingDto) -> Self {
        Self {
            name: b.name,
            logo: b.logo,
            primary_color: b.primary_color,
            secondary_color: b.secondary_color,
            font: b.font,
            badge_template: b.badge_template.map(Into::into),
        }
        .or_default_parts()
    }
}

impl From<&TenantBranding> for TenantBrandingDto {
    fn from(b: &TenantBranding) -> Self {
        Self {
            name: b.name.clone(),
            logo: b.logo.clone(),
            primary_color: b.primary_color.clone(),
            secondary_color: b.secondary_color.clone(),
            font: b.font.clone(),
            badge_template: b.badge_template.as_ref().map(Into::into),
        }
    }
}

impl From<TenantDto> for Tenant {
    fn from(t: TenantDto) -> Self {
        Self {
            created_at: parse_datetime(Some(&t.created_at)),
            updated_at: parse_datetime(Some(&t.updated_at)),
            status: t.status.parse().unwrap_or(TenantStatus::Pending),
            id: t.id,
            name: t.name,
            domain: t.domain,
            shortname: t.shortname,
            logo: t.logo,
            branding: t.branding.into(),
        }
    }
}

impl From<&Tenant> for TenantDto {
    fn from(t: &Tenant) -> Self {
        Self {
            id: t.id.clone(),
            name: t.name.clone(),
            domain: t.domain.clone(),
            shortname: t.shortname.clone(),
            logo: t.logo.clone(),
            branding: (&t.branding).into(),
            status: t.status.to_string(),
            created_at: format_datetime(t.created_at),
            updated_at: format_datetime(t.updated_at),
        }
    }
}

// ── Users ──────────────────────────────────────────────────────────

impl From<UserDto> for UserProfile {
    fn from(u: UserDto) -> Self {
        Self {
            id: u.id,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::model::{AccessLevel, PermissionRole};

    fn site_json() -> serde_json::Value {
        json!({
            "id": "s1",
            "tenantId": "acme",
            "name": "HQ Lobby",
            "url": "acme-hq-lobby",
            "published": true,
            "lastPublished": "2024-05-10T09:30:00Z",
            "visitorTypes": [
                { "id": "visitor", "name": "Visitor" },
                { "id": "contractor", "name": "Contractor", "requiredFields": ["company"] }
            ],
            "formFields": [
                { "id": "name", "label": "Full Name", "type": "text", "required": true },
                { "id": "phone", "label": "Phone", "type": "tel" },
                { "id": "host", "label": "Host", "type": "select", "visitorTypeIds": ["contractor"] }
            ],
            "hosts": [
                { "id": "h1", "name": "Grace Hopper", "email": "grace@acme.test", "phone": "" }
            ]
        })
    }

    #[test]
    fn site_converts_with_closed_field_kinds() {
        let dto: SiteDto = serde_json::from_value(site_json()).unwrap();
        let site = SiteConfig::from(dto);

        assert_eq!(site.url_type, UrlType::Path);
        assert_eq!(site.language, "en");
        assert_eq!(
            site.last_published,
            Some(Utc.with_ymd_and_hms(2024, 5, 10, 9, 30, 0).unwrap())
        );
        assert_eq!(site.form_fields[1].kind, FieldKind::Phone);
        assert_eq!(site.form_fields[2].visitor_type_ids, vec!["contractor"]);
        assert_eq!(site.visitor_types[1].required_fields, vec!["company"]);
        assert_eq!(site.hosts[0].phone, None);
        assert!(site.check_in_policy.signature_required);
        assert!(site.has_host_field());
    }

    #[test]
    fn unknown_field_type_renders_as_text() {
        let mut raw = site_json();
        raw["formFields"][1]["type"] = json!("slider");
        let dto: SiteDto = serde_json::from_value(raw).unwrap();

        let site = SiteConfig::from(dto);
        assert_eq!(site.form_fields.len(), 3);
        assert_eq!(site.form_fields[1].id, "phone");
        assert_eq!(site.form_fields[1].kind, FieldKind::Text);
        assert_eq!(site.form_fields[0].kind, FieldKind::Text);
        assert!(site.has_host_field());
    }

    #[test]
    fn site_survives_a_trip_to_the_wire() {
        let dto: SiteDto = serde_json::from_value(site_json()).unwrap();
        let site = SiteConfig::from(dto);
        let back = SiteConfig::from(SiteDto::from(&site));
        assert_eq!(back, site);
    }

    #[test]
    fn visitor_status_and_times() {
        let dto: VisitorDto = serde_json::from_value(json!({
            "id": "v1",
            "name": "Ada",
            "status": "active",
            "checkInTime": "2024-05-10T09:30:00.000Z",
            "checkOutTime": "",
            "customFields": { "badge": "B-7" }
        }))
        .unwrap();
        let v = Visitor::from(dto);
        assert_eq!(v.status, VisitorStatus::CheckedIn);
        assert!(v.check_in_time.is_some());
        assert_eq!(v.check_out_time, None);
        assert_eq!(v.custom_fields.get("badge").map(String::as_str), Some("B-7"));

        let dto: VisitorDto =
            serde_json::from_value(json!({ "id": "v2", "name": "Bo", "status": "teleported" }))
                .unwrap();
        assert_eq!(Visitor::from(dto).status, VisitorStatus::Unknown);
    }

    #[test]
    fn permission_roles_are_closed() {
        let dto = PermissionDto {
            id: "p1".into(),
            user_name: "Ops".into(),
            user_email: "ops@acme.test".into(),
            role: "Receptionist".into(),
            level: "Admin".into(),
        };
        let p = SitePermission::try_from(dto.clone()).unwrap();
        assert_eq!(p.role, PermissionRole::Receptionist);
        assert_eq!(p.level, AccessLevel::Admin);
        assert_eq!(PermissionDto::from(&p), dto);

        let bad = PermissionDto {
            role: "Janitor".into(),
            ..dto
        };
        assert!(SitePermission::try_from(bad).is_err());
    }

    #[test]
    fn tenant_branding_is_never_blank() {
        let dto: TenantDto = serde_json::from_value(json!({
            "id": "t1",
            "name": "Globex",
            "domain": "globex.test",
            "status": "suspended",
            "branding": { "name": "", "primaryColor": "", "secondaryColor": "#111111" }
        }))
        .unwrap();
        let t = Tenant::from(dto);
        assert_eq!(t.status, TenantStatus::Suspended);
        assert_eq!(t.branding.name, "OneVisitor");
        assert_eq!(t.branding.primary_color, "#3B82F6");
        assert_eq!(t.branding.secondary_color, "#111111");
        assert_eq!(t.created_at, None);
    }

    #[test]
    fn submission_becomes_multipart_form() {
        let submission = CheckInSubmission {
            site_id: "s1".into(),
            fields: vec![("name".into(), "Ada".into())],
            photo: Some(PhotoUpload {
                file_name: "me.png".into(),
                content_type: "image/png".into(),
                bytes: vec![1, 2],
            }),
            check_in: Utc.with_ymd_and_hms(2024, 5, 10, 9, 30, 0).unwrap(),
        };
        let form = CheckInForm::from(&submission);
        assert!(form.has_field("name"));
        assert_eq!(form.photo.unwrap().file_name, "me.png");
    }
}
