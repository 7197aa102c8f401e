// ── Site (kiosk) domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How a site is addressed publicly. Only path-based URLs are issued today.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UrlType {
    #[default]
    Path,
    Subdomain,
}

/// Kiosk-level branding (distinct from tenant branding).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteBranding {
    pub logo: String,
    pub primary_color: String,
    pub secondary_color: String,
    pub favicon: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorType {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Field ids required for this type on top of each field's own flag.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_fields: Vec<String>,
}

/// Input kind of a configured form field.
///
/// Closed set; every consumer matches it exhaustively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Email,
    #[serde(alias = "tel")]
    Phone,
    Select {
        #[serde(default)]
        options: Vec<String>,
    },
    Checkbox,
    Date,
    Time,
    Textarea,
    Signature,
}

impl FieldKind {
    /// Parse the wire `type` discriminator. `options` only matters for selects.
    pub fn from_wire(field_type: &str, options: Option<Vec<String>>) -> Option<Self> {
        let kind = match field_type.to_ascii_lowercase().as_str() {
            "text" => Self::Text,
            "email" => Self::Email,
            "phone" | "tel" => Self::Phone,
            "select" => Self::Select {
                options: options.unwrap_or_default(),
            },
            "checkbox" => Self::Checkbox,
            "date" => Self::Date,
            "time" => Self::Time,
            "textarea" => Self::Textarea,
            "signature" => Self::Signature,
            _ => return None,
        };
        Some(kind)
    }

    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Select { .. } => "select",
            Self::Checkbox => "checkbox",
            Self::Date => "date",
            Self::Time => "time",
            Self::Textarea => "textarea",
            Self::Signature => "signature",
        }
    }

    /// Kinds whose value is a flag rather than text.
    pub fn is_flag(&self) -> bool {
        matches!(self, Self::Checkbox | Self::Signature)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub required: bool,
    /// Empty means visible for every visitor type.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub visitor_type_ids: Vec<String>,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FormField {
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            required: false,
            visitor_type_ids: Vec::new(),
            kind,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn for_types<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.visitor_type_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_host_picker(&self) -> bool {
        self.id == HOST_FIELD_ID
    }

    pub fn visible_for(&self, visitor_type: Option<&str>) -> bool {
        if self.visitor_type_ids.is_empty() {
            return true;
        }
        visitor_type.is_some_and(|t| self.visitor_type_ids.iter().any(|id| id == t))
    }
}

/// The field id that renders as a host picker.
pub const HOST_FIELD_ID: &str = "host";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Host {
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

impl Host {
    /// Hosts without an explicit `active` flag count as active.
    pub fn is_active(&self) -> bool {
        self.active.unwrap_or(true)
    }
}

/// Which proofs a check-in must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInPolicy {
    pub photo_required: bool,
    pub signature_required: bool,
}

impl Default for CheckInPolicy {
    fn default() -> Self {
        Self {
            photo_required: false,
            signature_required: true,
        }
    }
}

/// How long a visitor expects to stay.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum ExpectedDuration {
    #[serde(rename = "30min")]
    #[strum(serialize = "30min")]
    HalfHour,
    #[serde(rename = "1hour")]
    #[strum(serialize = "1hour")]
    OneHour,
    #[serde(rename = "2hours")]
    #[strum(serialize = "2hours")]
    TwoHours,
    #[serde(rename = "halfday")]
    #[strum(serialize = "halfday")]
    HalfDay,
    #[serde(rename = "fullday")]
    #[strum(serialize = "fullday")]
    FullDay,
}

impl ExpectedDuration {
    pub const ALL: [Self; 5] = [
        Self::HalfHour,
        Self::OneHour,
        Self::TwoHours,
        Self::HalfDay,
        Self::FullDay,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::HalfHour => "30 minutes",
            Self::OneHour => "1 hour",
            Self::TwoHours => "2 hours",
            Self::HalfDay => "Half day",
            Self::FullDay => "Full day",
        }
    }
}

/// A kiosk site and everything its check-in flow needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    /// Public path segment, e.g. `acme-hq-lobby`.
    pub url: String,
    pub url_type: UrlType,
    pub published: bool,
    pub branding: SiteBranding,
    pub welcome_message: String,
    pub language: String,
    pub last_published: Option<DateTime<Utc>>,
    pub visitor_types: Vec<VisitorType>,
    pub form_fields: Vec<FormField>,
    pub hosts: Vec<Host>,
    pub visitor_count: Option<u64>,
    pub check_in_policy: CheckInPolicy,
}

impl SiteConfig {
    /// An empty, unpublished site for `tenant_id`.
    pub fn new(
        tenant_id: impl Into<String>,
        name: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id: String::new(),
            tenant_id: tenant_id.into(),
            name: name.into(),
            url: url.into(),
            url_type: UrlType::Path,
            published: false,
            branding: SiteBranding::default(),
            welcome_message: String::new(),
            language: "en".into(),
            last_published: None,
            visitor_types: Vec::new(),
            form_fields: Vec::new(),
            hosts: Vec::new(),
            visitor_count: None,
            check_in_policy: CheckInPolicy::default(),
        }
    }

    pub fn has_host_field(&self) -> bool {
        self.form_fields.iter().any(FormField::is_host_picker)
    }

    pub fn visitor_type(&self, id: &str) -> Option<&VisitorType> {
        self.visitor_types.iter().find(|t| t.id == id)
    }

    pub fn host(&self, id: &str) -> Option<&Host> {
        self.hosts.iter().find(|h| h.id == id)
    }
}
