// ── Kiosk check-in wizard ──
//
// Linear flow VisitorTypeSelect(1) -> Details(2) -> Photo(3) -> Review(4)
// -> Complete(5) over one mutable `VisitorFormData`. Forward moves are
// gated by per-step validation that reports every unmet requirement;
// backward moves never validate and never touch the form data.

use std::fmt;
use std::future::Future;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::model::{ExpectedDuration, FieldKind, FormField, Host, SiteConfig, Visitor};
use crate::text::is_valid_email;

pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;
pub const ACCEPTED_PHOTO_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/webp", "image/gif"];

/// Field ids backed by fixed slots in [`VisitorFormData`].
const FIXED_TEXT_FIELDS: [&str; 6] = ["name", "company", "email", "phone", "host", "purpose"];
const EXPECTED_DURATION_FIELD: &str = "expectedDuration";

// ── Steps ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    VisitorTypeSelect,
    Details,
    Photo,
    Review,
    Complete,
}

impl Step {
    pub const ALL: [Self; 5] = [
        Self::VisitorTypeSelect,
        Self::Details,
        Self::Photo,
        Self::Review,
        Self::Complete,
    ];

    /// 1-based position in the flow.
    pub fn number(self) -> u8 {
        match self {
            Self::VisitorTypeSelect => 1,
            Self::Details => 2,
            Self::Photo => 3,
            Self::Review => 4,
            Self::Complete => 5,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.number() == n)
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::VisitorTypeSelect => "Visitor type",
            Self::Details => "Details",
            Self::Photo => "Photo",
            Self::Review => "Review",
            Self::Complete => "Complete",
        }
    }

    fn following(self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    fn preceding(self) -> Option<Self> {
        self.number().checked_sub(1).and_then(Self::from_number)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {} ({})", self.number(), self.title())
    }
}

// ── Requirements & errors ────────────────────────────────────────────

/// One unmet condition on a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    MissingField { id: String, label: String },
    InvalidEmail,
    VisitorTypeNotSelected,
    UnknownHost { id: String },
    PhotoRequired,
    SignatureRequired,
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField { label, .. } => write!(f, "{label} is required"),
            Self::InvalidEmail => f.write_str("a valid email address is required"),
            Self::VisitorTypeNotSelected => f.write_str("choose a visitor type"),
            Self::UnknownHost { id } => write!(f, "host '{id}' is not available at this site"),
            Self::PhotoRequired => f.write_str("a photo is required"),
            Self::SignatureRequired => f.write_str("the visitor agreement must be signed"),
        }
    }
}

fn join_requirements(missing: &[Requirement]) -> String {
    missing
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A step failed validation; `missing` lists every failed requirement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{step} is incomplete: {}", join_requirements(.missing))]
pub struct StepIncomplete {
    pub step: Step,
    pub missing: Vec<Requirement>,
}

#[derive(Debug, Error)]
pub enum WizardError {
    #[error(transparent)]
    Incomplete(#[from] StepIncomplete),

    #[error("Review is the last step; submit the check-in instead")]
    SubmitRequired,

    #[error("Check-in is already complete")]
    AlreadyComplete,

    #[error("Check-in can only be submitted from review (currently on {step})")]
    NotOnReview { step: Step },

    #[error("Cannot jump from {from} to {to}")]
    CannotGoTo { from: Step, to: Step },

    #[error("Unknown visitor type: {0}")]
    UnknownVisitorType(String),

    #[error("Unknown form field: {0}")]
    UnknownField(String),

    #[error("Field '{field}' takes a yes/no value")]
    ExpectsFlag { field: String },

    #[error("Field '{field}' takes a text value")]
    ExpectsText { field: String },

    #[error("'{value}' is not an option for field '{field}'")]
    NotAnOption { field: String, value: String },

    #[error("Unknown expected duration: {0}")]
    InvalidDuration(String),

    #[error("Invalid photo: {reason}")]
    InvalidPhoto { reason: String },
}

// ── Form data ────────────────────────────────────────────────────────

/// Value of a site-specific field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
}

impl FieldValue {
    pub fn is_filled(&self) -> bool {
        match self {
            Self::Text(s) => !s.trim().is_empty(),
            Self::Flag(b) => *b,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Flag(true) => f.write_str("Yes"),
            Self::Flag(false) => f.write_str("No"),
        }
    }
}

/// An image attached at the photo step.
#[derive(Clone, PartialEq, Eq)]
pub struct PhotoUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for PhotoUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhotoUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl PhotoUpload {
    /// MIME type for an image file name, by extension.
    pub fn content_type_for(file_name: &str) -> Option<&'static str> {
        let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some("image/jpeg"),
            "png" => Some("image/png"),
            "webp" => Some("image/webp"),
            "gif" => Some("image/gif"),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), WizardError> {
        if !ACCEPTED_PHOTO_TYPES.contains(&self.content_type.as_str()) {
            return Err(WizardError::InvalidPhoto {
                reason: format!("unsupported type {}", self.content_type),
            });
        }
        if self.bytes.is_empty() {
            return Err(WizardError::InvalidPhoto {
                reason: "file is empty".into(),
            });
        }
        if self.bytes.len() > MAX_PHOTO_BYTES {
            return Err(WizardError::InvalidPhoto {
                reason: format!("{} bytes exceeds the 5 MiB limit", self.bytes.len()),
            });
        }
        Ok(())
    }
}

/// The visitor's answers, mutated in place as the wizard runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitorFormData {
    pub name: String,
    pub company: String,
    pub email: String,
    pub phone: String,
    /// Host id.
    pub host: String,
    pub purpose: String,
    pub expected_duration: Option<ExpectedDuration>,
    pub signature: bool,
    pub photo: Option<PhotoUpload>,
    pub visitor_type: Option<String>,
    /// Site-specific fields, in the order they were first set.
    pub custom: IndexMap<String, FieldValue>,
}

impl VisitorFormData {
    fn fixed_slot(&mut self, id: &str) -> Option<&mut String> {
        match id {
            "name" => Some(&mut self.name),
            "company" => Some(&mut self.company),
            "email" => Some(&mut self.email),
            "phone" => Some(&mut self.phone),
            "host" => Some(&mut self.host),
            "purpose" => Some(&mut self.purpose),
            _ => None,
        }
    }

    /// Current value of `id` for display, whether fixed or custom.
    pub fn value(&self, id: &str) -> Option<FieldValue> {
        let fixed = match id {
            "name" => Some(&self.name),
            "company" => Some(&self.company),
            "email" => Some(&self.email),
            "phone" => Some(&self.phone),
            "host" => Some(&self.host),
            "purpose" => Some(&self.purpose),
            EXPECTED_DURATION_FIELD => {
                return self
                    .expected_duration
                    .map(|d| FieldValue::Text(d.to_string()));
            }
            _ => None,
        };
        match fixed {
            Some(s) if s.trim().is_empty() => None,
            Some(s) => Some(FieldValue::Text(s.clone())),
            None => self.custom.get(id).cloned(),
        }
    }

    fn is_filled(&self, id: &str) -> bool {
        self.value(id).is_some_and(|v| v.is_filled())
    }
}

// ── Rendering plan ───────────────────────────────────────────────────

/// How a visible field should be presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldWidget<'a> {
    /// Pick one of the site's active hosts.
    HostPicker { hosts: Vec<&'a Host> },
    Input(&'a FieldKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPlan<'a> {
    pub field: &'a FormField,
    pub required: bool,
    pub widget: FieldWidget<'a>,
}

// ── Submission ───────────────────────────────────────────────────────

/// One check-in, ready to send.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckInSubmission {
    pub site_id: String,
    /// Text parts in send order.
    pub fields: Vec<(String, String)>,
    pub photo: Option<PhotoUpload>,
    pub check_in: DateTime<Utc>,
}

/// Sends a finished check-in somewhere and returns the created visitor.
pub trait CheckInSubmitter: Send + Sync {
    fn submit_check_in(
        &self,
        submission: &CheckInSubmission,
    ) -> impl Future<Output = Result<Visitor, CoreError>> + Send;
}

// ── Wizard ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct CheckInWizard {
    site: SiteConfig,
    step: Step,
    data: VisitorFormData,
    visitor: Option<Visitor>,
}

impl CheckInWizard {
    /// Fresh wizard for `site`. A single visitor type is preselected and
    /// the flow starts on the details step.
    pub fn new(site: SiteConfig) -> Self {
        let mut data = VisitorFormData::default();
        let step = match site.visitor_types.as_slice() {
            [only] => {
                data.visitor_type = Some(only.id.clone());
                Step::Details
            }
            _ => Step::VisitorTypeSelect,
        };
        debug!(site = %site.url, %step, "check-in started");
        Self {
            site,
            step,
            data,
            visitor: None,
        }
    }

    /// Start over on the same site.
    pub fn reset(&mut self) {
        let site = std::mem::replace(&mut self.site, SiteConfig::new("", "", ""));
        *self = Self::new(site);
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn data(&self) -> &VisitorFormData {
        &self.data
    }

    /// The visitor created by a successful submit.
    pub fn visitor(&self) -> Option<&Visitor> {
        self.visitor.as_ref()
    }

    /// Display name of the selected host, if any.
    pub fn host_name(&self) -> Option<&str> {
        self.site.host(&self.data.host).map(|h| h.name.as_str())
    }

    // ── Editing ──────────────────────────────────────────────────────

    fn ensure_editable(&self) -> Result<(), WizardError> {
        if self.step == Step::Complete {
            Err(WizardError::AlreadyComplete)
        } else {
            Ok(())
        }
    }

    pub fn select_visitor_type(&mut self, id: &str) -> Result<(), WizardError> {
        self.ensure_editable()?;
        if self.site.visitor_type(id).is_none() {
            return Err(WizardError::UnknownVisitorType(id.to_owned()));
        }
        self.data.visitor_type = Some(id.to_owned());
        Ok(())
    }

    fn configured_field(&self, id: &str) -> Option<&FormField> {
        self.site.form_fields.iter().find(|f| f.id == id)
    }

    /// Set a text value. Fixed ids (`name`, `email`, `host`, ...) fill their
    /// slots; other ids must be configured, non-flag fields of the site.
    pub fn set_text(&mut self, id: &str, value: &str) -> Result<(), WizardError> {
        self.ensure_editable()?;

        if id == EXPECTED_DURATION_FIELD {
            let value = value.trim();
            self.data.expected_duration = if value.is_empty() {
                None
            } else {
                Some(
                    value
                        .parse()
                        .map_err(|_| WizardError::InvalidDuration(value.to_owned()))?,
                )
            };
            return Ok(());
        }

        if let Some(field) = self.configured_field(id) {
            match &field.kind {
                FieldKind::Checkbox | FieldKind::Signature => {
                    return Err(WizardError::ExpectsFlag { field: id.to_owned() });
                }
                // The host picker takes host ids, not the field's option labels.
                FieldKind::Select { .. } if field.is_host_picker() => {}
                FieldKind::Select { options } => {
                    if !options.is_empty() && !value.is_empty() && !options.iter().any(|o| o == value) {
                        return Err(WizardError::NotAnOption {
                            field: id.to_owned(),
                            value: value.to_owned(),
                        });
                    }
                }
                FieldKind::Text
                | FieldKind::Email
                | FieldKind::Phone
                | FieldKind::Date
                | FieldKind::Time
                | FieldKind::Textarea => {}
            }
        } else if !FIXED_TEXT_FIELDS.contains(&id) {
            return Err(WizardError::UnknownField(id.to_owned()));
        }

        match self.data.fixed_slot(id) {
            Some(slot) => value.clone_into(slot),
            None => {
                self.data
                    .custom
                    .insert(id.to_owned(), FieldValue::Text(value.to_owned()));
            }
        }
        Ok(())
    }

    /// Set a checkbox or signature field.
    pub fn set_flag(&mut self, id: &str, value: bool) -> Result<(), WizardError> {
        self.ensure_editable()?;
        let field = self
            .configured_field(id)
            .ok_or_else(|| WizardError::UnknownField(id.to_owned()))?;
        if !field.kind.is_flag() || FIXED_TEXT_FIELDS.contains(&id) {
            return Err(WizardError::ExpectsText { field: id.to_owned() });
        }
        self.data.custom.insert(id.to_owned(), FieldValue::Flag(value));
        Ok(())
    }

    pub fn set_expected_duration(&mut self, duration: Option<ExpectedDuration>) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.data.expected_duration = duration;
        Ok(())
    }

    pub fn attach_photo(&mut self, photo: PhotoUpload) -> Result<(), WizardError> {
        self.ensure_editable()?;
        photo.validate()?;
        self.data.photo = Some(photo);
        Ok(())
    }

    pub fn clear_photo(&mut self) {
        self.data.photo = None;
    }

    /// The review-step agreement checkbox.
    pub fn acknowledge_signature(&mut self, signed: bool) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.data.signature = signed;
        Ok(())
    }

    // ── Field visibility ─────────────────────────────────────────────

    /// Site fields shown for the selected visitor type, in site order.
    pub fn visible_fields(&self) -> Vec<&FormField> {
        let selected = self.data.visitor_type.as_deref();
        self.site
            .form_fields
            .iter()
            .filter(|f| f.visible_for(selected))
            .collect()
    }

    fn type_required(&self) -> &[String] {
        self.data
            .visitor_type
            .as_deref()
            .and_then(|id| self.site.visitor_type(id))
            .map_or(&[], |t| t.required_fields.as_slice())
    }

    fn is_required(&self, field: &FormField) -> bool {
        field.required
            || field.id == "name"
            || field.id == "email"
            || self.type_required().iter().any(|id| *id == field.id)
    }

    pub fn render_plan(&self) -> Vec<FieldPlan<'_>> {
        self.visible_fields()
            .into_iter()
            .map(|field| {
                let widget = if field.is_host_picker() {
                    FieldWidget::HostPicker {
                        hosts: self.site.hosts.iter().filter(|h| h.is_active()).collect(),
                    }
                } else {
                    FieldWidget::Input(&field.kind)
                };
                FieldPlan {
                    field,
                    required: self.is_required(field),
                    widget,
                }
            })
            .collect()
    }

    /// Active hosts whose name, email, or department contains `query`.
    pub fn search_hosts(&self, query: &str) -> Vec<&Host> {
        let needle = query.trim().to_lowercase();
        self.site
            .hosts
            .iter()
            .filter(|h| h.is_active())
            .filter(|h| {
                needle.is_empty()
                    || h.name.to_lowercase().contains(&needle)
                    || h.email.to_lowercase().contains(&needle)
                    || h.department
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
            })
            .collect()
    }

    // ── Validation ───────────────────────────────────────────────────

    fn details_requirements(&self) -> Vec<Requirement> {
        let mut missing = Vec::new();
        let visible = self.visible_fields();

        // Name and email are always collected, configured or not.
        for (id, label) in [("name", "Full Name"), ("email", "Email")] {
            if !visible.iter().any(|f| f.id == id) && !self.data.is_filled(id) {
                missing.push(Requirement::MissingField {
                    id: id.into(),
                    label: label.into(),
                });
            }
        }

        for field in &visible {
            if self.is_required(field) && !self.data.is_filled(&field.id) {
                missing.push(Requirement::MissingField {
                    id: field.id.clone(),
                    label: field.label.clone(),
                });
            }
        }

        if !self.data.email.trim().is_empty() && !is_valid_email(&self.data.email) {
            missing.push(Requirement::InvalidEmail);
        }

        let host = self.data.host.trim();
        if !host.is_empty() && self.site.host(host).is_none_or(|h| !h.is_active()) {
            missing.push(Requirement::UnknownHost { id: host.to_owned() });
        }

        missing
    }

    /// Check `step`'s requirements against the current data.
    pub fn validate_step(&self, step: Step) -> Result<(), StepIncomplete> {
        let missing = match step {
            Step::VisitorTypeSelect => match self.data.visitor_type.as_deref() {
                Some(id) if self.site.visitor_type(id).is_some() => Vec::new(),
                _ => vec![Requirement::VisitorTypeNotSelected],
            },
            Step::Details => self.details_requirements(),
            Step::Photo => {
                if self.site.check_in_policy.photo_required && self.data.photo.is_none() {
                    vec![Requirement::PhotoRequired]
                } else {
                    Vec::new()
                }
            }
            Step::Review => {
                if self.site.check_in_policy.signature_required && !self.data.signature {
                    vec![Requirement::SignatureRequired]
                } else {
                    Vec::new()
                }
            }
            Step::Complete => Vec::new(),
        };

        if missing.is_empty() {
            Ok(())
        } else {
            Err(StepIncomplete { step, missing })
        }
    }

    // ── Navigation ───────────────────────────────────────────────────

    /// `true` iff the current step's requirements are met.
    pub fn can_advance(&self) -> bool {
        self.step != Step::Complete && self.validate_step(self.step).is_ok()
    }

    /// Advance one step. From review, use [`submit`](Self::submit).
    pub fn next(&mut self) -> Result<Step, WizardError> {
        match self.step {
            Step::Complete => return Err(WizardError::AlreadyComplete),
            Step::Review => return Err(WizardError::SubmitRequired),
            _ => {}
        }
        self.validate_step(self.step)?;
        if let Some(next) = self.step.following() {
            self.step = next;
        }
        debug!(step = %self.step, "check-in advanced");
        Ok(self.step)
    }

    pub fn can_go_back(&self) -> bool {
        self.step > Step::VisitorTypeSelect && self.step != Step::Complete
    }

    /// Step back without validating. Returns the new step, or `None` if
    /// there is nowhere to go.
    pub fn previous(&mut self) -> Option<Step> {
        if !self.can_go_back() {
            return None;
        }
        self.step = self.step.preceding()?;
        Some(self.step)
    }

    /// Jump back to an earlier step (the review screen's edit links).
    pub fn goto(&mut self, step: Step) -> Result<Step, WizardError> {
        if self.step == Step::Complete {
            return Err(WizardError::AlreadyComplete);
        }
        if step > self.step || step == Step::Complete {
            return Err(WizardError::CannotGoTo {
                from: self.step,
                to: step,
            });
        }
        self.step = step;
        Ok(step)
    }

    // ── Submit ───────────────────────────────────────────────────────

    fn check_all(&self) -> Result<(), StepIncomplete> {
        [Step::VisitorTypeSelect, Step::Details, Step::Photo, Step::Review]
            .into_iter()
            .try_for_each(|step| self.validate_step(step))
    }

    /// Build the submission for the current data.
    pub fn submission(&self, check_in: DateTime<Utc>) -> CheckInSubmission {
        let d = &self.data;
        let mut fields: Vec<(String, String)> = Vec::new();
        let mut push = |k: &str, v: &str| {
            if !v.trim().is_empty() {
                fields.push((k.to_owned(), v.trim().to_owned()));
            }
        };

        push("site", &self.site.id);
        push("tenantId", &self.site.tenant_id);
        push("visitorType", d.visitor_type.as_deref().unwrap_or_default());
        push("name", &d.name);
        push("email", &d.email);
        push("company", &d.company);
        push("phone", &d.phone);
        push("host", &d.host);
        push("hostName", self.host_name().unwrap_or_default());
        push("purpose", &d.purpose);
        if let Some(duration) = d.expected_duration {
            push(EXPECTED_DURATION_FIELD, &duration.to_string());
        }
        push("agreementSigned", if d.signature { "true" } else { "false" });

        if !d.custom.is_empty() {
            match serde_json::to_string(&d.custom) {
                Ok(json) => push("customFields", &json),
                Err(e) => warn!("dropping custom fields from check-in: {e}"),
            }
        }

        CheckInSubmission {
            site_id: self.site.id.clone(),
            fields,
            photo: d.photo.clone(),
            check_in,
        }
    }

    /// Validate everything and submit once. On success the wizard is
    /// complete and the photo bytes are released; on failure it stays on
    /// review with the data intact.
    pub async fn submit<S: CheckInSubmitter>(&mut self, submitter: &S) -> Result<&Visitor, CoreError> {
        self.submit_at(submitter, Utc::now()).await
    }

    pub async fn submit_at<S: CheckInSubmitter>(
        &mut self,
        submitter: &S,
        check_in: DateTime<Utc>,
    ) -> Result<&Visitor, CoreError> {
        if self.step != Step::Review {
            return Err(WizardError::NotOnReview { step: self.step }.into());
        }
        self.check_all().map_err(WizardError::from)?;

        let submission = self.submission(check_in);
        match submitter.submit_check_in(&submission).await {
            Ok(visitor) => {
                info!(site = %self.site.url, visitor = %visitor.id, "visitor checked in");
                self.step = Step::Complete;
                self.data.photo = None;
                Ok(self.visitor.insert(visitor))
            }
            Err(e) => {
                warn!(site = %self.site.url, "check-in failed: {e}");
                Err(e)
            }
        }
    }
}
