// ── Site editing: ordered lists, drafts, host import ──
//
// The dashboard edits visitor types, form fields, and hosts as ordered
// lists keyed by id. A `SiteDraft` owns those lists plus the scalar site
// settings and enforces the save-time invariants before handing back a
// `SiteConfig`.

use std::collections::HashSet;

use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::model::{FieldKind, FormField, HOST_FIELD_ID, Host, SiteConfig, VisitorType};
use crate::text::{is_hex_color, is_slug, is_valid_email, slugify};

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("Position {index} is out of range (list has {len} entries)")]
    OutOfRange { index: usize, len: usize },

    #[error("'{0}' is not a #rrggbb color")]
    InvalidColor(String),

    #[error("Unknown library field: {0}")]
    UnknownLibraryField(String),

    #[error("A field with id '{0}' already exists")]
    DuplicateField(String),

    #[error("{what} must not be empty")]
    Blank { what: &'static str },

    #[error("No {entity} with id '{id}'")]
    Missing { entity: &'static str, id: String },

    #[error("CSV must have name and email columns")]
    MissingColumns,

    #[error("Could not read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Site cannot be saved: {}", .problems.join("; "))]
    Unsaveable { problems: Vec<String> },
}

// ── OrderedList ──────────────────────────────────────────────────────

/// Entries addressable by a stable string id.
pub trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for VisitorType {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for FormField {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for Host {
    fn key(&self) -> &str {
        &self.id
    }
}

/// A `Vec` whose entries are unique by key and reorderable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedList<T> {
    items: Vec<T>,
}

impl<T> Default for OrderedList<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Keyed> OrderedList<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|i| i.key() == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.items.iter_mut().find(|i| i.key() == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|i| i.key() == id)
    }

    /// Replace the entry with the same id in place, or append. Returns
    /// `true` when an existing entry was replaced.
    pub fn upsert(&mut self, item: T) -> bool {
        match self.position(item.key()) {
            Some(idx) => {
                self.items[idx] = item;
                true
            }
            None => {
                self.items.push(item);
                false
            }
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<T> {
        self.position(id).map(|idx| self.items.remove(idx))
    }

    /// Take the entry at `from` out and reinsert it at `to`.
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<(), EditorError> {
        let len = self.items.len();
        for index in [from, to] {
            if index >= len {
                return Err(EditorError::OutOfRange { index, len });
            }
        }
        if from != to {
            let item = self.items.remove(from);
            self.items.insert(to, item);
        }
        Ok(())
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

// ── Field library ────────────────────────────────────────────────────

pub struct LibraryField {
    pub id: &'static str,
    pub label: &'static str,
    pub kind: fn() -> FieldKind,
}

/// Predefined fields offered by the form builder.
pub static FIELD_LIBRARY: [LibraryField; 8] = [
    LibraryField { id: "name", label: "Full Name", kind: || FieldKind::Text },
    LibraryField { id: "email", label: "Email", kind: || FieldKind::Email },
    LibraryField { id: "phone", label: "Phone Number", kind: || FieldKind::Phone },
    LibraryField { id: "company", label: "Company", kind: || FieldKind::Text },
    LibraryField {
        id: "host",
        label: "Host",
        kind: || FieldKind::Select { options: Vec::new() },
    },
    LibraryField { id: "purpose", label: "Purpose of Visit", kind: || FieldKind::Text },
    LibraryField { id: "nda", label: "NDA Signature", kind: || FieldKind::Signature },
    LibraryField { id: "health", label: "Health Questions", kind: || FieldKind::Checkbox },
];

impl LibraryField {
    pub fn lookup(id: &str) -> Option<&'static Self> {
        FIELD_LIBRARY.iter().find(|f| f.id == id)
    }

    /// Library fields are optional except `name`.
    pub fn to_field(&self) -> FormField {
        let field = FormField::new(self.id, self.label, (self.kind)());
        if self.id == "name" { field.required() } else { field }
    }
}

// ── Host CSV import ──────────────────────────────────────────────────

/// Parse hosts from CSV text. The header row must name `name` and `email`
/// columns (any case); `phone` and `department` are optional. Rows without
/// a name or email are skipped.
pub fn import_hosts_csv(text: &str) -> Result<Vec<Host>, EditorError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.trim().as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_lowercase).collect();
    let column = |name: &str| headers.iter().position(|h| h == name);
    let (Some(name_idx), Some(email_idx)) = (column("name"), column("email")) else {
        return Err(EditorError::MissingColumns);
    };
    let phone_idx = column("phone");
    let dept_idx = column("department");

    let mut hosts = Vec::new();
    for record in reader.records() {
        let record = record?;
        let cell = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
        };
        let (Some(name), Some(email)) = (cell(Some(name_idx)), cell(Some(email_idx))) else {
            continue;
        };
        hosts.push(Host {
            id: new_host_id(),
            name,
            email,
            phone: cell(phone_idx),
            department: cell(dept_idx),
            active: Some(true),
        });
    }

    debug!(count = hosts.len(), "parsed hosts from CSV");
    Ok(hosts)
}

fn new_host_id() -> String {
    format!("host-{}", Uuid::new_v4())
}

// ── SiteDraft ────────────────────────────────────────────────────────

/// An editing session over one site.
#[derive(Debug, Clone)]
pub struct SiteDraft {
    base: SiteConfig,
    pub visitor_types: OrderedList<VisitorType>,
    pub form_fields: OrderedList<FormField>,
    pub hosts: OrderedList<Host>,
}

impl SiteDraft {
    pub fn new(mut site: SiteConfig) -> Self {
        let visitor_types = OrderedList::new(std::mem::take(&mut site.visitor_types));
        let form_fields = OrderedList::new(std::mem::take(&mut site.form_fields));
        let hosts = OrderedList::new(std::mem::take(&mut site.hosts));
        Self {
            base: site,
            visitor_types,
            form_fields,
            hosts,
        }
    }

    /// Starting template for a new site: one `visitor` type and the name,
    /// email, and company fields.
    pub fn blank(tenant_id: &str, name: &str) -> Self {
        let mut site = SiteConfig::new(tenant_id, name, slugify(name));
        site.branding.primary_color = "#3B82F6".into();
        site.branding.secondary_color = "#2563EB".into();
        site.welcome_message = "Welcome! Please check in for your visit.".into();
        site.visitor_types = vec![VisitorType {
            id: "visitor".into(),
            name: "Visitor".into(),
            icon: Some("User".into()),
            required_fields: Vec::new(),
        }];
        site.form_fields = vec![
            FormField::new("name", "Full Name", FieldKind::Text).required(),
            FormField::new("email", "Email", FieldKind::Email).required(),
            FormField::new("company", "Company", FieldKind::Text),
        ];
        Self::new(site)
    }

    pub fn name(&self) -> &str {
        &self.base.name
    }

    pub fn url(&self) -> &str {
        &self.base.url
    }

    pub fn set_name(&mut self, name: &str) {
        name.trim().clone_into(&mut self.base.name);
    }

    /// Store `raw` as a URL slug.
    pub fn set_url(&mut self, raw: &str) -> &str {
        self.base.url = slugify(raw);
        &self.base.url
    }

    pub fn set_welcome_message(&mut self, message: &str) {
        message.clone_into(&mut self.base.welcome_message);
    }

    pub fn set_published(&mut self, published: bool) {
        self.base.published = published;
    }

    pub fn set_primary_color(&mut self, color: &str) -> Result<(), EditorError> {
        self.base.branding.primary_color = checked_color(color)?;
        Ok(())
    }

    pub fn set_secondary_color(&mut self, color: &str) -> Result<(), EditorError> {
        self.base.branding.secondary_color = checked_color(color)?;
        Ok(())
    }

    pub fn set_photo_required(&mut self, required: bool) {
        self.base.check_in_policy.photo_required = required;
    }

    pub fn set_signature_required(&mut self, required: bool) {
        self.base.check_in_policy.signature_required = required;
    }

    // ── Visitor types ──

    /// Add or replace a visitor type; the id is the slug of `name`.
    pub fn add_visitor_type(&mut self, name: &str, icon: Option<&str>) -> Result<String, EditorError> {
        let id = non_empty_slug(name, "Visitor type name")?;
        let required_fields = self
            .visitor_types
            .get(&id)
            .map(|t| t.required_fields.clone())
            .unwrap_or_default();
        self.visitor_types.upsert(VisitorType {
            id: id.clone(),
            name: name.trim().to_owned(),
            icon: icon.map(str::to_owned),
            required_fields,
        });
        Ok(id)
    }

    // ── Form fields ──

    /// Add or replace a custom field; the id is the slug of `label`.
    pub fn add_field(&mut self, label: &str, kind: FieldKind, required: bool) -> Result<String, EditorError> {
        let id = non_empty_slug(label, "Field label")?;
        let mut field = FormField::new(id.clone(), label.trim(), kind);
        field.required = required;
        if let Some(existing) = self.form_fields.get(&id) {
            field.visitor_type_ids.clone_from(&existing.visitor_type_ids);
        }
        self.form_fields.upsert(field);
        Ok(id)
    }

    /// Append a predefined field. Adding one that already exists is an error.
    pub fn add_library_field(&mut self, id: &str) -> Result<&FormField, EditorError> {
        let entry =
            LibraryField::lookup(id).ok_or_else(|| EditorError::UnknownLibraryField(id.to_owned()))?;
        if self.form_fields.get(id).is_some() {
            return Err(EditorError::DuplicateField(id.to_owned()));
        }
        self.form_fields.upsert(entry.to_field());
        self.form_fields.get(id).ok_or_else(|| EditorError::Missing {
            entity: "field",
            id: id.to_owned(),
        })
    }

    pub fn set_field_required(&mut self, id: &str, required: bool) -> Result<(), EditorError> {
        let field = self.form_fields.get_mut(id).ok_or_else(|| EditorError::Missing {
            entity: "field",
            id: id.to_owned(),
        })?;
        field.required = required;
        Ok(())
    }

    /// Limit a field to the given visitor types; empty shows it for all.
    pub fn set_field_visitor_types(&mut self, id: &str, types: Vec<String>) -> Result<(), EditorError> {
        let field = self.form_fields.get_mut(id).ok_or_else(|| EditorError::Missing {
            entity: "field",
            id: id.to_owned(),
        })?;
        field.visitor_type_ids = types;
        Ok(())
    }

    // ── Hosts ──

    pub fn add_host(
        &mut self,
        name: &str,
        email: &str,
        phone: Option<&str>,
        department: Option<&str>,
    ) -> Result<String, EditorError> {
        if name.trim().is_empty() {
            return Err(EditorError::Blank { what: "Host name" });
        }
        if email.trim().is_empty() {
            return Err(EditorError::Blank { what: "Host email" });
        }
        let id = new_host_id();
        self.hosts.upsert(Host {
            id: id.clone(),
            name: name.trim().to_owned(),
            email: email.trim().to_owned(),
            phone: phone.map(str::to_owned),
            department: department.map(str::to_owned),
            active: Some(true),
        });
        Ok(id)
    }

    /// Append hosts parsed from CSV. Returns how many were added.
    pub fn import_hosts(&mut self, text: &str) -> Result<usize, EditorError> {
        let hosts = import_hosts_csv(text)?;
        let count = hosts.len();
        for host in hosts {
            self.hosts.upsert(host);
        }
        Ok(count)
    }

    // ── Saving ──

    /// Every reason the draft cannot be saved yet.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.base.name.trim().is_empty() {
            problems.push("site name is empty".to_owned());
        }
        if !is_slug(&self.base.url) {
            problems.push(format!("site URL '{}' is not a slug", self.base.url));
        }

        let mut seen = HashSet::new();
        for t in self.visitor_types.items() {
            if !seen.insert(t.id.as_str()) {
                problems.push(format!("duplicate visitor type id '{}'", t.id));
            }
        }
        let mut seen = HashSet::new();
        for f in self.form_fields.items() {
            if !seen.insert(f.id.as_str()) {
                problems.push(format!("duplicate field id '{}'", f.id));
            }
        }

        if self.form_fields.get(HOST_FIELD_ID).is_some() && self.hosts.is_empty() {
            problems.push("the host field needs at least one host".to_owned());
        }
        for h in self.hosts.items() {
            if !is_valid_email(&h.email) {
                problems.push(format!("host '{}' has an invalid email", h.name));
            }
        }
        problems
    }

    pub fn save_checks(&self) -> Result<(), EditorError> {
        let problems = self.problems();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(EditorError::Unsaveable { problems })
        }
    }

    /// Current state as a `SiteConfig`, without checks.
    pub fn snapshot(&self) -> SiteConfig {
        SiteConfig {
            visitor_types: self.visitor_types.items().to_vec(),
            form_fields: self.form_fields.items().to_vec(),
            hosts: self.hosts.items().to_vec(),
            ..self.base.clone()
        }
    }

    /// Run the save checks and produce the site to persist.
    pub fn finish(self) -> Result<SiteConfig, EditorError> {
        self.save_checks()?;
        Ok(SiteConfig {
            visitor_types: self.visitor_types.into_vec(),
            form_fields: self.form_fields.into_vec(),
            hosts: self.hosts.into_vec(),
            ..self.base
        })
    }
}

fn checked_color(color: &str) -> Result<String, EditorError> {
    let color = color.trim();
    if is_hex_color(color) {
        Ok(color.to_owned())
    } else {
        Err(EditorError::InvalidColor(color.to_owned()))
    }
}

fn non_empty_slug(s: &str, what: &'static str) -> Result<String, EditorError> {
    let slug = slugify(s);
    if slug.is_empty() {
        Err(EditorError::Blank { what })
    } else {
        Ok(slug)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn ids<T: Keyed>(list: &OrderedList<T>) -> Vec<&str> {
        list.items().iter().map(Keyed::key).collect()
    }

    fn fields(ids: &[&str]) -> OrderedList<FormField> {
        OrderedList::new(
            ids.iter()
                .map(|id| FormField::new(*id, *id, FieldKind::Text))
                .collect(),
        )
    }

    #[test]
    fn move_item_splices_and_reinserts() {
        let mut list = fields(&["a", "b", "c", "d"]);
        list.move_item(0, 2).unwrap();
        assert_eq!(ids(&list), vec!["b", "c", "a", "d"]);
        list.move_item(3, 0).unwrap();
        assert_eq!(ids(&list), vec!["d", "b", "c", "a"]);
        list.move_item(1, 1).unwrap();
        assert_eq!(ids(&list), vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn move_item_rejects_out_of_range() {
        let mut list = fields(&["a", "b"]);
        let err = list.move_item(0, 2).unwrap_err();
        assert!(matches!(err, EditorError::OutOfRange { index: 2, len: 2 }));
        assert_eq!(ids(&list), vec!["a", "b"]);
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut list = fields(&["a", "b", "c"]);
        let replaced = list.upsert(FormField::new("b", "Bee", FieldKind::Email));
        assert!(replaced);
        assert_eq!(ids(&list), vec!["a", "b", "c"]);
        assert_eq!(list.get("b").unwrap().label, "Bee");

        assert!(!list.upsert(FormField::new("z", "Zed", FieldKind::Text)));
        assert_eq!(ids(&list), vec!["a", "b", "c", "z"]);
        assert!(list.remove("a").is_some());
        assert!(list.remove("a").is_none());
    }

    #[test]
    fn library_fields_name_is_required() {
        let mut draft = SiteDraft::blank("acme", "Lobby");
        draft.form_fields = OrderedList::default();
        assert!(draft.add_library_field("name").unwrap().required);
        assert!(!draft.add_library_field("phone").unwrap().required);
        assert!(matches!(
            draft.add_library_field("name"),
            Err(EditorError::DuplicateField(_))
        ));
        assert!(matches!(
            draft.add_library_field("favourite-color"),
            Err(EditorError::UnknownLibraryField(_))
        ));
        assert_eq!(
            draft.form_fields.get("phone").unwrap().kind,
            FieldKind::Phone
        );
    }

    #[test]
    fn host_field_requires_hosts() {
        let mut draft = SiteDraft::blank("acme", "HQ Lobby");
        assert!(draft.save_checks().is_ok());

        draft.add_library_field("host").unwrap();
        let err = draft.save_checks().unwrap_err();
        match err {
            EditorError::Unsaveable { problems } => {
                assert_eq!(problems, vec!["the host field needs at least one host"]);
            }
            other => panic!("unexpected: {other:?}"),
        }

        let id = draft
            .add_host("Grace Hopper", "grace@acme.test", None, Some("Engineering"))
            .unwrap();
        assert!(id.starts_with("host-"));
        let site = draft.finish().unwrap();
        assert_eq!(site.hosts.len(), 1);
        assert!(site.has_host_field());
    }

    #[test]
    fn url_is_slugified_and_checked() {
        let mut draft = SiteDraft::blank("acme", "HQ Lobby");
        assert_eq!(draft.url(), "hq-lobby");
        assert_eq!(draft.set_url("  Main Entrance #2 "), "main-entrance-2");

        draft.set_url("!!!");
        draft.set_name("  ");
        let problems = draft.problems();
        assert_eq!(problems.len(), 2);
    }

    #[test]
    fn colors_must_be_hex() {
        let mut draft = SiteDraft::blank("acme", "Lobby");
        draft.set_primary_color("#112233").unwrap();
        assert!(matches!(
            draft.set_secondary_color("blue"),
            Err(EditorError::InvalidColor(_))
        ));
        assert_eq!(draft.snapshot().branding.primary_color, "#112233");
        assert_eq!(draft.snapshot().branding.secondary_color, "#2563EB");
    }

    #[test]
    fn custom_field_ids_come_from_labels() {
        let mut draft = SiteDraft::blank("acme", "Lobby");
        let id = draft
            .add_field("Vehicle Plate #", FieldKind::Text, false)
            .unwrap();
        assert_eq!(id, "vehicle-plate");
        assert!(matches!(
            draft.add_field("???", FieldKind::Text, false),
            Err(EditorError::Blank { .. })
        ));

        draft
            .set_field_visitor_types("vehicle-plate", vec!["contractor".into()])
            .unwrap();
        draft.add_field("Vehicle Plate", FieldKind::Text, true).unwrap();
        let field = draft.form_fields.get("vehicle-plate").unwrap();
        assert!(field.required);
        assert_eq!(field.visitor_type_ids, vec!["contractor"]);
    }

    #[test]
    fn csv_import_needs_name_and_email_headers() {
        let err = import_hosts_csv("name,phone\nAda,555").unwrap_err();
        assert!(matches!(err, EditorError::MissingColumns));
    }

    #[test]
    fn csv_import_skips_incomplete_rows() {
        let text = "Name, Email ,Department\n\
                    Grace Hopper,grace@acme.test,Engineering\n\
                    No Email,,Sales\n\
                    \"Turing, Alan\",alan@acme.test,\n";
        let hosts = import_hosts_csv(text).unwrap();
        assert_eq!(hosts.len(), 2);
        assert_eq!(hosts[0].name, "Grace Hopper");
        assert_eq!(hosts[0].department.as_deref(), Some("Engineering"));
        assert_eq!(hosts[1].name, "Turing, Alan");
        assert_eq!(hosts[1].department, None);
        assert_eq!(hosts[1].phone, None);
        assert_ne!(hosts[0].id, hosts[1].id);
    }

    #[test]
    fn import_appends_to_draft() {
        let mut draft = SiteDraft::blank("acme", "Lobby");
        draft.add_host("Existing", "e@acme.test", None, None).unwrap();
        let added = draft
            .import_hosts("email,name\nada@acme.test,Ada\n")
            .unwrap();
        assert_eq!(added, 1);
        let names: Vec<&str> = draft.hosts.items().iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["Existing", "Ada"]);
    }

    #[test]
    fn draft_round_trips_site() {
        let mut site = SiteConfig::new("acme", "Lobby", "acme-lobby");
        site.form_fields = vec![FormField::new("name", "Full Name", FieldKind::Text)];
        let draft = SiteDraft::new(site.clone());
        assert_eq!(draft.snapshot(), site);
        assert_eq!(draft.finish().unwrap(), site);
    }
}
