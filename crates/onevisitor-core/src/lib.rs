//! Domain layer between `onevisitor-api` and the CLI.
//!
//! This crate owns the business logic and domain model of the OneVisitor
//! client workspace:
//!
//! - **[`Dashboard`]**: Facade over one authenticated [`ApiClient`] and its
//!   [`TenantContext`]. Sites, visitors, permissions, tenants, the kiosk
//!   lookup, and CSV exports all go through it.
//!
//! - **[`TenantContext`]**: Explicitly passed, observable tenant state.
//!   Resolves a tenant from a hostname subdomain or a kiosk site path and
//!   publishes branding through a `tokio::sync::watch` channel.
//!
//! - **[`CheckInWizard`]**: The kiosk's five-step check-in state machine
//!   with per-step validation that reports every unmet [`Requirement`].
//!
//! - **[`SiteDraft`] / [`OrderedList`]**: Site editing: reorderable visitor
//!   types, form fields, and hosts, plus host CSV import.
//!
//! - **Domain model** ([`model`]): Canonical types (`SiteConfig`,
//!   `FormField`, `Visitor`, `Tenant`, ...) with closed enums where the wire
//!   format uses strings.
//!
//! [`ApiClient`]: onevisitor_api::ApiClient

pub mod config;
pub mod convert;
pub mod dashboard;
pub mod editor;
pub mod error;
pub mod export;
pub mod model;
pub mod tenant;
pub mod text;
pub mod wizard;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{AuthCredentials, ClientConfig, DEFAULT_API_URL, TlsVerification};
pub use dashboard::Dashboard;
pub use editor::{EditorError, FIELD_LIBRARY, Keyed, LibraryField, OrderedList, SiteDraft};
pub use error::CoreError;
pub use export::{VISITOR_COLUMNS, VisitorRow, export_filename, visitor_csv};
pub use tenant::{
    BrandingCatalog, Recognition, ResolvedTenant, StaticCatalog, TenantContext, TenantId,
    TenantResolverConfig, TenantSource, TenantWatch,
};
pub use text::{format_relative, is_valid_email, slugify};
pub use wizard::{
    CheckInSubmission, CheckInSubmitter, CheckInWizard, FieldPlan, FieldValue, FieldWidget,
    PhotoUpload, Requirement, Step, StepIncomplete, VisitorFormData, WizardError,
};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    AccessLevel, BadgeTemplate, CheckInPolicy, ExpectedDuration, FieldKind, FormField, Host,
    LogoPosition, PermissionRole, SiteBranding, SiteConfig, SitePermission, Tenant,
    TenantBranding, TenantStatus, UrlType, UserProfile, Visitor, VisitorFilter, VisitorStatus,
    VisitorType,
};

// Token storage is part of the public surface the CLI wires up.
pub use onevisitor_api::{MemoryTokenStore, TokenStore};
