// ── Domain model ──
//
// Canonical types shared by the CLI and the check-in workflow. Wire
// shapes live in `onevisitor_api::types`; `crate::convert` bridges them.

pub mod permission;
pub mod site;
pub mod tenant;
pub mod visitor;

pub use permission::{AccessLevel, PermissionRole, SitePermission, UserProfile};
pub use site::{
    CheckInPolicy, ExpectedDuration, FieldKind, FormField, HOST_FIELD_ID, Host, SiteBranding,
    SiteConfig, UrlType, VisitorType,
};
pub use tenant::{BadgeTemplate, LogoPosition, Tenant, TenantBranding, TenantStatus};
pub use visitor::{Visitor, VisitorFilter, VisitorStatus};
