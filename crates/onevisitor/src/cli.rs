//! Clap derive structures for the `onevisitor` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// onevisitor -- visitor check-in and kiosk administration
#[derive(Debug, Parser)]
#[command(
    name = "onevisitor",
    version,
    about = "Manage OneVisitor kiosks, visitors, and tenants from the command line",
    long_about = "A CLI for the OneVisitor visitor management platform.\n\n\
        Configure kiosk sites, review and export visitor logs, manage site\n\
        permissions, and run the kiosk check-in flow in the terminal.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend profile to use
    #[arg(long, short = 'p', env = "ONEVISITOR_PROFILE", global = true)]
    pub profile: Option<String>,

    /// API base URL (overrides profile)
    #[arg(long, short = 'u', env = "ONEVISITOR_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Tenant shortname to act as (overrides profile and hostname)
    #[arg(long, short = 't', env = "ONEVISITOR_TENANT", global = true)]
    pub tenant: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "ONEVISITOR_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "ONEVISITOR_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds [default: profile's, else 30]
    #[arg(long, env = "ONEVISITOR_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Keep session tokens in memory only
    #[arg(long, env = "ONEVISITOR_NO_KEYRING", global = true)]
    pub no_keyring: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage kiosk sites
    #[command(alias = "s")]
    Sites(SitesArgs),

    /// Review, check out, and export visitors
    #[command(alias = "v")]
    Visitors(VisitorsArgs),

    /// Manage the hosts visitors can choose
    Hosts(HostsArgs),

    /// Manage a site's visitor types
    VisitorTypes(VisitorTypesArgs),

    /// Manage a site's check-in form fields
    Fields(FieldsArgs),

    /// Manage who can administer a site
    #[command(alias = "perms")]
    Permissions(PermissionsArgs),

    /// Manage tenant organizations (platform admin)
    Tenants(TenantsArgs),

    /// Run the kiosk check-in flow for a site
    Checkin(CheckinArgs),

    /// Preview which tenant a hostname or kiosk path resolves to
    Tenant(TenantArgs),

    /// Log in and store the session
    Login(LoginArgs),

    /// End the session and forget stored tokens
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Change or reset a password
    Password(PasswordArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SITES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SitesArgs {
    #[command(subcommand)]
    pub command: SitesCommand,
}

/// Branding and policy settings shared by `create` and `update`.
#[derive(Debug, Args)]
pub struct SiteSettings {
    /// Public URL path (slugified)
    #[arg(long)]
    pub url: Option<String>,

    /// Message shown on the kiosk welcome screen
    #[arg(long)]
    pub welcome_message: Option<String>,

    /// Primary color (#rrggbb)
    #[arg(long)]
    pub primary_color: Option<String>,

    /// Secondary color (#rrggbb)
    #[arg(long)]
    pub secondary_color: Option<String>,

    /// Require a photo at check-in
    #[arg(long)]
    pub photo_required: Option<bool>,

    /// Require the agreement signature at check-in
    #[arg(long)]
    pub signature_required: Option<bool>,
}

#[derive(Debug, Subcommand)]
pub enum SitesCommand {
    /// List the tenant's sites
    #[command(alias = "ls")]
    List,

    /// Show a site's configuration
    Get {
        /// Site id, URL path, or name
        site: String,
    },

    /// Create a site from the default template
    Create {
        /// Site name
        name: String,

        #[command(flatten)]
        settings: SiteSettings,

        /// Publish immediately
        #[arg(long)]
        publish: bool,
    },

    /// Update a site's name, branding, or check-in policy
    Update {
        /// Site id, URL path, or name
        site: String,

        /// New site name
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        settings: SiteSettings,
    },

    /// Make a site's kiosk available
    Publish {
        /// Site id, URL path, or name
        site: String,
    },

    /// Take a site's kiosk offline
    Unpublish {
        /// Site id, URL path, or name
        site: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  VISITORS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct VisitorsArgs {
    #[command(subcommand)]
    pub command: VisitorsCommand,
}

/// Shared filter arguments for visitor listings and exports.
#[derive(Debug, Args)]
pub struct VisitorFilterArgs {
    /// Only visitors of this site (id, URL path, or name)
    #[arg(long, short = 's')]
    pub site: Option<String>,

    /// Only visitors of this type id
    #[arg(long = "type")]
    pub visitor_type: Option<String>,

    /// Only visitors in this status
    #[arg(long, value_parser = [
        "checked-in", "checked-out", "pre-registered", "no-show",
        "overdue", "emergency-safe", "emergency-unknown",
    ])]
    pub status: Option<String>,

    /// Match name, company, email, or host
    #[arg(long, short = 'f')]
    pub search: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum VisitorsCommand {
    /// List visitors
    #[command(alias = "ls")]
    List(VisitorFilterArgs),

    /// Mark a visitor as checked out
    CheckOut {
        /// Visitor id
        visitor: String,
    },

    /// Delete a visitor record
    #[command(alias = "rm")]
    Delete {
        /// Visitor id
        visitor: String,
    },

    /// Export visitors as CSV
    Export {
        #[command(flatten)]
        filter: VisitorFilterArgs,

        /// Output file (defaults to visitors_<date>.csv)
        #[arg(long = "file", short = 'F', conflicts_with = "stdout")]
        file: Option<PathBuf>,

        /// Write the CSV to stdout
        #[arg(long)]
        stdout: bool,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  HOSTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct HostsArgs {
    /// Site id, URL path, or name
    #[arg(long, short = 's', global = true)]
    pub site: Option<String>,

    #[command(subcommand)]
    pub command: HostsCommand,
}

#[derive(Debug, Subcommand)]
pub enum HostsCommand {
    /// List a site's hosts
    #[command(alias = "ls")]
    List,

    /// Add a host
    Add {
        /// Full name
        #[arg(long)]
        name: String,

        /// Email address
        #[arg(long)]
        email: String,

        /// Phone number
        #[arg(long)]
        phone: Option<String>,

        /// Department
        #[arg(long)]
        department: Option<String>,
    },

    /// Remove a host
    #[command(alias = "rm")]
    Remove {
        /// Host id
        host: String,
    },

    /// Import hosts from a CSV file with name and email columns
    Import {
        /// CSV file
        file: PathBuf,
    },

    /// Move a host to a new position
    Move(MoveArgs),
}

/// Reorder an entry of a site list.
#[derive(Debug, Args)]
pub struct MoveArgs {
    /// Entry id
    pub id: String,

    /// New 1-based position
    pub position: usize,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  VISITOR TYPES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct VisitorTypesArgs {
    /// Site id, URL path, or name
    #[arg(long, short = 's', global = true)]
    pub site: Option<String>,

    #[command(subcommand)]
    pub command: VisitorTypesCommand,
}

#[derive(Debug, Subcommand)]
pub enum VisitorTypesCommand {
    /// List visitor types
    #[command(alias = "ls")]
    List,

    /// Add a visitor type (replaces one with the same id)
    Add {
        /// Display name; the id is its slug
        name: String,

        /// Icon name
        #[arg(long)]
        icon: Option<String>,
    },

    /// Remove a visitor type
    #[command(alias = "rm")]
    Remove {
        /// Visitor type id
        id: String,
    },

    /// Move a visitor type to a new position
    Move(MoveArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  FORM FIELDS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct FieldsArgs {
    /// Site id, URL path, or name
    #[arg(long, short = 's', global = true)]
    pub site: Option<String>,

    #[command(subcommand)]
    pub command: FieldsCommand,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FieldKindArg {
    Text,
    Email,
    Phone,
    Select,
    Checkbox,
    Date,
    Time,
    Textarea,
    Signature,
}

#[derive(Debug, Subcommand)]
pub enum FieldsCommand {
    /// List a site's form fields
    #[command(alias = "ls")]
    List,

    /// List the predefined field library
    Library,

    /// Add a custom field (replaces one with the same id)
    Add {
        /// Label; the id is its slug
        label: String,

        /// Input kind
        #[arg(long, default_value = "text")]
        kind: FieldKindArg,

        /// Mark the field required
        #[arg(long)]
        required: bool,

        /// Choice for a select field (repeatable)
        #[arg(long = "option")]
        options: Vec<String>,
    },

    /// Add a field from the library
    AddLibrary {
        /// Library field id (see `fields library`)
        id: String,
    },

    /// Remove a field
    #[command(alias = "rm")]
    Remove {
        /// Field id
        id: String,
    },

    /// Move a field to a new position
    Move(MoveArgs),

    /// Mark a field required or optional
    Require {
        /// Field id
        id: String,

        /// Make the field optional instead
        #[arg(long)]
        off: bool,
    },

    /// Show a field only for the given visitor types (none: all types)
    Only {
        /// Field id
        id: String,

        /// Visitor type ids
        types: Vec<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  PERMISSIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct PermissionsArgs {
    /// Site id, URL path, or name
    #[arg(long, short = 's', global = true)]
    pub site: Option<String>,

    #[command(subcommand)]
    pub command: PermissionsCommand,
}

const ROLES: [&str; 4] = ["Admin", "Staff", "Receptionist", "SecurityOfficer"];
const LEVELS: [&str; 2] = ["Viewer", "Admin"];

#[derive(Debug, Subcommand)]
pub enum PermissionsCommand {
    /// List who can access a site
    #[command(alias = "ls")]
    List,

    /// Grant a user access to a site
    Grant {
        /// User's display name
        #[arg(long)]
        name: String,

        /// User's email
        #[arg(long)]
        email: String,

        /// Role at the site
        #[arg(long, value_parser = ROLES)]
        role: String,

        /// Access level
        #[arg(long, default_value = "Viewer", value_parser = LEVELS)]
        level: String,
    },

    /// Change a permission's role or level
    Update {
        /// Permission id
        id: String,

        /// New role
        #[arg(long, value_parser = ROLES)]
        role: Option<String>,

        /// New access level
        #[arg(long, value_parser = LEVELS)]
        level: Option<String>,
    },

    /// Revoke a permission
    Revoke {
        /// Permission id
        id: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  TENANTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct TenantsArgs {
    #[command(subcommand)]
    pub command: TenantsCommand,
}

#[derive(Debug, Subcommand)]
pub enum TenantsCommand {
    /// List tenants
    #[command(alias = "ls")]
    List,

    /// Show a tenant by shortname
    Get {
        /// Tenant shortname
        shortname: String,
    },

    /// Create a tenant
    Create {
        /// Organization name
        #[arg(long)]
        name: String,

        /// Organization domain (e.g. acme.com)
        #[arg(long)]
        domain: String,

        /// Shortname used in subdomains and kiosk paths
        #[arg(long)]
        shortname: Option<String>,

        /// Primary brand color (#rrggbb)
        #[arg(long)]
        primary_color: Option<String>,

        /// Secondary brand color (#rrggbb)
        #[arg(long)]
        secondary_color: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  KIOSK
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CheckinArgs {
    /// Kiosk path, e.g. acme-hq-lobby (prompted when omitted)
    pub site_path: Option<String>,

    /// Visitor type id
    #[arg(long = "type")]
    pub visitor_type: Option<String>,

    /// Prefill a field (repeatable), e.g. --field name="Ada Lovelace"
    #[arg(long = "field", value_name = "ID=VALUE")]
    pub fields: Vec<String>,

    /// Expected duration (30min, 1hour, 2hours, halfday, fullday)
    #[arg(long)]
    pub duration: Option<String>,

    /// Photo to attach (jpeg, png, webp, gif; at most 5 MiB)
    #[arg(long)]
    pub photo: Option<PathBuf>,

    /// Accept the visitor agreement without prompting
    #[arg(long)]
    pub sign: bool,
}

#[derive(Debug, Args)]
pub struct TenantArgs {
    /// Hostname to resolve (defaults to the API URL's host)
    #[arg(long, conflicts_with = "path")]
    pub host: Option<String>,

    /// Kiosk path to resolve, e.g. globex-lobby
    #[arg(long)]
    pub path: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SESSION
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Login email (defaults to the profile's)
    #[arg(long, short = 'e')]
    pub email: Option<String>,
}

#[derive(Debug, Args)]
pub struct PasswordArgs {
    #[command(subcommand)]
    pub command: PasswordCommand,
}

#[derive(Debug, Subcommand)]
pub enum PasswordCommand {
    /// Change the logged-in user's password
    Change,

    /// Email a password reset link
    Reset {
        /// Account email
        email: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Set a value on the active profile
    Set {
        /// Profile key (api_url, tenant, email, password_env, timeout, ...)
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a password in the system keyring
    SetPassword {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
