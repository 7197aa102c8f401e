//! Command dispatch: bridges CLI args -> `Dashboard` calls -> output formatting.

pub mod checkin;
pub mod config_cmd;
pub mod fields;
pub mod hosts;
pub mod permissions;
pub mod session;
pub mod sites;
pub mod tenant;
pub mod tenants;
pub mod util;
pub mod visitor_types;
pub mod visitors;

use onevisitor_core::Dashboard;

use crate::cli::{Command, FieldsCommand, GlobalOpts, PasswordCommand};
use crate::error::CliError;

/// Commands that work without a stored session.
fn is_anonymous(cmd: &Command) -> bool {
    match cmd {
        Command::Login(_) | Command::Logout => true,
        Command::Password(args) => matches!(args.command, PasswordCommand::Reset { .. }),
        Command::Fields(args) => matches!(args.command, FieldsCommand::Library),
        _ => false,
    }
}

/// Dispatch a backend-bound command to its handler.
pub async fn dispatch(
    cmd: Command,
    dashboard: &Dashboard,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if !is_anonymous(&cmd) {
        dashboard.connect().await?;
    }

    match cmd {
        Command::Sites(args) => sites::handle(dashboard, args, global).await,
        Command::Visitors(args) => visitors::handle(dashboard, args, global).await,
        Command::Hosts(args) => hosts::handle(dashboard, args, global).await,
        Command::VisitorTypes(args) => visitor_types::handle(dashboard, args, global).await,
        Command::Fields(args) => fields::handle(dashboard, args, global).await,
        Command::Permissions(args) => permissions::handle(dashboard, args, global).await,
        Command::Tenants(args) => tenants::handle(dashboard, args, global).await,
        Command::Checkin(args) => checkin::handle(dashboard, args, global).await,
        Command::Login(args) => session::login(dashboard, args, global).await,
        Command::Logout => session::logout(dashboard, global).await,
        Command::Whoami => session::whoami(dashboard, global).await,
        Command::Password(args) => session::password(dashboard, args, global).await,
        // Local-only commands are handled before a dashboard exists
        Command::Config(_) | Command::Tenant(_) | Command::Completions(_) => unreachable!(),
    }
}
