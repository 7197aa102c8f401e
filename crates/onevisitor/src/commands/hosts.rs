//! Host list editing for a site.

use tabled::Tabled;

use onevisitor_core::{Dashboard, Host};

use crate::cli::{GlobalOpts, HostsArgs, HostsCommand};
use crate::error::CliError;
use crate::output::{self, Painter};

use super::util;

#[derive(Tabled)]
struct HostRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Department")]
    department: String,
    #[tabled(rename = "Active")]
    active: String,
}

fn position_of(hosts: &[Host], host: &Host) -> usize {
    hosts.iter().position(|h| h.id == host.id).map_or(0, |i| i + 1)
}

pub async fn handle(
    dashboard: &Dashboard,
    args: HostsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let site_key = util::require_site(args.site.as_deref())?;

    match args.command {
        HostsCommand::List => {
            let site = dashboard.find_site(site_key).await?;
            let painter = Painter::new(global);
            let out = output::render_list(
                &global.output,
                &site.hosts,
                |h| HostRow {
                    position: position_of(&site.hosts, h),
                    id: h.id.clone(),
                    name: h.name.clone(),
                    email: h.email.clone(),
                    department: util::or_dash(h.department.as_deref()),
                    active: painter.flag(h.is_active()),
                },
                |h| h.id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        HostsCommand::Add {
            name,
            email,
            phone,
            department,
        } => {
            let mut added = String::new();
            util::edit_site(dashboard, site_key, |draft| {
                added = draft.add_host(&name, &email, phone.as_deref(), department.as_deref())?;
                Ok(())
            })
            .await?;
            output::note(global, &format!("Host '{name}' added"));
            output::print_output(&added, global.quiet);
            Ok(())
        }

        HostsCommand::Remove { host } => {
            let mut removed = None;
            util::edit_site(dashboard, site_key, |draft| {
                removed = Some(util::remove_entry(&mut draft.hosts, "host", &host)?);
                Ok(())
            })
            .await?;
            if let Some(h) = removed {
                output::note(global, &format!("Host '{}' removed", h.name));
            }
            Ok(())
        }

        HostsCommand::Import { file } => {
            let text = std::fs::read_to_string(&file)?;
            let mut count = 0;
            util::edit_site(dashboard, site_key, |draft| {
                count = draft.import_hosts(&text)?;
                Ok(())
            })
            .await?;
            output::note(
                global,
                &format!("Imported {count} host(s) from {}", file.display()),
            );
            Ok(())
        }

        HostsCommand::Move(mv) => {
            util::edit_site(dashboard, site_key, |draft| {
                util::move_entry(&mut draft.hosts, "host", &mv.id, mv.position)
            })
            .await?;
            output::note(global, &format!("Host {} moved to {}", mv.id, mv.position));
            Ok(())
        }
    }
}
