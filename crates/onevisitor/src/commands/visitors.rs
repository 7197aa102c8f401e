//! Visitor command handlers.

use std::path::PathBuf;
use std::str::FromStr;

use tabled::Tabled;

use onevisitor_core::{
    Dashboard, Visitor, VisitorFilter, VisitorStatus, export_filename, format_relative,
};

use crate::cli::{GlobalOpts, VisitorFilterArgs, VisitorsArgs, VisitorsCommand};
use crate::error::CliError;
use crate::output::{self, Painter};

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct VisitorRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Company")]
    company: String,
    #[tabled(rename = "Host")]
    host: String,
    #[tabled(rename = "Type")]
    visitor_type: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Checked in")]
    checked_in: String,
}

fn visitor_row(v: &Visitor, painter: Painter, now: chrono::DateTime<chrono::Utc>) -> VisitorRow {
    VisitorRow {
        id: v.id.clone(),
        name: v.name.clone(),
        company: util::or_dash(v.company.as_deref()),
        host: util::or_dash(Some(&v.host_name)),
        visitor_type: util::or_dash(v.visitor_type.as_deref()),
        status: painter.status(v.status),
        checked_in: v
            .check_in_time
            .map_or_else(|| "-".into(), |t| format_relative(t, now)),
    }
}

/// Translate CLI filter flags into a `VisitorFilter`, resolving `--site`
/// to a site id.
async fn build_filter(
    dashboard: &Dashboard,
    args: VisitorFilterArgs,
) -> Result<VisitorFilter, CliError> {
    let site_id = match args.site {
        Some(key) => Some(dashboard.find_site(&key).await?.id),
        None => None,
    };
    let status = args
        .status
        .map(|s| {
            VisitorStatus::from_str(&s).map_err(|_| CliError::Validation {
                field: "status".into(),
                reason: format!("unknown visitor status '{s}'"),
            })
        })
        .transpose()?;

    Ok(VisitorFilter {
        site_id,
        visitor_type: args.visitor_type,
        status,
        query: args.search.filter(|q| !q.trim().is_empty()),
    })
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    dashboard: &Dashboard,
    args: VisitorsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let painter = Painter::new(global);

    match args.command {
        VisitorsCommand::List(filter) => {
            let filter = build_filter(dashboard, filter).await?;
            let visitors = dashboard.visitors(&filter).await?;
            let now = chrono::Utc::now();
            let out = output::render_list(
                &global.output,
                &visitors,
                |v| visitor_row(v, painter, now),
                |v| v.id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        VisitorsCommand::CheckOut { visitor } => {
            let updated = dashboard.check_out(&visitor).await?;
            output::note(
                global,
                &format!("{} checked out ({})", updated.name, updated.status),
            );
            Ok(())
        }

        VisitorsCommand::Delete { visitor } => {
            if !util::confirm(&format!("Delete visitor {visitor}?"), global.yes)? {
                return Ok(());
            }
            dashboard.delete_visitor(&visitor).await?;
            output::note(global, &format!("Visitor {visitor} deleted"));
            Ok(())
        }

        VisitorsCommand::Export {
            filter,
            file,
            stdout,
        } => {
            let filter = build_filter(dashboard, filter).await?;
            let csv = dashboard.export_visitors(&filter).await?;

            if stdout {
                print!("{csv}");
                return Ok(());
            }

            let path = file.unwrap_or_else(|| {
                PathBuf::from(export_filename(
                    "visitors",
                    chrono::Local::now().date_naive(),
                ))
            });
            std::fs::write(&path, csv)?;
            output::note(global, &format!("Exported to {}", path.display()));
            Ok(())
        }
    }
}
