//! Visitor type editing for a site.

use tabled::Tabled;

use onevisitor_core::{Dashboard, VisitorType};

use crate::cli::{GlobalOpts, VisitorTypesArgs, VisitorTypesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct VisitorTypeRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Icon")]
    icon: String,
    #[tabled(rename = "Required fields")]
    required: String,
}

fn type_row(t: &VisitorType) -> VisitorTypeRow {
    VisitorTypeRow {
        id: t.id.clone(),
        name: t.name.clone(),
        icon: util::or_dash(t.icon.as_deref()),
        required: if t.required_fields.is_empty() {
            "-".into()
        } else {
            t.required_fields.join(", ")
        },
    }
}

pub async fn handle(
    dashboard: &Dashboard,
    args: VisitorTypesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let site_key = util::require_site(args.site.as_deref())?;

    match args.command {
        VisitorTypesCommand::List => {
            let site = dashboard.find_site(site_key).await?;
            let out = output::render_list(
                &global.output,
                &site.visitor_types,
                type_row,
                |t| t.id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        VisitorTypesCommand::Add { name, icon } => {
            let mut id = String::new();
            util::edit_site(dashboard, site_key, |draft| {
                id = draft.add_visitor_type(&name, icon.as_deref())?;
                Ok(())
            })
            .await?;
            output::note(global, &format!("Visitor type '{name}' saved as {id}"));
            Ok(())
        }

        VisitorTypesCommand::Remove { id } => {
            util::edit_site(dashboard, site_key, |draft| {
                util::remove_entry(&mut draft.visitor_types, "visitor type", &id).map(drop)
            })
            .await?;
            output::note(global, &format!("Visitor type {id} removed"));
            Ok(())
        }

        VisitorTypesCommand::Move(mv) => {
            util::edit_site(dashboard, site_key, |draft| {
                util::move_entry(&mut draft.visitor_types, "visitor type", &mv.id, mv.position)
            })
            .await?;
            output::note(
                global,
                &format!("Visitor type {} moved to {}", mv.id, mv.position),
            );
            Ok(())
        }
    }
}
