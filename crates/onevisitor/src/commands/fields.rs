//! Form builder: a site's check-in fields and the predefined library.

use serde::Serialize;
use tabled::Tabled;

use onevisitor_core::{Dashboard, FIELD_LIBRARY, FieldKind, FormField};

use crate::cli::{FieldKindArg, FieldsArgs, FieldsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output::{self, Painter};

use super::util;

// ── Rows ────────────────────────────────────────────────────────────

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Required")]
    required: String,
    #[tabled(rename = "Visitor types")]
    types: String,
}

fn kind_label(kind: &FieldKind) -> String {
    match kind {
        FieldKind::Select { options } if !options.is_empty() => {
            format!("select ({})", options.join("|"))
        }
        other => other.wire_name().to_owned(),
    }
}

fn field_row(f: &FormField, painter: Painter) -> FieldRow {
    FieldRow {
        id: f.id.clone(),
        label: f.label.clone(),
        kind: kind_label(&f.kind),
        required: painter.flag(f.required),
        types: if f.visitor_type_ids.is_empty() {
            "all".into()
        } else {
            f.visitor_type_ids.join(", ")
        },
    }
}

#[derive(Clone, Serialize, Tabled)]
struct LibraryRow {
    #[tabled(rename = "ID")]
    id: &'static str,
    #[tabled(rename = "Label")]
    label: &'static str,
    #[tabled(rename = "Kind")]
    kind: &'static str,
}

fn library_rows() -> Vec<LibraryRow> {
    FIELD_LIBRARY
        .iter()
        .map(|f| LibraryRow {
            id: f.id,
            label: f.label,
            kind: (f.kind)().wire_name(),
        })
        .collect()
}

fn to_kind(arg: FieldKindArg, options: Vec<String>) -> Result<FieldKind, CliError> {
    if !options.is_empty() && !matches!(arg, FieldKindArg::Select) {
        return Err(CliError::Validation {
            field: "option".into(),
            reason: "--option only applies to --kind select".into(),
        });
    }
    Ok(match arg {
        FieldKindArg::Text => FieldKind::Text,
        FieldKindArg::Email => FieldKind::Email,
        FieldKindArg::Phone => FieldKind::Phone,
        FieldKindArg::Select => FieldKind::Select { options },
        FieldKindArg::Checkbox => FieldKind::Checkbox,
        FieldKindArg::Date => FieldKind::Date,
        FieldKindArg::Time => FieldKind::Time,
        FieldKindArg::Textarea => FieldKind::Textarea,
        FieldKindArg::Signature => FieldKind::Signature,
    })
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    dashboard: &Dashboard,
    args: FieldsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    // The library is static; no site needed.
    if matches!(args.command, FieldsCommand::Library) {
        let rows = library_rows();
        let out = output::render_list(
            &global.output,
            &rows,
            LibraryRow::clone,
            |r| r.id.to_owned(),
        );
        output::print_output(&out, global.quiet);
        return Ok(());
    }

    let site_key = util::require_site(args.site.as_deref())?;

    match args.command {
        FieldsCommand::List => {
            let site = dashboard.find_site(site_key).await?;
            let painter = Painter::new(global);
            let out = output::render_list(
                &global.output,
                &site.form_fields,
                |f| field_row(f, painter),
                |f| f.id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        FieldsCommand::Add {
            label,
            kind,
            required,
            options,
        } => {
            let kind = to_kind(kind, options)?;
            let mut id = String::new();
            util::edit_site(dashboard, site_key, |draft| {
                id = draft.add_field(&label, kind, required)?;
                Ok(())
            })
            .await?;
            output::note(global, &format!("Field '{label}' saved as {id}"));
            Ok(())
        }

        FieldsCommand::AddLibrary { id } => {
            util::edit_site(dashboard, site_key, |draft| {
                draft.add_library_field(&id)?;
                Ok(())
            })
            .await?;
            output::note(global, &format!("Library field {id} added"));
            Ok(())
        }

        FieldsCommand::Remove { id } => {
            util::edit_site(dashboard, site_key, |draft| {
                util::remove_entry(&mut draft.form_fields, "field", &id).map(drop)
            })
            .await?;
            output::note(global, &format!("Field {id} removed"));
            Ok(())
        }

        FieldsCommand::Move(mv) => {
            util::edit_site(dashboard, site_key, |draft| {
                util::move_entry(&mut draft.form_fields, "field", &mv.id, mv.position)
            })
            .await?;
            output::note(global, &format!("Field {} moved to {}", mv.id, mv.position));
            Ok(())
        }

        FieldsCommand::Require { id, off } => {
            util::edit_site(dashboard, site_key, |draft| {
                Ok(draft.set_field_required(&id, !off)?)
            })
            .await?;
            let state = if off { "optional" } else { "required" };
            output::note(global, &format!("Field {id} is now {state}"));
            Ok(())
        }

        FieldsCommand::Only { id, types } => {
            let summary = if types.is_empty() {
                "all visitor types".to_owned()
            } else {
                types.join(", ")
            };
            util::edit_site(dashboard, site_key, |draft| {
                Ok(draft.set_field_visitor_types(&id, types)?)
            })
            .await?;
            output::note(global, &format!("Field {id} shown for {summary}"));
            Ok(())
        }

        FieldsCommand::Library => Ok(()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn select_keeps_its_options() {
        let kind = to_kind(FieldKindArg::Select, vec!["Sales".into(), "Ops".into()]).unwrap();
        assert_eq!(
            kind,
            FieldKind::Select {
                options: vec!["Sales".into(), "Ops".into()]
            }
        );
        assert_eq!(kind_label(&kind), "select (Sales|Ops)");
    }

    #[test]
    fn options_on_a_text_field_are_rejected() {
        assert!(matches!(
            to_kind(FieldKindArg::Text, vec!["x".into()]),
            Err(CliError::Validation { .. })
        ));
    }

    #[test]
    fn library_lists_every_predefined_field() {
        let rows = library_rows();
        assert_eq!(rows.len(), FIELD_LIBRARY.len());
        assert!(rows.iter().any(|r| r.id == "nda" && r.kind == "signature"));
    }
}
