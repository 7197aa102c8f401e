//! `onevisitor checkin`: run the kiosk check-in flow from the terminal.
//!
//! Flags prefill the form. On a terminal, anything still missing is
//! prompted for step by step; otherwise the first incomplete step is
//! reported as an error listing every unmet requirement.

use std::collections::HashSet;
use std::io::IsTerminal;
use std::path::Path;
use std::time::Duration;

use dialoguer::{Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};

use onevisitor_core::{
    CheckInWizard, Dashboard, ExpectedDuration, FieldKind, FieldWidget, PhotoUpload, Requirement,
    Step, WizardError,
};

use crate::cli::{CheckinArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util::prompt_err;

// ── Prefill from flags ──────────────────────────────────────────────

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "on" => Some(true),
        "false" | "no" | "n" | "0" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Apply one `ID=VALUE` pair. Flag fields take yes/no style values.
fn apply_field(wizard: &mut CheckInWizard, pair: &str) -> Result<(), CliError> {
    let (id, value) = pair.split_once('=').ok_or_else(|| CliError::Validation {
        field: "field".into(),
        reason: format!("expected ID=VALUE, got '{pair}'"),
    })?;
    let id = id.trim();

    match wizard.set_text(id, value) {
        Err(WizardError::ExpectsFlag { field }) => {
            let flag = parse_flag(value).ok_or_else(|| CliError::Validation {
                field: field.clone(),
                reason: format!("'{value}' is not yes/no"),
            })?;
            wizard.set_flag(&field, flag)?;
            Ok(())
        }
        other => Ok(other?),
    }
}

fn load_photo(path: &Path) -> Result<PhotoUpload, CliError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let content_type = PhotoUpload::content_type_for(&file_name).ok_or_else(|| {
        CliError::Validation {
            field: "photo".into(),
            reason: format!("{file_name}: expected a jpeg, png, webp, or gif image"),
        }
    })?;
    Ok(PhotoUpload {
        content_type: content_type.to_owned(),
        bytes: std::fs::read(path)?,
        file_name,
    })
}

fn prefill(wizard: &mut CheckInWizard, args: &CheckinArgs) -> Result<(), CliError> {
    if let Some(ref id) = args.visitor_type {
        wizard.select_visitor_type(id)?;
    }
    for pair in &args.fields {
        apply_field(wizard, pair)?;
    }
    if let Some(ref duration) = args.duration {
        wizard.set_text("expectedDuration", duration)?;
    }
    if let Some(ref path) = args.photo {
        wizard.attach_photo(load_photo(path)?)?;
    }
    if args.sign {
        wizard.acknowledge_signature(true)?;
    }
    Ok(())
}

// ── Detail prompts ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum PromptKind {
    /// `(host id, label)` pairs.
    Host(Vec<(String, String)>),
    Flag,
    Choice(Vec<String>),
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FieldPrompt {
    id: String,
    label: String,
    required: bool,
    kind: PromptKind,
}

/// What the details step asks for, in display order. Name and email are
/// collected even when the site does not configure them.
fn detail_prompts(wizard: &CheckInWizard) -> Vec<FieldPrompt> {
    let plan = wizard.render_plan();
    let mut prompts = Vec::new();

    for (id, label) in [("name", "Full Name"), ("email", "Email")] {
        if !plan.iter().any(|p| p.field.id == id) {
            prompts.push(FieldPrompt {
                id: id.into(),
                label: label.into(),
                required: true,
                kind: PromptKind::Text,
            });
        }
    }

    for p in plan {
        let kind = match p.widget {
            FieldWidget::HostPicker { hosts } => PromptKind::Host(
                hosts
                    .iter()
                    .map(|h| {
                        let label = match h.department.as_deref() {
                            Some(d) if !d.is_empty() => format!("{} ({d})", h.name),
                            _ => h.name.clone(),
                        };
                        (h.id.clone(), label)
                    })
                    .collect(),
            ),
            FieldWidget::Input(kind) if kind.is_flag() => PromptKind::Flag,
            FieldWidget::Input(FieldKind::Select { options }) if !options.is_empty() => {
                PromptKind::Choice(options.clone())
            }
            FieldWidget::Input(_) => PromptKind::Text,
        };
        prompts.push(FieldPrompt {
            id: p.field.id.clone(),
            label: p.field.label.clone(),
            required: p.required,
            kind,
        });
    }
    prompts
}

/// Field ids behind a failed details check.
fn failing_ids(missing: &[Requirement]) -> HashSet<String> {
    missing
        .iter()
        .filter_map(|r| match r {
            Requirement::MissingField { id, .. } => Some(id.clone()),
            Requirement::InvalidEmail => Some("email".into()),
            Requirement::UnknownHost { .. } => Some("host".into()),
            _ => None,
        })
        .collect()
}

fn ask(wizard: &mut CheckInWizard, prompt: &FieldPrompt) -> Result<(), CliError> {
    let label = if prompt.required {
        format!("{} *", prompt.label)
    } else {
        prompt.label.clone()
    };

    match &prompt.kind {
        PromptKind::Host(hosts) if hosts.is_empty() => {}
        PromptKind::Host(hosts) => {
            let mut items: Vec<&str> = hosts.iter().map(|(_, l)| l.as_str()).collect();
            if !prompt.required {
                items.push("(no host)");
            }
            let choice = Select::new()
                .with_prompt(label)
                .items(&items)
                .default(0)
                .interact()
                .map_err(prompt_err)?;
            let id = hosts.get(choice).map_or("", |(id, _)| id.as_str());
            wizard.set_text(&prompt.id, id)?;
        }
        PromptKind::Flag => {
            let value = Confirm::new()
                .with_prompt(label)
                .default(false)
                .interact()
                .map_err(prompt_err)?;
            wizard.set_flag(&prompt.id, value)?;
        }
        PromptKind::Choice(options) => {
            let choice = Select::new()
                .with_prompt(label)
                .items(options)
                .default(0)
                .interact()
                .map_err(prompt_err)?;
            if let Some(option) = options.get(choice) {
                wizard.set_text(&prompt.id, option)?;
            }
        }
        PromptKind::Text => {
            let value: String = Input::new()
                .with_prompt(label)
                .allow_empty(!prompt.required)
                .interact_text()
                .map_err(prompt_err)?;
            wizard.set_text(&prompt.id, &value)?;
        }
    }
    Ok(())
}

fn ask_duration(wizard: &mut CheckInWizard) -> Result<(), CliError> {
    if wizard.data().expected_duration.is_some() {
        return Ok(());
    }
    let mut items: Vec<&str> = ExpectedDuration::ALL.iter().map(|d| d.label()).collect();
    items.push("Not sure");
    let choice = Select::new()
        .with_prompt("Expected duration")
        .items(&items)
        .default(items.len() - 1)
        .interact()
        .map_err(prompt_err)?;
    wizard.set_expected_duration(ExpectedDuration::ALL.get(choice).copied())?;
    Ok(())
}

// ── Steps ───────────────────────────────────────────────────────────

fn choose_visitor_type(wizard: &mut CheckInWizard) -> Result<(), CliError> {
    let types: Vec<(String, String)> = wizard
        .site()
        .visitor_types
        .iter()
        .map(|t| (t.id.clone(), t.name.clone()))
        .collect();
    if types.is_empty() {
        return Ok(());
    }
    let names: Vec<&str> = types.iter().map(|(_, n)| n.as_str()).collect();
    let choice = Select::new()
        .with_prompt("Visitor type")
        .items(&names)
        .default(0)
        .interact()
        .map_err(prompt_err)?;
    if let Some((id, _)) = types.get(choice) {
        wizard.select_visitor_type(id)?;
    }
    Ok(())
}

/// Prompt for details. The first pass asks for everything still empty;
/// later passes only for what failed validation. Returns whether anything
/// was asked.
fn fill_details(wizard: &mut CheckInWizard, first_pass: bool) -> Result<bool, CliError> {
    let retry = match wizard.validate_step(Step::Details) {
        Ok(()) if !first_pass => return Ok(false),
        Ok(()) => HashSet::new(),
        Err(incomplete) => {
            if !first_pass {
                for requirement in &incomplete.missing {
                    eprintln!("  ! {requirement}");
                }
            }
            failing_ids(&incomplete.missing)
        }
    };

    let mut asked = false;
    for prompt in detail_prompts(wizard) {
        let filled = wizard.data().value(&prompt.id).is_some_and(|v| v.is_filled());
        let wanted = if first_pass {
            !filled || retry.contains(&prompt.id)
        } else {
            retry.contains(&prompt.id)
        };
        if wanted && !matches!(&prompt.kind, PromptKind::Host(h) if h.is_empty()) {
            ask(wizard, &prompt)?;
            asked = true;
        }
    }
    if first_pass {
        ask_duration(wizard)?;
    }
    Ok(asked)
}

fn ask_photo(wizard: &mut CheckInWizard) -> Result<(), CliError> {
    if let Some(name) = wizard.data().photo.as_ref().map(|p| p.file_name.clone()) {
        let keep = Confirm::new()
            .with_prompt(format!("Keep photo {name}?"))
            .default(true)
            .interact()
            .map_err(prompt_err)?;
        if keep {
            return Ok(());
        }
        wizard.clear_photo();
    }
    let required = wizard.site().check_in_policy.photo_required;
    let prompt = if required {
        "Photo file *"
    } else {
        "Photo file (blank to skip)"
    };
    let path: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(!required)
        .interact_text()
        .map_err(prompt_err)?;
    if !path.trim().is_empty() {
        wizard.attach_photo(load_photo(Path::new(path.trim()))?)?;
    }
    Ok(())
}

fn review_summary(wizard: &CheckInWizard) -> String {
    let data = wizard.data();
    let mut pairs: Vec<(&str, String)> = vec![("Site", wizard.site().name.clone())];
    if let Some(t) = data
        .visitor_type
        .as_deref()
        .and_then(|id| wizard.site().visitor_type(id))
    {
        pairs.push(("Visitor type", t.name.clone()));
    }
    for field in wizard.visible_fields() {
        if field.is_host_picker() {
            continue;
        }
        if let Some(value) = data.value(&field.id) {
            pairs.push((field.label.as_str(), value.to_string()));
        }
    }
    for (id, label) in [("name", "Full Name"), ("email", "Email")] {
        let shown = pairs.iter().any(|(l, _)| *l == label);
        match data.value(id) {
            Some(value) if !shown => pairs.push((label, value.to_string())),
            _ => {}
        }
    }
    if let Some(host) = wizard.host_name() {
        pairs.push(("Host", host.to_owned()));
    }
    if let Some(duration) = data.expected_duration {
        pairs.push(("Duration", duration.label().to_owned()));
    }
    if let Some(ref photo) = data.photo {
        pairs.push(("Photo", photo.file_name.clone()));
    }
    output::detail_block(&pairs)
}

fn spinner(global: &GlobalOpts) -> Option<ProgressBar> {
    if global.quiet || !std::io::stderr().is_terminal() {
        return None;
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style);
    }
    bar.set_message("Submitting check-in...");
    bar.enable_steady_tick(Duration::from_millis(100));
    Some(bar)
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    dashboard: &Dashboard,
    args: CheckinArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let interactive = std::io::stdin().is_terminal();

    let path = match args.site_path.clone() {
        Some(path) => path,
        None if interactive => Input::new()
            .with_prompt("Kiosk path")
            .interact_text()
            .map_err(prompt_err)?,
        None => {
            return Err(CliError::Validation {
                field: "site_path".into(),
                reason: "pass the kiosk path, e.g. `onevisitor checkin acme-hq-lobby`".into(),
            });
        }
    };

    let mut wizard = dashboard.start_check_in(&path).await?;
    prefill(&mut wizard, &args)?;
    output::note(
        global,
        &format!("Checking in at {}", output::Painter::new(global).heading(&wizard.site().name)),
    );

    while wizard.step() < Step::Review {
        if interactive {
            match wizard.step() {
                Step::VisitorTypeSelect if !wizard.can_advance() => {
                    choose_visitor_type(&mut wizard)?;
                }
                Step::Details => {
                    // Re-prompt until valid, or until nothing left can be asked.
                    let mut first_pass = true;
                    while fill_details(&mut wizard, first_pass)? && !wizard.can_advance() {
                        first_pass = false;
                    }
                }
                Step::Photo => ask_photo(&mut wizard)?,
                _ => {}
            }
        }
        wizard.next()?;
    }

    // ── Review ──
    if interactive {
        eprintln!("\n{}", review_summary(&wizard));
        if wizard.site().check_in_policy.signature_required && !wizard.data().signature {
            let signed = Confirm::new()
                .with_prompt("I agree to the visitor terms and conditions")
                .default(false)
                .interact()
                .map_err(prompt_err)?;
            wizard.acknowledge_signature(signed)?;
        }
        let submit = Confirm::new()
            .with_prompt("Submit check-in?")
            .default(true)
            .interact()
            .map_err(prompt_err)?;
        if !submit {
            output::note(global, "Check-in cancelled");
            return Ok(());
        }
    }

    let bar = spinner(global);
    let result = wizard.submit(dashboard.client()).await.map(Clone::clone);
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    let visitor = result?;

    let host = wizard.host_name().unwrap_or(visitor.host_name.as_str()).to_owned();
    let duration = wizard
        .data()
        .expected_duration
        .map(ExpectedDuration::label)
        .or_else(|| visitor.expected_duration.as_deref())
        .unwrap_or("-")
        .to_owned();

    let out = output::render_single(
        &global.output,
        &visitor,
        |v| {
            output::detail_block(&[
                ("Checked in", v.name.clone()),
                ("Host", if host.is_empty() { "-".into() } else { host.clone() }),
                ("Duration", duration.clone()),
                ("Visitor ID", v.id.clone()),
            ])
        },
        |v| v.id.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use onevisitor_core::{FormField, Host, SiteConfig, VisitorType};

    use super::*;

    fn site() -> SiteConfig {
        let mut site = SiteConfig::new("acme-corp", "Lobby", "acme-corp-lobby");
        site.id = "s1".into();
        site.visitor_types = vec![VisitorType {
            id: "guest".into(),
            name: "Guest".into(),
            icon: None,
            required_fields: Vec::new(),
        }];
        site.form_fields = vec![
            FormField::new("name", "Full Name", FieldKind::Text).required(),
            FormField::new("host", "Host", FieldKind::Select { options: Vec::new() }),
            FormField::new("nda", "NDA Signature", FieldKind::Signature),
            FormField::new(
                "dept",
                "Department",
                FieldKind::Select {
                    options: vec!["Sales".into(), "Ops".into()],
                },
            ),
        ];
        site.hosts = vec![Host {
            id: "h1".into(),
            name: "Grace Hopper".into(),
            email: "grace@acme.com".into(),
            phone: None,
            department: Some("Engineering".into()),
            active: Some(true),
        }];
        site
    }

    #[test]
    fn flags_accept_common_spellings() {
        assert_eq!(parse_flag("Yes"), Some(true));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn field_pairs_route_to_text_or_flag() {
        let mut wizard = CheckInWizard::new(site());
        apply_field(&mut wizard, "name=Ada Lovelace").unwrap();
        apply_field(&mut wizard, "nda=yes").unwrap();
        assert_eq!(wizard.data().name, "Ada Lovelace");
        assert!(wizard.data().custom.contains_key("nda"));
        assert!(matches!(
            apply_field(&mut wizard, "no-equals-sign"),
            Err(CliError::Validation { .. })
        ));
    }

    #[test]
    fn prompts_cover_unconfigured_email_and_widgets() {
        let wizard = CheckInWizard::new(site());
        let prompts = detail_prompts(&wizard);
        let ids: Vec<&str> = prompts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["email", "name", "host", "nda", "dept"]);

        let host = prompts.iter().find(|p| p.id == "host").unwrap();
        assert_eq!(
            host.kind,
            PromptKind::Host(vec![("h1".into(), "Grace Hopper (Engineering)".into())])
        );
        assert_eq!(prompts.iter().find(|p| p.id == "nda").unwrap().kind, PromptKind::Flag);
        assert!(matches!(
            prompts.iter().find(|p| p.id == "dept").unwrap().kind,
            PromptKind::Choice(_)
        ));
    }

    #[test]
    fn failing_ids_map_requirements_to_fields() {
        let ids = failing_ids(&[
            Requirement::InvalidEmail,
            Requirement::UnknownHost { id: "h9".into() },
            Requirement::PhotoRequired,
        ]);
        assert!(ids.contains("email") && ids.contains("host"));
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn review_lists_answers_with_host_name() {
        let mut wizard = CheckInWizard::new(site());
        apply_field(&mut wizard, "name=Ada Lovelace").unwrap();
        apply_field(&mut wizard, "email=ada@example.com").unwrap();
        apply_field(&mut wizard, "host=h1").unwrap();
        wizard.set_text("expectedDuration", "2hours").unwrap();

        let summary = review_summary(&wizard);
        assert!(summary.contains("Ada Lovelace"));
        assert!(summary.contains("Grace Hopper"));
        assert!(summary.contains("2 hours"));
        assert!(summary.contains("ada@example.com"));
    }
}
