// ── CSV export ──

use chrono::{NaiveDate, SecondsFormat};

use crate::error::CoreError;
use crate::model::Visitor;

pub const VISITOR_COLUMNS: [&str; 10] = [
    "Site",
    "Visitor Name",
    "Company",
    "Type",
    "Host",
    "Check-In Time",
    "Status",
    "Email",
    "Phone",
    "Purpose",
];

/// One export row: the visitor plus the display name of its site.
#[derive(Debug, Clone, Copy)]
pub struct VisitorRow<'a> {
    pub site_name: &'a str,
    pub visitor: &'a Visitor,
}

/// Render visitors as RFC 4180 CSV with a header row.
///
/// Check-in times are RFC 3339 in UTC; absent values are empty cells.
pub fn visitor_csv<'a, I>(rows: I) -> Result<String, CoreError>
where
    I: IntoIterator<Item = VisitorRow<'a>>,
{
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());
    writer.write_record(VISITOR_COLUMNS).map_err(export_err)?;

    for VisitorRow { site_name, visitor: v } in rows {
        let check_in = v
            .check_in_time
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_default();
        let status = v.status.to_string();
        writer
            .write_record([
                site_name,
                v.name.as_str(),
                v.company.as_deref().unwrap_or_default(),
                v.visitor_type.as_deref().unwrap_or_default(),
                v.host_name.as_str(),
                check_in.as_str(),
                status.as_str(),
                v.email.as_deref().unwrap_or_default(),
                v.phone.as_deref().unwrap_or_default(),
                v.purpose.as_deref().unwrap_or_default(),
            ])
            .map_err(export_err)?;
    }

    let bytes = writer.into_inner().map_err(|e| CoreError::Export {
        message: e.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|e| CoreError::Export {
        message: e.to_string(),
    })
}

fn export_err(e: csv::Error) -> CoreError {
    CoreError::Export {
        message: e.to_string(),
    }
}

/// `visitors` + 2024-05-10 -> `visitors_2024-05-10.csv`. A trailing `.csv`
/// on the stem is dropped first.
pub fn export_filename(stem: &str, date: NaiveDate) -> String {
    let stem = stem.strip_suffix(".csv").unwrap_or(stem);
    format!("{stem}_{}.csv", date.format("%Y-%m-%d"))
}
