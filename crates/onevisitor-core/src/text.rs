// ── Text helpers: slugs, email checks, relative times ──

use chrono::{DateTime, Utc};
use validator::ValidateEmail;

/// Lowercase ASCII slug: alphanumerics kept, every other run becomes one `-`.
///
/// `slugify("Acme Corp!") == "acme-corp"`. May return an empty string when
/// the input has no ASCII alphanumerics.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut last_was_dash = false;

    for ch in input.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
            last_was_dash = false;
        } else if !last_was_dash {
            slug.push('-');
            last_was_dash = true;
        }
    }

    slug.trim_matches('-').to_owned()
}

/// `true` if `s` is already in slug form.
pub fn is_slug(s: &str) -> bool {
    !s.is_empty() && slugify(s) == s
}

pub fn is_valid_email(s: &str) -> bool {
    let s = s.trim();
    !s.is_empty() && s.validate_email()
}

/// `#rrggbb`, case-insensitive.
pub fn is_hex_color(s: &str) -> bool {
    s.len() == 7
        && s.starts_with('#')
        && s.chars().skip(1).all(|c| c.is_ascii_hexdigit())
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}

/// Human-friendly age of `ts` relative to `now`; older than a week shows the date.
pub fn format_relative(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(ts);
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if elapsed.num_seconds() < 60 {
        "just now".into()
    } else if minutes < 60 {
        plural(minutes, "minute")
    } else if hours < 24 {
        plural(hours, "hour")
    } else if days < 7 {
        plural(days, "day")
    } else {
        ts.format("%b %-d, %Y").to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("Acme Corp!"), "acme-corp");
        assert_eq!(slugify("HQ Lobby"), "hq-lobby");
    }

    #[test]
    fn slugify_trims_and_collapses() {
        assert_eq!(slugify("  Main   Entrance  "), "main-entrance");
        assert_eq!(slugify("Warehouse -- Door #2"), "warehouse-door-2");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn slugify_unicode_punctuation() {
        assert_eq!(slugify("Café — “Front” Desk…"), "caf-front-desk");
        assert_eq!(slugify("Straße"), "stra-e");
    }

    #[test]
    fn slugs_are_stable() {
        let once = slugify("Globex Industries (West)");
        assert_eq!(once, "globex-industries-west");
        assert!(is_slug(&once));
        assert!(!is_slug("Not A Slug"));
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("ada@example.com"));
        assert!(is_valid_email(" ada@example.com "));
        assert!(!is_valid_email("ada@"));
        assert!(!is_valid_email("not an email"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn hex_colors() {
        assert!(is_hex_color("#3498db"));
        assert!(is_hex_color("#3B82F6"));
        assert!(!is_hex_color("3498db"));
        assert!(!is_hex_color("#34d"));
        assert!(!is_hex_color("#zzzzzz"));
    }

    #[test]
    fn relative_times() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        assert_eq!(format_relative(now - Duration::seconds(5), now), "just now");
        assert_eq!(format_relative(now - Duration::minutes(1), now), "1 minute ago");
        assert_eq!(format_relative(now - Duration::minutes(42), now), "42 minutes ago");
        assert_eq!(format_relative(now - Duration::hours(3), now), "3 hours ago");
        assert_eq!(format_relative(now - Duration::days(2), now), "2 days ago");
        assert_eq!(format_relative(now - Duration::days(30), now), "Apr 10, 2024");
        assert_eq!(format_relative(now + Duration::minutes(5), now), "just now");
    }
}
