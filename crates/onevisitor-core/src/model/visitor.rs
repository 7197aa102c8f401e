// ── Visitor domain types ──

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lifecycle state of a visitor record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum VisitorStatus {
    /// Also accepts the kiosk's legacy `active` spelling.
    #[strum(to_string = "checked-in", serialize = "active")]
    CheckedIn,
    CheckedOut,
    PreRegistered,
    NoShow,
    Overdue,
    EmergencySafe,
    EmergencyUnknown,
    /// Any status this client does not know about.
    Unknown,
}

impl VisitorStatus {
    pub fn is_on_site(self) -> bool {
        matches!(
            self,
            Self::CheckedIn | Self::Overdue | Self::EmergencySafe | Self::EmergencyUnknown
        )
    }
}

/// A visitor as recorded by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visitor {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub email: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub host_id: Option<String>,
    pub host_name: String,
    pub purpose: Option<String>,
    pub expected_duration: Option<String>,
    pub check_in_time: Option<DateTime<Utc>>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub photo_url: Option<String>,
    pub badge_id: Option<String>,
    pub status: VisitorStatus,
    pub location: Option<String>,
    pub agreement_signed: bool,
    pub signature_url: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_fields: BTreeMap<String, String>,
    pub door_access_granted: Option<bool>,
    pub last_door_access_time: Option<DateTime<Utc>>,
    pub visitor_type: Option<String>,
    pub site_id: Option<String>,
}

/// Filter applied to a visitor listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitorFilter {
    pub site_id: Option<String>,
    pub visitor_type: Option<String>,
    pub status: Option<VisitorStatus>,
    /// Case-insensitive match against name, company, email, and host.
    pub query: Option<String>,
}

impl VisitorFilter {
    pub fn matches(&self, visitor: &Visitor) -> bool {
        if let Some(site) = &self.site_id {
            if visitor.site_id.as_deref() != Some(site.as_str()) {
                return false;
            }
        }
        if let Some(kind) = &self.visitor_type {
            if visitor.visitor_type.as_deref() != Some(kind.as_str()) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if visitor.status != status {
                return false;
            }
        }
        match self.query.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(query) => {
                let needle = query.to_lowercase();
                [
                    Some(visitor.name.as_str()),
                    visitor.company.as_deref(),
                    visitor.email.as_deref(),
                    Some(visitor.host_name.as_str()),
                ]
                .into_iter()
                .flatten()
                .any(|hay| hay.to_lowercase().contains(&needle))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn visitor(name: &str, status: VisitorStatus) -> Visitor {
        Visitor {
            id: "v1".into(),
            tenant_id: "acme".into(),
            name: name.into(),
            email: Some("ada@example.com".into()),
            company: Some("Analytical Engines".into()),
            phone: None,
            host_id: Some("h1".into()),
            host_name: "Grace Hopper".into(),
            purpose: None,
            expected_duration: None,
            check_in_time: None,
            check_out_time: None,
            photo_url: None,
            badge_id: None,
            status,
            location: None,
            agreement_signed: true,
            signature_url: None,
            custom_fields: BTreeMap::new(),
            door_access_granted: None,
            last_door_access_time: None,
            visitor_type: Some("visitor".into()),
            site_id: Some("s1".into()),
        }
    }

    #[test]
    fn status_parses_kebab_case_and_legacy_active() {
        assert_eq!("no-show".parse::<VisitorStatus>().unwrap(), VisitorStatus::NoShow);
        assert_eq!("active".parse::<VisitorStatus>().unwrap(), VisitorStatus::CheckedIn);
        assert_eq!(VisitorStatus::CheckedIn.to_string(), "checked-in");
        assert!("bogus".parse::<VisitorStatus>().is_err());
    }

    #[test]
    fn emergency_statuses_count_as_on_site() {
        assert!(VisitorStatus::EmergencyUnknown.is_on_site());
        assert!(VisitorStatus::Overdue.is_on_site());
        assert!(!VisitorStatus::CheckedOut.is_on_site());
        assert!(!VisitorStatus::PreRegistered.is_on_site());
    }

    #[test]
    fn filter_by_query_is_case_insensitive() {
        let v = visitor("Ada Lovelace", VisitorStatus::CheckedIn);
        let filter = VisitorFilter {
            query: Some("ENGINES".into()),
            ..VisitorFilter::default()
        };
        assert!(filter.matches(&v));

        let filter = VisitorFilter {
            query: Some("babbage".into()),
            ..VisitorFilter::default()
        };
        assert!(!filter.matches(&v));
    }

    #[test]
    fn filter_by_status_and_site() {
        let v = visitor("Ada", VisitorStatus::CheckedOut);
        let filter = VisitorFilter {
            site_id: Some("s1".into()),
            status: Some(VisitorStatus::CheckedOut),
            ..VisitorFilter::default()
        };
        assert!(filter.matches(&v));

        let filter = VisitorFilter {
            site_id: Some("s2".into()),
            ..VisitorFilter::default()
        };
        assert!(!filter.matches(&v));
    }
}
