//! Quarantine selection policies
//!
//! Which incidents count as "selected for quarantine" is a policy decision,
//! injected into the incident service rather than hardcoded.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::incident::QuarantineIncident;
use crate::validation::ValidationError;

/// Predicate deciding whether an incident is selected for quarantine.
pub trait QuarantinePolicy: Send + Sync {
    fn selects(&self, incident: &QuarantineIncident, today: NaiveDate) -> bool;
}

impl<F> QuarantinePolicy for F
where
    F: Fn(&QuarantineIncident, NaiveDate) -> bool + Send + Sync,
{
    fn selects(&self, incident: &QuarantineIncident, today: NaiveDate) -> bool {
        self(incident, today)
    }
}

/// Quarantine has an end date that has not passed yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActiveQuarantine;

impl QuarantinePolicy for ActiveQuarantine {
    fn selects(&self, incident: &QuarantineIncident, today: NaiveDate) -> bool {
        matches!(incident.until, Some(until) if until >= today)
    }
}

/// Every stored incident.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllIncidents;

impl QuarantinePolicy for AllIncidents {
    fn selects(&self, _incident: &QuarantineIncident, _today: NaiveDate) -> bool {
        true
    }
}

/// Incidents still waiting for an end date.
#[derive(Debug, Clone, Copy, Default)]
pub struct PendingDecision;

impl QuarantinePolicy for PendingDecision {
    fn selects(&self, incident: &QuarantineIncident, _today: NaiveDate) -> bool {
        incident.until.is_none()
    }
}

/// Named policy, as written in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionKind {
    #[default]
    Active,
    All,
    Pending,
}

impl SelectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::All => "all",
            Self::Pending => "pending",
        }
    }

    pub fn policy(&self) -> Arc<dyn QuarantinePolicy> {
        match self {
            Self::Active => Arc::new(ActiveQuarantine),
            Self::All => Arc::new(AllIncidents),
            Self::Pending => Arc::new(PendingDecision),
        }
    }
}

impl fmt::Display for SelectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SelectionKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "all" => Ok(Self::All),
            "pending" => Ok(Self::Pending),
            _ => Err(ValidationError::InvalidVariant {
                field: "quarantine.selection",
                value: s.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 4, d).unwrap()
    }

    fn incident(until: Option<NaiveDate>) -> QuarantineIncident {
        QuarantineIncident {
            id: Uuid::new_v4(),
            patient_id: "p".into(),
            event_date: day(1),
            until,
            comment: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn active_includes_last_day() {
        let policy = ActiveQuarantine;
        assert!(policy.selects(&incident(Some(day(14))), day(14)));
        assert!(!policy.selects(&incident(Some(day(13))), day(14)));
        assert!(!policy.selects(&incident(None), day(14)));
    }

    #[test]
    fn pending_and_all() {
        assert!(PendingDecision.selects(&incident(None), day(2)));
        assert!(!PendingDecision.selects(&incident(Some(day(3))), day(2)));
        assert!(AllIncidents.selects(&incident(Some(day(1))), day(30)));
    }

    #[test]
    fn closures_are_policies() {
        let commented = |i: &QuarantineIncident, _: NaiveDate| i.comment.is_some();
        let mut with_comment = incident(None);
        with_comment.comment = Some("contact of index case".into());
        assert!(commented.selects(&with_comment, day(1)));
        assert!(!commented.selects(&incident(None), day(1)));
    }

    #[test]
    fn parses_names() {
        assert_eq!("ACTIVE".parse::<SelectionKind>().unwrap(), SelectionKind::Active);
        assert_eq!("pending".parse::<SelectionKind>().unwrap(), SelectionKind::Pending);
        assert!("everyone".parse::<SelectionKind>().is_err());
        assert_eq!(SelectionKind::default(), SelectionKind::Active);
    }
}
