use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// CPFR stage a forecast or shipment signal belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
    Sales,
    Factory,
    Shipping,
    Transit,
    Warehouse,
}

impl Milestone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Milestone::Sales => "sales",
            Milestone::Factory => "factory",
            Milestone::Shipping => "shipping",
            Milestone::Transit => "transit",
            Milestone::Warehouse => "warehouse",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "sales" => Some(Milestone::Sales),
            "factory" => Some(Milestone::Factory),
            "shipping" => Some(Milestone::Shipping),
            "transit" => Some(Milestone::Transit),
            "warehouse" => Some(Milestone::Warehouse),
            _ => None,
        }
    }
}

/// Per-milestone signal value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SignalStatus {
    #[default]
    Unknown,
    Awaiting,
    Submitted,
    Accepted,
    Rejected,
}

impl SignalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalStatus::Unknown => "unknown",
            SignalStatus::Awaiting => "awaiting",
            SignalStatus::Submitted => "submitted",
            SignalStatus::Accepted => "accepted",
            SignalStatus::Rejected => "rejected",
        }
    }

    /// Unrecognized values are stored as `unknown`
    pub fn from_str_lossy(value: &str) -> Self {
        match value {
            "awaiting" => SignalStatus::Awaiting,
            "submitted" => SignalStatus::Submitted,
            "accepted" => SignalStatus::Accepted,
            "rejected" => SignalStatus::Rejected,
            _ => SignalStatus::Unknown,
        }
    }
}

/// Appends a status-history line `[YYYY-MM-DD] MILESTONE → status: notes`.
pub fn append_milestone_note(
    existing: Option<&str>,
    date: NaiveDate,
    milestone: Milestone,
    status: SignalStatus,
    notes: &str,
) -> String {
    let line = format!(
        "[{}] {} → {}: {}",
        date.format("%Y-%m-%d"),
        milestone.as_str().to_uppercase(),
        status.as_str(),
        notes
    );
    match existing {
        Some(prev) if !prev.is_empty() => format!("{}\n{}", prev, line),
        _ => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_is_appended_on_new_line() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let first = append_milestone_note(
            None,
            date,
            Milestone::Factory,
            SignalStatus::Accepted,
            "capacity confirmed",
        );
        assert_eq!(first, "[2025-03-14] FACTORY → accepted: capacity confirmed");

        let second = append_milestone_note(
            Some(&first),
            date,
            Milestone::Transit,
            SignalStatus::Awaiting,
            "booked vessel",
        );
        assert_eq!(
            second,
            "[2025-03-14] FACTORY → accepted: capacity confirmed\n[2025-03-14] TRANSIT → awaiting: booked vessel"
        );
    }

    #[test]
    fn empty_existing_notes_are_replaced() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let note = append_milestone_note(Some(""), date, Milestone::Sales, SignalStatus::Submitted, "ok");
        assert_eq!(note, "[2025-01-02] SALES → submitted: ok");
    }

    #[test]
    fn milestone_parse_rejects_unknown() {
        assert_eq!(Milestone::parse("shipping"), Some(Milestone::Shipping));
        assert_eq!(Milestone::parse("customs"), None);
        assert_eq!(SignalStatus::from_str_lossy("bogus"), SignalStatus::Unknown);
    }
}
