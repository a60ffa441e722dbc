use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Sequential identifiers, allocated by the store starting at 1.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct MedicationId(pub u64);

impl std::fmt::Display for MedicationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct LogId(pub u64);

impl std::fmt::Display for LogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a single scheduled dose.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    #[default]
    Pending,
    Taken,
    Missed,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Taken => "taken",
            Self::Missed => "missed",
        }
    }
}

impl std::fmt::Display for LogStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Medication
// ---------------------------------------------------------------------------

/// A tracked drug regimen.
///
/// Deleting a medication only clears `is_active`; the record and its logs
/// stay in the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub id: MedicationId,
    pub name: String,
    pub dosage: String,
    /// Free-form frequency label such as `once-daily`.
    pub frequency: String,
    /// Zero-padded `HH:MM` times, in the order they were given.
    pub times: Vec<String>,
    pub prescribed_by: Option<String>,
    pub instructions: Option<String>,
    pub is_active: bool,
    pub enable_smart_reminders: bool,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// MedicationLog
// ---------------------------------------------------------------------------

/// One scheduled dose of a medication on a given day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MedicationLog {
    pub id: LogId,
    pub medication_id: MedicationId,
    /// `HH:MM`; zero padding makes string order match time order.
    pub scheduled_time: String,
    pub status: LogStatus,
    /// `YYYY-MM-DD`
    pub date: String,
    pub taken_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_format() {
        assert_eq!(serde_json::to_string(&LogStatus::Missed).unwrap(), "\"missed\"");
        let parsed: LogStatus = serde_json::from_str("\"taken\"").unwrap();
        assert_eq!(parsed, LogStatus::Taken);
        assert!(serde_json::from_str::<LogStatus>("\"skipped\"").is_err());
    }

    #[test]
    fn test_medication_serializes_camel_case() {
        let med = Medication {
            id: MedicationId(4),
            name: "Metformin".into(),
            dosage: "500mg".into(),
            frequency: "twice-daily".into(),
            times: vec!["08:00".into(), "20:00".into()],
            prescribed_by: None,
            instructions: Some("With food".into()),
            is_active: true,
            enable_smart_reminders: false,
            created_at: Utc::now(),
        };

        let value = serde_json::to_value(&med).unwrap();
        assert_eq!(value["id"], 4);
        assert_eq!(value["prescribedBy"], serde_json::Value::Null);
        assert_eq!(value["isActive"], true);
        assert_eq!(value["enableSmartReminders"], false);
        assert!(value.get("createdAt").is_some());
    }
}
