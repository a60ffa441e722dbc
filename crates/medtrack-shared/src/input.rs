//! Insert and patch payloads accepted by the store.
//!
//! None of these types carries `id` or `createdAt`: both are assigned by the
//! store and cannot be overridden. Unknown JSON keys are ignored, so a client
//! echoing a full record back in an update changes only the mutable fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;
use crate::types::{LogStatus, MedicationId};
use crate::validate::{check_date, check_non_empty, check_time_of_day, check_times};

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`) on nullable patch fields.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Treat blank optional text the same as a missing value.
pub fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Medication
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewMedication {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub times: Vec<String>,
    #[serde(default)]
    pub prescribed_by: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
    /// Defaults to `true`.
    #[serde(default)]
    pub is_active: Option<bool>,
    /// Defaults to `false`.
    #[serde(default)]
    pub enable_smart_reminders: Option<bool>,
}

impl NewMedication {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_non_empty("name", &self.name)?;
        check_non_empty("dosage", &self.dosage)?;
        check_non_empty("frequency", &self.frequency)?;
        check_times(&self.times)
    }
}

/// Partial update of a [`Medication`](crate::types::Medication).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MedicationPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub times: Option<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub prescribed_by: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub instructions: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_smart_reminders: Option<bool>,
}

impl MedicationPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            check_non_empty("name", name)?;
        }
        if let Some(dosage) = &self.dosage {
            check_non_empty("dosage", dosage)?;
        }
        if let Some(frequency) = &self.frequency {
            check_non_empty("frequency", frequency)?;
        }
        if let Some(times) = &self.times {
            check_times(times)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MedicationLog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewMedicationLog {
    pub medication_id: MedicationId,
    pub scheduled_time: String,
    pub status: LogStatus,
    pub date: String,
    #[serde(default)]
    pub taken_at: Option<DateTime<Utc>>,
}

impl NewMedicationLog {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_time_of_day("scheduledTime", &self.scheduled_time)?;
        check_date("date", &self.date)
    }
}

/// Partial update of a [`MedicationLog`](crate::types::MedicationLog).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MedicationLogPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medication_id: Option<MedicationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<LogStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub taken_at: Option<Option<DateTime<Utc>>>,
}

impl MedicationLogPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(time) = &self.scheduled_time {
            check_time_of_day("scheduledTime", time)?;
        }
        if let Some(date) = &self.date {
            check_date("date", date)?;
        }
        Ok(())
    }
}
