//! # medtrack-shared
//!
//! Types shared by the MedTrack store and server: the medication and
//! dose-log entities, their insert/patch payloads with field validation, and
//! the insight generator's request/response contract.

pub mod constants;
pub mod error;
pub mod input;
pub mod insight;
pub mod types;
pub mod validate;

pub use error::ValidationError;
pub use input::{MedicationLogPatch, MedicationPatch, NewMedication, NewMedicationLog};
pub use insight::{AiInsight, InsightKind, InsightPriority, InsightRequest, ReminderRequest};
pub use types::{LogId, LogStatus, Medication, MedicationId, MedicationLog};
