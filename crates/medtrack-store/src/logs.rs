use chrono::Utc;
use medtrack_shared::{LogId, LogStatus, MedicationId, MedicationLog, MedicationLogPatch, NewMedicationLog};
use tracing::debug;

use crate::error::{Entity, Result, StoreError};
use crate::store::MemStore;

fn not_found(id: LogId) -> StoreError {
    StoreError::NotFound {
        entity: Entity::MedicationLog,
        id: id.0,
    }
}

impl MemStore {
    /// All logs, optionally narrowed to one medication and/or one date,
    /// ordered by scheduled time.
    pub fn list_medication_logs(
        &self,
        medication_id: Option<MedicationId>,
        date: Option<&str>,
    ) -> Result<Vec<MedicationLog>> {
        let state = self.lock()?;
        Ok(state.logs_matching(medication_id, date))
    }

    /// Store a log as given. The referenced medication is not checked and
    /// duplicates are not rejected.
    pub fn create_medication_log(&self, input: NewMedicationLog) -> Result<MedicationLog> {
        input.validate()?;

        let mut state = self.lock()?;
        let log = state.insert_log(input);

        debug!(
            id = %log.id,
            medication = %log.medication_id,
            date = %log.date,
            status = %log.status,
            "Medication log created"
        );
        Ok(log)
    }

    pub fn update_medication_log(&self, id: LogId, patch: MedicationLogPatch) -> Result<MedicationLog> {
        patch.validate()?;

        let mut state = self.lock()?;
        let log = state.logs.get_mut(&id).ok_or_else(|| not_found(id))?;

        if let Some(medication_id) = patch.medication_id {
            log.medication_id = medication_id;
        }
        if let Some(time) = patch.scheduled_time {
            log.scheduled_time = time;
        }
        if let Some(status) = patch.status {
            log.status = status;
        }
        if let Some(date) = patch.date {
            log.date = date;
        }
        if let Some(taken_at) = patch.taken_at {
            log.taken_at = taken_at;
        }

        debug!(id = %id, status = %log.status, "Medication log updated");
        Ok(log.clone())
    }

    /// Flip a log to `taken`, stamped with the current instant.
    pub fn mark_log_taken(&self, id: LogId) -> Result<MedicationLog> {
        let mut state = self.lock()?;
        let log = state.logs.get_mut(&id).ok_or_else(|| not_found(id))?;
        log.status = LogStatus::Taken;
        log.taken_at = Some(Utc::now());

        debug!(id = %id, medication = %log.medication_id, "Dose marked taken");
        Ok(log.clone())
    }
}
