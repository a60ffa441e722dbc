use chrono::Utc;
use medtrack_shared::input::blank_to_none;
use medtrack_shared::{
    LogStatus, Medication, MedicationId, MedicationPatch, NewMedication, NewMedicationLog,
};
use tracing::{debug, info};

use crate::error::{Entity, Result, StoreError};
use crate::store::MemStore;

fn not_found(id: MedicationId) -> StoreError {
    StoreError::NotFound {
        entity: Entity::Medication,
        id: id.0,
    }
}

impl MemStore {
    /// Active medications in insertion order.
    pub fn list_medications(&self) -> Result<Vec<Medication>> {
        let state = self.lock()?;
        Ok(state
            .medications
            .values()
            .filter(|med| med.is_active)
            .cloned()
            .collect())
    }

    /// Look up a medication, active or not.
    pub fn get_medication(&self, id: MedicationId) -> Result<Medication> {
        let state = self.lock()?;
        state.medications.get(&id).cloned().ok_or_else(|| not_found(id))
    }

    /// Store a new medication and one pending log per scheduled time, dated
    /// today.
    ///
    /// Logs are only generated for the creation date.
    pub fn create_medication(&self, input: NewMedication) -> Result<Medication> {
        input.validate()?;
        let today = self.today_string();

        let mut state = self.lock()?;
        let id = state.allocate_medication_id();
        let medication = Medication {
            id,
            name: input.name,
            dosage: input.dosage,
            frequency: input.frequency,
            times: input.times,
            prescribed_by: blank_to_none(input.prescribed_by),
            instructions: blank_to_none(input.instructions),
            is_active: input.is_active.unwrap_or(true),
            enable_smart_reminders: input.enable_smart_reminders.unwrap_or(false),
            created_at: Utc::now(),
        };
        state.medications.insert(id, medication.clone());

        for time in &medication.times {
            state.insert_log(NewMedicationLog {
                medication_id: id,
                scheduled_time: time.clone(),
                status: LogStatus::Pending,
                date: today.clone(),
                taken_at: None,
            });
        }

        info!(
            id = %id,
            name = %medication.name,
            doses = medication.times.len(),
            date = %today,
            "Medication created"
        );
        Ok(medication)
    }

    /// Merge `patch` over the stored record. Existing logs are left alone,
    /// even when `times` changes.
    pub fn update_medication(&self, id: MedicationId, patch: MedicationPatch) -> Result<Medication> {
        patch.validate()?;

        let mut state = self.lock()?;
        let medication = state.medications.get_mut(&id).ok_or_else(|| not_found(id))?;

        if let Some(name) = patch.name {
            medication.name = name;
        }
        if let Some(dosage) = patch.dosage {
            medication.dosage = dosage;
        }
        if let Some(frequency) = patch.frequency {
            medication.frequency = frequency;
        }
        if let Some(times) = patch.times {
            medication.times = times;
        }
        if let Some(prescribed_by) = patch.prescribed_by {
            medication.prescribed_by = prescribed_by;
        }
        if let Some(instructions) = patch.instructions {
            medication.instructions = instructions;
        }
        if let Some(is_active) = patch.is_active {
            medication.is_active = is_active;
        }
        if let Some(enable) = patch.enable_smart_reminders {
            medication.enable_smart_reminders = enable;
        }

        debug!(id = %id, "Medication updated");
        Ok(medication.clone())
    }

    /// Soft delete: clears `is_active`. Idempotent.
    pub fn delete_medication(&self, id: MedicationId) -> Result<()> {
        let mut state = self.lock()?;
        let medication = state.medications.get_mut(&id).ok_or_else(|| not_found(id))?;
        medication.is_active = false;

        info!(id = %id, "Medication deactivated");
        Ok(())
    }

    pub fn active_medications_count(&self) -> Result<usize> {
        let state = self.lock()?;
        Ok(state.medications.values().filter(|m| m.is_active).count())
    }
}
