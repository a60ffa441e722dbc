//! Response shapes and computations behind the dashboard endpoints.

use std::collections::BTreeMap;

use chrono::{NaiveDateTime, NaiveTime};
use medtrack_shared::constants::TIME_FORMAT;
use medtrack_shared::{LogStatus, Medication, MedicationId, MedicationLog};
use medtrack_store::{MemStore, StoreError};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub weekly_adherence: u32,
    pub active_medications: usize,
    pub missed_today: usize,
    pub next_dose: String,
    pub today_logs: Vec<MedicationLog>,
}

/// A log with its medication embedded; `medication` is `null` when the
/// referenced record does not exist.
#[derive(Debug, Serialize)]
pub struct ScheduledDose {
    #[serde(flatten)]
    pub log: MedicationLog,
    pub medication: Option<Medication>,
}

/// Countdown to the earliest pending dose still ahead today.
///
/// Only logs whose `HH:MM` is strictly later than the current minute are
/// considered. The wait is rounded up to whole hours.
pub fn next_dose_label(today_logs: &[MedicationLog], now: NaiveDateTime) -> String {
    let current = now.format(TIME_FORMAT).to_string();

    let next = today_logs
        .iter()
        .filter(|log| log.status == LogStatus::Pending && log.scheduled_time > current)
        .filter_map(|log| NaiveTime::parse_from_str(&log.scheduled_time, TIME_FORMAT).ok())
        .min();

    let Some(time) = next else {
        return "None today".to_string();
    };

    let wait_ms = (now.date().and_time(time) - now).num_milliseconds();
    let hours = (wait_ms + 3_599_999).div_euclid(3_600_000);
    if hours > 0 {
        format!("{hours}h")
    } else {
        "Soon".to_string()
    }
}

pub fn dashboard_stats(store: &MemStore) -> Result<DashboardStats, StoreError> {
    let weekly_adherence = store.weekly_adherence()?;
    let active_medications = store.active_medications_count()?;
    let missed_today = store.missed_today_count()?;
    let today_logs = store.today_logs()?;

    let next_dose = next_dose_label(&today_logs, store.now());

    Ok(DashboardStats {
        weekly_adherence,
        active_medications,
        missed_today,
        next_dose,
        today_logs,
    })
}

/// Today's logs, each joined with its medication.
pub fn today_schedule(store: &MemStore) -> Result<Vec<ScheduledDose>, StoreError> {
    let logs = store.today_logs()?;
    let mut medications: BTreeMap<MedicationId, Option<Medication>> = BTreeMap::new();

    let mut schedule = Vec::with_capacity(logs.len());
    for log in logs {
        if !medications.contains_key(&log.medication_id) {
            let medication = match store.get_medication(log.medication_id) {
                Ok(med) => Some(med),
                Err(e) if e.is_not_found() => None,
                Err(e) => return Err(e),
            };
            medications.insert(log.medication_id, medication);
        }
        let medication = medications.get(&log.medication_id).cloned().flatten();
        schedule.push(ScheduledDose { log, medication });
    }
    Ok(schedule)
}
