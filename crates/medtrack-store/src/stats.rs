//! Derived reads over the log collection.

use chrono::{Duration, NaiveDate};
use medtrack_shared::constants::ADHERENCE_WINDOW_DAYS;
use medtrack_shared::validate::parse_date;
use medtrack_shared::{LogStatus, MedicationLog};

use crate::error::Result;
use crate::store::MemStore;

/// Percentage of `taken` logs among those dated within the trailing window
/// ending on `today`, rounded half up. Pending and missed both count as not
/// taken. Logs with unparseable dates are skipped.
pub fn adherence_percent<'a>(
    logs: impl IntoIterator<Item = &'a MedicationLog>,
    today: NaiveDate,
) -> u32 {
    let start = today - Duration::days(ADHERENCE_WINDOW_DAYS - 1);

    let (mut taken, mut total) = (0u64, 0u64);
    for log in logs {
        let Some(date) = parse_date(&log.date) else {
            continue;
        };
        if date < start || date > today {
            continue;
        }
        total += 1;
        if log.status == LogStatus::Taken {
            taken += 1;
        }
    }

    if total == 0 {
        return 0;
    }
    ((taken * 200 + total) / (total * 2)) as u32
}

impl MemStore {
    pub fn today_logs(&self) -> Result<Vec<MedicationLog>> {
        let today = self.today_string();
        let state = self.lock()?;
        Ok(state.logs_matching(None, Some(&today)))
    }

    /// Adherence over the last seven calendar days, today included.
    pub fn weekly_adherence(&self) -> Result<u32> {
        let today = self.today();
        let state = self.lock()?;
        Ok(adherence_percent(state.logs.values(), today))
    }

    pub fn missed_today_count(&self) -> Result<usize> {
        let today = self.today_string();
        let state = self.lock()?;
        Ok(state
            .logs
            .values()
            .filter(|log| log.date == today && log.status == LogStatus::Missed)
            .count())
    }
}
