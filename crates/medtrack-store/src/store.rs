//! In-memory state ownership.
//!
//! [`MemStore`] owns both collections and both id counters behind a single
//! mutex. Each public operation takes the lock once and runs to completion,
//! so no two operations interleave. State lives only as long as the process.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{NaiveDate, NaiveDateTime, Utc};
use medtrack_shared::constants::DATE_FORMAT;
use medtrack_shared::{LogId, Medication, MedicationId, MedicationLog, NewMedicationLog};

use crate::clock::{Clock, LocalClock};
use crate::error::{Result, StoreError};

/// Cheaply cloneable handle to the shared in-memory store.
#[derive(Clone)]
pub struct MemStore {
    state: Arc<Mutex<State>>,
    clock: Arc<dyn Clock>,
}

/// Keys are allocated in increasing order, so map order is insertion order.
#[derive(Debug)]
pub(crate) struct State {
    pub(crate) medications: BTreeMap<MedicationId, Medication>,
    pub(crate) logs: BTreeMap<LogId, MedicationLog>,
    next_medication_id: u64,
    next_log_id: u64,
}

impl State {
    fn new() -> Self {
        Self {
            medications: BTreeMap::new(),
            logs: BTreeMap::new(),
            next_medication_id: 1,
            next_log_id: 1,
        }
    }

    pub(crate) fn allocate_medication_id(&mut self) -> MedicationId {
        let id = MedicationId(self.next_medication_id);
        self.next_medication_id += 1;
        id
    }

    /// Store an already-validated log under the next id.
    pub(crate) fn insert_log(&mut self, input: NewMedicationLog) -> MedicationLog {
        let id = LogId(self.next_log_id);
        self.next_log_id += 1;

        let log = MedicationLog {
            id,
            medication_id: input.medication_id,
            scheduled_time: input.scheduled_time,
            status: input.status,
            date: input.date,
            taken_at: input.taken_at,
            created_at: Utc::now(),
        };
        self.logs.insert(id, log.clone());
        log
    }

    /// Logs matching the optional filters, ordered by `scheduled_time`.
    ///
    /// The sort is stable, so logs sharing a time keep id order.
    pub(crate) fn logs_matching(
        &self,
        medication_id: Option<MedicationId>,
        date: Option<&str>,
    ) -> Vec<MedicationLog> {
        let mut logs: Vec<MedicationLog> = self
            .logs
            .values()
            .filter(|log| medication_id.map_or(true, |id| log.medication_id == id))
            .filter(|log| date.map_or(true, |d| log.date == d))
            .cloned()
            .collect();
        logs.sort_by(|a, b| a.scheduled_time.cmp(&b.scheduled_time));
        logs
    }
}

impl MemStore {
    /// Empty store using the system local time zone.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(LocalClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::new())),
            clock,
        }
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Today's date in wire format.
    pub(crate) fn today_string(&self) -> String {
        self.today().format(DATE_FORMAT).to_string()
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemStore").finish_non_exhaustive()
    }
}
