//! Prometheus text exposition for `/api/metrics`.

use std::fmt::Write;

use medtrack_store::{MemStore, StoreError};

pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub active_medications: usize,
    pub daily_logs: usize,
    pub uptime_secs: f64,
}

impl Snapshot {
    pub fn collect(store: &MemStore, uptime_secs: f64) -> Result<Self, StoreError> {
        Ok(Self {
            active_medications: store.active_medications_count()?,
            daily_logs: store.today_logs()?.len(),
            uptime_secs,
        })
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        metric(
            &mut out,
            "medtracker_active_medications_total",
            "Total number of active medications",
            "gauge",
            self.active_medications as f64,
        );
        metric(
            &mut out,
            "medtracker_daily_logs_total",
            "Total number of medication logs today",
            "gauge",
            self.daily_logs as f64,
        );
        metric(
            &mut out,
            "medtracker_app_uptime_seconds",
            "Application uptime in seconds",
            "counter",
            self.uptime_secs,
        );
        out
    }
}

fn metric(out: &mut String, name: &str, help: &str, kind: &str, value: f64) {
    // Writing into a String cannot fail.
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} {kind}");
    let _ = writeln!(out, "{name} {value}");
}
