//! Counters for selection and overlay activity, snapshotted into log events.

use crate::logging::{LogEvent, LogFields, LogLevel};
use serde_json::json;
use std::time::Duration;

#[derive(Debug, Default, Clone)]
pub struct SelectMetrics {
    opens: u64,
    closes: u64,
    selections: u64,
    deselections: u64,
    orphan_promotions: u64,
    placements: u64,
    validity_failures: u64,
}

impl SelectMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_open(&mut self) {
        self.opens = self.opens.saturating_add(1);
    }

    pub fn record_close(&mut self) {
        self.closes = self.closes.saturating_add(1);
    }

    pub fn record_selection(&mut self) {
        self.selections = self.selections.saturating_add(1);
    }

    pub fn record_deselection(&mut self) {
        self.deselections = self.deselections.saturating_add(1);
    }

    pub fn record_orphan_promotion(&mut self) {
        self.orphan_promotions = self.orphan_promotions.saturating_add(1);
    }

    pub fn record_placement(&mut self) {
        self.placements = self.placements.saturating_add(1);
    }

    pub fn record_validity_failure(&mut self) {
        self.validity_failures = self.validity_failures.saturating_add(1);
    }

    pub fn snapshot(&self, uptime: Duration) -> MetricSnapshot {
        MetricSnapshot {
            uptime_ms: uptime.as_millis() as u64,
            opens: self.opens,
            closes: self.closes,
            selections: self.selections,
            deselections: self.deselections,
            orphan_promotions: self.orphan_promotions,
            placements: self.placements,
            validity_failures: self.validity_failures,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricSnapshot {
    pub uptime_ms: u64,
    pub opens: u64,
    pub closes: u64,
    pub selections: u64,
    pub deselections: u64,
    pub orphan_promotions: u64,
    pub placements: u64,
    pub validity_failures: u64,
}

impl MetricSnapshot {
    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("uptime_ms".to_string(), json!(self.uptime_ms));
        map.insert("opens".to_string(), json!(self.opens));
        map.insert("closes".to_string(), json!(self.closes));
        map.insert("selections".to_string(), json!(self.selections));
        map.insert("deselections".to_string(), json!(self.deselections));
        map.insert(
            "orphan_promotions".to_string(),
            json!(self.orphan_promotions),
        );
        map.insert("placements".to_string(), json!(self.placements));
        map.insert(
            "validity_failures".to_string(),
            json!(self.validity_failures),
        );
        map
    }

    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(
            LogLevel::Info,
            target.to_string(),
            "select_metrics".to_string(),
            self.as_fields(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_carries_counters() {
        let mut metrics = SelectMetrics::new();
        metrics.record_open();
        metrics.record_selection();
        metrics.record_selection();
        metrics.record_validity_failure();

        let snapshot = metrics.snapshot(Duration::from_millis(1500));
        assert_eq!(snapshot.uptime_ms, 1500);
        assert_eq!(snapshot.opens, 1);
        assert_eq!(snapshot.selections, 2);
        assert_eq!(snapshot.validity_failures, 1);

        let event = snapshot.to_log_event("floatmenu::overlay.metrics");
        assert_eq!(event.message, "select_metrics");
        assert_eq!(event.fields.get("selections"), Some(&json!(2)));
    }
}
