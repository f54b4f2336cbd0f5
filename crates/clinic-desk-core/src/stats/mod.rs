//! Appointment statistics aggregation.
//!
//! Buckets each patient's appointment count relative to the busiest patient:
//! - `High`: more than 70% of the maximum
//! - `Medium`: more than 40% of the maximum
//! - `Low`: everything else
//!
//! Bar widths are proportional to the maximum. When the maximum is zero
//! (no rows, or no appointments at all) every bar has zero width.

use serde::Serialize;

use crate::models::{EntityId, Stat};

const HIGH_RATIO: f64 = 0.7;
const MEDIUM_RATIO: f64 = 0.4;

/// Visit-count bucket relative to the busiest patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Classify `total` against `max`.
    pub fn classify(total: u64, max: u64) -> Self {
        let total = total as f64;
        let max = max as f64;
        if total > HIGH_RATIO * max {
            Severity::High
        } else if total > MEDIUM_RATIO * max {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

/// One aggregated row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatRow {
    pub patient_id: EntityId,
    pub name: String,
    pub total_appointments: u64,
    pub severity: Severity,
    /// Bar width in percent of the maximum, always finite and in `0..=100`
    pub scale_percent: f64,
}

/// Aggregated statistics in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsView {
    pub max: u64,
    pub total: u64,
    pub rows: Vec<StatRow>,
}

impl StatsView {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, patient_id: EntityId) -> Option<&StatRow> {
        self.rows.iter().find(|r| r.patient_id == patient_id)
    }
}

/// Percentage of `max` that `total` represents; zero when `max` is zero.
pub fn scale_percent(total: u64, max: u64) -> f64 {
    if max == 0 {
        return 0.0;
    }
    total as f64 / max as f64 * 100.0
}

/// Aggregate a stats report.
pub fn aggregate(stats: &[Stat]) -> StatsView {
    let max = stats.iter().map(|s| s.total_appointments).max().unwrap_or(0);
    // Counts come off the wire; saturate instead of overflowing.
    let total = stats
        .iter()
        .fold(0u64, |acc, s| acc.saturating_add(s.total_appointments));

    let rows = stats
        .iter()
        .map(|s| StatRow {
            patient_id: s.patient_id,
            name: s.name.clone(),
            total_appointments: s.total_appointments,
            severity: Severity::classify(s.total_appointments, max),
            scale_percent: scale_percent(s.total_appointments, max),
        })
        .collect();

    StatsView { max, total, rows }
}
