//! Statistics derived from retrieved rows.

use serde::{Deserialize, Serialize};

use crate::domain::school::{AttendanceStatus, ExcuseStatus};

/// Coarse health band for an attendance rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Critical,
    AtRisk,
    Warning,
    Good,
}

impl RiskTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Critical => "critical",
            RiskTier::AtRisk => "at_risk",
            RiskTier::Warning => "warning",
            RiskTier::Good => "good",
        }
    }

    /// `<75` critical, `[75,85)` at risk, `[85,90)` warning, `>=90` good.
    pub fn from_rate(rate: f64) -> Self {
        if rate < 75.0 {
            RiskTier::Critical
        } else if rate < 85.0 {
            RiskTier::AtRisk
        } else if rate < 90.0 {
            RiskTier::Warning
        } else {
            RiskTier::Good
        }
    }
}

/// Per-status counts as returned by a grouped count query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceCounts {
    pub present: u64,
    pub absent: u64,
    pub late: u64,
    pub excused: u64,
}

impl AttendanceCounts {
    pub fn add(&mut self, status: AttendanceStatus, n: u64) {
        match status {
            AttendanceStatus::Present => self.present += n,
            AttendanceStatus::Absent => self.absent += n,
            AttendanceStatus::Late => self.late += n,
            AttendanceStatus::Excused => self.excused += n,
        }
    }

    pub fn total(&self) -> u64 {
        self.present + self.absent + self.late + self.excused
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    pub present: u64,
    pub absent: u64,
    pub late: u64,
    pub excused: u64,
    pub total: u64,
    /// Percentage of marks that were present or late, one decimal.
    pub rate: f64,
    /// Absent when there is nothing to rate.
    pub risk: Option<RiskTier>,
}

impl AttendanceSummary {
    pub fn from_counts(counts: AttendanceCounts) -> Self {
        let total = counts.total();
        let (rate, risk) = if total == 0 {
            (0.0, None)
        } else {
            let rate = round1(100.0 * (counts.present + counts.late) as f64 / total as f64);
            (rate, Some(RiskTier::from_rate(rate)))
        };
        Self {
            present: counts.present,
            absent: counts.absent,
            late: counts.late,
            excused: counts.excused,
            total,
            rate,
            risk,
        }
    }

    pub fn empty() -> Self {
        Self::from_counts(AttendanceCounts::default())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcuseSummary {
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
    pub total: u64,
}

impl ExcuseSummary {
    pub fn add(&mut self, status: ExcuseStatus, n: u64) {
        match status {
            ExcuseStatus::Pending => self.pending += n,
            ExcuseStatus::Approved => self.approved += n,
            ExcuseStatus::Rejected => self.rejected += n,
        }
        self.total += n;
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
#[path = "aggregates_test.rs"]
mod aggregates_test;
