//! Output types of the site capacity optimizer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::ScheduleTask;
use crate::phase::Phase;

/// Workforce on site on one day against the applicable capacity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CapacityDay {
    pub date: NaiveDate,
    pub workers_allocated: f64,
    /// `None` when the day is unconstrained.
    pub workers_capacity: Option<u32>,
    pub utilization_percent: f64,
    /// Exactly `workers_allocated > workers_capacity`.
    pub is_bottleneck: bool,
}

/// How far a bottleneck day exceeds capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Up to 10% over is low, up to 30% medium, anything more high.
    pub fn for_overage(overage_percent: f64) -> Self {
        if overage_percent <= 10.0 {
            Severity::Low
        } else if overage_percent <= 30.0 {
            Severity::Medium
        } else {
            Severity::High
        }
    }
}

/// A day on which demand exceeds capacity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bottleneck {
    pub date: NaiveDate,
    pub severity: Severity,
    pub overage_percent: f64,
    pub workers_allocated: f64,
    pub workers_capacity: u32,
    /// Phases active that day, in taxonomy order.
    pub phases: Vec<Phase>,
    pub task_uids: Vec<u32>,
    pub reason: String,
    /// Set for per-storey bottlenecks.
    pub storey: Option<String>,
}

/// Two mutually exclusive phases scheduled on the same days.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OverlapConflict {
    pub first: Phase,
    pub second: Phase,
    pub start_date: NaiveDate,
    /// Exclusive.
    pub finish_date: NaiveDate,
    pub overlap_days: i64,
}

/// Advisory change to the schedule. Nothing is applied automatically.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Suggestion {
    DelayTask {
        task_uid: u32,
        days: i64,
        /// The delay fits in the task's total float.
        within_float: bool,
        reason: String,
    },
    ReduceCrew {
        task_uid: u32,
        current_workers: f64,
        suggested_workers: u32,
        reason: String,
    },
    RemoveOverlap {
        first: Phase,
        second: Phase,
        overlap_days: i64,
        reason: String,
    },
}

/// Capacity analysis of a schedule, with an optional leveled alternative.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptimizedSchedule {
    pub original_duration_days: i64,
    pub leveled_duration_days: Option<i64>,
    /// Leveled copy of the tasks. Floats still describe the unleveled schedule.
    pub leveled_tasks: Option<Vec<ScheduleTask>>,
    pub labor_hours: f64,
    pub capacity_timeline: Vec<CapacityDay>,
    pub storey_timelines: BTreeMap<String, Vec<CapacityDay>>,
    pub bottlenecks: Vec<Bottleneck>,
    pub overlap_conflicts: Vec<OverlapConflict>,
    pub suggestions: Vec<Suggestion>,
    pub efficiency_gain: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_bands() {
        assert_eq!(Severity::for_overage(5.0), Severity::Low);
        assert_eq!(Severity::for_overage(10.0), Severity::Low);
        assert_eq!(Severity::for_overage(25.0), Severity::Medium);
        assert_eq!(Severity::for_overage(30.0), Severity::Medium);
        assert_eq!(Severity::for_overage(60.0), Severity::High);
    }

    #[test]
    fn test_suggestion_serializes_with_kind_tag() {
        let suggestion = Suggestion::RemoveOverlap {
            first: Phase::Plumbing,
            second: Phase::Electrical,
            overlap_days: 4,
            reason: String::new(),
        };
        let json = serde_json::to_string(&suggestion).unwrap();
        assert!(json.starts_with(r#"{"kind":"remove_overlap","first":"plumbing""#));
    }
}
