//! Structural checks for schedules received from outside the engine.
//!
//! Detects:
//! - Duplicate uids and relations to unknown uids
//! - Tasks finishing before they start
//! - A total duration that does not match the project dates
//! - Summary tasks that are not the roll-up of their phase
//! - A critical path that is broken, has float, or does not span the project

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::models::{ProjectSchedule, ScheduleTask};
use crate::sequencer::phase_rollups;

const COST_TOLERANCE: f64 = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    DuplicateUid,
    UnknownPredecessor,
    InvertedDates,
    DurationMismatch,
    SummaryMismatch,
    CriticalPathBroken,
}

/// One invariant a schedule fails.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduleViolation {
    pub kind: ViolationKind,
    pub uid: Option<u32>,
    pub message: String,
}

impl ScheduleViolation {
    fn new(kind: ViolationKind, uid: Option<u32>, message: impl Into<String>) -> Self {
        Self {
            kind,
            uid,
            message: message.into(),
        }
    }
}

/// Every violation found in `schedule`; empty when it is consistent.
pub fn validate_schedule(schedule: &ProjectSchedule) -> Vec<ScheduleViolation> {
    let mut violations = Vec::new();

    let mut uids = FxHashSet::default();
    for task in &schedule.tasks {
        if !uids.insert(task.uid) {
            violations.push(ScheduleViolation::new(
                ViolationKind::DuplicateUid,
                Some(task.uid),
                format!("Duplicate task uid: {}", task.uid),
            ));
        }
    }

    for task in &schedule.tasks {
        for link in &task.predecessors {
            if !uids.contains(&link.uid) {
                violations.push(ScheduleViolation::new(
                    ViolationKind::UnknownPredecessor,
                    Some(task.uid),
                    format!("Task {} follows unknown task {}", task.uid, link.uid),
                ));
            }
        }
        if task.finish_date < task.start_date {
            violations.push(ScheduleViolation::new(
                ViolationKind::InvertedDates,
                Some(task.uid),
                format!("Task {} finishes before it starts", task.uid),
            ));
        }
    }

    let span = (schedule.finish_date - schedule.start_date).num_days();
    if span != schedule.total_duration_days {
        violations.push(ScheduleViolation::new(
            ViolationKind::DurationMismatch,
            None,
            format!(
                "Total duration {} days, but the project spans {} days",
                schedule.total_duration_days, span
            ),
        ));
    }

    check_summaries(schedule, &mut violations);
    check_critical_path(schedule, &mut violations);
    violations
}

fn check_summaries(schedule: &ProjectSchedule, violations: &mut Vec<ScheduleViolation>) {
    let rollups = phase_rollups(&schedule.tasks);
    for summary in schedule.tasks.iter().filter(|t| t.is_summary) {
        let consistent = rollups.get(&summary.phase).is_some_and(|r| {
            r.start_date == summary.start_date
                && r.finish_date == summary.finish_date
                && (r.cost - summary.cost).abs() <= COST_TOLERANCE
        });
        if !consistent {
            violations.push(ScheduleViolation::new(
                ViolationKind::SummaryMismatch,
                Some(summary.uid),
                format!("Summary {} is not the roll-up of phase {}", summary.uid, summary.phase),
            ));
        }
    }
}

fn check_critical_path(schedule: &ProjectSchedule, violations: &mut Vec<ScheduleViolation>) {
    let mut broken = |uid: Option<u32>, message: String| {
        violations.push(ScheduleViolation::new(
            ViolationKind::CriticalPathBroken,
            uid,
            message,
        ));
    };

    let mut chain: Vec<&ScheduleTask> = Vec::with_capacity(schedule.critical_path.len());
    for &uid in &schedule.critical_path {
        match schedule.tasks.iter().find(|t| t.uid == uid) {
            Some(task) => {
                if task.total_float_days != 0 {
                    broken(Some(uid), format!("Critical task {} has float", uid));
                }
                chain.push(task);
            }
            None => broken(Some(uid), format!("Critical path names unknown task {}", uid)),
        }
    }

    let (Some(first), Some(last)) = (chain.first(), chain.last()) else {
        return;
    };
    if first.start_date != schedule.start_date {
        broken(Some(first.uid), "Critical path does not start at the project start".to_string());
    }
    if last.finish_date != schedule.finish_date {
        broken(Some(last.uid), "Critical path does not reach the project finish".to_string());
    }
    for pair in chain.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        let driven = next.predecessors.iter().any(|l| {
            l.uid == prev.uid && (next.start_date - prev.finish_date).num_days() == l.lag_days
        });
        if !driven {
            broken(
                Some(next.uid),
                format!("Critical task {} is not driven by task {}", next.uid, prev.uid),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaskLink, TeamSummary};
    use crate::phase::Phase;
    use crate::resources::ProjectResources;
    use chrono::{Duration, NaiveDate};

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 3).unwrap()
    }

    fn task(uid: u32, offset: i64, days: i64, preds: Vec<u32>) -> ScheduleTask {
        ScheduleTask {
            uid,
            name: format!("t{}", uid),
            phase: Phase::Earthworks,
            wbs_code: None,
            start_date: start() + Duration::days(offset),
            finish_date: start() + Duration::days(offset + days),
            duration_days: days,
            duration_hours: 0.0,
            cost: 10.0,
            resources: vec![],
            predecessors: preds.into_iter().map(|uid| TaskLink { uid, lag_days: 0 }).collect(),
            storey: None,
            is_summary: false,
            is_critical: true,
            total_float_days: 0,
            free_float_days: 0,
            notes: String::new(),
        }
    }

    fn valid() -> ProjectSchedule {
        let mut summary = task(1, 0, 5, vec![]);
        summary.is_summary = true;
        summary.cost = 20.0;
        ProjectSchedule {
            start_date: start(),
            finish_date: start() + Duration::days(5),
            tasks: vec![summary, task(2, 0, 2, vec![]), task(3, 2, 3, vec![2])],
            total_duration_days: 5,
            total_cost: 20.0,
            team_summary: TeamSummary::default(),
            critical_path: vec![2, 3],
            critical_chain: None,
            resources: ProjectResources::default(),
        }
    }

    #[test]
    fn test_valid_schedule() {
        assert!(validate_schedule(&valid()).is_empty());
    }

    #[test]
    fn test_duplicate_uid_and_unknown_predecessor() {
        let mut schedule = valid();
        schedule.tasks[2].uid = 2;
        schedule.tasks[1].predecessors.push(TaskLink { uid: 42, lag_days: 0 });
        let kinds: Vec<ViolationKind> = validate_schedule(&schedule).iter().map(|v| v.kind).collect();
        assert!(kinds.contains(&ViolationKind::DuplicateUid));
        assert!(kinds.contains(&ViolationKind::UnknownPredecessor));
    }

    #[test]
    fn test_duration_mismatch() {
        let mut schedule = valid();
        schedule.total_duration_days = 4;
        let violations = validate_schedule(&schedule);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::DurationMismatch);
    }

    #[test]
    fn test_summary_cost_mismatch() {
        let mut schedule = valid();
        schedule.tasks[0].cost = 25.0;
        let violations = validate_schedule(&schedule);
        assert_eq!(violations[0].kind, ViolationKind::SummaryMismatch);
        assert_eq!(violations[0].uid, Some(1));
    }

    #[test]
    fn test_broken_critical_path() {
        let mut schedule = valid();
        schedule.critical_path = vec![3];
        schedule.tasks[2].total_float_days = 1;
        let violations = validate_schedule(&schedule);
        assert!(violations.iter().all(|v| v.kind == ViolationKind::CriticalPathBroken));
        assert_eq!(violations.len(), 2);
    }
}
