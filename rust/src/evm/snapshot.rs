//! Earned value snapshot at a data date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::EvmOptions;
use crate::dates::shift_date;
use crate::error::{EngineError, EngineWarning};
use crate::{log_changes, log_debug};
use crate::models::ProjectSchedule;

use super::baseline::EvmBaseline;
use super::progress::{resolve_progress, TaskProgress};

/// Index at or above which performance is on target.
pub const ON_TARGET_INDEX: f64 = 0.95;
/// Index below which performance is in trouble.
pub const CRITICAL_INDEX: f64 = 0.85;
/// Longest slip a projected finish may show, about a century.
pub const MAX_PROJECTED_SLIP_DAYS: i64 = 36_500;

/// Overall project condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Health {
    Green,
    Yellow,
    Red,
}

impl Health {
    /// Green when both indices reach 0.95, yellow when either lies in
    /// `[0.85, 0.95)`, red otherwise.
    pub fn from_indices(spi: f64, cpi: f64) -> Self {
        let watch = |index: f64| (CRITICAL_INDEX..ON_TARGET_INDEX).contains(&index);
        if spi >= ON_TARGET_INDEX && cpi >= ON_TARGET_INDEX {
            Health::Green
        } else if watch(spi) || watch(cpi) {
            Health::Yellow
        } else {
            Health::Red
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Completed,
    OnTrack,
    AtRisk,
    Delayed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TasksByStatus {
    pub completed: u32,
    pub on_track: u32,
    pub at_risk: u32,
    pub delayed: u32,
}

impl TasksByStatus {
    fn count(&mut self, status: TaskStatus) {
        match status {
            TaskStatus::Completed => self.completed += 1,
            TaskStatus::OnTrack => self.on_track += 1,
            TaskStatus::AtRisk => self.at_risk += 1,
            TaskStatus::Delayed => self.delayed += 1,
        }
    }
}

/// Earned value figures of one task.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskEvmMetrics {
    pub uid: u32,
    pub name: String,
    pub percent_complete: f64,
    pub planned_value: f64,
    pub earned_value: f64,
    pub actual_cost: f64,
    pub spi: f64,
    pub cpi: f64,
    pub status: TaskStatus,
    pub is_critical: bool,
}

/// Project-level earned value indices at a data date.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectEvmSnapshot {
    pub data_date: NaiveDate,
    pub budget_at_completion: f64,
    pub planned_value: f64,
    pub earned_value: f64,
    pub actual_cost: f64,
    pub cost_variance: f64,
    pub schedule_variance: f64,
    pub cpi: f64,
    pub spi: f64,
    pub estimate_at_completion: f64,
    pub estimate_to_complete: f64,
    pub variance_at_completion: f64,
    pub tcpi: f64,
    pub projected_finish_date: NaiveDate,
    pub schedule_slippage_days: i64,
    pub health: Health,
    pub tasks_by_status: TasksByStatus,
    pub task_metrics: Vec<TaskEvmMetrics>,
    pub warnings: Vec<EngineWarning>,
}

/// `numerator / denominator`, or 0 when the denominator is 0.
#[inline]
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// An index with a zero denominator counts as on target.
#[inline]
fn index_or_target(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        1.0
    } else {
        numerator / denominator
    }
}

fn task_status(percent_complete: f64, pv: f64, ev: f64, ac: f64) -> TaskStatus {
    if percent_complete >= 100.0 {
        return TaskStatus::Completed;
    }
    match Health::from_indices(index_or_target(ev, pv), index_or_target(ev, ac)) {
        Health::Green => TaskStatus::OnTrack,
        Health::Yellow => TaskStatus::AtRisk,
        Health::Red => TaskStatus::Delayed,
    }
}

/// Compute the earned value snapshot of `progress` against `baseline` on
/// `data_date`. Criticality is taken from `schedule`.
pub fn compute_evm_snapshot(
    baseline: &EvmBaseline,
    schedule: &ProjectSchedule,
    progress: &[TaskProgress],
    data_date: NaiveDate,
    options: &EvmOptions,
) -> Result<ProjectEvmSnapshot, EngineError> {
    let (resolved, warnings) = resolve_progress(baseline, progress, options);

    let mut pv = 0.0;
    let mut ev = 0.0;
    let mut ac = 0.0;
    let mut tasks_by_status = TasksByStatus::default();
    let mut task_metrics = Vec::with_capacity(baseline.tasks().len());

    for task in baseline.tasks() {
        let planned_value = task.cost * task.planned_fraction(data_date);
        let (percent_complete, earned_value, actual_cost) = match resolved.get(&task.uid) {
            Some(p) => (p.percent_complete, p.earned_value(task), p.actual_cost),
            None => (0.0, 0.0, 0.0),
        };
        let status = task_status(percent_complete, planned_value, earned_value, actual_cost);
        tasks_by_status.count(status);

        pv += planned_value;
        ev += earned_value;
        ac += actual_cost;
        task_metrics.push(TaskEvmMetrics {
            uid: task.uid,
            name: task.name.clone(),
            percent_complete,
            planned_value,
            earned_value,
            actual_cost,
            spi: ratio(earned_value, planned_value),
            cpi: ratio(earned_value, actual_cost),
            status,
            is_critical: schedule.is_critical(task.uid),
        });
    }

    let bac = baseline.budget_at_completion();
    let cpi = ratio(ev, ac);
    let spi = ratio(ev, pv);

    let eac = if cpi > 0.0 {
        bac / cpi
    } else if ac > 0.0 {
        ac + (bac - ev)
    } else {
        bac
    };
    // Negative once the actual cost has passed the budget.
    let tcpi = ratio(bac - ev, bac - ac);

    let original_days = baseline.duration_days();
    let projected_finish_date = if spi > 0.0 {
        let slip = (original_days as f64 / spi - original_days as f64).round();
        let slip = if slip > MAX_PROJECTED_SLIP_DAYS as f64 {
            log_debug!(
                options.verbosity,
                "SPI {:.6} projects a {} day slip, capped at {}",
                spi,
                slip,
                MAX_PROJECTED_SLIP_DAYS
            );
            MAX_PROJECTED_SLIP_DAYS
        } else {
            slip as i64
        };
        shift_date(baseline.finish_date(), slip)?
    } else if pv == 0.0 {
        baseline.finish_date()
    } else {
        shift_date(data_date, original_days)?
    };
    let schedule_slippage_days = (projected_finish_date - baseline.finish_date()).num_days();

    let health = Health::from_indices(index_or_target(ev, pv), index_or_target(ev, ac));
    log_changes!(
        options.verbosity,
        "EVM {}: PV={:.2} EV={:.2} AC={:.2} SPI={:.3} CPI={:.3} -> {:?}",
        data_date,
        pv,
        ev,
        ac,
        spi,
        cpi,
        health
    );

    Ok(ProjectEvmSnapshot {
        data_date,
        budget_at_completion: bac,
        planned_value: pv,
        earned_value: ev,
        actual_cost: ac,
        cost_variance: ev - ac,
        schedule_variance: ev - pv,
        cpi,
        spi,
        estimate_at_completion: eac,
        estimate_to_complete: eac - ac,
        variance_at_completion: bac - eac,
        tcpi,
        projected_finish_date,
        schedule_slippage_days,
        health,
        tasks_by_status,
        task_metrics,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ScheduleTask, TeamSummary};
    use crate::phase::Phase;
    use crate::resources::ProjectResources;

    fn d(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn task(uid: u32, start: NaiveDate, finish: NaiveDate, cost: f64) -> ScheduleTask {
        ScheduleTask {
            uid,
            name: format!("t{}", uid),
            phase: Phase::InteriorFinishes,
            wbs_code: None,
            start_date: start,
            finish_date: finish,
            duration_days: (finish - start).num_days(),
            duration_hours: 0.0,
            cost,
            resources: vec![],
            predecessors: vec![],
            storey: None,
            is_summary: false,
            is_critical: false,
            total_float_days: 0,
            free_float_days: 0,
            notes: String::new(),
        }
    }

    /// Two parallel 10-day tasks worth 4000 and 6000.
    fn fixture() -> (EvmBaseline, ProjectSchedule) {
        let schedule = ProjectSchedule {
            start_date: d(2025, 9, 1),
            finish_date: d(2025, 9, 11),
            tasks: vec![
                task(1, d(2025, 9, 1), d(2025, 9, 11), 4000.0),
                task(2, d(2025, 9, 1), d(2025, 9, 11), 6000.0),
            ],
            total_duration_days: 10,
            total_cost: 10000.0,
            team_summary: TeamSummary::default(),
            critical_path: vec![2],
            critical_chain: None,
            resources: ProjectResources::default(),
        };
        let (baseline, _) = EvmBaseline::capture(&schedule, d(2025, 8, 29));
        (baseline, schedule)
    }

    fn progress(uid: u32, percent: f64, cost: Option<f64>) -> TaskProgress {
        TaskProgress {
            task_uid: uid,
            percent_complete: percent,
            actual_start: Some(d(2025, 9, 1)),
            actual_finish: None,
            actual_cost: cost,
        }
    }

    #[test]
    fn test_half_done_at_midpoint_is_green() {
        let (baseline, schedule) = fixture();
        let records = vec![progress(1, 50.0, Some(2000.0)), progress(2, 50.0, Some(3000.0))];
        let snapshot =
            compute_evm_snapshot(&baseline, &schedule, &records, d(2025, 9, 6), &EvmOptions::default())
                .unwrap();

        assert!((snapshot.planned_value - 5000.0).abs() < 1e-9);
        assert!((snapshot.earned_value - 5000.0).abs() < 1e-9);
        assert!((snapshot.actual_cost - 5000.0).abs() < 1e-9);
        assert!((snapshot.cpi - 1.0).abs() < 1e-9);
        assert!((snapshot.spi - 1.0).abs() < 1e-9);
        assert!((snapshot.estimate_at_completion - 10000.0).abs() < 1e-9);
        assert!((snapshot.tcpi - 1.0).abs() < 1e-9);
        assert_eq!(snapshot.health, Health::Green);
        assert_eq!(snapshot.projected_finish_date, d(2025, 9, 11));
        assert_eq!(snapshot.schedule_slippage_days, 0);
        assert_eq!(snapshot.tasks_by_status.on_track, 2);
        assert!(snapshot.task_metrics[1].is_critical);
        assert!(!snapshot.task_metrics[0].is_critical);
    }

    #[test]
    fn test_behind_schedule_projects_later_finish() {
        let (baseline, schedule) = fixture();
        let records = vec![progress(1, 25.0, Some(1000.0)), progress(2, 25.0, Some(1500.0))];
        let snapshot =
            compute_evm_snapshot(&baseline, &schedule, &records, d(2025, 9, 6), &EvmOptions::default())
                .unwrap();

        assert!((snapshot.spi - 0.5).abs() < 1e-9);
        assert_eq!(snapshot.health, Health::Red);
        // 10 / 0.5 - 10 = 10 days late
        assert_eq!(snapshot.projected_finish_date, d(2025, 9, 21));
        assert_eq!(snapshot.schedule_slippage_days, 10);
        assert_eq!(snapshot.tasks_by_status.delayed, 2);
    }

    #[test]
    fn test_health_bands() {
        assert_eq!(Health::from_indices(1.0, 0.95), Health::Green);
        assert_eq!(Health::from_indices(0.9, 0.5), Health::Yellow);
        assert_eq!(Health::from_indices(1.2, 0.85), Health::Yellow);
        assert_eq!(Health::from_indices(0.5, 1.0), Health::Red);
        assert_eq!(Health::from_indices(0.84, 0.7), Health::Red);
    }

    #[test]
    fn test_one_index_in_watch_band_puts_task_at_risk() {
        let (baseline, schedule) = fixture();
        // Task 1: SPI 0.9, CPI 0.5.
        let records = vec![progress(1, 45.0, Some(3600.0))];
        let snapshot =
            compute_evm_snapshot(&baseline, &schedule, &records, d(2025, 9, 6), &EvmOptions::default())
                .unwrap();

        assert!((snapshot.task_metrics[0].spi - 0.9).abs() < 1e-9);
        assert!((snapshot.task_metrics[0].cpi - 0.5).abs() < 1e-9);
        assert_eq!(snapshot.task_metrics[0].status, TaskStatus::AtRisk);
    }

    #[test]
    fn test_overspent_budget_gives_negative_tcpi() {
        let (baseline, schedule) = fixture();
        let records = vec![progress(1, 50.0, Some(7000.0)), progress(2, 50.0, Some(5000.0))];
        let snapshot =
            compute_evm_snapshot(&baseline, &schedule, &records, d(2025, 9, 6), &EvmOptions::default())
                .unwrap();

        // (10000 - 5000) / (10000 - 12000)
        assert!((snapshot.tcpi + 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_spent_exactly_the_budget_guards_tcpi() {
        let (baseline, schedule) = fixture();
        let records = vec![progress(1, 50.0, Some(4000.0)), progress(2, 50.0, Some(6000.0))];
        let snapshot =
            compute_evm_snapshot(&baseline, &schedule, &records, d(2025, 9, 6), &EvmOptions::default())
                .unwrap();

        assert_eq!(snapshot.tcpi, 0.0);
    }

    #[test]
    fn test_vanishing_spi_caps_projected_finish() {
        let start = d(2025, 1, 1);
        let finish = d(2026, 1, 1);
        let schedule = ProjectSchedule {
            start_date: start,
            finish_date: finish,
            tasks: vec![
                task(1, start, finish, 1_000_000.0),
                task(2, start, finish, 1.0),
            ],
            total_duration_days: (finish - start).num_days(),
            total_cost: 1_000_001.0,
            team_summary: TeamSummary::default(),
            critical_path: vec![1],
            critical_chain: None,
            resources: ProjectResources::default(),
        };
        let (baseline, _) = EvmBaseline::capture(&schedule, start);
        let records = vec![progress(2, 0.001, None)];
        let snapshot =
            compute_evm_snapshot(&baseline, &schedule, &records, d(2025, 7, 2), &EvmOptions::default())
                .unwrap();

        assert!(snapshot.spi > 0.0);
        assert_eq!(snapshot.schedule_slippage_days, MAX_PROJECTED_SLIP_DAYS);
        assert!(snapshot.projected_finish_date > finish);
        assert_eq!(snapshot.health, Health::Red);
    }

    #[test]
    fn test_all_complete_earns_full_budget() {
        let (baseline, schedule) = fixture();
        let records = vec![progress(1, 100.0, None), progress(2, 100.0, None)];
        let snapshot =
            compute_evm_snapshot(&baseline, &schedule, &records, d(2025, 9, 11), &EvmOptions::default())
                .unwrap();

        assert_eq!(snapshot.earned_value, snapshot.budget_at_completion);
        assert!(snapshot.spi >= 1.0);
        assert_eq!(snapshot.tasks_by_status.completed, 2);
    }

    #[test]
    fn test_nothing_started_guards_divisions() {
        let (baseline, schedule) = fixture();
        let snapshot =
            compute_evm_snapshot(&baseline, &schedule, &[], d(2025, 8, 30), &EvmOptions::default())
                .unwrap();

        assert_eq!(snapshot.cpi, 0.0);
        assert_eq!(snapshot.spi, 0.0);
        assert_eq!(snapshot.estimate_at_completion, 10000.0);
        assert_eq!(snapshot.projected_finish_date, baseline.finish_date());
        assert_eq!(snapshot.health, Health::Green);
    }

    #[test]
    fn test_spent_without_earning_uses_remaining_budget() {
        let (baseline, schedule) = fixture();
        let records = vec![progress(1, 0.0, Some(800.0))];
        let snapshot =
            compute_evm_snapshot(&baseline, &schedule, &records, d(2025, 9, 3), &EvmOptions::default())
                .unwrap();

        assert_eq!(snapshot.cpi, 0.0);
        assert!((snapshot.estimate_at_completion - 10800.0).abs() < 1e-9);
        // data date + original duration
        assert_eq!(snapshot.projected_finish_date, d(2025, 9, 13));
    }

    #[test]
    fn test_estimated_actual_cost_mode() {
        let (baseline, schedule) = fixture();
        let records = vec![progress(1, 50.0, Some(9000.0))];
        let options = EvmOptions {
            tracked_actual_cost: false,
            ..Default::default()
        };
        let snapshot =
            compute_evm_snapshot(&baseline, &schedule, &records, d(2025, 9, 6), &options).unwrap();
        assert!((snapshot.actual_cost - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn test_bad_progress_records_warn() {
        let (baseline, schedule) = fixture();
        let records = vec![progress(1, 140.0, None), progress(99, 10.0, None)];
        let snapshot =
            compute_evm_snapshot(&baseline, &schedule, &records, d(2025, 9, 6), &EvmOptions::default())
                .unwrap();

        assert_eq!(snapshot.warnings.len(), 2);
        assert!(snapshot.warnings.contains(&EngineWarning::UnknownTask { uid: 99 }));
        assert_eq!(snapshot.task_metrics[0].percent_complete, 100.0);
        assert!(snapshot.earned_value <= snapshot.budget_at_completion);
    }
}
