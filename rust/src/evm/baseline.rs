//! Frozen baseline for earned value tracking.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::EngineWarning;
use crate::models::ProjectSchedule;
use crate::phase::Phase;

/// A detail task as planned when the baseline was captured.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BaselineTask {
    pub uid: u32,
    pub name: String,
    pub phase: Phase,
    pub start_date: NaiveDate,
    pub finish_date: NaiveDate,
    pub cost: f64,
}

impl BaselineTask {
    /// Fraction of the planned window elapsed on `date`, in [0, 1].
    pub fn planned_fraction(&self, date: NaiveDate) -> f64 {
        elapsed_fraction(self.start_date, self.finish_date, date)
    }
}

/// Linear position of `date` in the half-open window `[start, finish)`.
pub(crate) fn elapsed_fraction(start: NaiveDate, finish: NaiveDate, date: NaiveDate) -> f64 {
    let window = (finish - start).num_days();
    if window <= 0 {
        return if date >= finish { 1.0 } else { 0.0 };
    }
    ((date - start).num_days() as f64 / window as f64).clamp(0.0, 1.0)
}

/// Snapshot of the planned schedule. Read-only once captured.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvmBaseline {
    captured_at: NaiveDate,
    start_date: NaiveDate,
    finish_date: NaiveDate,
    tasks: Vec<BaselineTask>,
    budget_at_completion: f64,
}

impl EvmBaseline {
    /// Freeze the detail tasks of `schedule`.
    ///
    /// Tasks finishing before they start are left out with a warning.
    pub fn capture(schedule: &ProjectSchedule, captured_at: NaiveDate) -> (Self, Vec<EngineWarning>) {
        let mut warnings = Vec::new();
        let mut tasks: Vec<BaselineTask> = Vec::new();
        for task in schedule.detail_tasks() {
            if task.finish_date < task.start_date {
                warnings.push(EngineWarning::InconsistentDates { uid: task.uid });
                continue;
            }
            tasks.push(BaselineTask {
                uid: task.uid,
                name: task.name.clone(),
                phase: task.phase,
                start_date: task.start_date,
                finish_date: task.finish_date,
                cost: task.cost,
            });
        }
        tasks.sort_by_key(|t| t.uid);

        let baseline = Self {
            captured_at,
            start_date: schedule.start_date,
            finish_date: schedule.finish_date,
            budget_at_completion: tasks.iter().map(|t| t.cost).sum(),
            tasks,
        };
        (baseline, warnings)
    }

    pub fn captured_at(&self) -> NaiveDate {
        self.captured_at
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn finish_date(&self) -> NaiveDate {
        self.finish_date
    }

    pub fn duration_days(&self) -> i64 {
        (self.finish_date - self.start_date).num_days()
    }

    pub fn tasks(&self) -> &[BaselineTask] {
        &self.tasks
    }

    pub fn task(&self, uid: u32) -> Option<&BaselineTask> {
        self.tasks
            .binary_search_by_key(&uid, |t| t.uid)
            .ok()
            .map(|idx| &self.tasks[idx])
    }

    /// BAC.
    pub fn budget_at_completion(&self) -> f64 {
        self.budget_at_completion
    }

    /// Cumulative planned value on `date`.
    pub fn planned_value_at(&self, date: NaiveDate) -> f64 {
        self.tasks
            .iter()
            .map(|t| t.cost * t.planned_fraction(date))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ScheduleTask, TeamSummary};
    use crate::resources::ProjectResources;

    fn d(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn task(uid: u32, start: NaiveDate, finish: NaiveDate, cost: f64) -> ScheduleTask {
        ScheduleTask {
            uid,
            name: format!("t{}", uid),
            phase: Phase::Roofing,
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

    fn schedule(tasks: Vec<ScheduleTask>) -> ProjectSchedule {
        ProjectSchedule {
            start_date: d(2025, 6, 2),
            finish_date: d(2025, 6, 12),
            tasks,
            total_duration_days: 10,
            total_cost: 0.0,
            team_summary: TeamSummary::default(),
            critical_path: vec![],
            critical_chain: None,
            resources: ProjectResources::default(),
        }
    }

    #[test]
    fn test_capture_and_planned_value() {
        let mut summary = task(1, d(2025, 6, 2), d(2025, 6, 12), 9999.0);
        summary.is_summary = true;
        let source = schedule(vec![
            summary,
            task(2, d(2025, 6, 2), d(2025, 6, 12), 10000.0),
        ]);
        let (baseline, warnings) = EvmBaseline::capture(&source, d(2025, 6, 1));

        assert!(warnings.is_empty());
        assert_eq!(baseline.tasks().len(), 1);
        assert_eq!(baseline.budget_at_completion(), 10000.0);
        assert_eq!(baseline.planned_value_at(d(2025, 6, 1)), 0.0);
        assert!((baseline.planned_value_at(d(2025, 6, 7)) - 5000.0).abs() < 1e-9);
        assert_eq!(baseline.planned_value_at(d(2025, 7, 1)), 10000.0);
    }

    #[test]
    fn test_inconsistent_dates_are_skipped() {
        let source = schedule(vec![
            task(1, d(2025, 6, 5), d(2025, 6, 3), 100.0),
            task(2, d(2025, 6, 2), d(2025, 6, 4), 50.0),
        ]);
        let (baseline, warnings) = EvmBaseline::capture(&source, d(2025, 6, 1));

        assert_eq!(warnings, vec![EngineWarning::InconsistentDates { uid: 1 }]);
        assert!(baseline.task(1).is_none());
        assert_eq!(baseline.budget_at_completion(), 50.0);
    }

    #[test]
    fn test_baseline_is_independent_of_later_changes() {
        let mut source = schedule(vec![task(1, d(2025, 6, 2), d(2025, 6, 4), 50.0)]);
        let (baseline, _) = EvmBaseline::capture(&source, d(2025, 6, 1));
        source.tasks[0].cost = 500.0;
        assert_eq!(baseline.task(1).unwrap().cost, 50.0);
    }

    #[test]
    fn test_zero_length_window() {
        let day = d(2025, 6, 2);
        assert_eq!(elapsed_fraction(day, day, d(2025, 6, 1)), 0.0);
        assert_eq!(elapsed_fraction(day, day, day), 1.0);
    }
}
