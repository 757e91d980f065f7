//! Progress observations and their resolution against a baseline.

use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::config::{ActualCostMode, EvmOptions};
use crate::error::EngineWarning;
use crate::log_warn;

use super::baseline::{elapsed_fraction, BaselineTask, EvmBaseline};

/// Reported progress of one task.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskProgress {
    pub task_uid: u32,
    pub percent_complete: f64,
    #[serde(default)]
    pub actual_start: Option<NaiveDate>,
    #[serde(default)]
    pub actual_finish: Option<NaiveDate>,
    /// Money spent so far, when costs are tracked.
    #[serde(default)]
    pub actual_cost: Option<f64>,
}

/// Progress of a baseline task with percent clamped and actual cost decided.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ResolvedProgress {
    pub percent_complete: f64,
    pub actual_start: Option<NaiveDate>,
    pub actual_finish: Option<NaiveDate>,
    pub actual_cost: f64,
}

impl ResolvedProgress {
    pub fn earned_value(&self, task: &BaselineTask) -> f64 {
        task.cost * self.percent_complete / 100.0
    }

    /// Share of the reported progress reached on `date`, assuming linear
    /// progress from the actual (or planned) start to the actual finish (or
    /// the data date).
    pub fn fraction_reached(&self, task: &BaselineTask, date: NaiveDate, data_date: NaiveDate) -> f64 {
        let start = self.actual_start.unwrap_or(task.start_date);
        let finish = self.actual_finish.unwrap_or(data_date);
        elapsed_fraction(start, finish, date)
    }
}

/// Match progress records to baseline tasks.
///
/// Records for unknown uids are dropped and percentages outside [0, 100] are
/// clamped, each with a warning. A later record for the same uid replaces an
/// earlier one.
pub(crate) fn resolve_progress(
    baseline: &EvmBaseline,
    progress: &[TaskProgress],
    options: &EvmOptions,
) -> (FxHashMap<u32, ResolvedProgress>, Vec<EngineWarning>) {
    let mode = options.actual_cost_mode();
    let mut resolved = FxHashMap::default();
    let mut warnings = Vec::new();

    for record in progress {
        let Some(task) = baseline.task(record.task_uid) else {
            let warning = EngineWarning::UnknownTask {
                uid: record.task_uid,
            };
            log_warn!(options.verbosity, "{}", warning);
            warnings.push(warning);
            continue;
        };

        let given = record.percent_complete;
        let percent_complete = if given.is_nan() { 0.0 } else { given.clamp(0.0, 100.0) };
        if percent_complete != given {
            let warning = EngineWarning::PercentClamped {
                uid: record.task_uid,
                given,
                clamped: percent_complete,
            };
            log_warn!(options.verbosity, "{}", warning);
            warnings.push(warning);
        }

        let estimated = task.cost * percent_complete / 100.0;
        let actual_cost = match mode {
            ActualCostMode::Tracked => record.actual_cost.unwrap_or(estimated),
            ActualCostMode::EstimatedFromProgress => estimated,
        };

        resolved.insert(
            record.task_uid,
            ResolvedProgress {
                percent_complete,
                actual_start: record.actual_start,
                actual_finish: record.actual_finish,
                actual_cost,
            },
        );
    }

    (resolved, warnings)
}
