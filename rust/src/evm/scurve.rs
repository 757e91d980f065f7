//! Cumulative planned, earned and actual cost curves.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::config::EvmOptions;

use super::baseline::EvmBaseline;
use super::progress::{resolve_progress, TaskProgress};

/// One point of the S-curve.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SCurvePoint {
    pub date: NaiveDate,
    pub planned_value: f64,
    /// Only up to the data date.
    pub earned_value: Option<f64>,
    /// Only up to the data date.
    pub actual_cost: Option<f64>,
}

/// S-curve with one point per baseline task start or finish date.
pub fn s_curve(
    baseline: &EvmBaseline,
    progress: &[TaskProgress],
    data_date: NaiveDate,
    options: &EvmOptions,
) -> Vec<SCurvePoint> {
    let (resolved, _) = resolve_progress(baseline, progress, options);
    let dates: BTreeSet<NaiveDate> = baseline
        .tasks()
        .iter()
        .flat_map(|t| [t.start_date, t.finish_date])
        .collect();

    dates
        .into_iter()
        .map(|date| {
            let planned_value = baseline.planned_value_at(date);
            if date > data_date {
                return SCurvePoint {
                    date,
                    planned_value,
                    earned_value: None,
                    actual_cost: None,
                };
            }
            let (earned, spent) = baseline
                .tasks()
                .iter()
                .filter_map(|task| resolved.get(&task.uid).map(|p| (task, p)))
                .fold((0.0, 0.0), |(ev, ac), (task, p)| {
                    let reached = p.fraction_reached(task, date, data_date);
                    (ev + p.earned_value(task) * reached, ac + p.actual_cost * reached)
                });
            SCurvePoint {
                date,
                planned_value,
                earned_value: Some(earned),
                actual_cost: Some(spent),
            }
        })
        .collect()
}
