//! Daily labor demand over the project window.

use chrono::NaiveDate;

use crate::dates::days_between;
use crate::models::{ScheduleTask, TeamSummary};

/// Workers needed on one calendar day.
#[derive(Clone, Debug, PartialEq)]
pub struct DailyDemand {
    pub date: NaiveDate,
    pub workers: f64,
    /// Uids of detail tasks active that day, in uid order.
    pub active: Vec<u32>,
}

/// Sum of labor units of every detail task active on each day of the window.
pub fn daily_labor_demand<'a, I>(tasks: I, start: NaiveDate, finish: NaiveDate) -> Vec<DailyDemand>
where
    I: IntoIterator<Item = &'a ScheduleTask>,
{
    let mut days: Vec<DailyDemand> = days_between(start, finish)
        .map(|date| DailyDemand {
            date,
            workers: 0.0,
            active: Vec::new(),
        })
        .collect();

    let mut tasks: Vec<&ScheduleTask> = tasks.into_iter().filter(|t| !t.is_summary).collect();
    tasks.sort_by_key(|t| t.uid);

    for task in tasks {
        let workers = task.labor_units();
        let from = (task.start_date - start).num_days().max(0) as usize;
        let to = ((task.finish_date - start).num_days().max(0) as usize).min(days.len());
        for day in days.iter_mut().take(to).skip(from) {
            day.workers += workers;
            day.active.push(task.uid);
        }
    }

    days
}

/// Average and peak workforce plus total man-hours.
pub fn team_summary(tasks: &[ScheduleTask], start: NaiveDate, finish: NaiveDate) -> TeamSummary {
    let demand = daily_labor_demand(tasks, start, finish);
    let total_man_hours = tasks
        .iter()
        .filter(|t| !t.is_summary)
        .map(|t| t.labor_units() * t.duration_hours)
        .sum();

    if demand.is_empty() {
        return TeamSummary {
            total_man_hours,
            ..Default::default()
        };
    }

    let sum: f64 = demand.iter().map(|d| d.workers).sum();
    let max = demand.iter().map(|d| d.workers).fold(0.0, f64::max);
    TeamSummary {
        average_workers: sum / demand.len() as f64,
        max_workers: max,
        total_man_hours,
    }
}
