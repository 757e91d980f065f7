//! Phase summary roll-ups, folded from the detail tasks.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::models::ScheduleTask;
use crate::phase::Phase;

/// Aggregate of the detail tasks of one phase.
#[derive(Clone, Debug, PartialEq)]
pub struct PhaseRollup {
    pub start_date: NaiveDate,
    pub finish_date: NaiveDate,
    pub cost: f64,
    pub duration_hours: f64,
    pub total_float_days: i64,
    pub free_float_days: i64,
    pub is_critical: bool,
    pub task_count: usize,
}

impl PhaseRollup {
    fn of(task: &ScheduleTask) -> Self {
        Self {
            start_date: task.start_date,
            finish_date: task.finish_date,
            cost: task.cost,
            duration_hours: task.duration_hours,
            total_float_days: task.total_float_days,
            free_float_days: task.free_float_days,
            is_critical: task.is_critical,
            task_count: 1,
        }
    }

    fn absorb(&mut self, task: &ScheduleTask) {
        self.start_date = self.start_date.min(task.start_date);
        self.finish_date = self.finish_date.max(task.finish_date);
        self.cost += task.cost;
        self.duration_hours += task.duration_hours;
        self.total_float_days = self.total_float_days.min(task.total_float_days);
        self.free_float_days = self.free_float_days.min(task.free_float_days);
        self.is_critical |= task.is_critical;
        self.task_count += 1;
    }

    pub fn duration_days(&self) -> i64 {
        (self.finish_date - self.start_date).num_days()
    }
}

/// One roll-up per phase that has at least one detail task.
pub fn phase_rollups(tasks: &[ScheduleTask]) -> BTreeMap<Phase, PhaseRollup> {
    tasks
        .iter()
        .filter(|t| !t.is_summary)
        .fold(BTreeMap::new(), |mut acc, task| {
            acc.entry(task.phase)
                .and_modify(|r: &mut PhaseRollup| r.absorb(task))
                .or_insert_with(|| PhaseRollup::of(task));
            acc
        })
}

/// Overwrite every summary task with the roll-up of its phase.
pub fn apply_rollups(tasks: &mut [ScheduleTask]) {
    let rollups = phase_rollups(tasks);
    for task in tasks.iter_mut().filter(|t| t.is_summary) {
        let Some(rollup) = rollups.get(&task.phase) else {
            continue;
        };
        task.start_date = rollup.start_date;
        task.finish_date = rollup.finish_date;
        task.duration_days = rollup.duration_days();
        task.duration_hours = rollup.duration_hours;
        task.cost = rollup.cost;
        task.total_float_days = rollup.total_float_days;
        task.free_float_days = rollup.free_float_days;
        task.is_critical = rollup.is_critical;
        task.notes = format!("{} tasks", rollup.task_count);
    }
}
