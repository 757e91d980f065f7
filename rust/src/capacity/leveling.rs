//! Serial resource-constrained leveling against the site capacity.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::dates::shift_date;
use crate::error::EngineError;
use crate::log_changes;
use crate::models::{ProjectSchedule, ScheduleTask};
use crate::sequencer::apply_rollups;

use super::types::Suggestion;

/// Workers reserved per day offset from the project start.
///
/// Grows on demand; days past the end are free.
#[derive(Clone, Debug, Default)]
struct LaborProfile {
    usage: Vec<f64>,
}

impl LaborProfile {
    fn used(&self, day: i64) -> f64 {
        self.usage.get(day as usize).copied().unwrap_or(0.0)
    }

    fn fits(&self, start: i64, days: i64, workers: f64, capacity: f64) -> bool {
        (start..start + days).all(|day| self.used(day) + workers <= capacity + 1e-9)
    }

    fn is_idle(&self, start: i64, days: i64) -> bool {
        (start..start + days).all(|day| self.used(day) <= 0.0)
    }

    fn reserve(&mut self, start: i64, days: i64, workers: f64) {
        let end = (start + days) as usize;
        if self.usage.len() < end {
            self.usage.resize(end, 0.0);
        }
        for slot in &mut self.usage[start as usize..end] {
            *slot += workers;
        }
    }
}

/// Result of one leveling pass.
#[derive(Clone, Debug)]
pub struct Leveling {
    pub tasks: Vec<ScheduleTask>,
    pub duration_days: i64,
    pub suggestions: Vec<Suggestion>,
}

/// Place every detail task at the earliest day its relations allow and the
/// remaining capacity can take its crew.
///
/// Tasks are taken in precedence order, ties broken by original start then
/// uid. A crew larger than the whole site waits for a stretch with nobody
/// else on site, and gets a crew reduction suggestion.
pub fn level_schedule(
    schedule: &ProjectSchedule,
    capacity: u32,
    verbosity: u8,
) -> Result<Leveling, EngineError> {
    let mut tasks = schedule.tasks.clone();
    let n = tasks.len();
    let offset = |task: &ScheduleTask| (task.start_date - schedule.start_date).num_days();

    let mut in_degree = vec![0usize; n];
    let mut successors: Vec<Vec<(usize, i64)>> = vec![Vec::new(); n];
    for (idx, task) in tasks.iter().enumerate().filter(|(_, t)| !t.is_summary) {
        for link in &task.predecessors {
            let p = schedule
                .task(link.uid)
                .map(|t| t.uid as usize - 1)
                .ok_or(EngineError::UnknownPredecessor(link.uid))?;
            in_degree[idx] += 1;
            successors[p].push((idx, link.lag_days));
        }
    }

    let mut ready: BinaryHeap<Reverse<(i64, u32, usize)>> = tasks
        .iter()
        .enumerate()
        .filter(|(idx, t)| !t.is_summary && in_degree[*idx] == 0)
        .map(|(idx, t)| Reverse((offset(t), t.uid, idx)))
        .collect();

    let capacity_f = capacity as f64;
    let mut profile = LaborProfile::default();
    let mut release = vec![0i64; n];
    let mut finish = vec![0i64; n];
    let mut placed = 0usize;
    let mut suggestions = Vec::new();

    while let Some(Reverse((_, uid, idx))) = ready.pop() {
        let task = &tasks[idx];
        let days = task.duration_days.max(0);
        let workers = task.labor_units();
        let original = offset(task);
        let earliest = release[idx].max(0);

        let mut start = earliest;
        if workers > capacity_f {
            while !profile.is_idle(start, days) {
                start += 1;
            }
            suggestions.push(Suggestion::ReduceCrew {
                task_uid: uid,
                current_workers: workers,
                suggested_workers: capacity,
                reason: format!(
                    "crew of {} exceeds the site capacity of {}",
                    workers, capacity
                ),
            });
        } else {
            while !profile.fits(start, days, workers, capacity_f) {
                start += 1;
            }
        }
        profile.reserve(start, days, workers);
        finish[idx] = start + days;
        placed += 1;

        if start > original {
            let delay = start - original;
            log_changes!(verbosity, "Leveling: task {} delayed {} days", uid, delay);
            suggestions.push(Suggestion::DelayTask {
                task_uid: uid,
                days: delay,
                within_float: delay <= task.total_float_days,
                reason: format!("site capacity of {} workers reached", capacity),
            });
        }

        let task = &mut tasks[idx];
        task.start_date = shift_date(schedule.start_date, start)?;
        task.finish_date = shift_date(schedule.start_date, start + days)?;

        for &(succ, lag) in &successors[idx] {
            release[succ] = release[succ].max(finish[idx] + lag);
            in_degree[succ] -= 1;
            if in_degree[succ] == 0 {
                let s = &tasks[succ];
                ready.push(Reverse((offset(s), s.uid, succ)));
            }
        }
    }

    if placed != tasks.iter().filter(|t| !t.is_summary).count() {
        return Err(EngineError::CircularDependency);
    }

    apply_rollups(&mut tasks);
    let duration_days = tasks
        .iter()
        .filter(|t| !t.is_summary)
        .map(|t| (t.finish_date - schedule.start_date).num_days())
        .max()
        .unwrap_or(0);

    Ok(Leveling {
        tasks,
        duration_days,
        suggestions,
    })
}
