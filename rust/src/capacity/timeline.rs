//! Daily capacity timelines, bottleneck detection and phase conflicts.

use std::collections::BTreeMap;

use crate::config::SiteCapacityConstraints;
use crate::models::ProjectSchedule;
use crate::phase::Phase;
use crate::sequencer::phase_rollups;
use crate::workforce::{daily_labor_demand, DailyDemand};

use super::types::{Bottleneck, CapacityDay, OverlapConflict, Severity};

/// Compare each day's demand with `capacity`.
pub fn capacity_timeline(demand: &[DailyDemand], capacity: Option<u32>) -> Vec<CapacityDay> {
    demand
        .iter()
        .map(|day| {
            let (utilization_percent, is_bottleneck) = match capacity {
                Some(cap) => (
                    day.workers / cap as f64 * 100.0,
                    day.workers > cap as f64,
                ),
                None => (0.0, false),
            };
            CapacityDay {
                date: day.date,
                workers_allocated: day.workers,
                workers_capacity: capacity,
                utilization_percent,
                is_bottleneck,
            }
        })
        .collect()
}

/// One bottleneck per over-capacity day of `timeline`.
///
/// `demand` must be the series `timeline` was built from.
pub fn find_bottlenecks(
    schedule: &ProjectSchedule,
    timeline: &[CapacityDay],
    demand: &[DailyDemand],
    storey: Option<&str>,
) -> Vec<Bottleneck> {
    timeline
        .iter()
        .zip(demand)
        .filter(|(day, _)| day.is_bottleneck)
        .filter_map(|(day, active)| {
            let cap = day.workers_capacity?;
            let overage_percent = (day.workers_allocated - cap as f64) / cap as f64 * 100.0;
            let mut phases: Vec<Phase> = active
                .active
                .iter()
                .filter_map(|&uid| schedule.task(uid).map(|t| t.phase))
                .collect();
            phases.sort();
            phases.dedup();

            let place = match storey {
                Some(name) => format!("on storey {}", name),
                None => "on site".to_string(),
            };
            Some(Bottleneck {
                date: day.date,
                severity: Severity::for_overage(overage_percent),
                overage_percent,
                workers_allocated: day.workers_allocated,
                workers_capacity: cap,
                phases,
                task_uids: active.active.clone(),
                reason: format!(
                    "{} workers needed {} against a capacity of {}",
                    day.workers_allocated, place, cap
                ),
                storey: storey.map(str::to_string),
            })
        })
        .collect()
}

/// Demand per storey, for the detail tasks that carry one.
pub fn storey_demand(schedule: &ProjectSchedule) -> BTreeMap<String, Vec<DailyDemand>> {
    let mut storeys: BTreeMap<&str, Vec<_>> = BTreeMap::new();
    for task in schedule.detail_tasks() {
        if let Some(storey) = task.storey.as_deref() {
            storeys.entry(storey).or_default().push(task);
        }
    }
    storeys
        .into_iter()
        .map(|(name, tasks)| {
            (
                name.to_string(),
                daily_labor_demand(tasks, schedule.start_date, schedule.finish_date),
            )
        })
        .collect()
}

/// Days on which two declared-exclusive phases both have work.
pub fn overlap_conflicts(
    schedule: &ProjectSchedule,
    constraints: &SiteCapacityConstraints,
) -> Vec<OverlapConflict> {
    let rollups = phase_rollups(&schedule.tasks);
    let phases: Vec<Phase> = rollups.keys().copied().collect();

    let mut conflicts = Vec::new();
    for (i, &first) in phases.iter().enumerate() {
        for &second in &phases[i + 1..] {
            if !constraints.are_exclusive(first, second) {
                continue;
            }
            let (a, b) = (&rollups[&first], &rollups[&second]);
            let start_date = a.start_date.max(b.start_date);
            let finish_date = a.finish_date.min(b.finish_date);
            let overlap_days = (finish_date - start_date).num_days();
            if overlap_days > 0 {
                conflicts.push(OverlapConflict {
                    first,
                    second,
                    start_date,
                    finish_date,
                    overlap_days,
                });
            }
        }
    }
    conflicts
}
