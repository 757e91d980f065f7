//! Site capacity optimizer.
//!
//! Builds the daily workforce timeline of a schedule, flags days above the
//! site (or per-storey) capacity, reports exclusive phases that overlap and
//! proposes a leveled alternative. The input schedule is never modified;
//! everything returned is advisory.

mod leveling;
mod timeline;
mod types;

pub use leveling::{level_schedule, Leveling};
pub use timeline::{capacity_timeline, find_bottlenecks, overlap_conflicts, storey_demand};
pub use types::{
    Bottleneck, CapacityDay, OptimizedSchedule, OverlapConflict, Severity, Suggestion,
};

use std::collections::BTreeMap;

use crate::config::SiteCapacityConstraints;
use crate::error::EngineError;
use crate::models::ProjectSchedule;
use crate::resources::ProjectResources;
use crate::workforce::daily_labor_demand;
use crate::{log_changes, log_warn};

/// Check `schedule` against `constraints` and suggest how to relieve it.
///
/// A capacity of zero means unconstrained: no bottlenecks and no leveling.
pub fn optimize_site_capacity(
    schedule: &ProjectSchedule,
    resources: &ProjectResources,
    constraints: &SiteCapacityConstraints,
) -> Result<OptimizedSchedule, EngineError> {
    let verbosity = constraints.verbosity;
    let site_capacity = constraints.site_capacity();
    if site_capacity.is_none() {
        log_warn!(verbosity, "No site capacity set, treating the site as unconstrained");
    }

    let demand = daily_labor_demand(&schedule.tasks, schedule.start_date, schedule.finish_date);
    let site_timeline = capacity_timeline(&demand, site_capacity);
    let mut bottlenecks = find_bottlenecks(schedule, &site_timeline, &demand, None);

    let mut storey_timelines = BTreeMap::new();
    if let Some(floor_capacity) = constraints.floor_capacity() {
        for (storey, demand) in storey_demand(schedule) {
            let timeline = capacity_timeline(&demand, Some(floor_capacity));
            bottlenecks.extend(find_bottlenecks(schedule, &timeline, &demand, Some(storey.as_str())));
            storey_timelines.insert(storey, timeline);
        }
    }
    bottlenecks.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.storey.cmp(&b.storey)));

    let conflicts = overlap_conflicts(schedule, constraints);
    let mut suggestions: Vec<Suggestion> = conflicts
        .iter()
        .map(|c| Suggestion::RemoveOverlap {
            first: c.first,
            second: c.second,
            overlap_days: c.overlap_days,
            reason: format!("{} and {} must not share the site", c.first, c.second),
        })
        .collect();

    let original_duration_days = schedule.total_duration_days;
    let site_bottleneck = site_timeline.iter().any(|d| d.is_bottleneck);
    let (leveled_duration_days, leveled_tasks, efficiency_gain) = match site_capacity {
        Some(capacity) if site_bottleneck => {
            let leveling = level_schedule(schedule, capacity, verbosity)?;
            suggestions.extend(leveling.suggestions);
            let gain = if original_duration_days > 0 {
                (original_duration_days - leveling.duration_days) as f64
                    / original_duration_days as f64
                    * 100.0
            } else {
                0.0
            };
            (Some(leveling.duration_days), Some(leveling.tasks), gain)
        }
        _ => (None, None, 0.0),
    };

    log_changes!(
        verbosity,
        "Capacity: {} bottleneck days, {} conflicts, {} suggestions",
        bottlenecks.len(),
        conflicts.len(),
        suggestions.len()
    );

    Ok(OptimizedSchedule {
        original_duration_days,
        leveled_duration_days,
        leveled_tasks,
        labor_hours: resources.total_labor_hours,
        capacity_timeline: site_timeline,
        storey_timelines,
        bottlenecks,
        overlap_conflicts: conflicts,
        suggestions,
        efficiency_gain,
    })
}
