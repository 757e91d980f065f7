//! Critical path calculation using forward and backward passes.

use rustc_hash::FxHashMap;
use std::collections::VecDeque;

use crate::error::EngineError;
use crate::models::ScheduleTask;
use crate::{log_changes, log_debug};

use super::types::{Activity, CriticalPathResult, TaskTiming};

/// Activity-on-node network with integer-indexed adjacency.
///
/// Activities keep their input order; all internal lookups use positions into
/// that order, uids only appear at the boundaries.
#[derive(Clone, Debug)]
pub struct ActivityNetwork {
    activities: Vec<Activity>,
    index: FxHashMap<u32, usize>,
    /// (predecessor index, lag) per activity.
    preds: Vec<Vec<(usize, i64)>>,
    /// (successor index, lag) per activity.
    succs: Vec<Vec<(usize, i64)>>,
}

impl ActivityNetwork {
    /// Build the network. Every predecessor uid must be present.
    pub fn new(activities: Vec<Activity>) -> Result<Self, EngineError> {
        let index: FxHashMap<u32, usize> = activities
            .iter()
            .enumerate()
            .map(|(idx, a)| (a.uid, idx))
            .collect();

        let n = activities.len();
        let mut preds: Vec<Vec<(usize, i64)>> = vec![Vec::new(); n];
        let mut succs: Vec<Vec<(usize, i64)>> = vec![Vec::new(); n];
        for (idx, activity) in activities.iter().enumerate() {
            for link in &activity.predecessors {
                let &pred_idx = index
                    .get(&link.uid)
                    .ok_or(EngineError::UnknownPredecessor(link.uid))?;
                preds[idx].push((pred_idx, link.lag_days));
                succs[pred_idx].push((idx, link.lag_days));
            }
        }

        Ok(Self {
            activities,
            index,
            preds,
            succs,
        })
    }

    /// Network over the detail tasks of a schedule.
    pub fn from_tasks(tasks: &[ScheduleTask]) -> Result<Self, EngineError> {
        let activities = tasks
            .iter()
            .filter(|t| !t.is_summary)
            .map(|t| Activity {
                uid: t.uid,
                rank: t.phase.rank(),
                duration_days: t.duration_days,
                predecessors: t.predecessors.clone(),
            })
            .collect();
        Self::new(activities)
    }

    /// Same relations with durations replaced.
    pub fn with_durations<F>(&self, duration: F) -> Self
    where
        F: Fn(&Activity) -> i64,
    {
        let mut copy = self.clone();
        for activity in &mut copy.activities {
            activity.duration_days = duration(activity);
        }
        copy
    }

    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    #[inline]
    pub fn index_of(&self, uid: u32) -> Option<usize> {
        self.index.get(&uid).copied()
    }

    pub(crate) fn predecessors_of(&self, idx: usize) -> &[(usize, i64)] {
        &self.preds[idx]
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    /// Deterministic tie-break key: later phase, then higher uid, wins.
    #[inline]
    pub(crate) fn tie_key(&self, idx: usize) -> (u32, u32) {
        let a = &self.activities[idx];
        (a.rank, a.uid)
    }
}

/// Topological order (predecessors before successors) using Kahn's algorithm.
fn topological_order(network: &ActivityNetwork) -> Result<Vec<usize>, EngineError> {
    let n = network.len();
    let mut in_degree: Vec<usize> = network.preds.iter().map(|p| p.len()).collect();
    let mut queue: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);

    while let Some(idx) = queue.pop_front() {
        order.push(idx);
        for &(succ, _) in &network.succs[idx] {
            in_degree[succ] -= 1;
            if in_degree[succ] == 0 {
                queue.push_back(succ);
            }
        }
    }

    if order.len() != n {
        return Err(EngineError::CircularDependency);
    }
    Ok(order)
}

/// Forward and backward pass over the network.
///
/// The backward pass is seeded at the project finish. Tasks with zero total
/// float form the critical path, returned as one ordered chain; when several
/// zero-float chains exist the one ending later in phase order wins.
pub fn analyze(network: &ActivityNetwork, verbosity: u8) -> Result<CriticalPathResult, EngineError> {
    if network.is_empty() {
        return Ok(CriticalPathResult::default());
    }

    let order = topological_order(network)?;
    let n = network.len();
    let duration = |idx: usize| network.activities[idx].duration_days;

    // Forward pass
    let mut timings = vec![TaskTiming::default(); n];
    for &idx in &order {
        let earliest_start = network.preds[idx]
            .iter()
            .map(|&(p, lag)| timings[p].earliest_finish + lag)
            .fold(0, i64::max);
        timings[idx].earliest_start = earliest_start;
        timings[idx].earliest_finish = earliest_start + duration(idx);
    }

    let project_length = timings.iter().map(|t| t.earliest_finish).max().unwrap_or(0);

    // Backward pass
    for &idx in order.iter().rev() {
        let latest_finish = network.succs[idx]
            .iter()
            .map(|&(s, lag)| timings[s].latest_start - lag)
            .fold(project_length, i64::min);
        let free_finish = network.succs[idx]
            .iter()
            .map(|&(s, lag)| timings[s].earliest_start - lag)
            .fold(project_length, i64::min);

        let timing = &mut timings[idx];
        timing.latest_finish = latest_finish;
        timing.latest_start = latest_finish - duration(idx);
        timing.total_float = timing.latest_start - timing.earliest_start;
        timing.free_float = (free_finish - timing.earliest_finish).max(0);

        log_debug!(
            verbosity,
            "  task {}: ES={} EF={} LS={} LF={} TF={}",
            network.activities[idx].uid,
            timing.earliest_start,
            timing.earliest_finish,
            timing.latest_start,
            timing.latest_finish,
            timing.total_float
        );
    }

    let critical_path = extract_chain(network, &timings, project_length);
    log_changes!(
        verbosity,
        "Critical path: {} tasks over {} days",
        critical_path.len(),
        project_length
    );

    Ok(CriticalPathResult {
        timings,
        project_length,
        critical_path,
    })
}

/// Copy floats and criticality from `result` onto the matching detail tasks.
pub fn apply_timings(tasks: &mut [ScheduleTask], network: &ActivityNetwork, result: &CriticalPathResult) {
    for task in tasks.iter_mut().filter(|t| !t.is_summary) {
        if let Some(idx) = network.index_of(task.uid) {
            let timing = result.timings[idx];
            task.total_float_days = timing.total_float;
            task.free_float_days = timing.free_float;
            task.is_critical = timing.is_critical();
        }
    }
}

/// Walk back from the latest-finishing critical task along driving
/// predecessors, preferring the later phase (then higher uid) on ties.
fn extract_chain(network: &ActivityNetwork, timings: &[TaskTiming], project_length: i64) -> Vec<u32> {
    let Some(mut current) = (0..network.len())
        .filter(|&i| timings[i].is_critical() && timings[i].earliest_finish == project_length)
        .max_by_key(|&i| network.tie_key(i))
    else {
        return Vec::new();
    };

    let mut chain = vec![network.activities[current].uid];
    loop {
        let start = timings[current].earliest_start;
        let Some(driver) = network.preds[current]
            .iter()
            .filter(|&&(p, lag)| timings[p].is_critical() && timings[p].earliest_finish + lag == start)
            .map(|&(p, _)| p)
            .max_by_key(|&p| network.tie_key(p))
        else {
            break;
        };
        chain.push(network.activities[driver].uid);
        current = driver;
    }

    chain.reverse();
    chain
}
