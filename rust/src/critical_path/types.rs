//! Types for critical path analysis.

use crate::models::TaskLink;

/// A node of the activity-on-node network.
#[derive(Clone, Debug, PartialEq)]
pub struct Activity {
    pub uid: u32,
    /// Phase order, used for deterministic tie-breaks.
    pub rank: u32,
    pub duration_days: i64,
    pub predecessors: Vec<TaskLink>,
}

/// Per-task timing information in day offsets from the project start.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TaskTiming {
    /// Earliest possible start time (from forward pass).
    pub earliest_start: i64,
    /// Earliest possible finish time (from forward pass).
    pub earliest_finish: i64,
    /// Latest allowable start time (from backward pass).
    pub latest_start: i64,
    /// Latest allowable finish time (from backward pass).
    pub latest_finish: i64,
    /// Total float = latest_start - earliest_start.
    pub total_float: i64,
    /// Delay absorbable without moving any successor.
    pub free_float: i64,
}

impl TaskTiming {
    #[inline]
    pub fn is_critical(&self) -> bool {
        self.total_float == 0
    }
}

/// Result of a forward/backward pass over an activity network.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CriticalPathResult {
    /// Timings aligned with the network's activity order.
    pub timings: Vec<TaskTiming>,
    /// Project length in days (max earliest finish).
    pub project_length: i64,
    /// Ordered uid chain of zero-float tasks from project start to finish.
    pub critical_path: Vec<u32>,
}
