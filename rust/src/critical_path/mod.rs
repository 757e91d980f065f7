//! Critical path and critical chain analysis.
//!
//! The critical path analyzer runs a forward and a backward pass over the
//! finish-to-start relations the sequencer established. The critical chain
//! transformer reruns it on aggressive durations and places CCPM buffers.

mod calculation;
mod chain;
mod types;

pub use calculation::{analyze, apply_timings, ActivityNetwork};
pub use chain::{
    aggressive_duration, buffer_at, consumed_percent, critical_chain, zone_for,
    GREEN_LIMIT_PERCENT, YELLOW_LIMIT_PERCENT,
};
pub use types::{Activity, CriticalPathResult, TaskTiming};
