//! Task sequencer: turns a priced WBS into a dated, phase-ordered schedule.
//!
//! Phases follow the fixed taxonomy order, tasks inside a phase run in
//! document order, and trade lag and phase overlap rules shape the relations
//! before the critical path pass assigns dates.

mod articles;
mod core;
mod rollup;

pub use articles::{prepare_article, PreparedArticle};
pub use core::{build_schedule, ScheduleBuild, TaskSequencer};
pub use rollup::{apply_rollups, phase_rollups, PhaseRollup};
