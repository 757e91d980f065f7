//! Earned value engine: baseline capture, EVM indices and S-curves.
//!
//! Every computation is a pure function of a frozen [`EvmBaseline`], the
//! progress records and an explicit data date.

mod baseline;
mod progress;
mod scurve;
mod snapshot;

pub use baseline::{BaselineTask, EvmBaseline};
pub use progress::TaskProgress;
pub use scurve::{s_curve, SCurvePoint};
pub use snapshot::{
    compute_evm_snapshot, Health, ProjectEvmSnapshot, TaskEvmMetrics, TaskStatus, TasksByStatus,
    CRITICAL_INDEX, ON_TARGET_INDEX,
};
