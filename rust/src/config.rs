//! Configuration types for scheduling, capacity checks and earned value.
//!
//! All configuration is passed explicitly; nothing is read from the
//! environment.

use chrono::NaiveDate;
use pyo3::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::phase::Phase;

/// Options for turning a WBS into a dated schedule.
#[pyclass]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduleOptions {
    /// First working day of the project.
    #[pyo3(get, set)]
    pub start_date: NaiveDate,
    /// Crew size cap per task (0 = uncapped).
    #[pyo3(get, set)]
    pub max_workers: u32,
    /// Working hours in one day.
    #[pyo3(get, set)]
    pub hours_per_day: f64,
    /// Run the critical chain transformation after the critical path.
    #[pyo3(get, set)]
    pub use_critical_chain: bool,
    /// Fraction of each safe duration removed as padding (0.0-1.0).
    #[pyo3(get, set)]
    pub safety_reduction: f64,
    /// Fraction of removed chain safety pooled into the project buffer.
    #[pyo3(get, set)]
    pub project_buffer_ratio: f64,
    /// Fraction of removed feeding-path safety pooled into each feeding buffer.
    #[pyo3(get, set)]
    pub feeding_buffer_ratio: f64,
    /// Verbosity level: 0=silent, 1=warnings, 2=changes, 3=debug.
    #[pyo3(get, set)]
    pub verbosity: u8,
}

impl ScheduleOptions {
    /// Default options for a project starting on `start_date`.
    pub fn starting(start_date: NaiveDate) -> Self {
        Self {
            start_date,
            max_workers: 0,
            hours_per_day: 8.0,
            use_critical_chain: false,
            safety_reduction: 0.5,
            project_buffer_ratio: 0.5,
            feeding_buffer_ratio: 0.5,
            verbosity: 0,
        }
    }

    /// Reject values the algorithms cannot work with.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.hours_per_day > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "hours_per_day must be positive, got {}",
                self.hours_per_day
            )));
        }
        for (name, value) in [
            ("safety_reduction", self.safety_reduction),
            ("project_buffer_ratio", self.project_buffer_ratio),
            ("feeding_buffer_ratio", self.feeding_buffer_ratio),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::InvalidConfig(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

#[pymethods]
impl ScheduleOptions {
    #[new]
    #[pyo3(signature = (
        start_date,
        max_workers=None,
        hours_per_day=None,
        use_critical_chain=None,
        safety_reduction=None,
        project_buffer_ratio=None,
        feeding_buffer_ratio=None,
        verbosity=None
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        start_date: NaiveDate,
        max_workers: Option<u32>,
        hours_per_day: Option<f64>,
        use_critical_chain: Option<bool>,
        safety_reduction: Option<f64>,
        project_buffer_ratio: Option<f64>,
        feeding_buffer_ratio: Option<f64>,
        verbosity: Option<u8>,
    ) -> Self {
        let defaults = Self::starting(start_date);
        Self {
            start_date,
            max_workers: max_workers.unwrap_or(defaults.max_workers),
            hours_per_day: hours_per_day.unwrap_or(defaults.hours_per_day),
            use_critical_chain: use_critical_chain.unwrap_or(defaults.use_critical_chain),
            safety_reduction: safety_reduction.unwrap_or(defaults.safety_reduction),
            project_buffer_ratio: project_buffer_ratio.unwrap_or(defaults.project_buffer_ratio),
            feeding_buffer_ratio: feeding_buffer_ratio.unwrap_or(defaults.feeding_buffer_ratio),
            verbosity: verbosity.unwrap_or(defaults.verbosity),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "ScheduleOptions(start_date={}, max_workers={}, use_critical_chain={}, safety_reduction={})",
            self.start_date, self.max_workers, self.use_critical_chain, self.safety_reduction
        )
    }
}

/// Site limits the capacity optimizer checks the schedule against.
#[pyclass]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteCapacityConstraints {
    /// Workers allowed on site per day (0 = unconstrained).
    #[pyo3(get, set)]
    pub max_workers: u32,
    /// Workers allowed per storey per day, where tasks carry a storey.
    #[pyo3(get, set)]
    pub max_workers_per_floor: Option<u32>,
    /// Phase pairs that must not run on the same day.
    pub exclusive_phases: Vec<(Phase, Phase)>,
    /// Verbosity level: 0=silent, 1=warnings, 2=changes, 3=debug.
    #[pyo3(get, set)]
    pub verbosity: u8,
}

impl SiteCapacityConstraints {
    /// Global capacity, `None` when unconstrained.
    pub fn site_capacity(&self) -> Option<u32> {
        (self.max_workers > 0).then_some(self.max_workers)
    }

    /// Per-storey capacity, `None` when unconstrained.
    pub fn floor_capacity(&self) -> Option<u32> {
        self.max_workers_per_floor.filter(|&c| c > 0)
    }

    /// Whether `a` and `b` are declared mutually exclusive (in either order).
    pub fn are_exclusive(&self, a: Phase, b: Phase) -> bool {
        self.exclusive_phases
            .iter()
            .any(|&(x, y)| (x == a && y == b) || (x == b && y == a))
    }
}

#[pymethods]
impl SiteCapacityConstraints {
    #[new]
    #[pyo3(signature = (max_workers, max_workers_per_floor=None, exclusive_phases=None, verbosity=0))]
    fn new(
        max_workers: u32,
        max_workers_per_floor: Option<u32>,
        exclusive_phases: Option<Vec<(String, String)>>,
        verbosity: u8,
    ) -> PyResult<Self> {
        let exclusive_phases = exclusive_phases
            .unwrap_or_default()
            .into_iter()
            .map(|(a, b)| Ok((a.parse::<Phase>()?, b.parse::<Phase>()?)))
            .collect::<Result<Vec<_>, EngineError>>()
            .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))?;
        Ok(Self {
            max_workers,
            max_workers_per_floor,
            exclusive_phases,
            verbosity,
        })
    }

    fn __repr__(&self) -> String {
        format!(
            "SiteCapacityConstraints(max_workers={}, max_workers_per_floor={:?}, exclusive_phases={})",
            self.max_workers,
            self.max_workers_per_floor,
            self.exclusive_phases.len()
        )
    }
}

/// How Actual Cost is obtained for earned value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActualCostMode {
    /// Sum the actual costs reported with each progress record.
    Tracked,
    /// Estimate as percent complete x planned cost.
    EstimatedFromProgress,
}

/// Options for the earned value engine.
#[pyclass]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvmOptions {
    /// Use tracked actual costs instead of estimating them from progress.
    #[pyo3(get, set)]
    pub tracked_actual_cost: bool,
    /// Verbosity level: 0=silent, 1=warnings, 2=changes, 3=debug.
    #[pyo3(get, set)]
    pub verbosity: u8,
}

impl Default for EvmOptions {
    fn default() -> Self {
        Self {
            tracked_actual_cost: true,
            verbosity: 0,
        }
    }
}

impl EvmOptions {
    pub fn actual_cost_mode(&self) -> ActualCostMode {
        if self.tracked_actual_cost {
            ActualCostMode::Tracked
        } else {
            ActualCostMode::EstimatedFromProgress
        }
    }
}

#[pymethods]
impl EvmOptions {
    #[new]
    #[pyo3(signature = (tracked_actual_cost=true, verbosity=0))]
    fn new(tracked_actual_cost: bool, verbosity: u8) -> Self {
        Self {
            tracked_actual_cost,
            verbosity,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "EvmOptions(tracked_actual_cost={}, verbosity={})",
            self.tracked_actual_cost, self.verbosity
        )
    }
}
