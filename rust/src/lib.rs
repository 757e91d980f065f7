//! Rust implementation of the buildplan scheduling and earned value engine.
//!
//! The pipeline turns a priced WBS into a dated schedule (sequencer, critical
//! path, optional critical chain), aggregates its resources, checks it against
//! site capacity and tracks progress against a frozen baseline.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use chrono::NaiveDate;
use pyo3::prelude::*;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub mod capacity;
mod config;
pub mod critical_path;
pub mod dates;
mod error;
pub mod evm;
pub mod interner;
pub mod logging;
mod models;
pub mod phase;
pub mod resources;
pub mod sequencer;
pub mod validation;
pub mod workforce;

pub use capacity::{optimize_site_capacity, OptimizedSchedule};
pub use config::{ActualCostMode, EvmOptions, ScheduleOptions, SiteCapacityConstraints};
pub use error::{EngineError, EngineWarning};
pub use evm::{compute_evm_snapshot, s_curve, EvmBaseline, ProjectEvmSnapshot, SCurvePoint, TaskProgress};
pub use models::{
    BufferKind, BufferZone, ChainTask, CriticalChain, CriticalChainBuffer, MatchedCost,
    ProjectSchedule, ResourceAssignment, ResourceKind, ResourceRequirement, ScheduleTask, TaskLink,
    TeamSummary, WbsArticle, WbsChapter, WbsTree,
};
pub use phase::Phase;
pub use resources::{aggregate_resources, ProjectResources, ResourceAccumulator, ResourceTotal};
pub use sequencer::{build_schedule, ScheduleBuild, TaskSequencer};
pub use validation::{validate_schedule, ScheduleViolation, ViolationKind};

fn value_error(err: impl std::fmt::Display) -> PyErr {
    pyo3::exceptions::PyValueError::new_err(err.to_string())
}

fn from_json<T: DeserializeOwned>(json: &str) -> PyResult<T> {
    serde_json::from_str(json)
        .map_err(EngineError::from)
        .map_err(value_error)
}

fn to_json<T: Serialize>(value: &T) -> PyResult<String> {
    serde_json::to_string(value)
        .map_err(EngineError::from)
        .map_err(value_error)
}

/// Build a dated schedule from a WBS document.
///
/// # Arguments
/// * `wbs_json` - The classified, cost-matched WBS tree as JSON
/// * `options` - Scheduling options
///
/// # Returns
/// * JSON object with `schedule` and the `warnings` for excluded articles
///
/// # Raises
/// * ValueError on malformed JSON, invalid options or circular relations
#[pyfunction]
#[pyo3(name = "build_schedule")]
fn py_build_schedule(wbs_json: &str, options: ScheduleOptions) -> PyResult<String> {
    let wbs: WbsTree = from_json(wbs_json)?;
    let build = build_schedule(&wbs, &options).map_err(value_error)?;
    to_json(&build)
}

/// Reduce the resource lines of a task list (JSON) to project totals (JSON).
#[pyfunction]
#[pyo3(name = "aggregate_resources")]
fn py_aggregate_resources(tasks_json: &str) -> PyResult<String> {
    let tasks: Vec<ScheduleTask> = from_json(tasks_json)?;
    to_json(&aggregate_resources(&tasks))
}

/// Check a schedule against site capacity.
///
/// `resources_json` defaults to the totals stored on the schedule.
#[pyfunction]
#[pyo3(name = "optimize_site_capacity", signature = (schedule_json, constraints, resources_json=None))]
fn py_optimize_site_capacity(
    schedule_json: &str,
    constraints: SiteCapacityConstraints,
    resources_json: Option<&str>,
) -> PyResult<String> {
    let schedule: ProjectSchedule = from_json(schedule_json)?;
    let resources = match resources_json {
        Some(json) => from_json(json)?,
        None => schedule.resources.clone(),
    };
    let optimized =
        optimize_site_capacity(&schedule, &resources, &constraints).map_err(value_error)?;
    to_json(&optimized)
}

/// Freeze a schedule as the earned value baseline.
///
/// # Returns
/// * JSON object with `baseline` and `warnings` for skipped tasks
#[pyfunction]
#[pyo3(name = "capture_baseline")]
fn py_capture_baseline(schedule_json: &str, captured_at: NaiveDate) -> PyResult<String> {
    let schedule: ProjectSchedule = from_json(schedule_json)?;
    let (baseline, warnings) = EvmBaseline::capture(&schedule, captured_at);
    to_json(&serde_json::json!({
        "baseline": baseline,
        "warnings": warnings,
    }))
}

/// Earned value snapshot of the progress records on `data_date`.
#[pyfunction]
#[pyo3(name = "compute_evm_snapshot", signature = (baseline_json, schedule_json, progress_json, data_date, options=None))]
fn py_compute_evm_snapshot(
    baseline_json: &str,
    schedule_json: &str,
    progress_json: &str,
    data_date: NaiveDate,
    options: Option<EvmOptions>,
) -> PyResult<String> {
    let baseline: EvmBaseline = from_json(baseline_json)?;
    let schedule: ProjectSchedule = from_json(schedule_json)?;
    let progress: Vec<TaskProgress> = from_json(progress_json)?;
    let options = options.unwrap_or_default();
    let snapshot = compute_evm_snapshot(&baseline, &schedule, &progress, data_date, &options)
        .map_err(value_error)?;
    to_json(&snapshot)
}

/// S-curve points for the baseline and progress records.
#[pyfunction]
#[pyo3(name = "s_curve", signature = (baseline_json, progress_json, data_date, options=None))]
fn py_s_curve(
    baseline_json: &str,
    progress_json: &str,
    data_date: NaiveDate,
    options: Option<EvmOptions>,
) -> PyResult<String> {
    let baseline: EvmBaseline = from_json(baseline_json)?;
    let progress: Vec<TaskProgress> = from_json(progress_json)?;
    to_json(&s_curve(&baseline, &progress, data_date, &options.unwrap_or_default()))
}

/// Critical chain buffers of a schedule with zones recomputed for `data_date`.
///
/// Returns JSON `null` when the schedule has no critical chain.
#[pyfunction]
#[pyo3(name = "buffer_status")]
fn py_buffer_status(schedule_json: &str, data_date: NaiveDate) -> PyResult<String> {
    let schedule: ProjectSchedule = from_json(schedule_json)?;
    let chain = schedule
        .critical_chain
        .as_ref()
        .map(|c| c.at_data_date(data_date));
    to_json(&chain)
}

/// Invariant violations of a schedule (JSON list, empty when consistent).
#[pyfunction]
#[pyo3(name = "validate_schedule")]
fn py_validate_schedule(schedule_json: &str) -> PyResult<String> {
    let schedule: ProjectSchedule = from_json(schedule_json)?;
    to_json(&validate_schedule(&schedule))
}

/// The buildplan.rust Python module.
#[pymodule]
fn rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Config types
    m.add_class::<ScheduleOptions>()?;
    m.add_class::<SiteCapacityConstraints>()?;
    m.add_class::<EvmOptions>()?;

    // Algorithms
    m.add_function(wrap_pyfunction!(py_build_schedule, m)?)?;
    m.add_function(wrap_pyfunction!(py_aggregate_resources, m)?)?;
    m.add_function(wrap_pyfunction!(py_optimize_site_capacity, m)?)?;
    m.add_function(wrap_pyfunction!(py_capture_baseline, m)?)?;
    m.add_function(wrap_pyfunction!(py_compute_evm_snapshot, m)?)?;
    m.add_function(wrap_pyfunction!(py_s_curve, m)?)?;
    m.add_function(wrap_pyfunction!(py_buffer_status, m)?)?;
    m.add_function(wrap_pyfunction!(py_validate_schedule, m)?)?;

    Ok(())
}
