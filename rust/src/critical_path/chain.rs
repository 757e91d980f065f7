//! Critical chain (CCPM) transformation and buffer consumption.
//!
//! Safety is stripped from every task, the critical path is recomputed on the
//! aggressive durations, and the removed safety is pooled into one project
//! buffer at the end of the chain plus one feeding buffer wherever a non-chain
//! path merges into it.

use chrono::NaiveDate;

use crate::config::ScheduleOptions;
use crate::dates::shift_date;
use crate::error::EngineError;
use crate::{log_changes, log_debug};
use crate::models::{BufferKind, BufferZone, ChainTask, CriticalChain, CriticalChainBuffer};

use super::calculation::{analyze, ActivityNetwork};
use super::types::TaskTiming;

/// Consumed percent below which a buffer is green.
pub const GREEN_LIMIT_PERCENT: f64 = 33.0;
/// Consumed percent below which a buffer is yellow.
pub const YELLOW_LIMIT_PERCENT: f64 = 66.0;

/// Round `value` up to whole days, ignoring float noise just above an integer.
fn ceil_days(value: f64) -> i64 {
    (value - 1e-9).ceil().max(0.0) as i64
}

/// Duration after removing `safety_reduction` of padding (at least one day).
pub fn aggressive_duration(safe_days: i64, safety_reduction: f64) -> i64 {
    if safe_days <= 0 {
        return safe_days.max(0);
    }
    ceil_days(safe_days as f64 * (1.0 - safety_reduction)).max(1)
}

/// Band for a consumed percentage.
pub fn zone_for(consumed_percent: f64) -> BufferZone {
    if consumed_percent < GREEN_LIMIT_PERCENT {
        BufferZone::Green
    } else if consumed_percent < YELLOW_LIMIT_PERCENT {
        BufferZone::Yellow
    } else {
        BufferZone::Red
    }
}

/// Elapsed fraction of the buffer window at `data_date`, as a percentage.
pub fn consumed_percent(buffer: &CriticalChainBuffer, data_date: NaiveDate) -> f64 {
    if buffer.duration_days <= 0 {
        return if data_date >= buffer.start_date { 100.0 } else { 0.0 };
    }
    let elapsed = (data_date - buffer.start_date).num_days() as f64;
    (elapsed / buffer.duration_days as f64).clamp(0.0, 1.0) * 100.0
}

/// Copy of `buffer` with consumption recomputed for `data_date`.
pub fn buffer_at(buffer: &CriticalChainBuffer, data_date: NaiveDate) -> CriticalChainBuffer {
    let consumed = consumed_percent(buffer, data_date);
    CriticalChainBuffer {
        consumed_percent: consumed,
        zone: zone_for(consumed),
        ..buffer.clone()
    }
}

impl CriticalChain {
    /// Copy with every buffer's zone recomputed for `data_date`.
    pub fn at_data_date(&self, data_date: NaiveDate) -> CriticalChain {
        CriticalChain {
            project_buffer: self
                .project_buffer
                .as_ref()
                .map(|b| buffer_at(b, data_date)),
            feeding_buffers: self
                .feeding_buffers
                .iter()
                .map(|b| buffer_at(b, data_date))
                .collect(),
            ..self.clone()
        }
    }
}

/// Driving non-chain path ending at `from`, walked backwards.
fn feeding_path(
    network: &ActivityNetwork,
    timings: &[TaskTiming],
    on_chain: &[bool],
    from: usize,
) -> Vec<usize> {
    let mut path = vec![from];
    let mut current = from;
    loop {
        let Some(next) = network
            .predecessors_of(current)
            .iter()
            .filter(|&&(p, _)| !on_chain[p])
            .max_by_key(|&&(p, lag)| (timings[p].earliest_finish + lag, network.tie_key(p)))
            .map(|&(p, _)| p)
        else {
            break;
        };
        path.push(next);
        current = next;
    }
    path
}

/// Run the CCPM transformation over the safe-duration network.
///
/// `first_buffer_uid` is the uid given to the project buffer; feeding buffers
/// take the following uids.
pub fn critical_chain(
    network: &ActivityNetwork,
    options: &ScheduleOptions,
    first_buffer_uid: u32,
) -> Result<CriticalChain, EngineError> {
    let verbosity = options.verbosity;
    let start_date = options.start_date;

    let original = analyze(network, 0)?;
    let aggressive_network =
        network.with_durations(|a| aggressive_duration(a.duration_days, options.safety_reduction));
    let aggressive = analyze(&aggressive_network, verbosity)?;

    let safe = |idx: usize| network.activities()[idx].duration_days;
    let short = |idx: usize| aggressive_network.activities()[idx].duration_days;

    let mut on_chain = vec![false; network.len()];
    let mut chain = Vec::with_capacity(aggressive.critical_path.len());
    for &uid in &aggressive.critical_path {
        let Some(idx) = network.index_of(uid) else {
            continue;
        };
        on_chain[idx] = true;
        let timing = aggressive.timings[idx];
        chain.push(ChainTask {
            uid,
            safe_duration_days: safe(idx),
            aggressive_duration_days: short(idx),
            start_date: shift_date(start_date, timing.earliest_start)?,
            finish_date: shift_date(start_date, timing.earliest_finish)?,
        });
    }

    let removed_on_chain: i64 = chain.iter().map(ChainTask::removed_safety_days).sum();
    let project_buffer_days = ceil_days(options.project_buffer_ratio * removed_on_chain as f64);

    let mut next_uid = first_buffer_uid;
    let project_buffer = if project_buffer_days > 0 {
        let buffer_start = shift_date(start_date, aggressive.project_length)?;
        let buffer = CriticalChainBuffer {
            uid: next_uid,
            kind: BufferKind::Project,
            name: "Project buffer".to_string(),
            start_date: buffer_start,
            finish_date: shift_date(buffer_start, project_buffer_days)?,
            duration_days: project_buffer_days,
            protects_uid: chain.last().map(|c| c.uid),
            source_uids: chain.iter().map(|c| c.uid).collect(),
            zone: BufferZone::Green,
            consumed_percent: 0.0,
        };
        next_uid += 1;
        log_changes!(
            verbosity,
            "Project buffer: {} days pooled from {} removed",
            project_buffer_days,
            removed_on_chain
        );
        Some(buffer_at(&buffer, start_date))
    } else {
        None
    };

    let mut feeding_buffers = Vec::new();
    for link in &chain {
        let Some(merge_idx) = network.index_of(link.uid) else {
            continue;
        };
        let merge_start = aggressive.timings[merge_idx].earliest_start;
        let mut feeders: Vec<(usize, i64)> = network
            .predecessors_of(merge_idx)
            .iter()
            .copied()
            .filter(|&(p, _)| !on_chain[p])
            .collect();
        feeders.sort_by_key(|&(p, lag)| (network.tie_key(p), std::cmp::Reverse(lag)));
        feeders.dedup_by_key(|&mut (p, _)| p);

        for (feeder, lag) in feeders {
            let path = feeding_path(&aggressive_network, &aggressive.timings, &on_chain, feeder);
            let removed: i64 = path.iter().map(|&i| safe(i) - short(i)).sum();
            let wanted = ceil_days(options.feeding_buffer_ratio * removed as f64);
            // The buffer sits between the feeder's earliest hand-over and the
            // merge start; it shrinks to that gap and never covers its sources.
            let handover = (aggressive.timings[feeder].earliest_finish + lag).max(0);
            let size = wanted.min(merge_start - handover);
            if size <= 0 {
                if wanted > 0 {
                    log_debug!(
                        verbosity,
                        "No room for a feeding buffer before task {} (from task {})",
                        link.uid,
                        network.activities()[feeder].uid
                    );
                }
                continue;
            }
            if size < wanted {
                log_changes!(
                    verbosity,
                    "Feeding buffer before task {} shrunk from {} to {} days",
                    link.uid,
                    wanted,
                    size
                );
            }

            let finish = shift_date(start_date, merge_start)?;
            let source_uids: Vec<u32> = path
                .iter()
                .rev()
                .map(|&i| network.activities()[i].uid)
                .collect();
            let buffer = CriticalChainBuffer {
                uid: next_uid,
                kind: BufferKind::Feeding,
                name: format!(
                    "Feeding buffer before task {} (from task {})",
                    link.uid,
                    network.activities()[feeder].uid
                ),
                start_date: shift_date(finish, -size)?,
                finish_date: finish,
                duration_days: size,
                protects_uid: Some(link.uid),
                source_uids,
                zone: BufferZone::Green,
                consumed_percent: 0.0,
            };
            next_uid += 1;
            log_changes!(
                verbosity,
                "Feeding buffer: {} days before task {}",
                size,
                link.uid
            );
            feeding_buffers.push(buffer_at(&buffer, start_date));
        }
    }

    let ccpm_duration_days = aggressive.project_length + project_buffer_days;
    Ok(CriticalChain {
        chain,
        project_buffer,
        feeding_buffers,
        original_duration_days: original.project_length,
        aggressive_duration_days: aggressive.project_length,
        ccpm_duration_days,
        ccpm_finish_date: shift_date(start_date, ccpm_duration_days)?,
    })
}
