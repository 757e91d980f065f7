//! Turning one priced WBS article into a task's duration, cost and resources.

use crate::config::ScheduleOptions;
use crate::error::EngineWarning;
use crate::models::{ResourceAssignment, ResourceKind, WbsArticle};
use crate::phase::Phase;

/// An article that passed validation, with everything the sequencer needs.
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedArticle<'a> {
    pub article: &'a WbsArticle,
    pub phase: Phase,
    pub quantity: f64,
    pub crew_size: f64,
    pub duration_days: i64,
    pub duration_hours: f64,
    pub cost: f64,
    pub resources: Vec<ResourceAssignment>,
}

/// Validate and size one article.
///
/// Articles with a missing or non-positive quantity, no matched cost, or no
/// phase classification are rejected with a warning naming the article code.
pub fn prepare_article<'a>(
    article: &'a WbsArticle,
    options: &ScheduleOptions,
) -> Result<PreparedArticle<'a>, EngineWarning> {
    let quantity = article
        .quantity
        .filter(|q| q.is_finite() && *q > 0.0)
        .ok_or_else(|| EngineWarning::InvalidQuantity {
            code: article.code.clone(),
            quantity: article.quantity,
        })?;
    let cost = article
        .cost
        .as_ref()
        .ok_or_else(|| EngineWarning::UnmatchedCost {
            code: article.code.clone(),
        })?;
    let phase = article
        .phase
        .ok_or_else(|| EngineWarning::UnclassifiedArticle {
            code: article.code.clone(),
        })?;

    let labor_total: f64 = cost
        .resources
        .iter()
        .filter(|r| r.kind == ResourceKind::Labor && r.units > 0.0)
        .map(|r| r.units)
        .sum();
    let cap = options.max_workers as f64;
    let crew_scale = if cap > 0.0 && labor_total > cap {
        cap / labor_total
    } else {
        1.0
    };
    let crew_size = if labor_total > 0.0 {
        labor_total * crew_scale
    } else {
        1.0
    };

    let crew_days =
        quantity * cost.labor_hours_per_unit.max(0.0) / crew_size / options.hours_per_day;
    let duration_days = ((crew_days - 1e-9).ceil() as i64).max(1);
    let duration_hours = duration_days as f64 * options.hours_per_day;

    let resources = cost
        .resources
        .iter()
        .filter(|r| r.units > 0.0)
        .map(|r| ResourceAssignment {
            kind: r.kind,
            name: r.name.clone(),
            units: match r.kind {
                ResourceKind::Labor => r.units * crew_scale,
                ResourceKind::Equipment => r.units,
                ResourceKind::Material => r.units * quantity,
            },
            rate: r.rate,
        })
        .collect();

    Ok(PreparedArticle {
        article,
        phase,
        quantity,
        crew_size,
        duration_days,
        duration_hours,
        cost: quantity * cost.unit_price,
        resources,
    })
}
