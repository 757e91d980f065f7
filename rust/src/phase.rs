//! Construction phase taxonomy and the fixed sequencing rule tables.
//!
//! Phases form a total order. The sequencer walks them in that order, the
//! critical path uses the order to break ties, and the capacity optimizer uses
//! it to keep suggestions from reordering work.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;

/// A construction phase. Declaration order is the precedence order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    SiteSetup,
    Earthworks,
    Foundations,
    Structure,
    Masonry,
    Roofing,
    Waterproofing,
    ExteriorFinishes,
    InteriorFinishes,
    Floors,
    Ceilings,
    Openings,
    Plumbing,
    Electrical,
    Telecom,
    Hvac,
    FireSafety,
    Insulation,
    ExteriorWorks,
    TestingCloseout,
}

impl Phase {
    /// All phases in precedence order.
    pub const ALL: [Phase; 20] = [
        Phase::SiteSetup,
        Phase::Earthworks,
        Phase::Foundations,
        Phase::Structure,
        Phase::Masonry,
        Phase::Roofing,
        Phase::Waterproofing,
        Phase::ExteriorFinishes,
        Phase::InteriorFinishes,
        Phase::Floors,
        Phase::Ceilings,
        Phase::Openings,
        Phase::Plumbing,
        Phase::Electrical,
        Phase::Telecom,
        Phase::Hvac,
        Phase::FireSafety,
        Phase::Insulation,
        Phase::ExteriorWorks,
        Phase::TestingCloseout,
    ];

    /// Position in the precedence order (0 = first).
    #[inline]
    pub fn rank(self) -> u32 {
        self as u32
    }

    /// Human-readable name, used for summary task names.
    pub fn display_name(self) -> &'static str {
        match self {
            Phase::SiteSetup => "Site setup",
            Phase::Earthworks => "Earthworks",
            Phase::Foundations => "Foundations",
            Phase::Structure => "Structure",
            Phase::Masonry => "Masonry",
            Phase::Roofing => "Roofing",
            Phase::Waterproofing => "Waterproofing",
            Phase::ExteriorFinishes => "Exterior finishes",
            Phase::InteriorFinishes => "Interior finishes",
            Phase::Floors => "Floors",
            Phase::Ceilings => "Ceilings",
            Phase::Openings => "Openings",
            Phase::Plumbing => "Plumbing",
            Phase::Electrical => "Electrical",
            Phase::Telecom => "Telecom",
            Phase::Hvac => "HVAC",
            Phase::FireSafety => "Fire safety",
            Phase::Insulation => "Insulation",
            Phase::ExteriorWorks => "Exterior works",
            Phase::TestingCloseout => "Testing and closeout",
        }
    }

    /// Identifier used on the wire (matches the serde representation).
    pub fn key(self) -> &'static str {
        match self {
            Phase::SiteSetup => "site_setup",
            Phase::Earthworks => "earthworks",
            Phase::Foundations => "foundations",
            Phase::Structure => "structure",
            Phase::Masonry => "masonry",
            Phase::Roofing => "roofing",
            Phase::Waterproofing => "waterproofing",
            Phase::ExteriorFinishes => "exterior_finishes",
            Phase::InteriorFinishes => "interior_finishes",
            Phase::Floors => "floors",
            Phase::Ceilings => "ceilings",
            Phase::Openings => "openings",
            Phase::Plumbing => "plumbing",
            Phase::Electrical => "electrical",
            Phase::Telecom => "telecom",
            Phase::Hvac => "hvac",
            Phase::FireSafety => "fire_safety",
            Phase::Insulation => "insulation",
            Phase::ExteriorWorks => "exterior_works",
            Phase::TestingCloseout => "testing_closeout",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Phase {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Phase::ALL
            .iter()
            .copied()
            .find(|p| p.key() == wanted)
            .ok_or_else(|| EngineError::UnknownPhase(s.to_string()))
    }
}

/// Days a phase may start before the previous phase finishes.
///
/// Pairs not listed here are strictly finish-to-start.
const PHASE_OVERLAPS: &[(Phase, Phase, i64)] = &[
    (Phase::Structure, Phase::Masonry, 5),
    (Phase::ExteriorFinishes, Phase::InteriorFinishes, 5),
    (Phase::Floors, Phase::Ceilings, 3),
    (Phase::Plumbing, Phase::Electrical, 10),
    (Phase::Electrical, Phase::Telecom, 10),
    (Phase::Telecom, Phase::Hvac, 5),
    (Phase::Hvac, Phase::FireSafety, 5),
];

/// Allowed overlap (in days) of `next` over the finish of `previous`.
pub fn allowed_overlap_days(previous: Phase, next: Phase) -> i64 {
    PHASE_OVERLAPS
        .iter()
        .find(|(p, n, _)| *p == previous && *n == next)
        .map(|(_, _, days)| *days)
        .unwrap_or(0)
}

/// A trade-sequencing rule: work matching one of `successors` must wait
/// `lag_days` after work matching `predecessor` finishes (cure/dry times).
///
/// Keywords match at the start of a word, so "tile" finds "Floor tiles" but
/// not "ventilation".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TradeLagRule {
    pub predecessor: &'static str,
    pub successors: &'static [&'static str],
    pub lag_days: i64,
}

/// Keyword-matched lag rules, applied within a phase.
pub const TRADE_LAG_RULES: &[TradeLagRule] = &[
    TradeLagRule {
        predecessor: "plaster",
        successors: &["paint"],
        lag_days: 7,
    },
    TradeLagRule {
        predecessor: "screed",
        successors: &["tile", "tiling"],
        lag_days: 5,
    },
    TradeLagRule {
        predecessor: "concrete",
        successors: &["formwork strip"],
        lag_days: 7,
    },
    TradeLagRule {
        predecessor: "primer",
        successors: &["paint"],
        lag_days: 1,
    },
];

/// Whether `keyword` occurs in `lowered` at the start of a word.
fn contains_word_start(lowered: &str, keyword: &str) -> bool {
    lowered.match_indices(keyword).any(|(at, _)| {
        lowered[..at]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric())
    })
}

/// Rules whose successor keywords match `description`.
pub fn lag_rules_for_successor(description: &str) -> impl Iterator<Item = &'static TradeLagRule> {
    let lowered = description.to_lowercase();
    TRADE_LAG_RULES.iter().filter(move |rule| {
        rule.successors
            .iter()
            .any(|keyword| contains_word_start(&lowered, keyword))
    })
}

/// Whether `description` matches the predecessor side of `rule`.
pub fn matches_predecessor(rule: &TradeLagRule, description: &str) -> bool {
    contains_word_start(&description.to_lowercase(), rule.predecessor)
}
