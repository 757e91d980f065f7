//! Core data types: the priced WBS that comes in and the schedule that goes out.
//!
//! Field names are part of the contract with the schedule-file and budget
//! exporters, which map them positionally into external formats.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::phase::Phase;
use crate::resources::ProjectResources;

/// Kind of a resource line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Labor,
    Material,
    Equipment,
}

/// One resource line of a matched unit cost, expressed per article unit
/// for materials and per crew for labor and equipment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceRequirement {
    pub kind: ResourceKind,
    pub name: String,
    pub units: f64,
    pub rate: f64,
}

/// Unit cost matched to a WBS article by the external cost engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchedCost {
    pub unit_price: f64,
    /// Crew productivity: man-hours needed per article unit.
    pub labor_hours_per_unit: f64,
    #[serde(default)]
    pub resources: Vec<ResourceRequirement>,
}

/// A leaf of the WBS: a measurable, priced line item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WbsArticle {
    pub code: String,
    pub description: String,
    #[serde(default)]
    pub unit: String,
    pub quantity: Option<f64>,
    pub phase: Option<Phase>,
    #[serde(default)]
    pub storey: Option<String>,
    pub cost: Option<MatchedCost>,
}

/// A chapter or sub-chapter of the WBS.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WbsChapter {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub chapters: Vec<WbsChapter>,
    #[serde(default)]
    pub articles: Vec<WbsArticle>,
}

/// The classified, cost-matched work breakdown structure.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WbsTree {
    pub chapters: Vec<WbsChapter>,
}

impl WbsTree {
    /// Flatten into document order (depth-first, articles before sub-chapters).
    pub fn articles(&self) -> Vec<&WbsArticle> {
        fn walk<'a>(chapter: &'a WbsChapter, out: &mut Vec<&'a WbsArticle>) {
            out.extend(chapter.articles.iter());
            for child in &chapter.chapters {
                walk(child, out);
            }
        }

        let mut out = Vec::new();
        for chapter in &self.chapters {
            walk(chapter, &mut out);
        }
        out
    }
}

/// A resource assigned to a scheduled task.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceAssignment {
    pub kind: ResourceKind,
    pub name: String,
    /// Workers or machines for labor/equipment; total quantity for materials.
    pub units: f64,
    pub rate: f64,
}

impl ResourceAssignment {
    /// Hours this line books on a task of the given working length.
    pub fn hours(&self, duration_hours: f64) -> f64 {
        match self.kind {
            ResourceKind::Labor | ResourceKind::Equipment => duration_hours * self.units,
            ResourceKind::Material => 0.0,
        }
    }

    /// Cost of this line on a task of the given working length.
    pub fn line_cost(&self, duration_hours: f64) -> f64 {
        match self.kind {
            ResourceKind::Labor | ResourceKind::Equipment => {
                self.hours(duration_hours) * self.rate
            }
            ResourceKind::Material => self.units * self.rate,
        }
    }
}

/// Finish-to-start relation with a lag (negative = lead).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskLink {
    pub uid: u32,
    pub lag_days: i64,
}

/// A dated task. Summary tasks are roll-ups of one phase.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduleTask {
    pub uid: u32,
    pub name: String,
    pub phase: Phase,
    pub wbs_code: Option<String>,
    pub start_date: NaiveDate,
    /// Exclusive: the task is active on `start_date <= day < finish_date`.
    pub finish_date: NaiveDate,
    pub duration_days: i64,
    pub duration_hours: f64,
    pub cost: f64,
    pub resources: Vec<ResourceAssignment>,
    pub predecessors: Vec<TaskLink>,
    pub storey: Option<String>,
    pub is_summary: bool,
    pub is_critical: bool,
    pub total_float_days: i64,
    pub free_float_days: i64,
    pub notes: String,
}

impl ScheduleTask {
    /// Whether the task is active on `day`.
    #[inline]
    pub fn is_active_on(&self, day: NaiveDate) -> bool {
        self.start_date <= day && day < self.finish_date
    }

    /// Workers on site while the task runs.
    pub fn labor_units(&self) -> f64 {
        self.resources
            .iter()
            .filter(|r| r.kind == ResourceKind::Labor)
            .map(|r| r.units)
            .sum()
    }
}

/// Workforce statistics over the project window.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamSummary {
    pub average_workers: f64,
    pub max_workers: f64,
    pub total_man_hours: f64,
}

/// Which schedule a buffer protects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferKind {
    Project,
    Feeding,
}

/// Buffer consumption band.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferZone {
    Green,
    Yellow,
    Red,
}

/// A CCPM buffer placed on the schedule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CriticalChainBuffer {
    pub uid: u32,
    pub kind: BufferKind,
    pub name: String,
    pub start_date: NaiveDate,
    pub finish_date: NaiveDate,
    pub duration_days: i64,
    /// Chain task the buffer protects (the merge point for feeding buffers).
    pub protects_uid: Option<u32>,
    /// Tasks whose removed safety was pooled into this buffer.
    pub source_uids: Vec<u32>,
    pub zone: BufferZone,
    pub consumed_percent: f64,
}

/// Safe vs aggressive duration of one chain task.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChainTask {
    pub uid: u32,
    pub safe_duration_days: i64,
    pub aggressive_duration_days: i64,
    pub start_date: NaiveDate,
    pub finish_date: NaiveDate,
}

impl ChainTask {
    pub fn removed_safety_days(&self) -> i64 {
        self.safe_duration_days - self.aggressive_duration_days
    }
}

/// Result of the critical chain transformation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CriticalChain {
    pub chain: Vec<ChainTask>,
    pub project_buffer: Option<CriticalChainBuffer>,
    pub feeding_buffers: Vec<CriticalChainBuffer>,
    pub original_duration_days: i64,
    pub aggressive_duration_days: i64,
    pub ccpm_duration_days: i64,
    pub ccpm_finish_date: NaiveDate,
}

/// The fully dated project schedule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectSchedule {
    pub start_date: NaiveDate,
    pub finish_date: NaiveDate,
    pub tasks: Vec<ScheduleTask>,
    pub total_duration_days: i64,
    pub total_cost: f64,
    pub team_summary: TeamSummary,
    /// Ordered finish-to-start chain of zero-float task uids.
    pub critical_path: Vec<u32>,
    pub critical_chain: Option<CriticalChain>,
    pub resources: ProjectResources,
}

impl ProjectSchedule {
    /// Look up a task by uid (uids are arena positions + 1).
    pub fn task(&self, uid: u32) -> Option<&ScheduleTask> {
        let idx = (uid as usize).checked_sub(1)?;
        self.tasks.get(idx).filter(|t| t.uid == uid)
    }

    /// Non-summary tasks in uid order.
    pub fn detail_tasks(&self) -> impl Iterator<Item = &ScheduleTask> {
        self.tasks.iter().filter(|t| !t.is_summary)
    }

    /// Whether `uid` lies on the critical path.
    pub fn is_critical(&self, uid: u32) -> bool {
        self.critical_path.contains(&uid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(code: &str) -> WbsArticle {
        WbsArticle {
            code: code.to_string(),
            description: format!("Article {}", code),
            unit: "m2".to_string(),
            quantity: Some(1.0),
            phase: Some(Phase::Masonry),
            storey: None,
            cost: None,
        }
    }

    #[test]
    fn test_wbs_flattens_in_document_order() {
        let tree = WbsTree {
            chapters: vec![
                WbsChapter {
                    code: "01".to_string(),
                    name: "Works".to_string(),
                    chapters: vec![WbsChapter {
                        code: "01.02".to_string(),
                        name: "Sub".to_string(),
                        chapters: vec![],
                        articles: vec![article("01.02.001")],
                    }],
                    articles: vec![article("01.001")],
                },
                WbsChapter {
                    code: "02".to_string(),
                    name: "More".to_string(),
                    chapters: vec![],
                    articles: vec![article("02.001")],
                },
            ],
        };

        let codes: Vec<&str> = tree.articles().iter().map(|a| a.code.as_str()).collect();
        assert_eq!(codes, vec!["01.001", "01.02.001", "02.001"]);
    }

    #[test]
    fn test_resource_line_costs() {
        let labor = ResourceAssignment {
            kind: ResourceKind::Labor,
            name: "Mason".to_string(),
            units: 2.0,
            rate: 20.0,
        };
        assert_eq!(labor.hours(16.0), 32.0);
        assert_eq!(labor.line_cost(16.0), 640.0);

        let material = ResourceAssignment {
            kind: ResourceKind::Material,
            name: "Brick".to_string(),
            units: 500.0,
            rate: 0.5,
        };
        assert_eq!(material.hours(16.0), 0.0);
        assert_eq!(material.line_cost(16.0), 250.0);
    }

    #[test]
    fn test_active_window_is_half_open() {
        let d = |day| NaiveDate::from_ymd_opt(2025, 3, day).unwrap();
        let task = ScheduleTask {
            uid: 1,
            name: "t".to_string(),
            phase: Phase::Masonry,
            wbs_code: None,
            start_date: d(3),
            finish_date: d(5),
            duration_days: 2,
            duration_hours: 16.0,
            cost: 0.0,
            resources: vec![],
            predecessors: vec![],
            storey: None,
            is_summary: false,
            is_critical: false,
            total_float_days: 0,
            free_float_days: 0,
            notes: String::new(),
        };
        assert!(!task.is_active_on(d(2)));
        assert!(task.is_active_on(d(3)));
        assert!(task.is_active_on(d(4)));
        assert!(!task.is_active_on(d(5)));
    }
}
