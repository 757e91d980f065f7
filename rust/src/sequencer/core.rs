//! Task sequencer: priced WBS articles to a dated and analyzed schedule.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Range;

use crate::config::ScheduleOptions;
use crate::critical_path::{analyze, apply_timings, critical_chain, ActivityNetwork};
use crate::dates::shift_date;
use crate::error::{EngineError, EngineWarning};
use crate::models::{ProjectSchedule, ScheduleTask, TaskLink, WbsTree};
use crate::phase::{allowed_overlap_days, lag_rules_for_successor, matches_predecessor, Phase};
use crate::resources::aggregate_resources;
use crate::workforce::team_summary;
use crate::{log_changes, log_warn};

use super::articles::{prepare_article, PreparedArticle};
use super::rollup::apply_rollups;

/// A schedule plus the warnings collected while building it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduleBuild {
    pub schedule: ProjectSchedule,
    pub warnings: Vec<EngineWarning>,
}

/// Positions of one phase's tasks in the task arena.
#[derive(Clone, Debug)]
struct PhaseBlock {
    phase: Phase,
    details: Range<usize>,
}

/// Builds schedules with one fixed set of options.
#[derive(Clone, Debug)]
pub struct TaskSequencer {
    options: ScheduleOptions,
}

impl TaskSequencer {
    pub fn new(options: ScheduleOptions) -> Result<Self, EngineError> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &ScheduleOptions {
        &self.options
    }

    /// Sequence, date and analyze every valid article of `wbs`.
    pub fn sequence(&self, wbs: &WbsTree) -> Result<ScheduleBuild, EngineError> {
        let verbosity = self.options.verbosity;
        let (groups, warnings) = self.prepare(wbs);
        let (mut tasks, blocks) = self.lay_out(&groups);
        link_phases(&mut tasks, &blocks, verbosity);

        let network = ActivityNetwork::from_tasks(&tasks)?;
        let analysis = analyze(&network, verbosity)?;
        let start_date = self.options.start_date;
        for task in tasks.iter_mut().filter(|t| !t.is_summary) {
            if let Some(idx) = network.index_of(task.uid) {
                let timing = analysis.timings[idx];
                task.start_date = shift_date(start_date, timing.earliest_start)?;
                task.finish_date = shift_date(start_date, timing.earliest_finish)?;
            }
        }
        apply_timings(&mut tasks, &network, &analysis);
        apply_rollups(&mut tasks);

        let chain = if self.options.use_critical_chain && !network.is_empty() {
            Some(critical_chain(&network, &self.options, tasks.len() as u32 + 1)?)
        } else {
            None
        };

        let finish_date = shift_date(start_date, analysis.project_length)?;
        let schedule = ProjectSchedule {
            start_date,
            finish_date,
            total_duration_days: analysis.project_length,
            total_cost: tasks.iter().filter(|t| !t.is_summary).map(|t| t.cost).sum(),
            team_summary: team_summary(&tasks, start_date, finish_date),
            critical_path: analysis.critical_path,
            critical_chain: chain,
            resources: aggregate_resources(&tasks),
            tasks,
        };

        log_changes!(
            verbosity,
            "Schedule: {} tasks, {} days, finish {}",
            schedule.tasks.len(),
            schedule.total_duration_days,
            schedule.finish_date
        );

        Ok(ScheduleBuild { schedule, warnings })
    }

    /// Validate articles and group the survivors by phase, document order kept.
    fn prepare<'a>(
        &self,
        wbs: &'a WbsTree,
    ) -> (BTreeMap<Phase, Vec<PreparedArticle<'a>>>, Vec<EngineWarning>) {
        let mut groups: BTreeMap<Phase, Vec<PreparedArticle<'a>>> = BTreeMap::new();
        let mut warnings = Vec::new();
        for article in wbs.articles() {
            match prepare_article(article, &self.options) {
                Ok(prepared) => groups.entry(prepared.phase).or_default().push(prepared),
                Err(warning) => {
                    log_warn!(self.options.verbosity, "{}", warning);
                    warnings.push(warning);
                }
            }
        }
        (groups, warnings)
    }

    /// Create the summary and detail tasks with their in-phase relations.
    fn lay_out(
        &self,
        groups: &BTreeMap<Phase, Vec<PreparedArticle<'_>>>,
    ) -> (Vec<ScheduleTask>, Vec<PhaseBlock>) {
        let start_date = self.options.start_date;
        let mut tasks: Vec<ScheduleTask> = Vec::new();
        let mut blocks = Vec::with_capacity(groups.len());

        for (&phase, articles) in groups {
            tasks.push(ScheduleTask {
                uid: tasks.len() as u32 + 1,
                name: phase.display_name().to_string(),
                phase,
                wbs_code: None,
                start_date,
                finish_date: start_date,
                duration_days: 0,
                duration_hours: 0.0,
                cost: 0.0,
                resources: Vec::new(),
                predecessors: Vec::new(),
                storey: None,
                is_summary: true,
                is_critical: false,
                total_float_days: 0,
                free_float_days: 0,
                notes: String::new(),
            });

            let first = tasks.len();
            for (pos, prepared) in articles.iter().enumerate() {
                let uid = tasks.len() as u32 + 1;
                let article = prepared.article;
                let mut notes = format!(
                    "{} {} with a crew of {:.1}",
                    prepared.quantity, article.unit, prepared.crew_size
                );

                let mut predecessors = Vec::new();
                if pos > 0 {
                    predecessors.push(TaskLink {
                        uid: uid - 1,
                        lag_days: 0,
                    });
                }
                for rule in lag_rules_for_successor(&article.description) {
                    let Some(k) = (0..pos)
                        .rev()
                        .find(|&k| matches_predecessor(rule, &articles[k].article.description))
                    else {
                        continue;
                    };
                    let pred_uid = (first + k) as u32 + 1;
                    add_link(
                        &mut predecessors,
                        TaskLink {
                            uid: pred_uid,
                            lag_days: rule.lag_days,
                        },
                    );
                    notes.push_str(&format!(
                        "; waits {} days after task {} ({} before {})",
                        rule.lag_days, pred_uid, rule.predecessor, rule.successors[0]
                    ));
                }

                tasks.push(ScheduleTask {
                    uid,
                    name: article.description.clone(),
                    phase,
                    wbs_code: Some(article.code.clone()),
                    start_date,
                    finish_date: start_date,
                    duration_days: prepared.duration_days,
                    duration_hours: prepared.duration_hours,
                    cost: prepared.cost,
                    resources: prepared.resources.clone(),
                    predecessors,
                    storey: article.storey.clone(),
                    is_summary: false,
                    is_critical: false,
                    total_float_days: 0,
                    free_float_days: 0,
                    notes,
                });
            }
            blocks.push(PhaseBlock {
                phase,
                details: first..tasks.len(),
            });
        }

        (tasks, blocks)
    }
}

/// Add `link`, keeping the larger lag when the predecessor is already linked.
fn add_link(links: &mut Vec<TaskLink>, link: TaskLink) {
    match links.iter_mut().find(|l| l.uid == link.uid) {
        Some(existing) => existing.lag_days = existing.lag_days.max(link.lag_days),
        None => links.push(link),
    }
}

/// Chain consecutive phases: the first task of each phase follows the last
/// task of the previous phase, led by the allowed overlap.
///
/// The lead is clamped to the previous phase's span, so a phase never starts
/// before the one it follows.
fn link_phases(tasks: &mut [ScheduleTask], blocks: &[PhaseBlock], verbosity: u8) {
    let mut earliest = vec![0i64; tasks.len()];
    let mut previous: Option<(Phase, usize, i64, i64)> = None;

    for block in blocks {
        if block.details.is_empty() {
            continue;
        }
        let first = block.details.start;
        if let Some((prev_phase, last, prev_start, prev_finish)) = previous {
            let lead = allowed_overlap_days(prev_phase, block.phase).min(prev_finish - prev_start);
            let link = TaskLink {
                uid: tasks[last].uid,
                lag_days: -lead,
            };
            add_link(&mut tasks[first].predecessors, link);
            if lead > 0 {
                log_changes!(
                    verbosity,
                    "Phase {} overlaps {} by {} days",
                    block.phase,
                    prev_phase,
                    lead
                );
            }
        }

        let mut phase_start = i64::MAX;
        let mut phase_finish = 0;
        for idx in block.details.clone() {
            let start = tasks[idx]
                .predecessors
                .iter()
                .map(|l| {
                    let p = l.uid as usize - 1;
                    earliest[p] + tasks[p].duration_days + l.lag_days
                })
                .fold(0, i64::max);
            earliest[idx] = start;
            phase_start = phase_start.min(start);
            phase_finish = phase_finish.max(start + tasks[idx].duration_days);
        }
        previous = Some((block.phase, block.details.end - 1, phase_start, phase_finish));
    }
}

/// Build a schedule from `wbs` with `options`.
pub fn build_schedule(wbs: &WbsTree, options: &ScheduleOptions) -> Result<ScheduleBuild, EngineError> {
    TaskSequencer::new(options.clone())?.sequence(wbs)
}
