//! Resource aggregation: task-level resource lines reduced to project totals.
//!
//! Totals accumulate in fixed-point thousandths so the reduction is exactly
//! associative and commutative. Splitting the task list, aggregating the parts
//! independently and merging gives the same bytes as a single pass.

use serde::{Deserialize, Serialize};

use crate::interner::{ResourceBucket, ResourceInterner, ResourceKey};
use crate::models::{ResourceKind, ScheduleTask};

const SCALE: f64 = 1000.0;

#[inline]
fn to_fixed(value: f64) -> i64 {
    (value * SCALE).round() as i64
}

#[inline]
fn from_fixed(value: i64) -> f64 {
    value as f64 / SCALE
}

/// Totals for one resource identity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceTotal {
    pub name: String,
    pub kind: ResourceKind,
    pub rate: f64,
    pub total_units: f64,
    pub total_hours: f64,
    pub total_cost: f64,
    pub task_count: u32,
}

/// Per-resource and project-wide resource totals.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectResources {
    /// Sorted by (kind, name, rate).
    pub resources: Vec<ResourceTotal>,
    pub total_labor_hours: f64,
    pub total_equipment_hours: f64,
    pub total_cost: f64,
}

impl ProjectResources {
    pub fn find(&self, name: &str, kind: ResourceKind) -> impl Iterator<Item = &ResourceTotal> {
        let name = name.to_string();
        self.resources
            .iter()
            .filter(move |r| r.kind == kind && r.name == name)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct BucketTotals {
    units: i64,
    hours: i64,
    cost: i64,
    tasks: u32,
}

impl BucketTotals {
    fn absorb(&mut self, other: BucketTotals) {
        self.units += other.units;
        self.hours += other.hours;
        self.cost += other.cost;
        self.tasks += other.tasks;
    }
}

/// Partial aggregation state. Build one per partition and [`merge`] them.
///
/// [`merge`]: ResourceAccumulator::merge
#[derive(Clone, Debug, Default)]
pub struct ResourceAccumulator {
    interner: ResourceInterner,
    buckets: Vec<BucketTotals>,
}

impl ResourceAccumulator {
    fn bucket(&mut self, key: ResourceKey) -> ResourceBucket {
        let bucket = self.interner.intern(key);
        if bucket as usize >= self.buckets.len() {
            self.buckets.push(BucketTotals::default());
        }
        bucket
    }

    /// Accumulate every resource line of a detail task. Summary tasks are
    /// skipped since their children already carry the lines.
    pub fn add_task(&mut self, task: &ScheduleTask) {
        if task.is_summary {
            return;
        }
        for line in &task.resources {
            let bucket = self.bucket(ResourceKey::new(&line.name, line.kind, line.rate));
            self.buckets[bucket as usize].absorb(BucketTotals {
                units: to_fixed(line.units),
                hours: to_fixed(line.hours(task.duration_hours)),
                cost: to_fixed(line.line_cost(task.duration_hours)),
                tasks: 1,
            });
        }
    }

    /// Combine two partial aggregations.
    pub fn merge(mut self, other: ResourceAccumulator) -> Self {
        for (idx, totals) in other.buckets.into_iter().enumerate() {
            if let Some(key) = other.interner.resolve(idx as ResourceBucket) {
                let bucket = self.bucket(key.clone());
                self.buckets[bucket as usize].absorb(totals);
            }
        }
        self
    }

    /// Produce the ordered, project-wide totals.
    pub fn finish(self) -> ProjectResources {
        let mut keyed: Vec<(ResourceKey, BucketTotals)> = self
            .buckets
            .into_iter()
            .enumerate()
            .filter_map(|(idx, totals)| {
                self.interner
                    .resolve(idx as ResourceBucket)
                    .map(|key| (key.clone(), totals))
            })
            .collect();
        keyed.sort_by(|(a, _), (b, _)| {
            a.kind
                .cmp(&b.kind)
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.rate().total_cmp(&b.rate()))
        });

        let mut labor_hours = 0i64;
        let mut equipment_hours = 0i64;
        let mut cost = 0i64;
        let resources = keyed
            .into_iter()
            .map(|(key, totals)| {
                match key.kind {
                    ResourceKind::Labor => labor_hours += totals.hours,
                    ResourceKind::Equipment => equipment_hours += totals.hours,
                    ResourceKind::Material => {}
                }
                cost += totals.cost;
                let rate = key.rate();
                ResourceTotal {
                    name: key.name,
                    kind: key.kind,
                    rate,
                    total_units: from_fixed(totals.units),
                    total_hours: from_fixed(totals.hours),
                    total_cost: from_fixed(totals.cost),
                    task_count: totals.tasks,
                }
            })
            .collect();

        ProjectResources {
            resources,
            total_labor_hours: from_fixed(labor_hours),
            total_equipment_hours: from_fixed(equipment_hours),
            total_cost: from_fixed(cost),
        }
    }
}

/// Reduce the resource lines of every detail task into project totals.
pub fn aggregate_resources(tasks: &[ScheduleTask]) -> ProjectResources {
    tasks
        .iter()
        .fold(ResourceAccumulator::default(), |mut acc, task| {
            acc.add_task(task);
            acc
        })
        .finish()
}
