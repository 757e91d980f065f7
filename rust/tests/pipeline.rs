//! End-to-end runs through the public API: WBS to schedule, capacity and
//! earned value.

use buildplan_rust::capacity::Severity;
use buildplan_rust::evm::Health;
use buildplan_rust::{
    build_schedule, compute_evm_snapshot, optimize_site_capacity, s_curve, validate_schedule,
    EngineWarning, EvmBaseline, EvmOptions, MatchedCost, Phase, ResourceKind, ResourceRequirement,
    ScheduleOptions, SiteCapacityConstraints, TaskProgress, WbsArticle, WbsChapter, WbsTree,
};
use chrono::NaiveDate;

fn d(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn options() -> ScheduleOptions {
    ScheduleOptions::starting(d(2025, 3, 3))
}

/// An article taking `days` days for a crew of `workers`, one labor hour per
/// unit at 8 hours a day.
fn article(code: &str, description: &str, phase: Phase, days: f64, workers: f64, price: f64) -> WbsArticle {
    WbsArticle {
        code: code.to_string(),
        description: description.to_string(),
        unit: "h".to_string(),
        quantity: Some(days * workers * 8.0),
        phase: Some(phase),
        storey: None,
        cost: Some(MatchedCost {
            unit_price: price,
            labor_hours_per_unit: 1.0,
            resources: vec![ResourceRequirement {
                kind: ResourceKind::Labor,
                name: "Crew".to_string(),
                units: workers,
                rate: 25.0,
            }],
        }),
    }
}

fn wbs(articles: Vec<WbsArticle>) -> WbsTree {
    WbsTree {
        chapters: vec![WbsChapter {
            code: "01".to_string(),
            name: "Building".to_string(),
            chapters: vec![],
            articles,
        }],
    }
}

fn sequential(days: [f64; 3]) -> WbsTree {
    wbs(vec![
        article("01.01", "Columns", Phase::Structure, days[0], 1.0, 10.0),
        article("01.02", "Beams", Phase::Structure, days[1], 1.0, 10.0),
        article("01.03", "Slab", Phase::Structure, days[2], 1.0, 10.0),
    ])
}

/// Plumbing and electrical rough-in running side by side for 10 days,
/// 5000 each.
fn parallel_services() -> WbsTree {
    wbs(vec![
        article("02.01", "Pipework", Phase::Plumbing, 10.0, 4.0, 15.625),
        article("03.01", "Cabling", Phase::Electrical, 10.0, 4.0, 15.625),
    ])
}

#[test]
fn sequential_tasks_form_the_critical_path() {
    let build = build_schedule(&sequential([2.0, 3.0, 1.0]), &options()).unwrap();
    let schedule = &build.schedule;

    assert_eq!(schedule.total_duration_days, 6);
    assert_eq!(
        (schedule.finish_date - schedule.start_date).num_days(),
        schedule.total_duration_days
    );
    let details: Vec<u32> = schedule.detail_tasks().map(|t| t.uid).collect();
    assert_eq!(schedule.critical_path, details);
    for uid in &schedule.critical_path {
        assert_eq!(schedule.task(*uid).unwrap().total_float_days, 0);
    }
    assert!(validate_schedule(schedule).is_empty());
}

#[test]
fn critical_chain_shortens_the_schedule() {
    let options = ScheduleOptions {
        use_critical_chain: true,
        safety_reduction: 0.5,
        ..options()
    };
    let schedule = build_schedule(&sequential([2.0, 3.0, 1.0]), &options)
        .unwrap()
        .schedule;
    let chain = schedule.critical_chain.as_ref().unwrap();

    let aggressive: Vec<i64> = chain.chain.iter().map(|c| c.aggressive_duration_days).collect();
    assert_eq!(aggressive, vec![1, 2, 1]);
    assert!(chain.ccpm_duration_days < 6);
    assert!(chain.project_buffer.as_ref().unwrap().duration_days > 0);
}

#[test]
fn no_safety_reduction_keeps_the_duration() {
    let options = ScheduleOptions {
        use_critical_chain: true,
        safety_reduction: 0.0,
        ..options()
    };
    let schedule = build_schedule(&sequential([2.0, 3.0, 1.0]), &options)
        .unwrap()
        .schedule;
    let chain = schedule.critical_chain.unwrap();
    assert_eq!(chain.ccpm_duration_days, chain.original_duration_days);
    assert!(chain.project_buffer.is_none());
}

#[test]
fn longer_critical_task_delays_finish_by_the_same_amount() {
    let base = build_schedule(&sequential([2.0, 3.0, 1.0]), &options()).unwrap();
    let longer = build_schedule(&sequential([2.0, 7.0, 1.0]), &options()).unwrap();
    assert_eq!(
        longer.schedule.total_duration_days - base.schedule.total_duration_days,
        4
    );
}

#[test]
fn half_done_at_midpoint_is_green() {
    let schedule = build_schedule(&parallel_services(), &options()).unwrap().schedule;
    assert_eq!(schedule.total_duration_days, 10);

    let (baseline, warnings) = EvmBaseline::capture(&schedule, d(2025, 3, 1));
    assert!(warnings.is_empty());
    assert!((baseline.budget_at_completion() - 10000.0).abs() < 1e-6);

    let progress: Vec<TaskProgress> = schedule
        .detail_tasks()
        .map(|t| TaskProgress {
            task_uid: t.uid,
            percent_complete: 50.0,
            actual_start: Some(t.start_date),
            actual_finish: None,
            actual_cost: Some(2500.0),
        })
        .collect();
    let midpoint = d(2025, 3, 8);
    let snapshot =
        compute_evm_snapshot(&baseline, &schedule, &progress, midpoint, &EvmOptions::default())
            .unwrap();

    assert!((snapshot.earned_value - 5000.0).abs() < 1e-6);
    assert!((snapshot.cpi - 1.0).abs() < 1e-9);
    assert_eq!(snapshot.health, Health::Green);
    assert!(snapshot.earned_value <= snapshot.budget_at_completion);

    let curve = s_curve(&baseline, &progress, midpoint, &EvmOptions::default());
    assert_eq!(curve.len(), 2);
    assert!(curve[0].earned_value.is_some());
    assert!(curve[1].earned_value.is_none());
}

#[test]
fn concurrent_crews_exceed_site_capacity() {
    let schedule = build_schedule(&parallel_services(), &options()).unwrap().schedule;
    let constraints = SiteCapacityConstraints {
        max_workers: 5,
        ..Default::default()
    };
    let before = schedule.clone();
    let result = optimize_site_capacity(&schedule, &schedule.resources, &constraints).unwrap();

    let day = &result.capacity_timeline[0];
    assert!((day.workers_allocated - 8.0).abs() < 1e-9);
    assert!(day.is_bottleneck);
    assert_eq!(result.bottlenecks[0].severity, Severity::High);
    for day in &result.capacity_timeline {
        let over = day
            .workers_capacity
            .is_some_and(|cap| day.workers_allocated > cap as f64);
        assert_eq!(day.is_bottleneck, over);
    }
    assert_eq!(result.leveled_duration_days, Some(20));
    assert_eq!(schedule, before);
}

#[test]
fn zero_quantity_article_is_reported_and_dropped() {
    let mut tree = sequential([2.0, 3.0, 1.0]);
    let mut empty = article("09.99", "Skirting", Phase::Floors, 1.0, 1.0, 5.0);
    empty.quantity = Some(0.0);
    tree.chapters[0].articles.push(empty);

    let build = build_schedule(&tree, &options()).unwrap();
    assert!(build
        .schedule
        .tasks
        .iter()
        .all(|t| t.wbs_code.as_deref() != Some("09.99")));
    assert!(matches!(
        &build.warnings[..],
        [EngineWarning::InvalidQuantity { code, .. }] if code == "09.99"
    ));
}

#[test]
fn identical_inputs_serialize_identically() {
    let options = ScheduleOptions {
        use_critical_chain: true,
        ..options()
    };
    let first = serde_json::to_string(&build_schedule(&parallel_services(), &options).unwrap()).unwrap();
    let second = serde_json::to_string(&build_schedule(&parallel_services(), &options).unwrap()).unwrap();
    assert_eq!(first, second);
}
