//! Daily maintenance job: streak freezes and breaks, weekly resets, failure
//! isolation, overlap protection and the scheduler handle.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, NaiveDate};
use common::{engine_on, test_config, utc, FaultyStore};
use kudos_core::{
    ActivityCategory, IAggregateStore, KudosError, MaintenanceOutcome, MaintenanceReport,
    UserAggregate,
};
use kudos_engine::badges::default_catalog;
use kudos_engine::{GamificationEngine, HealthStatus, Role};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
}

/// Wednesday 11 March 2026, just after the default 00:05 run time.
fn run_time() -> chrono::DateTime<chrono::Utc> {
    utc(2026, 3, 11, 0, 5)
}

fn user_with_streak(user_id: &str, current: u32, last_activity: NaiveDate, freezes: u32) -> UserAggregate {
    let mut agg = UserAggregate::new(user_id, utc(2026, 2, 1, 0, 0));
    agg.streak.current_count = current;
    agg.streak.longest_count = current;
    agg.streak.last_activity_date = Some(last_activity);
    agg.streak.freeze_count = freezes;
    agg
}

fn seed(store: &FaultyStore, aggregates: &[UserAggregate]) {
    for agg in aggregates {
        store.commit_aggregate(agg, 0).unwrap();
    }
}

async fn run(engine: &GamificationEngine) -> MaintenanceReport {
    match engine.run_maintenance_now(Role::Operator).await.unwrap() {
        MaintenanceOutcome::Completed(report) => report,
        MaintenanceOutcome::Skipped => panic!("run unexpectedly skipped"),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Streak rules
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missed_day_consumes_a_freeze() {
    let store = Arc::new(FaultyStore::new());
    // Last active Monday; Tuesday was missed.
    seed(&store, &[user_with_streak("ada", 5, day(9), 2)]);
    let (engine, _clock) = engine_on(store.clone(), run_time(), test_config()).await;

    let report = run(&engine).await;
    assert_eq!(report.users_scanned, 1);
    assert_eq!(report.freezes_consumed, 1);
    assert_eq!(report.streaks_broken, 0);

    let streak = engine.get_stats("ada").await.unwrap().aggregate.streak;
    assert_eq!(streak.current_count, 5);
    assert_eq!(streak.freeze_count, 1);
    assert_eq!(streak.frozen_through, Some(day(10)));

    // Same day again: nothing left to do.
    let again = run(&engine).await;
    assert_eq!(again.users_updated, 0);
    assert_eq!(engine.get_stats("ada").await.unwrap().aggregate.streak.freeze_count, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missed_day_without_freeze_breaks_but_keeps_longest() {
    let store = Arc::new(FaultyStore::new());
    seed(
        &store,
        &[
            user_with_streak("ada", 9, day(8), 0),
            // Active yesterday: untouched.
            user_with_streak("bob", 3, day(10), 0),
        ],
    );
    let (engine, _clock) = engine_on(store.clone(), run_time(), test_config()).await;

    let report = run(&engine).await;
    assert_eq!(report.users_scanned, 2);
    assert_eq!(report.streaks_broken, 1);
    assert_eq!(report.users_updated, 1);

    let ada = engine.get_stats("ada").await.unwrap().aggregate.streak;
    assert_eq!(ada.current_count, 0);
    assert_eq!(ada.longest_count, 9);
    let bob = engine.get_stats("bob").await.unwrap().aggregate.streak;
    assert_eq!(bob.current_count, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn new_week_clears_categories_and_bonus() {
    let store = Arc::new(FaultyStore::new());
    let mut agg = user_with_streak("ada", 2, day(10), 0);
    agg.weekly.week_start = Some(day(2));
    agg.weekly.categories.extend(ActivityCategory::ALL);
    agg.streak.bonus_active = true;
    agg.streak.bonus_multiplier = 1.5;
    seed(&store, &[agg]);
    let (engine, _clock) = engine_on(store.clone(), run_time(), test_config()).await;

    let report = run(&engine).await;
    assert_eq!(report.weekly_resets, 1);

    let agg = engine.get_stats("ada").await.unwrap().aggregate;
    assert!(agg.weekly.categories.is_empty());
    assert_eq!(agg.weekly.week_start, Some(day(9)));
    assert!(!agg.streak.bonus_active);
    assert_eq!(agg.streak.bonus_multiplier, 1.0);
}

// ═══════════════════════════════════════════════════════════════════════════
// Batching and isolation
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn one_bad_user_does_not_stop_the_run() {
    let store = Arc::new(FaultyStore::new());
    let users: Vec<_> = (0..7)
        .map(|i| user_with_streak(&format!("user-{i}"), 4, day(7), 0))
        .collect();
    seed(&store, &users);
    store.poison("user-3");

    let mut config = test_config();
    config.maintenance.batch_size = 2;
    let (engine, _clock) = engine_on(store.clone(), run_time(), config).await;

    let report = run(&engine).await;
    assert_eq!(report.users_scanned, 7);
    assert_eq!(report.failures, 1);
    assert_eq!(report.streaks_broken, 6);

    let health = engine.health().await;
    assert_eq!(health.status, HealthStatus::Degraded, "a run with failures is flagged");
    assert_eq!(health.last_maintenance_at, Some(report.finished_at));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn overlapping_trigger_is_skipped() {
    let store = Arc::new(FaultyStore::new());
    seed(&store, &[user_with_streak("ada", 2, day(8), 0)]);
    store.set_list_delay(StdDuration::from_millis(400));
    let (engine, _clock) = engine_on(store.clone(), run_time(), test_config()).await;
    let engine = Arc::new(engine);

    let first = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.run_maintenance_now(Role::Operator).await })
    };
    tokio::time::sleep(StdDuration::from_millis(100)).await;

    let second = engine.run_maintenance_now(Role::Operator).await.unwrap();
    assert_eq!(second, MaintenanceOutcome::Skipped);

    let first = first.await.unwrap().unwrap();
    assert!(matches!(first, MaintenanceOutcome::Completed(ref r) if r.streaks_broken == 1));

    // The guard is released once the run ends.
    store.set_list_delay(StdDuration::ZERO);
    assert!(matches!(
        engine.run_maintenance_now(Role::Operator).await.unwrap(),
        MaintenanceOutcome::Completed(_)
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn slow_store_times_out_instead_of_hanging() {
    let store = Arc::new(FaultyStore::new());
    seed(&store, &[user_with_streak("ada", 2, day(8), 0)]);
    store.set_list_delay(StdDuration::from_millis(500));
    let mut config = test_config();
    config.updater.store_timeout_ms = 50;
    let (engine, _clock) = engine_on(store.clone(), run_time(), config).await;

    let err = engine.run_maintenance_now(Role::Operator).await.unwrap_err();
    assert!(matches!(err, KudosError::Timeout { .. }));
    assert!(!engine.maintenance_running(), "a failed run releases the guard");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn report_is_persisted_and_reported_by_health() {
    let store = Arc::new(FaultyStore::new());
    seed(&store, &[user_with_streak("ada", 2, day(10), 0)]);
    let (engine, clock) = engine_on(store.clone(), run_time(), test_config()).await;

    let report = run(&engine).await;
    assert_eq!(report.failures, 0);
    let stored = store.last_maintenance_run().unwrap().unwrap();
    assert_eq!(stored.run_id, report.run_id);

    let health = engine.health().await;
    assert_eq!(health.status, HealthStatus::Healthy);

    clock.advance(Duration::days(3));
    let health = engine.health().await;
    assert!(!health.check("maintenance").unwrap().healthy, "stale runs are flagged");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn run_recovers_a_degraded_badge_catalog() {
    let store = Arc::new(FaultyStore::new());
    for definition in default_catalog() {
        store.upsert_badge_definition(&definition).unwrap();
    }
    store.catalog_down.store(true, Ordering::SeqCst);
    let (engine, _clock) = engine_on(store.clone(), run_time(), test_config()).await;
    assert!(engine.get_badges().await.is_empty());
    assert!(!engine.health().await.check("badges").unwrap().healthy);

    // Still down: the run completes and badges stay degraded.
    run(&engine).await;
    assert!(engine.get_badges().await.is_empty());

    store.catalog_down.store(false, Ordering::SeqCst);
    run(&engine).await;
    assert_eq!(engine.get_badges().await.len(), 12);
    assert_eq!(engine.health().await.status, HealthStatus::Healthy);
}

// ═══════════════════════════════════════════════════════════════════════════
// Scheduler
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn scheduler_starts_and_shuts_down() {
    let store = Arc::new(FaultyStore::new());
    let (engine, _clock) = engine_on(store.clone(), run_time(), test_config()).await;

    let handle = engine.spawn_maintenance_scheduler().unwrap().expect("enabled by default");
    assert!(!handle.is_finished());
    tokio::time::timeout(StdDuration::from_secs(5), handle.shutdown())
        .await
        .expect("scheduler stops promptly");

    let mut config = test_config();
    config.maintenance.enabled = false;
    let (disabled, _clock) = engine_on(store, run_time(), config).await;
    assert!(disabled.spawn_maintenance_scheduler().unwrap().is_none());
}
