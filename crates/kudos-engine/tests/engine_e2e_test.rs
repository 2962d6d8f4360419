//! GamificationEngine end to end: activity logging, concurrency, badges,
//! degraded modes and the operator gate.

mod common;

use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use chrono::Duration;
use common::{engine_on, file_store, memory_engine, test_config, utc, FaultyStore};
use kudos_core::{ActivityEvent, Clock, KudosError, ManualClock, RecoveryAction, UserAggregate};
use kudos_engine::badges::{default_catalog, BadgeEngine};
use kudos_engine::gateway::StoreGateway;
use kudos_engine::transaction::OptimisticWriter;
use kudos_engine::{HealthStatus, Role};
use serde_json::json;

// ═══════════════════════════════════════════════════════════════════════════
// Activity logging
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn first_activity_creates_the_aggregate() {
    let (engine, _clock) = memory_engine(utc(2026, 3, 2, 9, 0)).await;

    let outcome = engine
        .log_activity("ada", Some("bio-101"), "flashcard_review", json!({"cards_reviewed": 25}))
        .await
        .unwrap();
    assert_eq!(outcome.base_xp, 10);
    assert_eq!(outcome.xp_awarded, 10);
    assert_eq!(outcome.total_xp, 10);
    assert_eq!(outcome.level, 1);
    assert_eq!(outcome.streak.current_count, 1);
    assert!(!outcome.leveled_up);

    let stats = engine.get_stats("ada").await.unwrap();
    assert!(stats.persisted);
    assert_eq!(stats.aggregate.course_id.as_deref(), Some("bio-101"));
    assert_eq!(stats.aggregate.activities.flashcards_reviewed, 25);
    assert_eq!(stats.aggregate.activities.flashcard_sets, 1);
    assert_eq!(stats.level.tier, "Novice");
    assert_eq!(stats.level.xp_to_next_level, 90);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unknown_activity_awards_nothing_and_writes_nothing() {
    let (engine, _clock) = memory_engine(utc(2026, 3, 2, 9, 0)).await;

    let outcome = engine
        .log_activity("ada", None, "podcast_listened", json!({"minutes": 30}))
        .await
        .unwrap();
    assert_eq!(outcome.xp_awarded, 0);
    assert_eq!(outcome.total_xp, 0);

    let stats = engine.get_stats("ada").await.unwrap();
    assert!(!stats.persisted);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn malformed_input_is_rejected_before_any_store_call() {
    let store = Arc::new(FaultyStore::new());
    let (engine, _clock) = engine_on(store.clone(), utc(2026, 3, 2, 9, 0), test_config()).await;
    let before = store.calls();

    let err = engine
        .log_activity("ada", None, "flashcard_review", json!({"cards_reviewed": "lots"}))
        .await
        .unwrap_err();
    assert!(matches!(err, KudosError::Validation(_)));
    assert!(err.is_client_error());

    let err = engine
        .log_activity("  ", None, "guide_completed", json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, KudosError::Validation(_)));

    let err = engine
        .log_activity("ada", None, "evaluation_submitted", json!({"score": 11}))
        .await
        .unwrap_err();
    assert!(matches!(err, KudosError::Validation(_)));

    assert_eq!(store.calls(), before, "validation must not touch the store");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn store_outage_fails_the_write_without_partial_state() {
    let store = Arc::new(FaultyStore::new());
    let (engine, _clock) = engine_on(store.clone(), utc(2026, 3, 2, 9, 0), test_config()).await;

    store.down.store(true, Ordering::SeqCst);
    let err = engine
        .log_activity("ada", None, "guide_completed", json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, KudosError::StoreUnavailable { .. }));
    assert!(!err.is_client_error());

    store.down.store(false, Ordering::SeqCst);
    let outcome = engine
        .log_activity("ada", None, "guide_completed", json!({}))
        .await
        .unwrap();
    assert_eq!(outcome.total_xp, 30, "the failed event left no trace");
}

// ═══════════════════════════════════════════════════════════════════════════
// Concurrency
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_events_for_one_user_lose_no_xp() {
    let (_dir, store) = file_store();
    let (engine, _clock) = engine_on(store, utc(2026, 3, 2, 9, 0), test_config()).await;
    let engine = Arc::new(engine);

    engine
        .log_activity("ada", None, "study_session", json!({"minutes": 50}))
        .await
        .unwrap();
    let start = engine.get_stats("ada").await.unwrap().aggregate.total_xp;
    assert_eq!(start, 20);

    const K: usize = 24;
    let mut handles = Vec::new();
    for i in 0..K {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            let (kind, payload) = if i % 2 == 0 {
                ("guide_completed", json!({}))
            } else {
                ("study_session", json!({"minutes": 25}))
            };
            engine.log_activity("ada", None, kind, payload).await.unwrap()
        }));
    }

    let mut awarded = 0;
    for h in handles {
        awarded += h.await.unwrap().xp_awarded;
    }
    // 12 guides at 30 plus 12 sessions at 10.
    assert_eq!(awarded, 12 * 30 + 12 * 10);

    let stats = engine.get_stats("ada").await.unwrap();
    assert_eq!(stats.aggregate.total_xp, start + awarded);
    assert_eq!(stats.aggregate.activities.guides_completed, 12);
    assert_eq!(stats.aggregate.activities.study_time_minutes, 50 + 12 * 25);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_unlocks_create_exactly_one_badge_row() {
    let (engine, _clock) = memory_engine(utc(2026, 3, 2, 9, 0)).await;
    let engine = Arc::new(engine);
    engine.seed_badge_definitions(Role::Operator, None).await.unwrap();

    // 3 × 30 XP, then a burst that crosses 100 many times over.
    for _ in 0..3 {
        engine.log_activity("ada", None, "guide_completed", json!({})).await.unwrap();
    }
    let mut handles = Vec::new();
    for _ in 0..12 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            engine
                .log_activity("ada", None, "guide_completed", json!({}))
                .await
                .unwrap()
        }));
    }

    let mut unlock_counts: HashMap<String, usize> = HashMap::new();
    for h in handles {
        for badge in h.await.unwrap().badges_unlocked {
            *unlock_counts.entry(badge.badge_id).or_default() += 1;
        }
    }
    assert_eq!(unlock_counts.get("xp_100"), Some(&1));

    let earned = engine.get_earned_badges("ada").await.unwrap();
    assert_eq!(earned.iter().filter(|b| b.badge_id == "xp_100").count(), 1);
}

// ═══════════════════════════════════════════════════════════════════════════
// Weekly consistency bonus
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn all_four_categories_in_a_week_boost_later_events() {
    let (engine, _clock) = memory_engine(utc(2026, 3, 2, 9, 0)).await;
    let monday = utc(2026, 3, 2, 10, 0);
    let event = |day: i64, kind: &str, payload: serde_json::Value| {
        ActivityEvent::new("ada", None, kind, payload, monday + Duration::days(day))
    };

    engine.log_event(event(0, "flashcard_review", json!({"cards_reviewed": 10}))).await.unwrap();
    engine.log_event(event(1, "quiz_passed", json!({"difficulty": "easy"}))).await.unwrap();
    engine.log_event(event(2, "evaluation_submitted", json!({"score": 5}))).await.unwrap();
    let activating = engine.log_event(event(3, "guide_completed", json!({}))).await.unwrap();
    assert_eq!(activating.consistency_bonus, 0);
    assert!(activating.streak.bonus_active);
    assert_eq!(activating.streak.current_count, 4);

    let boosted = engine
        .log_event(event(3, "quiz_passed", json!({"difficulty": "easy"})))
        .await
        .unwrap();
    assert_eq!(boosted.base_xp, 10);
    assert_eq!(boosted.consistency_bonus, 5);
    assert_eq!(boosted.xp_awarded, 15);

    // Next Monday: the bonus belongs to last week.
    let next_week = engine
        .log_event(event(7, "quiz_passed", json!({"difficulty": "easy"})))
        .await
        .unwrap();
    assert_eq!(next_week.consistency_bonus, 0);
    assert!(!next_week.streak.bonus_active);
    assert_eq!(next_week.streak.current_count, 1, "three idle days break the streak");
    assert_eq!(next_week.streak.longest_count, 4);
}

// ═══════════════════════════════════════════════════════════════════════════
// Badges
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn crossing_a_threshold_unlocks_once() {
    let (engine, _clock) = memory_engine(utc(2026, 3, 2, 9, 0)).await;
    assert_eq!(engine.seed_badge_definitions(Role::Operator, None).await.unwrap(), 12);
    assert_eq!(engine.get_badges().await.len(), 12);

    for _ in 0..3 {
        let o = engine.log_activity("ada", None, "guide_completed", json!({})).await.unwrap();
        assert!(o.badges_unlocked.is_empty());
    }
    let crossing = engine.log_activity("ada", None, "guide_completed", json!({})).await.unwrap();
    let ids: Vec<_> = crossing.badges_unlocked.iter().map(|b| b.badge_id.as_str()).collect();
    assert_eq!(ids, vec!["xp_100"]);
    assert!(crossing.leveled_up);

    let after = engine.log_activity("ada", None, "guide_completed", json!({})).await.unwrap();
    assert!(after.badges_unlocked.is_empty());

    let stats = engine.get_stats("ada").await.unwrap();
    assert!(stats.aggregate.earned_badge_ids.contains("xp_100"));
    let earned = engine.get_earned_badges("ada").await.unwrap();
    assert_eq!(earned.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn progress_covers_locked_badges_only() {
    let (engine, _clock) = memory_engine(utc(2026, 3, 2, 9, 0)).await;
    engine.seed_badge_definitions(Role::Operator, None).await.unwrap();
    engine
        .log_activity("ada", None, "evaluation_submitted", json!({"score": 9}))
        .await
        .unwrap();

    let progress = engine.get_badge_progress("ada").await.unwrap();
    let by_id: HashMap<_, _> = progress.iter().map(|p| (p.badge_id.as_str(), p.percent)).collect();
    assert_eq!(by_id.get("xp_100"), Some(&50));
    assert_eq!(by_id.get("evaluations_3"), Some(&33));
    assert_eq!(by_id.get("streak_3"), Some(&33));

    engine
        .log_activity("ada", None, "evaluation_submitted", json!({"score": 9}))
        .await
        .unwrap();
    let progress = engine.get_badge_progress("ada").await.unwrap();
    assert!(progress.iter().all(|p| p.badge_id != "xp_100"), "earned badges have no progress entry");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unreadable_catalog_degrades_then_recovers() {
    let store = Arc::new(FaultyStore::new());
    store.catalog_down.store(true, Ordering::SeqCst);
    let (engine, _clock) = engine_on(store.clone(), utc(2026, 3, 2, 9, 0), test_config()).await;

    assert!(engine.get_badges().await.is_empty());
    let health = engine.health().await;
    assert_eq!(health.status, HealthStatus::Degraded);
    assert!(!health.check("badges").unwrap().healthy);

    // XP still flows while badges are degraded.
    let outcome = engine.log_activity("ada", None, "guide_completed", json!({})).await.unwrap();
    assert_eq!(outcome.total_xp, 30);
    assert!(outcome.badges_unlocked.is_empty());

    store.catalog_down.store(false, Ordering::SeqCst);
    assert!(engine.refresh_badges().await);
    engine.seed_badge_definitions(Role::Operator, None).await.unwrap();
    assert_eq!(engine.get_badges().await.len(), 12);
    assert_eq!(engine.health().await.status, HealthStatus::Healthy);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn badge_failure_after_commit_keeps_the_xp() {
    let store = Arc::new(FaultyStore::new());
    let (engine, _clock) = engine_on(store.clone(), utc(2026, 3, 2, 9, 0), test_config()).await;
    engine.seed_badge_definitions(Role::Operator, None).await.unwrap();

    store.user_badges_down.store(true, Ordering::SeqCst);
    let outcome = engine
        .log_activity("ada", None, "evaluation_submitted", json!({"score": 10}))
        .await
        .unwrap();
    assert!(outcome.badge_check_degraded);
    assert!(outcome.badges_unlocked.is_empty());
    assert_eq!(outcome.total_xp, 50);

    store.user_badges_down.store(false, Ordering::SeqCst);
    assert_eq!(engine.get_stats("ada").await.unwrap().aggregate.total_xp, 50);

    // The next event catches up on the missed unlock.
    let next = engine
        .log_activity("ada", None, "evaluation_submitted", json!({"score": 10}))
        .await
        .unwrap();
    assert!(!next.badge_check_degraded);
    assert!(next.badges_unlocked.iter().any(|b| b.badge_id == "xp_100"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn badge_store_failure_surfaces_as_degraded_read() {
    let store = Arc::new(FaultyStore::new());
    let config = test_config();
    let clock = Arc::new(ManualClock::new(utc(2026, 3, 2, 9, 0)));
    let gateway = StoreGateway::new(store.clone(), config.updater.store_timeout());
    let writer = OptimisticWriter::new(gateway, config.updater.clone(), clock.clone());
    let badges = BadgeEngine::initialize(writer, clock.clone()).await;
    badges.seed_definitions(default_catalog()).await.unwrap();

    store.user_badges_down.store(true, Ordering::SeqCst);
    let mut aggregate = UserAggregate::new("ada", clock.now());
    aggregate.total_xp = 500;
    let err = badges.evaluate_and_unlock(&aggregate).await.unwrap_err();
    assert!(matches!(err, KudosError::DegradedRead { ref component, .. } if component == "badges"));
    assert_eq!(RecoveryAction::for_error(&err), RecoveryAction::Fallback);

    store.user_badges_down.store(false, Ordering::SeqCst);
    assert!(!badges.evaluate_and_unlock(&aggregate).await.unwrap().is_empty());
}

// ═══════════════════════════════════════════════════════════════════════════
// Operator gate
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn admin_operations_require_operator() {
    let (engine, _clock) = memory_engine(utc(2026, 3, 2, 9, 0)).await;

    let err = engine.seed_badge_definitions(Role::Learner, None).await.unwrap_err();
    assert!(matches!(err, KudosError::Forbidden { .. }));
    assert!(engine.get_badges().await.is_empty());

    let err = engine.run_maintenance_now(Role::Learner).await.unwrap_err();
    assert!(matches!(err, KudosError::Forbidden { .. }));
    assert!(err.is_client_error());
}
