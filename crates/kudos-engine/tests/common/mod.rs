//! Shared harness for engine integration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use kudos_core::{
    BadgeDefinition, IAggregateStore, KudosConfig, MaintenanceReport, ManualClock, StorageError,
    StorageResult, UserAggregate, UserBadge, VersionedAggregate,
};
use kudos_engine::GamificationEngine;
use kudos_storage::SqliteAggregateStore;

pub fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

/// Retries generous enough that contention tests never exhaust them.
pub fn test_config() -> KudosConfig {
    let mut config = KudosConfig::default();
    config.updater.max_retries = 1_000;
    config.updater.base_backoff_ms = 1;
    config.updater.max_backoff_ms = 5;
    config.maintenance.workers = 4;
    config
}

pub async fn engine_on(
    store: Arc<dyn IAggregateStore>,
    start: DateTime<Utc>,
    config: KudosConfig,
) -> (GamificationEngine, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start));
    let engine = GamificationEngine::with_store(config, store, clock.clone())
        .await
        .unwrap();
    (engine, clock)
}

pub async fn memory_engine(start: DateTime<Utc>) -> (GamificationEngine, Arc<ManualClock>) {
    let store = Arc::new(SqliteAggregateStore::open_in_memory().unwrap());
    engine_on(store, start, test_config()).await
}

pub fn file_store() -> (tempfile::TempDir, Arc<SqliteAggregateStore>) {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteAggregateStore::open(&dir.path().join("kudos.db"), 2).unwrap();
    (dir, Arc::new(store))
}

// ═══════════════════════════════════════════════════════════════════════════
// Fault injection
// ═══════════════════════════════════════════════════════════════════════════

/// Wraps a real store and fails selected operations on demand.
pub struct FaultyStore {
    inner: SqliteAggregateStore,
    /// Every call fails with `Unavailable`.
    pub down: AtomicBool,
    /// Badge catalog reads fail.
    pub catalog_down: AtomicBool,
    /// Reads and writes of earned badges fail.
    pub user_badges_down: AtomicBool,
    /// Loading these users' aggregates fails with `Corrupt`.
    pub poisoned_users: Mutex<HashSet<String>>,
    /// Blocking delay added to each user listing page.
    pub list_delay: Mutex<Duration>,
    pub calls: AtomicUsize,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self {
            inner: SqliteAggregateStore::open_in_memory().unwrap(),
            down: AtomicBool::new(false),
            catalog_down: AtomicBool::new(false),
            user_badges_down: AtomicBool::new(false),
            poisoned_users: Mutex::new(HashSet::new()),
            list_delay: Mutex::new(Duration::ZERO),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn poison(&self, user_id: &str) {
        self.poisoned_users.lock().unwrap().insert(user_id.to_string());
    }

    pub fn set_list_delay(&self, delay: Duration) {
        *self.list_delay.lock().unwrap() = delay;
    }

    fn gate(&self) -> StorageResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable {
                reason: "injected outage".into(),
            });
        }
        Ok(())
    }

    fn gate_flag(&self, flag: &AtomicBool) -> StorageResult<()> {
        self.gate()?;
        if flag.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable {
                reason: "injected partial outage".into(),
            });
        }
        Ok(())
    }
}

impl IAggregateStore for FaultyStore {
    fn get_aggregate(&self, user_id: &str) -> StorageResult<Option<VersionedAggregate>> {
        self.gate()?;
        if self.poisoned_users.lock().unwrap().contains(user_id) {
            return Err(StorageError::Corrupt {
                details: format!("injected corruption for {user_id}"),
            });
        }
        self.inner.get_aggregate(user_id)
    }

    fn commit_aggregate(&self, aggregate: &UserAggregate, expected_version: u64) -> StorageResult<u64> {
        self.gate()?;
        self.inner.commit_aggregate(aggregate, expected_version)
    }

    fn list_user_ids_after(&self, cursor: Option<&str>, limit: usize) -> StorageResult<Vec<String>> {
        self.gate()?;
        let delay = *self.list_delay.lock().unwrap();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        self.inner.list_user_ids_after(cursor, limit)
    }

    fn upsert_badge_definition(&self, definition: &BadgeDefinition) -> StorageResult<()> {
        self.gate_flag(&self.catalog_down)?;
        self.inner.upsert_badge_definition(definition)
    }

    fn list_badge_definitions(&self, include_inactive: bool) -> StorageResult<Vec<BadgeDefinition>> {
        self.gate_flag(&self.catalog_down)?;
        self.inner.list_badge_definitions(include_inactive)
    }

    fn insert_user_badge_if_absent(
        &self,
        user_id: &str,
        badge_id: &str,
        earned_at: DateTime<Utc>,
    ) -> StorageResult<(UserBadge, bool)> {
        self.gate_flag(&self.user_badges_down)?;
        self.inner.insert_user_badge_if_absent(user_id, badge_id, earned_at)
    }

    fn list_user_badges(&self, user_id: &str) -> StorageResult<Vec<UserBadge>> {
        self.gate_flag(&self.user_badges_down)?;
        self.inner.list_user_badges(user_id)
    }

    fn record_maintenance_run(&self, report: &MaintenanceReport) -> StorageResult<()> {
        self.gate()?;
        self.inner.record_maintenance_run(report)
    }

    fn last_maintenance_run(&self) -> StorageResult<Option<MaintenanceReport>> {
        self.gate()?;
        self.inner.last_maintenance_run()
    }

    fn ping(&self) -> StorageResult<()> {
        self.gate()?;
        self.inner.ping()
    }

    fn schema_version(&self) -> StorageResult<u32> {
        self.gate()?;
        self.inner.schema_version()
    }
}
