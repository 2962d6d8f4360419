//! `SqliteAggregateStore`: the SQLite implementation of `IAggregateStore`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use kudos_core::config::StorageConfig;
use kudos_core::{
    BadgeDefinition, IAggregateStore, MaintenanceReport, StorageError, StorageResult,
    UserAggregate, UserBadge, VersionedAggregate,
};
use tracing::{debug, info};

use crate::migrations;
use crate::pool::ConnectionPool;
use crate::queries::{aggregate_ops, badge_ops, maintenance_ops};
use crate::to_storage_err;

pub struct SqliteAggregateStore {
    pool: ConnectionPool,
    path: Option<PathBuf>,
}

impl SqliteAggregateStore {
    /// Open (or create) a file-backed store and bring its schema up to date.
    pub fn open(path: &Path, read_pool_size: usize) -> StorageResult<Self> {
        let mut pool = ConnectionPool::open_writer(path)?;
        pool.with_writer(|conn| migrations::run_migrations(conn).map(|_| ()))?;
        pool.attach_readers(path, read_pool_size)?;

        info!(path = %path.display(), readers = pool.reader_count(), "aggregate store opened");
        Ok(Self {
            pool,
            path: Some(path.to_path_buf()),
        })
    }

    /// Private in-memory store. Reads share the writer connection.
    pub fn open_in_memory() -> StorageResult<Self> {
        let pool = ConnectionPool::open_in_memory()?;
        pool.with_writer(|conn| migrations::run_migrations(conn).map(|_| ()))?;
        debug!("in-memory aggregate store opened");
        Ok(Self { pool, path: None })
    }

    /// `storage.path` unset means in-memory.
    pub fn from_config(config: &StorageConfig) -> StorageResult<Self> {
        match &config.path {
            Some(path) => Self::open(Path::new(path), config.read_pool_size),
            None => Self::open_in_memory(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_wal_mode(&self) -> bool {
        self.pool.is_wal_mode()
    }

    pub fn count_aggregates(&self) -> StorageResult<u64> {
        self.pool.with_reader(aggregate_ops::count_aggregates)
    }
}

impl IAggregateStore for SqliteAggregateStore {
    fn get_aggregate(&self, user_id: &str) -> StorageResult<Option<VersionedAggregate>> {
        self.pool
            .with_reader(|conn| aggregate_ops::get_aggregate(conn, user_id))
    }

    fn commit_aggregate(
        &self,
        aggregate: &UserAggregate,
        expected_version: u64,
    ) -> StorageResult<u64> {
        self.pool
            .with_writer(|conn| aggregate_ops::commit_aggregate(conn, aggregate, expected_version))
    }

    fn list_user_ids_after(
        &self,
        cursor: Option<&str>,
        limit: usize,
    ) -> StorageResult<Vec<String>> {
        self.pool
            .with_reader(|conn| aggregate_ops::list_user_ids_after(conn, cursor, limit))
    }

    fn upsert_badge_definition(&self, definition: &BadgeDefinition) -> StorageResult<()> {
        self.pool
            .with_writer(|conn| badge_ops::upsert_badge_definition(conn, definition, Utc::now()))
    }

    fn list_badge_definitions(
        &self,
        include_inactive: bool,
    ) -> StorageResult<Vec<BadgeDefinition>> {
        self.pool
            .with_reader(|conn| badge_ops::list_badge_definitions(conn, include_inactive))
    }

    fn insert_user_badge_if_absent(
        &self,
        user_id: &str,
        badge_id: &str,
        earned_at: DateTime<Utc>,
    ) -> StorageResult<(UserBadge, bool)> {
        self.pool.with_writer(|conn| {
            badge_ops::insert_user_badge_if_absent(conn, user_id, badge_id, earned_at)
        })
    }

    fn list_user_badges(&self, user_id: &str) -> StorageResult<Vec<UserBadge>> {
        self.pool
            .with_reader(|conn| badge_ops::list_user_badges(conn, user_id))
    }

    fn record_maintenance_run(&self, report: &MaintenanceReport) -> StorageResult<()> {
        self.pool
            .with_writer(|conn| maintenance_ops::record_maintenance_run(conn, report))
    }

    fn last_maintenance_run(&self) -> StorageResult<Option<MaintenanceReport>> {
        self.pool.with_reader(maintenance_ops::last_maintenance_run)
    }

    fn ping(&self) -> StorageResult<()> {
        self.pool.with_reader(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                .map_err(to_storage_err)
                .and_then(|one| {
                    if one == 1 {
                        Ok(())
                    } else {
                        Err(StorageError::Unavailable {
                            reason: format!("liveness probe returned {one}"),
                        })
                    }
                })
        })
    }

    fn schema_version(&self) -> StorageResult<u32> {
        self.pool.with_reader(migrations::current_version)
    }
}
