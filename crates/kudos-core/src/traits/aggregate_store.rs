//! `IAggregateStore`: abstraction over the persisted gamification state.
//!
//! Implementations are blocking. The engine offloads every call to the
//! blocking pool, so methods must not assume an async runtime.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::errors::StorageResult;
use crate::models::{BadgeDefinition, MaintenanceReport, UserAggregate, UserBadge};

/// An aggregate together with its optimistic concurrency token.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedAggregate {
    pub aggregate: UserAggregate,
    /// 0 means the document has never been persisted.
    pub version: u64,
}

impl VersionedAggregate {
    pub fn unpersisted(aggregate: UserAggregate) -> Self {
        Self {
            aggregate,
            version: 0,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.version > 0
    }
}

pub trait IAggregateStore: Send + Sync {
    // ── Aggregates ──

    /// Load a user's aggregate, `None` if the user has no document yet.
    fn get_aggregate(&self, user_id: &str) -> StorageResult<Option<VersionedAggregate>>;

    /// Write `aggregate` iff the stored version still equals `expected_version`.
    ///
    /// `expected_version == 0` inserts a new document. Returns the new version.
    /// A lost race yields `StorageError::VersionConflict`.
    fn commit_aggregate(&self, aggregate: &UserAggregate, expected_version: u64)
        -> StorageResult<u64>;

    /// Keyset page of user ids strictly after `cursor`, ascending.
    fn list_user_ids_after(&self, cursor: Option<&str>, limit: usize)
        -> StorageResult<Vec<String>>;

    // ── Badges ──

    /// Insert or replace a definition by `badge_id`.
    fn upsert_badge_definition(&self, definition: &BadgeDefinition) -> StorageResult<()>;

    fn list_badge_definitions(&self, include_inactive: bool)
        -> StorageResult<Vec<BadgeDefinition>>;

    /// Check-then-insert in one transaction. Returns the stored row and
    /// whether this call created it. An existing row is returned unmodified.
    fn insert_user_badge_if_absent(
        &self,
        user_id: &str,
        badge_id: &str,
        earned_at: DateTime<Utc>,
    ) -> StorageResult<(UserBadge, bool)>;

    fn list_user_badges(&self, user_id: &str) -> StorageResult<Vec<UserBadge>>;

    // ── Maintenance ──

    fn record_maintenance_run(&self, report: &MaintenanceReport) -> StorageResult<()>;

    fn last_maintenance_run(&self) -> StorageResult<Option<MaintenanceReport>>;

    // ── Lifecycle ──

    /// Cheap liveness probe.
    fn ping(&self) -> StorageResult<()>;

    fn schema_version(&self) -> StorageResult<u32>;
}

impl<T: IAggregateStore + ?Sized> IAggregateStore for Arc<T> {
    fn get_aggregate(&self, user_id: &str) -> StorageResult<Option<VersionedAggregate>> {
        (**self).get_aggregate(user_id)
    }
    fn commit_aggregate(
        &self,
        aggregate: &UserAggregate,
        expected_version: u64,
    ) -> StorageResult<u64> {
        (**self).commit_aggregate(aggregate, expected_version)
    }
    fn list_user_ids_after(
        &self,
        cursor: Option<&str>,
        limit: usize,
    ) -> StorageResult<Vec<String>> {
        (**self).list_user_ids_after(cursor, limit)
    }
    fn upsert_badge_definition(&self, definition: &BadgeDefinition) -> StorageResult<()> {
        (**self).upsert_badge_definition(definition)
    }
    fn list_badge_definitions(
        &self,
        include_inactive: bool,
    ) -> StorageResult<Vec<BadgeDefinition>> {
        (**self).list_badge_definitions(include_inactive)
    }
    fn insert_user_badge_if_absent(
        &self,
        user_id: &str,
        badge_id: &str,
        earned_at: DateTime<Utc>,
    ) -> StorageResult<(UserBadge, bool)> {
        (**self).insert_user_badge_if_absent(user_id, badge_id, earned_at)
    }
    fn list_user_badges(&self, user_id: &str) -> StorageResult<Vec<UserBadge>> {
        (**self).list_user_badges(user_id)
    }
    fn record_maintenance_run(&self, report: &MaintenanceReport) -> StorageResult<()> {
        (**self).record_maintenance_run(report)
    }
    fn last_maintenance_run(&self) -> StorageResult<Option<MaintenanceReport>> {
        (**self).last_maintenance_run()
    }
    fn ping(&self) -> StorageResult<()> {
        (**self).ping()
    }
    fn schema_version(&self) -> StorageResult<u32> {
        (**self).schema_version()
    }
}
