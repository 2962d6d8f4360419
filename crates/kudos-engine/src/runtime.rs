//! `GamificationEngine`: the public facade wiring the store, the updater, the
//! badge engine, the quest service and the maintenance job together.

use std::sync::Arc;

use chrono::Duration;
use kudos_core::config::{KudosConfig, QuestRequirements};
use kudos_core::{
    ActivityEvent, ActivityOutcome, BadgeDefinition, BadgeProgress, Clock, IAggregateStore,
    KudosError, KudosResult, MaintenanceOutcome, QuestActivation, QuestProgress, SystemClock,
    UserAggregate, UserBadge, UserStats,
};
use kudos_storage::SqliteAggregateStore;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::badges::{default_catalog, BadgeEngine};
use crate::gateway::StoreGateway;
use crate::health::{self, HealthReport};
use crate::maintenance::{scheduler, MaintenanceJob, SchedulerHandle};
use crate::quest::QuestService;
use crate::transaction::OptimisticWriter;
use crate::updater::ProgressUpdater;
use crate::xp::level_for;

/// A maintenance run older than this marks the job unhealthy.
const MAINTENANCE_STALE_AFTER_HOURS: i64 = 36;

/// Caller role for administrative operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Learner,
    Operator,
}

fn require_operator(role: Role, operation: &str) -> KudosResult<()> {
    if role == Role::Operator {
        Ok(())
    } else {
        Err(KudosError::Forbidden {
            operation: operation.to_string(),
        })
    }
}

pub struct GamificationEngine {
    config: Arc<KudosConfig>,
    clock: Arc<dyn Clock>,
    writer: OptimisticWriter,
    updater: ProgressUpdater,
    badges: Arc<BadgeEngine>,
    quests: QuestService,
    maintenance: Arc<MaintenanceJob>,
}

impl GamificationEngine {
    /// Open the SQLite store described by `config.storage` and build the engine.
    pub async fn open(config: KudosConfig) -> KudosResult<Self> {
        config.validate()?;
        let storage = config.storage.clone();
        let store = tokio::task::spawn_blocking(move || SqliteAggregateStore::from_config(&storage))
            .await
            .map_err(|e| KudosError::StoreUnavailable {
                reason: format!("store open task failed: {e}"),
            })??;
        info!(path = ?store.path(), "gamification store opened");
        Self::with_store(config, Arc::new(store), Arc::new(SystemClock)).await
    }

    /// Build the engine over any store and clock.
    pub async fn with_store(
        config: KudosConfig,
        store: Arc<dyn IAggregateStore>,
        clock: Arc<dyn Clock>,
    ) -> KudosResult<Self> {
        config.validate()?;
        let config = Arc::new(config);

        let gateway = StoreGateway::new(store, config.updater.store_timeout());
        let writer = OptimisticWriter::new(gateway, config.updater.clone(), Arc::clone(&clock));

        let badges = Arc::new(BadgeEngine::initialize(writer.clone(), Arc::clone(&clock)).await);
        let updater = ProgressUpdater::new(
            writer.clone(),
            Arc::clone(&badges),
            Arc::clone(&config),
            Arc::clone(&clock),
        );
        let quests = QuestService::new(
            writer.clone(),
            config.quest.clone(),
            config.streak.clone(),
            Arc::clone(&clock),
        );
        let maintenance = Arc::new(MaintenanceJob::new(
            writer.clone(),
            Arc::clone(&badges),
            Arc::clone(&config),
            Arc::clone(&clock),
        ));

        Ok(Self {
            config,
            clock,
            writer,
            updater,
            badges,
            quests,
            maintenance,
        })
    }

    pub fn config(&self) -> &KudosConfig {
        &self.config
    }

    // ── Activity ──

    pub async fn log_activity(
        &self,
        user_id: &str,
        course_id: Option<&str>,
        activity_type: &str,
        payload: serde_json::Value,
    ) -> KudosResult<ActivityOutcome> {
        let event = ActivityEvent::new(
            user_id,
            course_id.map(str::to_string),
            activity_type,
            payload,
            self.clock.now(),
        );
        self.updater.apply(event).await
    }

    pub async fn log_event(&self, event: ActivityEvent) -> KudosResult<ActivityOutcome> {
        self.updater.apply(event).await
    }

    /// Snapshot of a user's aggregate. Unknown users get a fresh, unsaved one.
    pub async fn get_stats(&self, user_id: &str) -> KudosResult<UserStats> {
        let (aggregate, persisted) = self.load_or_fresh(user_id).await?;
        let level = level_for(aggregate.total_xp);
        Ok(UserStats {
            aggregate,
            level,
            persisted,
        })
    }

    async fn load_or_fresh(&self, user_id: &str) -> KudosResult<(UserAggregate, bool)> {
        if user_id.trim().is_empty() {
            return Err(KudosError::Validation("user_id must be non-empty".into()));
        }
        Ok(match self.writer.load(user_id).await? {
            Some(v) => (v.aggregate, true),
            None => (UserAggregate::new(user_id, self.clock.now()), false),
        })
    }

    // ── Badges ──

    pub async fn get_badges(&self) -> Vec<BadgeDefinition> {
        self.badges.active_badges().await
    }

    pub async fn get_earned_badges(&self, user_id: &str) -> KudosResult<Vec<UserBadge>> {
        self.badges.earned_badges(user_id).await
    }

    pub async fn get_badge_progress(&self, user_id: &str) -> KudosResult<Vec<BadgeProgress>> {
        let (aggregate, _) = self.load_or_fresh(user_id).await?;
        self.badges.badge_progress(&aggregate).await
    }

    /// Reload the badge catalog; leaves degraded mode if the store answers.
    pub async fn refresh_badges(&self) -> bool {
        self.badges.refresh().await
    }

    // ── Quest ──

    pub async fn get_quest_progress(&self, user_id: &str) -> KudosResult<QuestProgress> {
        if user_id.trim().is_empty() {
            return Err(KudosError::Validation("user_id must be non-empty".into()));
        }
        self.quests.progress(user_id).await
    }

    pub fn get_quest_requirements(&self) -> QuestRequirements {
        self.quests.requirements()
    }

    pub async fn activate_quest(
        &self,
        user_id: &str,
        course_id: &str,
        current_week: u32,
    ) -> KudosResult<QuestActivation> {
        self.quests.activate(user_id, course_id, current_week).await
    }

    pub async fn deactivate_quest(&self, user_id: &str) -> KudosResult<bool> {
        self.quests.deactivate(user_id).await
    }

    // ── Administration ──

    /// Upsert `definitions`, or the default catalog when `None`.
    pub async fn seed_badge_definitions(
        &self,
        role: Role,
        definitions: Option<Vec<BadgeDefinition>>,
    ) -> KudosResult<usize> {
        require_operator(role, "seed_badge_definitions")?;
        self.badges
            .seed_definitions(definitions.unwrap_or_else(default_catalog))
            .await
    }

    pub async fn run_maintenance_now(&self, role: Role) -> KudosResult<MaintenanceOutcome> {
        require_operator(role, "run_maintenance_now")?;
        self.maintenance.run().await
    }

    pub fn maintenance_running(&self) -> bool {
        self.maintenance.is_running()
    }

    /// Start the daily scheduler. `None` when `maintenance.enabled` is false.
    pub fn spawn_maintenance_scheduler(&self) -> KudosResult<Option<SchedulerHandle>> {
        if !self.config.maintenance.enabled {
            info!("maintenance scheduler disabled by configuration");
            return Ok(None);
        }
        let run_at = self.config.maintenance.run_at_time()?;
        let offset = self.config.streak.utc_offset()?;
        Ok(Some(scheduler::spawn(
            Arc::clone(&self.maintenance),
            run_at,
            offset,
            Arc::clone(&self.clock),
        )))
    }

    // ── Health ──

    pub async fn health(&self) -> HealthReport {
        let gateway = self.writer.gateway();
        let ping = gateway.call("ping", |store| store.ping()).await;
        let schema = gateway.call("schema_version", |store| store.schema_version()).await;
        let last_run = gateway
            .call("last_maintenance_run", |store| store.last_maintenance_run())
            .await;

        let last_maintenance_at = last_run
            .as_ref()
            .ok()
            .and_then(|r| r.as_ref().map(|r| r.finished_at));
        let checks = vec![
            health::check_store(&ping, &schema),
            health::check_badges(
                self.badges.degraded_reason().await,
                self.badges.active_badges().await.len(),
            ),
            health::check_maintenance(
                &last_run,
                self.clock.now(),
                Duration::hours(MAINTENANCE_STALE_AFTER_HOURS),
            ),
        ];
        HealthReport::from_checks(checks, last_maintenance_at)
    }
}
