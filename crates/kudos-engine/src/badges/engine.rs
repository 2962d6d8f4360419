//! BadgeEngine: evaluates criteria and unlocks badges exactly once.
//!
//! The `user_badges` table is the only authority on what a user has earned.
//! The aggregate's `earned_badge_ids` is a best-effort mirror for display.
//!
//! If the store cannot be read at initialization the engine runs degraded:
//! every query answers with an empty result until `refresh()` succeeds.

use std::collections::BTreeSet;
use std::sync::Arc;

use kudos_core::{
    BadgeDefinition, BadgeProgress, Clock, KudosError, KudosResult, UserAggregate, UserBadge,
};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::criteria;
use crate::gateway::StoreGateway;
use crate::transaction::{Mutation, OptimisticWriter};

const COMPONENT: &str = "badges";

#[derive(Default)]
struct CatalogState {
    /// Active definitions only.
    definitions: Vec<BadgeDefinition>,
    degraded: bool,
    degraded_reason: Option<String>,
}

pub struct BadgeEngine {
    writer: OptimisticWriter,
    clock: Arc<dyn Clock>,
    state: RwLock<CatalogState>,
}

impl BadgeEngine {
    /// Build and load the catalog. Never fails: a store error puts the engine
    /// in degraded mode instead.
    pub async fn initialize(writer: OptimisticWriter, clock: Arc<dyn Clock>) -> Self {
        let engine = Self {
            writer,
            clock,
            state: RwLock::new(CatalogState::default()),
        };
        engine.refresh().await;
        engine
    }

    fn gateway(&self) -> &StoreGateway {
        self.writer.gateway()
    }

    /// Reload active definitions. Returns true if the engine is healthy afterwards.
    pub async fn refresh(&self) -> bool {
        let loaded = self
            .gateway()
            .call("list_badge_definitions", |store| store.list_badge_definitions(false))
            .await;

        let mut state = self.state.write().await;
        match loaded {
            Ok(definitions) => {
                if state.degraded {
                    info!(badges = definitions.len(), "badge engine left degraded mode");
                }
                debug!(badges = definitions.len(), "badge catalog loaded");
                *state = CatalogState {
                    definitions,
                    degraded: false,
                    degraded_reason: None,
                };
                true
            }
            Err(e) => {
                warn!(error = %e, "badge catalog unavailable, entering degraded mode");
                state.definitions.clear();
                state.degraded = true;
                state.degraded_reason = Some(e.to_string());
                false
            }
        }
    }

    pub async fn is_degraded(&self) -> bool {
        self.state.read().await.degraded
    }

    pub async fn degraded_reason(&self) -> Option<String> {
        self.state.read().await.degraded_reason.clone()
    }

    pub async fn active_badges(&self) -> Vec<BadgeDefinition> {
        self.state.read().await.definitions.clone()
    }

    async fn earned_rows(&self, user_id: &str) -> KudosResult<Vec<UserBadge>> {
        let uid = user_id.to_string();
        self.gateway()
            .call("list_user_badges", move |store| store.list_user_badges(&uid))
            .await
    }

    /// Earned badges whose definitions are still active.
    pub async fn earned_badges(&self, user_id: &str) -> KudosResult<Vec<UserBadge>> {
        let active: BTreeSet<String> = {
            let state = self.state.read().await;
            if state.degraded {
                return Ok(Vec::new());
            }
            state.definitions.iter().map(|d| d.badge_id.clone()).collect()
        };
        let rows = self.earned_rows(user_id).await?;
        Ok(rows
            .into_iter()
            .filter(|b| active.contains(&b.badge_id))
            .collect())
    }

    /// Progress towards every locked active badge that has numeric criteria.
    pub async fn badge_progress(&self, aggregate: &UserAggregate) -> KudosResult<Vec<BadgeProgress>> {
        let definitions = {
            let state = self.state.read().await;
            if state.degraded {
                return Ok(Vec::new());
            }
            state.definitions.clone()
        };
        let earned: BTreeSet<String> = self
            .earned_rows(&aggregate.user_id)
            .await?
            .into_iter()
            .map(|b| b.badge_id)
            .collect();

        Ok(definitions
            .iter()
            .filter(|d| !earned.contains(&d.badge_id))
            .filter_map(|d| {
                criteria::progress(&d.criteria, aggregate).map(|(percent, components)| {
                    BadgeProgress {
                        badge_id: d.badge_id.clone(),
                        name: d.name.clone(),
                        category: d.category,
                        percent,
                        components,
                    }
                })
            })
            .collect())
    }

    /// Unlock every satisfied, not-yet-earned active badge. Returns only the
    /// rows this call created.
    ///
    /// Runs after the XP commit, so store failures surface as
    /// `KudosError::DegradedRead` with component `badges`.
    pub async fn evaluate_and_unlock(&self, aggregate: &UserAggregate) -> KudosResult<Vec<UserBadge>> {
        self.unlock_satisfied(aggregate)
            .await
            .map_err(|e| KudosError::degraded(COMPONENT, e))
    }

    async fn unlock_satisfied(&self, aggregate: &UserAggregate) -> KudosResult<Vec<UserBadge>> {
        let definitions = {
            let state = self.state.read().await;
            if state.degraded {
                return Ok(Vec::new());
            }
            state.definitions.clone()
        };

        let earned: BTreeSet<String> = self
            .earned_rows(&aggregate.user_id)
            .await?
            .into_iter()
            .map(|b| b.badge_id)
            .collect();

        let mut unlocked = Vec::new();
        for definition in definitions
            .iter()
            .filter(|d| !earned.contains(&d.badge_id))
            .filter(|d| criteria::is_satisfied(&d.criteria, aggregate))
        {
            let uid = aggregate.user_id.clone();
            let bid = definition.badge_id.clone();
            let now = self.clock.now();
            let (row, created) = self
                .gateway()
                .call("insert_user_badge", move |store| {
                    store.insert_user_badge_if_absent(&uid, &bid, now)
                })
                .await?;
            if created {
                info!(user_id = %row.user_id, badge_id = %row.badge_id, "badge unlocked");
                unlocked.push(row);
            }
        }

        if !unlocked.is_empty() {
            self.mirror_earned(&aggregate.user_id, &unlocked).await;
        }
        Ok(unlocked)
    }

    /// Copy newly earned ids into the aggregate. Failures are logged only.
    async fn mirror_earned(&self, user_id: &str, unlocked: &[UserBadge]) {
        let result = self
            .writer
            .modify(user_id, false, |agg| {
                let before = agg.earned_badge_ids.len();
                agg.earned_badge_ids
                    .extend(unlocked.iter().map(|b| b.badge_id.clone()));
                if agg.earned_badge_ids.len() == before {
                    Ok(Mutation::Skip(()))
                } else {
                    Ok(Mutation::Write(()))
                }
            })
            .await;
        if let Err(e) = result {
            warn!(user_id, error = %e, "could not mirror earned badges into aggregate");
        }
    }

    /// Upsert definitions then reload the catalog.
    pub async fn seed_definitions(&self, definitions: Vec<BadgeDefinition>) -> KudosResult<usize> {
        for definition in &definitions {
            if definition.badge_id.trim().is_empty() {
                return Err(KudosError::Validation("badge_id must be non-empty".into()));
            }
        }
        let count = definitions.len();
        self.gateway()
            .call("seed_badge_definitions", move |store| {
                definitions
                    .iter()
                    .try_for_each(|d| store.upsert_badge_definition(d))
            })
            .await?;
        info!(count, "badge definitions seeded");
        self.refresh().await;
        Ok(count)
    }
}
