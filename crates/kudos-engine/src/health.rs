//! Per-subsystem health checks and the combined engine status.

use chrono::{DateTime, Utc};
use kudos_core::{KudosResult, MaintenanceReport};
use serde::Serialize;

/// Result of a single subsystem health check.
#[derive(Debug, Clone, Serialize)]
pub struct SubsystemCheck {
    pub name: &'static str,
    pub healthy: bool,
    /// Reason when unhealthy, status info otherwise.
    pub detail: String,
}

impl SubsystemCheck {
    pub fn ok(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            healthy: true,
            detail: detail.into(),
        }
    }

    pub fn unhealthy(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            healthy: false,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    /// Activity logging works; badges or maintenance are impaired.
    Degraded,
    /// The store is unreachable. Nothing can be written.
    Unavailable,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub checks: Vec<SubsystemCheck>,
    pub last_maintenance_at: Option<DateTime<Utc>>,
}

impl HealthReport {
    /// The store check decides `Unavailable`; any other failing check only
    /// degrades.
    pub fn from_checks(checks: Vec<SubsystemCheck>, last_maintenance_at: Option<DateTime<Utc>>) -> Self {
        let store_down = checks.iter().any(|c| c.name == "store" && !c.healthy);
        let status = if store_down {
            HealthStatus::Unavailable
        } else if checks.iter().all(|c| c.healthy) {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        };
        Self {
            status,
            checks,
            last_maintenance_at,
        }
    }

    pub fn check(&self, name: &str) -> Option<&SubsystemCheck> {
        self.checks.iter().find(|c| c.name == name)
    }
}

pub fn check_store(ping: &KudosResult<()>, schema: &KudosResult<u32>) -> SubsystemCheck {
    match (ping, schema) {
        (Ok(()), Ok(version)) => SubsystemCheck::ok("store", format!("connected, schema v{version}")),
        (Err(e), _) | (_, Err(e)) => SubsystemCheck::unhealthy("store", e.to_string()),
    }
}

pub fn check_badges(degraded_reason: Option<String>, active: usize) -> SubsystemCheck {
    match degraded_reason {
        Some(reason) => SubsystemCheck::unhealthy("badges", format!("degraded: {reason}")),
        None => SubsystemCheck::ok("badges", format!("{active} active badge(s)")),
    }
}

/// Healthy while the last recorded run is no older than `max_age`, or while
/// no run has been recorded yet (fresh deployment).
pub fn check_maintenance(
    last: &KudosResult<Option<MaintenanceReport>>,
    now: DateTime<Utc>,
    max_age: chrono::Duration,
) -> SubsystemCheck {
    match last {
        Ok(None) => SubsystemCheck::ok("maintenance", "no run recorded yet"),
        Ok(Some(report)) if now - report.finished_at > max_age => SubsystemCheck::unhealthy(
            "maintenance",
            format!("last run {} finished at {}", report.run_id, report.finished_at),
        ),
        Ok(Some(report)) if report.failures > 0 => SubsystemCheck::unhealthy(
            "maintenance",
            format!("last run had {} failure(s)", report.failures),
        ),
        Ok(Some(report)) => SubsystemCheck::ok(
            "maintenance",
            format!("last run {} updated {} user(s)", report.run_id, report.users_updated),
        ),
        Err(e) => SubsystemCheck::unhealthy("maintenance", e.to_string()),
    }
}
