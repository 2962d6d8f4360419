//! Standalone runner for the daily streak maintenance job.
//!
//! Usage: kudos-maintenance [--config <path>] [--once] [--seed-badges] [--json-logs]

use std::path::PathBuf;

use anyhow::{bail, Context};
use kudos_core::observability::init_tracing;
use kudos_core::{KudosConfig, MaintenanceOutcome};
use kudos_engine::{GamificationEngine, Role};
use tracing::info;

struct Args {
    config: Option<PathBuf>,
    once: bool,
    seed_badges: bool,
    json_logs: bool,
}

fn parse_args() -> anyhow::Result<Option<Args>> {
    let mut args = Args {
        config: None,
        once: false,
        seed_badges: false,
        json_logs: false,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = it.next().context("--config needs a path")?;
                args.config = Some(PathBuf::from(path));
            }
            "--once" => args.once = true,
            "--seed-badges" => args.seed_badges = true,
            "--json-logs" => args.json_logs = true,
            "--version" | "-V" => {
                println!("kudos-maintenance {}", env!("CARGO_PKG_VERSION"));
                return Ok(None);
            }
            "--help" | "-h" => {
                println!("kudos-maintenance {}", env!("CARGO_PKG_VERSION"));
                println!("Usage: kudos-maintenance [OPTIONS]\n");
                println!("Options:");
                println!("  -c, --config <path>  TOML config file (defaults when omitted)");
                println!("      --once           Run maintenance once and exit");
                println!("      --seed-badges    Upsert the default badge catalog first");
                println!("      --json-logs      Emit logs as JSON");
                println!("  -h, --help           Print help");
                return Ok(None);
            }
            other => bail!("unknown argument `{other}`, see --help"),
        }
    }
    Ok(Some(args))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Some(args) = parse_args()? else {
        return Ok(());
    };
    init_tracing(None, args.json_logs);

    let config = match &args.config {
        Some(path) => KudosConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => KudosConfig::default(),
    };

    let engine = GamificationEngine::open(config)
        .await
        .context("opening gamification engine")?;

    if args.seed_badges {
        let seeded = engine
            .seed_badge_definitions(Role::Operator, None)
            .await
            .context("seeding badge catalog")?;
        info!(seeded, "default badge catalog seeded");
    }

    if args.once {
        match engine.run_maintenance_now(Role::Operator).await? {
            MaintenanceOutcome::Completed(report) => {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            MaintenanceOutcome::Skipped => info!("maintenance already running"),
        }
        return Ok(());
    }

    let Some(scheduler) = engine.spawn_maintenance_scheduler()? else {
        bail!("maintenance.enabled is false; use --once for a manual run");
    };
    tokio::signal::ctrl_c()
        .await
        .context("waiting for ctrl-c")?;
    info!("shutdown requested");
    scheduler.shutdown().await;
    Ok(())
}
