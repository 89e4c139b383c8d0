//! pay_bank - HTTP service entry point
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌─────────────┐    ┌────────────┐
//! │  Config  │───▶│ Postgres │───▶│ Coordinator │───▶│  Gateway   │
//! │  (YAML)  │    │(migrate) │    │  (PgLedger) │    │  (axum)    │
//! └──────────┘    └──────────┘    └─────────────┘    └────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use pay_bank::config::AppConfig;
use pay_bank::db::Database;
use pay_bank::gateway::{self, state::AppState};
use pay_bank::logging::init_logging;
use pay_bank::transfer::{PgLedger, TransferCoordinator};
use pay_bank::user_auth::UserAuthService;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let config = AppConfig::load(&env)?;
    let _log_guard = init_logging(&config)?;

    tracing::info!(
        env = %env,
        version = env!("CARGO_PKG_VERSION"),
        git = env!("GIT_HASH"),
        "Starting pay_bank"
    );

    let db = Database::connect(&config.database)
        .await
        .context("Failed to connect to PostgreSQL")?;
    db.migrate().await.context("Failed to run migrations")?;

    let ledger = Arc::new(PgLedger::new(db.pool().clone()));
    let coordinator = Arc::new(TransferCoordinator::with_timeout(
        ledger,
        Duration::from_millis(config.transfer.timeout_ms),
    ));
    let user_auth = Arc::new(UserAuthService::new(
        db.pool().clone(),
        &config.auth,
        &config.onboarding,
    ));

    let state = Arc::new(AppState::new(db.clone(), coordinator, user_auth));
    gateway::run_server(&config.gateway, state).await?;

    db.pool().close().await;
    Ok(())
}
