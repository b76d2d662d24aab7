//! SFP devnet tooling: entry point.
//!
//! Runs the deployment scripts against a ledger snapshot on disk, mirrors
//! its event log into SQLite and exposes a small Axum REST API over the
//! index.

mod api;
mod config;
mod db;
mod errors;
mod events;
mod indexer;
mod records;
mod scripts;
mod state;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::Config;
use indexer::IndexerState;
use records::DeploymentRecord;

#[derive(Parser)]
#[command(name = "deployer")]
#[command(about = "Smart Funding Pool devnet tooling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy the beacon, the factory and the governance token
    Deploy,
    /// Create a demo pool through the factory and contribute to it
    SetupDemo,
    /// Move every deployed instance to its next revision
    Upgrade,
    /// Mirror the ledger event log into the database once
    Index,
    /// Keep the index current and serve the REST API
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;

    match cli.command {
        Commands::Deploy => {
            let mut ledger = state::load_ledger(&config.state_path)?;
            let record = run_script(scripts::deploy(&mut ledger, &config))?;
            state::save_ledger(&config.state_path, &ledger)?;
            record.save(&config.deployment_file)?;
            info!(
                "The addresses of deployed contracts are stored in {}",
                config.deployment_file.display()
            );
        }
        Commands::SetupDemo => {
            let mut record = DeploymentRecord::load(&config.deployment_file)?;
            let mut ledger = state::load_ledger(&config.state_path)?;
            let summary = run_script(scripts::setup_demo(&mut ledger, &config, &mut record))?;
            state::save_ledger(&config.state_path, &ledger)?;
            record.save(&config.deployment_file)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Upgrade => {
            let record = DeploymentRecord::load(&config.deployment_file)?;
            let mut ledger = state::load_ledger(&config.state_path)?;
            let summary = run_script(scripts::upgrade(&mut ledger, &config, &record))?;
            state::save_ledger(&config.state_path, &ledger)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Index => {
            let pool = db::init_pool(&config.database_url).await?;
            let ledger = state::load_ledger(&config.state_path)?;
            let inserted = indexer::index_ledger(&pool, &ledger).await?;
            info!("{inserted} new records indexed");
        }
        Commands::Serve => serve(config).await?,
    }

    Ok(())
}

/// Log a rejected script before handing the error up.
fn run_script<T>(result: errors::Result<T>) -> errors::Result<T> {
    if let Err(errors::DeployerError::Protocol(e)) = &result {
        warn!(code = e.code(), "Script rejected by the ledger: {e}");
    }
    result
}

async fn serve(config: Config) -> anyhow::Result<()> {
    // Set up the SQLite connection pool and run migrations.
    let pool = db::init_pool(&config.database_url).await?;

    // ─── Background indexer ───────────────────────────────
    let indexer_state = Arc::new(IndexerState {
        pool: pool.clone(),
        state_path: config.state_path.clone(),
        poll_interval_secs: config.poll_interval_secs,
    });
    tokio::spawn(indexer::run(indexer_state));

    // ─── REST API ─────────────────────────────────────────
    let app = api::router(Arc::new(api::ApiState {
        pool,
        deployment_file: config.deployment_file.clone(),
    }));

    let addr = format!("0.0.0.0:{}", config.api_port);
    info!("API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
