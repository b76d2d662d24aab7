//! Application configuration loaded from environment variables.

use std::path::PathBuf;

use sfp_protocol::Amount;

use crate::errors::{DeployerError, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// JSON snapshot of the devnet ledger
    pub state_path: PathBuf,
    /// Where deployed addresses are recorded
    pub deployment_file: PathBuf,
    /// SQLite database for indexed events
    pub database_url: String,
    /// Port for the REST API server
    pub api_port: u16,
    /// How often (in seconds) the snapshot is re-indexed while serving
    pub poll_interval_secs: u64,
    /// Seed of the account that deploys and administers everything
    pub deployer_seed: String,
    pub token_name: String,
    pub token_symbol: String,
    /// Native currency credited to the deployer on a fresh ledger
    pub deployer_funding: Amount,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let config = Config {
            state_path: var("STATE_PATH", "./sfp-devnet.json").into(),
            deployment_file: var("DEPLOYMENT_FILE", "./deployment-addresses.json").into(),
            database_url: var("DATABASE_URL", "sqlite:./sfp_events.db"),
            api_port: var("API_PORT", "3001")
                .parse()
                .map_err(|_| DeployerError::Config("Invalid API_PORT".to_string()))?,
            poll_interval_secs: var("POLL_INTERVAL_SECS", "5")
                .parse()
                .map_err(|_| DeployerError::Config("Invalid POLL_INTERVAL_SECS".to_string()))?,
            deployer_seed: var("DEPLOYER_SEED", "deployer"),
            token_name: var("TOKEN_NAME", "Ukraine University"),
            token_symbol: var("TOKEN_SYMBOL", "UU"),
            deployer_funding: var("DEPLOYER_FUNDING", "10000000000000000000000")
                .parse()
                .map_err(|_| DeployerError::Config("Invalid DEPLOYER_FUNDING".to_string()))?,
        };

        if config.deployer_seed.is_empty() {
            return Err(DeployerError::Config("DEPLOYER_SEED must not be empty".to_string()));
        }
        if config.token_name.is_empty() || config.token_symbol.is_empty() {
            return Err(DeployerError::Config(
                "TOKEN_NAME and TOKEN_SYMBOL must not be empty".to_string(),
            ));
        }
        Ok(config)
    }
}
