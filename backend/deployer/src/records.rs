//! The deployment record shared between the scripts and the API.
//!
//! Stored as pretty-printed JSON with camelCase keys:
//!
//! ```json
//! { "factory": "0x..", "beacon": "0x..", "token": "0x..", "latestProjectPool": "0x.." }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sfp_protocol::Address;

use crate::errors::{DeployerError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub factory: Address,
    pub beacon: Address,
    pub token: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_project_pool: Option<Address>,
}

impl DeploymentRecord {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DeployerError::MissingRecord(format!(
                "{} not found, run `deployer deploy` first",
                path.display()
            )));
        }
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
