//! Devnet ledger snapshot on disk.

use std::fs;
use std::path::Path;

use sfp_protocol::Ledger;
use tracing::{debug, info};

use crate::errors::Result;

/// Load the snapshot at `path`, or start an empty ledger if there is none.
pub fn load_ledger(path: &Path) -> Result<Ledger> {
    if !path.exists() {
        info!("No ledger snapshot at {}, starting fresh", path.display());
        return Ok(Ledger::new());
    }
    let raw = fs::read_to_string(path)?;
    let ledger: Ledger = serde_json::from_str(&raw)?;
    debug!(
        sequence = ledger.sequence(),
        events = ledger.events().len(),
        "Ledger snapshot loaded"
    );
    Ok(ledger)
}

/// Write the snapshot, replacing the previous file in one step.
pub fn save_ledger(path: &Path, ledger: &Ledger) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_string(ledger)?)?;
    fs::rename(&tmp, path)?;
    debug!(sequence = ledger.sequence(), "Ledger snapshot saved");
    Ok(())
}
