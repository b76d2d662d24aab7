//! Mirrors the ledger event log into SQLite.
//!
//! The snapshot file is the source of truth. The index appends records it
//! has not seen yet and is rebuilt when the snapshot no longer contains its
//! last row.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use sfp_protocol::{EventRecord, Ledger};
use sqlx::SqlitePool;
use tracing::{error, info, warn};

use crate::db;
use crate::errors::Result;
use crate::events::{EventRow, SfpEvent};
use crate::state;

pub struct IndexerState {
    pub pool: SqlitePool,
    pub state_path: PathBuf,
    pub poll_interval_secs: u64,
}

/// Index every record past the last stored `seq`. Returns the number of
/// new rows.
///
/// When the last stored row is not part of the snapshot (the state file
/// was replaced by a fresh ledger) the index is rebuilt from the snapshot.
pub async fn index_ledger(pool: &SqlitePool, ledger: &Ledger) -> Result<usize> {
    let records = ledger.events();
    let start = match db::last_indexed_event(pool).await? {
        None => 0,
        Some(last) if in_snapshot(&last, records)? => last.seq as usize + 1,
        Some(last) => {
            warn!(
                last_seq = last.seq,
                snapshot_records = records.len(),
                "Ledger snapshot does not extend the index; rebuilding"
            );
            return db::replace_events(pool, &decode_all(records)?).await;
        }
    };
    let records = &records[start..];
    if records.is_empty() {
        return Ok(0);
    }

    let inserted = db::insert_events(pool, &decode_all(records)?).await?;
    info!(
        "Indexed {} ledger records → {} new rows stored",
        records.len(),
        inserted
    );
    Ok(inserted)
}

fn decode_all(records: &[EventRecord]) -> Result<Vec<SfpEvent>> {
    records.iter().map(SfpEvent::decode).collect()
}

/// `true` when the snapshot holds the same record at `last.seq`.
fn in_snapshot(last: &EventRow, records: &[EventRecord]) -> Result<bool> {
    let Some(record) = usize::try_from(last.seq).ok().and_then(|i| records.get(i)) else {
        return Ok(false);
    };
    let decoded = SfpEvent::decode(record)?;
    Ok(decoded.contract == last.contract && decoded.payload == last.payload)
}

/// Re-read the snapshot and index it, forever.
pub async fn run(state: Arc<IndexerState>) {
    info!("Indexer watching {}", state.state_path.display());

    loop {
        if let Err(e) = poll_once(&state).await {
            error!("Indexer poll error: {e}");
        }
        tokio::time::sleep(Duration::from_secs(state.poll_interval_secs)).await;
    }
}

async fn poll_once(state: &IndexerState) -> Result<usize> {
    let ledger = state::load_ledger(&state.state_path)?;
    index_ledger(&state.pool, &ledger).await
}
