//! Flattened event rows for the SQLite index.

use serde::{Deserialize, Serialize};
use sfp_protocol::EventRecord;

/// A ledger record decoded for storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SfpEvent {
    pub seq: i64,
    pub ledger: i64,
    pub contract: String,
    pub event_type: String,
    pub actor: Option<String>,
    /// Decimal string; amounts exceed SQLite's integer range.
    pub amount: Option<String>,
    /// The full record body as JSON.
    pub payload: String,
}

impl SfpEvent {
    pub fn decode(record: &EventRecord) -> crate::errors::Result<Self> {
        Ok(SfpEvent {
            seq: record.seq as i64,
            ledger: record.ledger as i64,
            contract: record.contract.to_string(),
            event_type: record.event.name().to_string(),
            actor: record.event.actor().map(|a| a.to_string()),
            amount: record.event.amount().map(|a| a.to_string()),
            payload: serde_json::to_string(&record.event)?,
        })
    }
}

/// An event row as stored in / read from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRow {
    pub id: i64,
    pub seq: i64,
    pub ledger: i64,
    pub contract: String,
    pub event_type: String,
    pub actor: Option<String>,
    pub amount: Option<String>,
    pub payload: String,
    pub indexed_at: String,
}
