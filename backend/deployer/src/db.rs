//! Database layer: migrations, idempotent writes and queries.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::info;

use crate::errors::Result;
use crate::events::{EventRow, SfpEvent};

/// Establish a SQLite connection pool and run pending migrations.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    let url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite:{database_url}")
    };
    let options = SqliteConnectOptions::from_str(&url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied successfully");
    Ok(pool)
}

// ─────────────────────────────────────────────────────────
// Event writes
// ─────────────────────────────────────────────────────────

/// Persist a batch of decoded events. Rows whose `seq` is already stored are
/// silently ignored, so re-indexing the same log is harmless.
pub async fn insert_events(pool: &SqlitePool, events: &[SfpEvent]) -> Result<usize> {
    let mut tx = pool.begin().await?;
    let count = insert_rows(&mut tx, events).await?;
    tx.commit().await?;
    Ok(count)
}

/// Drop every stored row and store `events` instead, in one transaction.
pub async fn replace_events(pool: &SqlitePool, events: &[SfpEvent]) -> Result<usize> {
    let mut tx = pool.begin().await?;
    let removed = sqlx::query("DELETE FROM events")
        .execute(&mut *tx)
        .await?
        .rows_affected();
    let count = insert_rows(&mut tx, events).await?;
    tx.commit().await?;
    info!("Event index rebuilt: {removed} rows dropped, {count} stored");
    Ok(count)
}

async fn insert_rows(tx: &mut Transaction<'_, Sqlite>, events: &[SfpEvent]) -> Result<usize> {
    let indexed_at = chrono::Utc::now().to_rfc3339();
    let mut count = 0usize;
    for ev in events {
        let rows_affected = sqlx::query(
            r#"
            INSERT OR IGNORE INTO events
                (seq, ledger, contract, event_type, actor, amount, payload, indexed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(ev.seq)
        .bind(ev.ledger)
        .bind(&ev.contract)
        .bind(&ev.event_type)
        .bind(&ev.actor)
        .bind(&ev.amount)
        .bind(&ev.payload)
        .bind(&indexed_at)
        .execute(&mut **tx)
        .await?
        .rows_affected();

        count += rows_affected as usize;
    }
    Ok(count)
}

// ─────────────────────────────────────────────────────────
// Event reads
// ─────────────────────────────────────────────────────────

/// The row with the highest `seq`, or `None` for an empty index.
pub async fn last_indexed_event(pool: &SqlitePool) -> Result<Option<EventRow>> {
    let row = sqlx::query_as::<_, EventRow>(
        r#"
        SELECT id, seq, ledger, contract, event_type, actor, amount, payload, indexed_at
        FROM   events
        ORDER  BY seq DESC
        LIMIT  1
        "#,
    )
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Fetch all events emitted by `contract`, in log order.
pub async fn get_events_for_contract(pool: &SqlitePool, contract: &str) -> Result<Vec<EventRow>> {
    let rows = sqlx::query_as::<_, EventRow>(
        r#"
        SELECT id, seq, ledger, contract, event_type, actor, amount, payload, indexed_at
        FROM   events
        WHERE  contract = ?1
        ORDER  BY seq ASC
        "#,
    )
    .bind(contract)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Fetch all events, in log order.
pub async fn get_all_events(pool: &SqlitePool) -> Result<Vec<EventRow>> {
    let rows = sqlx::query_as::<_, EventRow>(
        r#"
        SELECT id, seq, ledger, contract, event_type, actor, amount, payload, indexed_at
        FROM   events
        ORDER  BY seq ASC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
