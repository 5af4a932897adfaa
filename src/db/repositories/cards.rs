use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, Row};
use serde_json::Value;

use crate::db::{
    helpers::{normalize_key, parse_datetime, to_u64},
    models::{card::metadata_is_empty, CardCacheEntry, CardName},
    Database,
};

fn row_to_card(row: &Row) -> Result<CardCacheEntry> {
    let last_seen: String = row.get("last_seen")?;
    let metadata: String = row.get("metadata")?;

    Ok(CardCacheEntry {
        name: row.get("name")?,
        raw_display_name: row.get("display_name")?,
        last_seen: parse_datetime(&last_seen, "last_seen")?,
        source_metadata: serde_json::from_str(&metadata)
            .with_context(|| "failed to decode card metadata")?,
    })
}

/// Insert or refresh one card. Returns false when the input was skipped.
fn upsert_card_row(conn: &Connection, name: &str, metadata: &Value) -> Result<bool> {
    let key = normalize_key(name);
    if key.is_empty() || metadata_is_empty(metadata) {
        return Ok(false);
    }

    let now = Utc::now().to_rfc3339();
    let encoded = serde_json::to_string(metadata)?;
    conn.execute(
        "INSERT INTO card_cache (name, display_name, metadata, last_seen)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(name) DO UPDATE SET
             display_name = excluded.display_name,
             metadata = excluded.metadata,
             last_seen = excluded.last_seen",
        params![key, name.trim(), encoded, now],
    )
    .with_context(|| format!("failed to upsert card '{key}'"))?;
    Ok(true)
}

impl Database {
    /// Create or refresh a cached card. Empty metadata or an empty name is a
    /// no-op and returns `false`.
    pub async fn upsert_card(&self, name: &str, metadata: Value) -> Result<bool> {
        let name = name.to_string();
        self.execute(move |conn| upsert_card_row(conn, &name, &metadata))
            .await
    }

    /// Batch variant of [`Database::upsert_card`], applied in one transaction.
    /// Returns the number of rows written.
    pub async fn upsert_cards(&self, cards: Vec<(String, Value)>) -> Result<usize> {
        self.execute(move |conn| {
            let tx = conn
                .transaction()
                .context("failed to open card cache transaction")?;
            let mut written = 0;
            for (name, metadata) in &cards {
                if upsert_card_row(&tx, name, metadata)? {
                    written += 1;
                }
            }
            tx.commit().context("failed to commit card cache batch")?;
            Ok(written)
        })
        .await
    }

    pub async fn get_card(&self, name: &str) -> Result<Option<CardCacheEntry>> {
        let key = normalize_key(name);
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT name, display_name, metadata, last_seen
                 FROM card_cache
                 WHERE name = ?1",
            )?;
            let mut rows = stmt.query(params![key])?;
            let card = match rows.next()? {
                Some(row) => Some(row_to_card(row)?),
                None => None,
            };
            Ok(card)
        })
        .await
    }

    /// Normalized name keyspace. Order is unspecified.
    pub async fn get_all_card_names(&self) -> Result<Vec<String>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare("SELECT name FROM card_cache")?;
            let names = stmt
                .query_map([], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(names)
        })
        .await
    }

    /// Keys paired with the display names the matcher hands back to callers.
    pub async fn load_card_index(&self) -> Result<Vec<CardName>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare("SELECT name, display_name FROM card_cache")?;
            let names = stmt
                .query_map([], |row| {
                    Ok(CardName {
                        key: row.get(0)?,
                        display: row.get(1)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(names)
        })
        .await
    }

    pub async fn card_count(&self) -> Result<u64> {
        self.execute(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM card_cache", [], |row| row.get(0))?;
            to_u64(count, "card count")
        })
        .await
    }

    /// Drop every cached card. Patterns, corrections and stats are kept.
    pub async fn clear_card_cache(&self) -> Result<u64> {
        self.execute(|conn| {
            let removed = conn
                .execute("DELETE FROM card_cache", [])
                .context("failed to clear card cache")?;
            Ok(removed as u64)
        })
        .await
    }

}
