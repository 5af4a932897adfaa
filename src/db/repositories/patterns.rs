use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, Row};

use crate::db::{
    helpers::{normalize_key, parse_datetime, to_u64},
    models::OcrPattern,
    Database,
};

const PATTERN_COLUMNS: &str =
    "ocr_text, resolved_name, success_count, total_count, confidence, created_at, last_used";

fn row_to_pattern(row: &Row) -> Result<OcrPattern> {
    let created_at: String = row.get("created_at")?;
    let last_used: String = row.get("last_used")?;
    let success_count = to_u64(row.get("success_count")?, "success_count")?;
    let total_count = to_u64(row.get("total_count")?, "total_count")?;

    Ok(OcrPattern {
        ocr_text: row.get("ocr_text")?,
        resolved_name: row.get("resolved_name")?,
        success_count,
        total_count,
        confidence: OcrPattern::ratio(success_count, total_count),
        created_at: parse_datetime(&created_at, "created_at")?,
        last_used: parse_datetime(&last_used, "last_used")?,
    })
}

fn select_mapping(conn: &Connection, key: &str, name: &str) -> Result<Option<OcrPattern>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATTERN_COLUMNS} FROM ocr_patterns WHERE ocr_text = ?1 AND resolved_name = ?2"
    ))?;
    let mut rows = stmt.query(params![key, name])?;
    let pattern = match rows.next()? {
        Some(row) => Some(row_to_pattern(row)?),
        None => None,
    };
    Ok(pattern)
}

/// Every mapping recorded for `key`, best first: highest confidence, then
/// most observations, then most recently used.
fn select_mappings(conn: &Connection, key: &str) -> Result<Vec<OcrPattern>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATTERN_COLUMNS} FROM ocr_patterns
         WHERE ocr_text = ?1
         ORDER BY confidence DESC, total_count DESC, last_used DESC, rowid DESC"
    ))?;
    let mut rows = stmt.query(params![key])?;
    let mut patterns = Vec::new();
    while let Some(row) = rows.next()? {
        patterns.push(row_to_pattern(row)?);
    }
    Ok(patterns)
}

impl Database {
    /// Record one observation of `ocr_text` resolving to `resolved_name`.
    ///
    /// Counters belong to the (text, name) pair. The first observation of a
    /// pair creates its row with `total_count = 1`; later ones bump
    /// `total_count`, and `success_count` only when `success`. Observations
    /// of other names for the same text never touch this pair. The update is
    /// one statement on the store thread, so concurrent callers never lose
    /// increments. Returns the pair's row after the update.
    pub async fn upsert_pattern(
        &self,
        ocr_text: &str,
        resolved_name: &str,
        success: bool,
    ) -> Result<Option<OcrPattern>> {
        let key = normalize_key(ocr_text);
        let resolved_name = resolved_name.trim().to_string();
        if key.is_empty() || resolved_name.is_empty() {
            return Ok(None);
        }

        self.execute(move |conn| {
            let now = Utc::now().to_rfc3339();
            conn.execute(
                "INSERT INTO ocr_patterns (ocr_text, resolved_name, success_count, total_count, created_at, last_used)
                 VALUES (?1, ?2, ?3, 1, ?4, ?4)
                 ON CONFLICT(ocr_text, resolved_name) DO UPDATE SET
                     success_count = ocr_patterns.success_count + excluded.success_count,
                     total_count = ocr_patterns.total_count + 1,
                     last_used = excluded.last_used",
                params![key, resolved_name, i64::from(success), now],
            )
            .with_context(|| format!("failed to upsert pattern '{key}' -> '{resolved_name}'"))?;

            select_mapping(conn, &key, &resolved_name)
        })
        .await
    }

    /// The best mapping learned for `ocr_text`, if any.
    pub async fn get_pattern(&self, ocr_text: &str) -> Result<Option<OcrPattern>> {
        Ok(self.get_patterns(ocr_text).await?.into_iter().next())
    }

    /// All mappings learned for `ocr_text`, best first.
    pub async fn get_patterns(&self, ocr_text: &str) -> Result<Vec<OcrPattern>> {
        let key = normalize_key(ocr_text);
        if key.is_empty() {
            return Ok(Vec::new());
        }
        self.execute(move |conn| select_mappings(conn, &key)).await
    }

    /// Total learned patterns and how many of them reach `threshold`.
    pub async fn pattern_stats(&self, threshold: f64) -> Result<(u64, u64)> {
        self.execute(move |conn| {
            let (total, trusted): (i64, i64) = conn.query_row(
                "SELECT COUNT(*),
                        COALESCE(SUM(CASE WHEN confidence >= ?1 THEN 1 ELSE 0 END), 0)
                 FROM ocr_patterns",
                params![threshold],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            Ok((to_u64(total, "pattern count")?, to_u64(trusted, "trusted count")?))
        })
        .await
    }
}
