use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Row};

use crate::db::{
    helpers::{normalize_key, parse_datetime, to_u64},
    models::UserCorrection,
    Database,
};

fn row_to_correction(row: &Row) -> Result<UserCorrection> {
    let created_at: String = row.get("created_at")?;
    Ok(UserCorrection {
        ocr_text: row.get("ocr_text")?,
        resolved_name: row.get("resolved_name")?,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

impl Database {
    /// Unconditional overwrite; the last correction for a key wins.
    pub async fn upsert_correction(
        &self,
        ocr_text: &str,
        resolved_name: &str,
    ) -> Result<Option<UserCorrection>> {
        let key = normalize_key(ocr_text);
        let resolved_name = resolved_name.trim().to_string();
        if key.is_empty() || resolved_name.is_empty() {
            return Ok(None);
        }

        self.execute(move |conn| {
            let created_at = Utc::now();
            conn.execute(
                "INSERT INTO user_corrections (ocr_text, resolved_name, created_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(ocr_text) DO UPDATE SET
                     resolved_name = excluded.resolved_name,
                     created_at = excluded.created_at",
                params![key, resolved_name, created_at.to_rfc3339()],
            )
            .with_context(|| format!("failed to write correction '{key}'"))?;

            Ok(Some(UserCorrection {
                ocr_text: key,
                resolved_name,
                created_at,
            }))
        })
        .await
    }

    pub async fn get_correction(&self, ocr_text: &str) -> Result<Option<UserCorrection>> {
        let key = normalize_key(ocr_text);
        if key.is_empty() {
            return Ok(None);
        }

        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT ocr_text, resolved_name, created_at
                 FROM user_corrections
                 WHERE ocr_text = ?1",
            )?;
            let mut rows = stmt.query(params![key])?;
            let correction = match rows.next()? {
                Some(row) => Some(row_to_correction(row)?),
                None => None,
            };
            Ok(correction)
        })
        .await
    }

    /// Most recent corrections first.
    pub async fn list_corrections(&self, limit: usize) -> Result<Vec<UserCorrection>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT ocr_text, resolved_name, created_at
                 FROM user_corrections
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?1",
            )?;
            let mut rows = stmt.query(params![limit])?;
            let mut corrections = Vec::new();
            while let Some(row) = rows.next()? {
                corrections.push(row_to_correction(row)?);
            }
            Ok(corrections)
        })
        .await
    }

    pub async fn correction_count(&self) -> Result<u64> {
        self.execute(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM user_corrections", [], |row| row.get(0))?;
            to_u64(count, "correction count")
        })
        .await
    }
}
