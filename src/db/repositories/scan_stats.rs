use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Row};

use crate::db::{
    helpers::{parse_datetime, parse_scan_kind, to_u64},
    models::{ScanKind, ScanStat, StatsSummary},
    Database,
};

fn row_to_stat(row: &Row) -> Result<ScanStat> {
    let kind: String = row.get("scan_kind")?;
    let recorded_at: String = row.get("recorded_at")?;
    Ok(ScanStat {
        id: row.get("id")?,
        scan_kind: parse_scan_kind(&kind)?,
        card_name: row.get("card_name")?,
        succeeded: row.get("succeeded")?,
        recorded_at: parse_datetime(&recorded_at, "recorded_at")?,
    })
}

impl Database {
    /// Append one scan outcome. Rows are never updated afterwards.
    pub async fn record_stat(
        &self,
        kind: ScanKind,
        succeeded: bool,
        card_name: Option<String>,
    ) -> Result<i64> {
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO scan_stats (scan_kind, card_name, succeeded, recorded_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![kind.as_str(), card_name, succeeded, Utc::now().to_rfc3339()],
            )
            .with_context(|| "failed to record scan stat")?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    pub async fn aggregate_stats(&self) -> Result<StatsSummary> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT scan_kind, COUNT(*), COALESCE(SUM(succeeded), 0)
                 FROM scan_stats
                 GROUP BY scan_kind",
            )?;
            let mut rows = stmt.query([])?;

            let mut by_kind = BTreeMap::new();
            let mut total_scans = 0u64;
            let mut successful_scans = 0u64;
            while let Some(row) = rows.next()? {
                let kind = parse_scan_kind(&row.get::<_, String>(0)?)?;
                let count = to_u64(row.get(1)?, "scan count")?;
                let succeeded = to_u64(row.get(2)?, "success count")?;
                by_kind.insert(kind, count);
                total_scans += count;
                successful_scans += succeeded;
            }

            let success_rate = if total_scans == 0 {
                0.0
            } else {
                successful_scans as f64 / total_scans as f64
            };

            Ok(StatsSummary {
                by_kind,
                total_scans,
                successful_scans,
                success_rate,
            })
        })
        .await
    }

    /// Latest scan outcomes, newest first.
    pub async fn recent_stats(&self, limit: usize) -> Result<Vec<ScanStat>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, scan_kind, card_name, succeeded, recorded_at
                 FROM scan_stats
                 ORDER BY id DESC
                 LIMIT ?1",
            )?;
            let mut rows = stmt.query(params![limit])?;
            let mut stats = Vec::new();
            while let Some(row) = rows.next()? {
                stats.push(row_to_stat(row)?);
            }
            Ok(stats)
        })
        .await
    }
}
