use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};

use crate::error::{WatchError, WatchResult};
use crate::model::{ScanId, ScanOutcome, ScanRecord};

pub fn insert(conn: &Connection, record: &ScanRecord) -> WatchResult<()> {
    conn.execute(
        "INSERT INTO scan_log (id, group_name, scanned_at, outcome, change_count, anomaly_count, detail)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            record.id.to_string(),
            record.group_name,
            record.scanned_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            record.outcome.to_db_str(),
            record.change_count as i64,
            record.anomaly_count as i64,
            record.detail,
        ],
    )?;
    Ok(())
}

/// Most recent scans of a guild, newest first.
pub fn recent_for_group(conn: &Connection, group_name: &str, limit: usize) -> WatchResult<Vec<ScanRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, group_name, scanned_at, outcome, change_count, anomaly_count, detail
         FROM scan_log WHERE group_name = ?1
         ORDER BY scanned_at DESC, rowid DESC LIMIT ?2",
    )?;

    let rows: Vec<(String, String, String, String, i64, i64, Option<String>)> = stmt
        .query_map(params![group_name, limit as i64], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut records = Vec::new();
    for (id_str, group_name, scanned_str, outcome_str, changes, anomalies, detail) in rows {
        let id = ScanId::parse(&id_str).map_err(|e| WatchError::Other(format!("Invalid UUID: {}", e)))?;
        let scanned_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&scanned_str)
            .map_err(|e| WatchError::Other(format!("Invalid timestamp: {}", e)))?
            .with_timezone(&Utc);
        let outcome = ScanOutcome::from_db_str(&outcome_str)
            .ok_or_else(|| WatchError::Other(format!("Unknown scan outcome: {}", outcome_str)))?;

        records.push(ScanRecord {
            id,
            group_name,
            scanned_at,
            outcome,
            change_count: changes as usize,
            anomaly_count: anomalies as usize,
            detail,
        });
    }

    Ok(records)
}
