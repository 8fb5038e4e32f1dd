use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};

use crate::error::{WatchError, WatchResult};
use crate::model::GroupSnapshot;

/// Stores `snapshot` as the latest known state of its guild, replacing any
/// previous one. The key is the configured guild name.
pub fn save(conn: &Connection, group_name: &str, snapshot: &GroupSnapshot) -> WatchResult<()> {
    let json = serde_json::to_string(snapshot)?;
    conn.execute(
        "INSERT INTO snapshots (group_name, snapshot, fetched_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(group_name) DO UPDATE SET snapshot = excluded.snapshot, fetched_at = excluded.fetched_at",
        params![group_name, json, Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)],
    )?;
    Ok(())
}

pub fn load(conn: &Connection, group_name: &str) -> WatchResult<Option<GroupSnapshot>> {
    let mut stmt = conn.prepare("SELECT snapshot FROM snapshots WHERE group_name = ?1")?;
    let result = stmt.query_row(params![group_name], |row| row.get::<_, String>(0));

    match result {
        Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Forgets a guild's snapshot. Returns whether one existed.
pub fn delete(conn: &Connection, group_name: &str) -> WatchResult<bool> {
    let removed = conn.execute(
        "DELETE FROM snapshots WHERE group_name = ?1",
        params![group_name],
    )?;
    Ok(removed > 0)
}

/// Stored guild names with the time their snapshot was taken, by name.
pub fn list(conn: &Connection) -> WatchResult<Vec<(String, DateTime<Utc>)>> {
    let mut stmt = conn.prepare("SELECT group_name, fetched_at FROM snapshots ORDER BY group_name")?;

    let rows: Vec<(String, String)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(name, ts)| {
            let fetched_at = DateTime::parse_from_rfc3339(&ts)
                .map_err(|e| WatchError::Other(format!("Invalid timestamp: {}", e)))?
                .with_timezone(&Utc);
            Ok((name, fetched_at))
        })
        .collect()
}
