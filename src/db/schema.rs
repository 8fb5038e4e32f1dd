use std::path::Path;

use rusqlite::Connection;

use crate::error::WatchResult;

/// Initialize the database schema. Creates all tables if they don't exist.
pub fn initialize(conn: &Connection) -> WatchResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS snapshots (
            group_name TEXT PRIMARY KEY NOT NULL,
            snapshot TEXT NOT NULL,
            fetched_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS scan_log (
            id TEXT PRIMARY KEY NOT NULL,
            group_name TEXT NOT NULL,
            scanned_at TEXT NOT NULL,
            outcome TEXT NOT NULL,
            change_count INTEGER NOT NULL DEFAULT 0,
            anomaly_count INTEGER NOT NULL DEFAULT 0,
            detail TEXT
        );

        CREATE INDEX IF NOT EXISTS scan_log_group ON scan_log (group_name, scanned_at);
        ",
    )?;
    Ok(())
}

/// Open (creating if needed) the database file and its parent directory.
pub fn open(path: &Path) -> WatchResult<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = Connection::open(path)?;
    initialize(&conn)?;
    Ok(conn)
}

/// Create an in-memory connection for testing.
pub fn test_connection() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    initialize(&conn).unwrap();
    conn
}
