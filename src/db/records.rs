//! Raw key-value rows backing persisted learner progress.
//!
//! Every row is scoped by the learner's session id, so two browsers never see
//! each other's records.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result};

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn get_record(conn: &Connection, scope: &str, key: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM progress_records WHERE scope = ?1 AND key = ?2",
        params![scope, key],
        |row| row.get(0),
    )
    .optional()
}

pub fn set_record(conn: &Connection, scope: &str, key: &str, value: &str) -> Result<()> {
    conn.execute(
        r#"
    INSERT INTO progress_records (scope, key, value, updated_at)
    VALUES (?1, ?2, ?3, ?4)
    ON CONFLICT(scope, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
    "#,
        params![scope, key, value, timestamp(Utc::now())],
    )?;
    Ok(())
}

pub fn delete_record(conn: &Connection, scope: &str, key: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM progress_records WHERE scope = ?1 AND key = ?2",
        params![scope, key],
    )?;
    Ok(())
}

/// Delete every record last written before `cutoff`. Returns the number removed.
pub fn prune_records_before(conn: &Connection, cutoff: DateTime<Utc>) -> Result<usize> {
    conn.execute(
        "DELETE FROM progress_records WHERE updated_at < ?1",
        params![timestamp(cutoff)],
    )
}
