//! SQLite-backed session store.
//!
//! Connections are short-lived: every operation opens the database file,
//! runs inside an implicit (or explicit) transaction and closes again, so
//! the store handle itself stays `Send + Sync` and cheap to clone around
//! worker tasks.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::storage::{CounterDelta, SessionStore};
use common::model::session::{
    RowOutcome, RowRecord, SessionStatus, SessionSummary, UploadSession,
};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS upload_sessions (
    id               TEXT PRIMARY KEY,
    source_file_name TEXT NOT NULL,
    checksum         TEXT NOT NULL,
    account_id       TEXT,
    total_rows       INTEGER NOT NULL,
    successful_count INTEGER NOT NULL DEFAULT 0,
    failed_count     INTEGER NOT NULL DEFAULT 0,
    status           TEXT NOT NULL,
    error_log        TEXT,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS upload_rows (
    session_id        TEXT NOT NULL REFERENCES upload_sessions(id),
    row_index         INTEGER NOT NULL,
    raw               TEXT NOT NULL,
    normalized        TEXT NOT NULL,
    validation_errors TEXT NOT NULL,
    is_valid          INTEGER NOT NULL,
    outcome           TEXT NOT NULL,
    PRIMARY KEY (session_id, row_index)
);
";

pub struct SqliteSessionStore {
    path: PathBuf,
}

impl SqliteSessionStore {
    /// Opens (creating if necessary) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let store = SqliteSessionStore {
            path: path.as_ref().to_path_buf(),
        };
        store.conn()?.execute_batch(SCHEMA)?;
        Ok(store)
    }

    fn conn(&self) -> Result<Connection, StoreError> {
        Connection::open(&self.path).map_err(StoreError::from)
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Backend(format!("bad timestamp in store: {e}")))
}

fn parse_status(value: &str) -> Result<SessionStatus, StoreError> {
    SessionStatus::parse(value)
        .ok_or_else(|| StoreError::Backend(format!("unknown session status in store: {value}")))
}

fn read_session_header(conn: &Connection, id: &str) -> Result<UploadSession, StoreError> {
    conn.query_row(
        "SELECT id, source_file_name, checksum, account_id, total_rows,
                successful_count, failed_count, status, error_log,
                created_at, updated_at
         FROM upload_sessions WHERE id = ?1",
        params![id],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, i64>(6)?,
                row.get::<_, String>(7)?,
                row.get::<_, Option<String>>(8)?,
                row.get::<_, String>(9)?,
                row.get::<_, String>(10)?,
            ))
        },
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound(id.to_string()),
        other => StoreError::from(other),
    })
    .and_then(
        |(id, file, checksum, account, total, ok, failed, status, log, created, updated)| {
            Ok(UploadSession {
                id,
                source_file_name: file,
                checksum,
                account_id: account,
                total_rows: total as usize,
                successful_count: ok as usize,
                failed_count: failed as usize,
                status: parse_status(&status)?,
                error_log: log,
                created_at: parse_timestamp(&created)?,
                updated_at: parse_timestamp(&updated)?,
                rows: Vec::new(),
            })
        },
    )
}

fn read_rows(conn: &Connection, id: &str) -> Result<Vec<RowRecord>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT row_index, raw, normalized, validation_errors, is_valid, outcome
         FROM upload_rows WHERE session_id = ?1 ORDER BY row_index",
    )?;
    let rows = stmt.query_map(params![id], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, i64>(4)?,
            row.get::<_, String>(5)?,
        ))
    })?;

    let mut out = Vec::new();
    for row in rows {
        let (index, raw, normalized, errors, is_valid, outcome) = row?;
        out.push(RowRecord {
            row_index: index as usize,
            raw: serde_json::from_str(&raw)?,
            normalized: serde_json::from_str(&normalized)?,
            validation_errors: serde_json::from_str(&errors)?,
            is_valid: is_valid != 0,
            outcome: serde_json::from_str(&outcome)?,
        });
    }
    Ok(out)
}

impl SessionStore for SqliteSessionStore {
    fn create(&self, session: &UploadSession) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO upload_sessions
                 (id, source_file_name, checksum, account_id, total_rows,
                  successful_count, failed_count, status, error_log,
                  created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                session.id,
                session.source_file_name,
                session.checksum,
                session.account_id,
                session.total_rows as i64,
                session.successful_count as i64,
                session.failed_count as i64,
                session.status.as_str(),
                session.error_log,
                session.created_at.to_rfc3339(),
                session.updated_at.to_rfc3339(),
            ],
        )?;
        for row in &session.rows {
            tx.execute(
                "INSERT INTO upload_rows
                     (session_id, row_index, raw, normalized, validation_errors,
                      is_valid, outcome)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    session.id,
                    row.row_index as i64,
                    serde_json::to_string(&row.raw)?,
                    serde_json::to_string(&row.normalized)?,
                    serde_json::to_string(&row.validation_errors)?,
                    row.is_valid as i64,
                    serde_json::to_string(&row.outcome)?,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<UploadSession, StoreError> {
        let conn = self.conn()?;
        let mut session = read_session_header(&conn, id)?;
        session.rows = read_rows(&conn, id)?;
        Ok(session)
    }

    fn list(&self) -> Result<Vec<SessionSummary>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, source_file_name, total_rows, successful_count,
                    failed_count, status, created_at, updated_at
             FROM upload_sessions ORDER BY created_at DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, String>(7)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, file, total, ok, failed, status, created, updated) = row?;
            out.push(SessionSummary {
                id,
                source_file_name: file,
                total_rows: total as usize,
                successful_count: ok as usize,
                failed_count: failed as usize,
                status: parse_status(&status)?,
                created_at: parse_timestamp(&created)?,
                updated_at: parse_timestamp(&updated)?,
            });
        }
        Ok(out)
    }

    fn update_row_outcome(
        &self,
        id: &str,
        row_index: usize,
        outcome: &RowOutcome,
    ) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE upload_rows SET outcome = ?1
             WHERE session_id = ?2 AND row_index = ?3",
            params![serde_json::to_string(outcome)?, id, row_index as i64],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("{id}#{row_index}")));
        }
        Ok(())
    }

    fn update_counters(&self, id: &str, delta: CounterDelta) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE upload_sessions
             SET successful_count = successful_count + ?1,
                 failed_count = failed_count + ?2,
                 updated_at = ?3
             WHERE id = ?4",
            params![delta.successful, delta.failed, Utc::now().to_rfc3339(), id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn set_status(
        &self,
        id: &str,
        status: SessionStatus,
        note: Option<&str>,
    ) -> Result<bool, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let current: String = tx
            .query_row(
                "SELECT status FROM upload_sessions WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound(id.to_string()),
                other => StoreError::from(other),
            })?;
        if !parse_status(&current)?.can_transition_to(status) {
            return Ok(false);
        }
        match note {
            Some(note) => tx.execute(
                "UPDATE upload_sessions SET status = ?1, error_log = ?2, updated_at = ?3
                 WHERE id = ?4",
                params![status.as_str(), note, Utc::now().to_rfc3339(), id],
            )?,
            None => tx.execute(
                "UPDATE upload_sessions SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![status.as_str(), Utc::now().to_rfc3339(), id],
            )?,
        };
        tx.commit()?;
        Ok(true)
    }

    fn reset_failed_rows(&self, id: &str) -> Result<usize, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let failed: Vec<i64> = {
            let mut stmt = tx.prepare(
                "SELECT row_index, outcome FROM upload_rows WHERE session_id = ?1",
            )?;
            let rows = stmt.query_map(params![id], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })?;
            let mut failed = Vec::new();
            for row in rows {
                let (index, outcome) = row?;
                let outcome: RowOutcome = serde_json::from_str(&outcome)?;
                if outcome.is_failed() {
                    failed.push(index);
                }
            }
            failed
        };
        let pending = serde_json::to_string(&RowOutcome::Pending)?;
        for index in &failed {
            tx.execute(
                "UPDATE upload_rows SET outcome = ?1
                 WHERE session_id = ?2 AND row_index = ?3",
                params![pending, id, index],
            )?;
        }
        tx.commit()?;
        Ok(failed.len())
    }
}
