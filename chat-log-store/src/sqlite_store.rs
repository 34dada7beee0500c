//! Local SQLite backend.
//!
//! Every operation opens its own connection on the blocking pool and runs a
//! single autocommitted statement, so no connection is shared between
//! requests.

use std::{path::PathBuf, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, params};
use tracing::{debug, info};

use crate::{
    LogStore,
    errors::{Result, StorageError},
    record::{InteractionLog, NewInteractionLog, decode_timestamp, encode_timestamp, new_id},
    sql::Statements,
};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Log store backed by a SQLite database file.
#[derive(Clone, Debug)]
pub struct SqliteLogStore {
    path: PathBuf,
    stmts: Arc<Statements>,
}

impl SqliteLogStore {
    /// `table` must be a validated identifier (see [`crate::LogStoreConfig::validate`]).
    pub fn new(path: impl Into<PathBuf>, table: &str) -> Self {
        Self {
            path: path.into(),
            stmts: Arc::new(Statements::for_table(table)),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection, &Statements) -> Result<T> + Send + 'static,
    {
        let path = self.path.clone();
        let stmts = Arc::clone(&self.stmts);
        tokio::task::spawn_blocking(move || {
            let conn = Connection::open(&path)?;
            conn.busy_timeout(BUSY_TIMEOUT)?;
            f(&conn, &stmts)
        })
        .await?
    }
}

/// Column values as stored, before timestamp decoding.
struct RawRow {
    id: String,
    session_id: String,
    total_tokens: i64,
    prompt_tokens: i64,
    completion_tokens: i64,
    total_cost_usd: f64,
    user_question: String,
    llm_answer: String,
    date_processed: String,
}

impl RawRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            session_id: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            total_tokens: row.get::<_, Option<i64>>(2)?.unwrap_or_default(),
            prompt_tokens: row.get::<_, Option<i64>>(3)?.unwrap_or_default(),
            completion_tokens: row.get::<_, Option<i64>>(4)?.unwrap_or_default(),
            total_cost_usd: row.get::<_, Option<f64>>(5)?.unwrap_or_default(),
            user_question: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
            llm_answer: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
            date_processed: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
        })
    }

    fn into_record(self) -> Result<InteractionLog> {
        Ok(InteractionLog {
            date_processed: decode_timestamp(&self.date_processed)?,
            id: self.id,
            session_id: self.session_id,
            total_tokens: self.total_tokens,
            prompt_tokens: self.prompt_tokens,
            completion_tokens: self.completion_tokens,
            total_cost_usd: self.total_cost_usd,
            user_question: self.user_question,
            llm_answer: self.llm_answer,
        })
    }
}

#[async_trait]
impl LogStore for SqliteLogStore {
    async fn initialize(&self) -> Result<()> {
        self.with_conn(|conn, s| {
            conn.execute(&s.create_table, [])?;
            Ok(())
        })
        .await?;
        info!(path = %self.path.display(), "sqlite log table ready");
        Ok(())
    }

    async fn insert(&self, record: NewInteractionLog) -> Result<InteractionLog> {
        let stored = record.with_id(new_id());
        let row = stored.clone();
        self.with_conn(move |conn, s| {
            conn.execute(
                &s.insert,
                params![
                    row.id,
                    row.session_id,
                    row.total_tokens,
                    row.prompt_tokens,
                    row.completion_tokens,
                    row.total_cost_usd,
                    row.user_question,
                    row.llm_answer,
                    encode_timestamp(&row.date_processed),
                ],
            )?;
            Ok(())
        })
        .await?;
        debug!(id = %stored.id, session_id = %stored.session_id, "log row inserted");
        Ok(stored)
    }

    async fn query_by_session(&self, session_id: &str) -> Result<Vec<InteractionLog>> {
        let sid = session_id.to_string();
        let raw = self
            .with_conn(move |conn, s| {
                let mut stmt = conn.prepare(&s.select_by_session)?;
                let rows = stmt
                    .query_map(params![sid], RawRow::from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(rows)
            })
            .await?;
        raw.into_iter().map(RawRow::into_record).collect()
    }

    async fn delete_by_session(&self, session_id: &str) -> Result<u64> {
        let sid = session_id.to_string();
        self.with_conn(move |conn, s| Ok(conn.execute(&s.delete_by_session, params![sid])? as u64))
            .await
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let cutoff = encode_timestamp(&cutoff);
        self.with_conn(move |conn, s| {
            Ok(conn.execute(&s.delete_older_than, params![cutoff])? as u64)
        })
        .await
    }

    async fn count_distinct_sessions(&self) -> Result<u64> {
        self.with_conn(|conn, s| {
            let n: i64 = conn.query_row(&s.count_sessions, [], |r| r.get(0))?;
            u64::try_from(n).map_err(|_| StorageError::Decode(format!("negative count {n}")))
        })
        .await
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
