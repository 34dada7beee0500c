//! Interaction log store for the chatbot backend.
//!
//! One table, one row per answered chat request. Rows are inserted and
//! deleted, never updated. Two backends implement [`LogStore`]:
//!
//! - [`SqliteLogStore`] for a local database file;
//! - [`RemoteLogStore`] for a remote libSQL database over HTTP.
//!
//! [`open_store`] picks one from [`LogStoreConfig`]; [`retention::sweep`]
//! implements age-based cleanup on top of any backend.

pub mod config;
pub mod errors;
pub mod record;
pub mod remote_store;
pub mod retention;
pub mod sqlite_store;

mod sql;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use config::{LogStoreConfig, StoreBackend};
pub use errors::StorageError;
pub use record::{InteractionLog, NewInteractionLog};
pub use remote_store::RemoteLogStore;
pub use sqlite_store::SqliteLogStore;

/// Operations issued against the interaction log table.
///
/// Each call is a single autocommitted statement; nothing is retried.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Creates the table if it does not exist. Safe on every start.
    async fn initialize(&self) -> errors::Result<()>;

    /// Writes one record under a freshly generated id and returns it.
    async fn insert(&self, record: NewInteractionLog) -> errors::Result<InteractionLog>;

    /// All records of a session, in no particular order.
    async fn query_by_session(&self, session_id: &str) -> errors::Result<Vec<InteractionLog>>;

    /// Deletes all records of a session and returns how many were removed.
    async fn delete_by_session(&self, session_id: &str) -> errors::Result<u64>;

    /// Deletes records with `date_processed < cutoff`; equal timestamps stay.
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> errors::Result<u64>;

    /// Number of distinct session ids in the table.
    async fn count_distinct_sessions(&self) -> errors::Result<u64>;

    /// Short backend label for logs.
    fn backend_name(&self) -> &'static str;
}

/// Builds the backend selected by `cfg.database_url`.
///
/// Does not touch the database; call [`LogStore::initialize`] afterwards.
pub fn open_store(cfg: &LogStoreConfig) -> errors::Result<Arc<dyn LogStore>> {
    cfg.validate()?;
    match cfg.backend()? {
        StoreBackend::Sqlite { path } => Ok(Arc::new(SqliteLogStore::new(path, &cfg.table))),
        StoreBackend::Remote { base_url } => {
            let token = cfg.auth_token.as_deref().ok_or_else(|| {
                StorageError::Config("TURSO_API_TOKEN is required for a remote DATABASE_URL".into())
            })?;
            Ok(Arc::new(RemoteLogStore::new(&base_url, token, &cfg.table)?))
        }
    }
}
