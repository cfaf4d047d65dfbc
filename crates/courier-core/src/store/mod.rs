//! Message store.
//!
//! The pipeline records what it sends through the [`Store`] trait. A SQLite
//! implementation is provided; MMS persistence goes through an ordered chain
//! of [`PersistenceStrategy`] implementations so a failing primary insert
//! falls back to a plainer manual one.

mod model;
mod repository;
mod strategy;

use async_trait::async_trait;

pub use model::{
    Folder, LogicalMessage, OutboxRecord, RecordKind, SendRecord, SendStatus, StatusChange,
    StoreLocation,
};
pub use repository::SqliteStore;
pub use strategy::{
    Fallback, ManualInsertion, PersistenceChain, PersistenceStrategy, Persisted, PrimaryPersister,
};

use crate::Result;

/// Persistent message store.
#[async_trait]
pub trait Store: Send + Sync {
    /// Inserts an SMS into the outbox with status `Queued`.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    async fn insert_outbox_record(&self, record: &OutboxRecord) -> Result<StoreLocation>;

    /// Returns the thread for a set of recipients, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if `addresses` is empty or the query fails.
    async fn resolve_thread_id(&self, addresses: &[String]) -> Result<i64>;

    /// Persists a complete MMS, header, parts and addresses, atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if any insert fails; nothing is stored in that case.
    async fn persist_logical_message(&self, message: &LogicalMessage) -> Result<StoreLocation>;

    /// Inserts an MMS row by row: header, image and text parts, addresses.
    ///
    /// # Errors
    ///
    /// Returns an error if an insert fails.
    async fn insert_manual_fallback(&self, message: &LogicalMessage) -> Result<StoreLocation>;

    /// Applies `change` if the record is still in `change.from`.
    ///
    /// Returns whether the record was updated.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    async fn move_to_folder(&self, location: StoreLocation, change: &StatusChange) -> Result<bool>;

    /// Looks up a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row is corrupt.
    async fn record(&self, location: StoreLocation) -> Result<Option<SendRecord>>;
}
