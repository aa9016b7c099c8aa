//! Transaction storage abstraction.
//!
//! The registry of transaction records is the single source of truth for
//! status. It is injected into the orchestrator behind [`TransactionStore`]
//! so the volatile in-memory registry can be replaced by a durable backend
//! without touching the state machine.

mod memory;

pub use memory::InMemoryStore;

use async_trait::async_trait;

use crate::{error::Result, model::Transaction};

/// A mutation applied to one transaction record under the store's per-id
/// lock.
pub type Mutation = Box<dyn FnOnce(&mut Transaction) + Send>;

/// Keyed storage of transaction records.
///
/// # Implementor contract
///
/// - `update` and `claim_side_effects` MUST be atomic per transaction id:
///   two concurrent calls for the same id observe each other's effects, never
///   an interleaved partial state. This is where the purchase path and a
///   racing webhook are serialized.
/// - Reads of an evicted or never-created id return `Ok(None)`.
/// - Records are never deleted by this crate; eviction policy belongs to the
///   backend.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Inserts a freshly created record.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend cannot persist the record.
    async fn create(&self, transaction: Transaction) -> Result<()>;

    /// Fetches a record by id.
    ///
    /// # Errors
    ///
    /// Returns an error only for backend failures; an unknown id is
    /// `Ok(None)`.
    async fn get(&self, id: &str) -> Result<Option<Transaction>>;

    /// Applies `mutation` to the record under the per-id lock and returns
    /// the record as stored afterwards, or `None` for an unknown id.
    ///
    /// # Errors
    ///
    /// Returns an error only for backend failures.
    async fn update(&self, id: &str, mutation: Mutation) -> Result<Option<Transaction>>;

    /// Atomically claims the approval side-effect slot.
    ///
    /// Returns `Some(true)` when this call flipped `side_effects_run` from
    /// false to true, `Some(false)` when the slot was already claimed, and
    /// `None` for an unknown id. At most one caller ever receives
    /// `Some(true)` for a given id.
    ///
    /// # Errors
    ///
    /// Returns an error only for backend failures.
    async fn claim_side_effects(&self, id: &str) -> Result<Option<bool>>;
}
