//! In-memory transaction registry.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::{
    error::Result,
    model::Transaction,
    store::{Mutation, TransactionStore},
};

/// Process-lifetime transaction registry backed by a concurrent map.
///
/// The map's per-entry locking provides the per-id atomicity the
/// [`TransactionStore`] contract requires: `update` and
/// `claim_side_effects` hold the entry lock for the duration of the
/// read-modify-write.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: DashMap<String, Transaction>,
}

impl InMemoryStore {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for InMemoryStore {
    async fn create(&self, transaction: Transaction) -> Result<()> {
        self.records.insert(transaction.id.clone(), transaction);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Transaction>> {
        Ok(self.records.get(id).map(|entry| entry.value().clone()))
    }

    async fn update(&self, id: &str, mutation: Mutation) -> Result<Option<Transaction>> {
        Ok(self.records.get_mut(id).map(|mut entry| {
            mutation(entry.value_mut());
            entry.value().clone()
        }))
    }

    async fn claim_side_effects(&self, id: &str) -> Result<Option<bool>> {
        Ok(self.records.get_mut(id).map(|mut entry| {
            let record = entry.value_mut();
            if record.side_effects_run {
                false
            } else {
                record.side_effects_run = true;
                true
            }
        }))
    }
}
