use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use super::domain::{OutpassRequest, RequestId};

/// Storage abstraction so the engine depends on a capability rather than a concrete store.
///
/// `put` must replace a record atomically; readers never observe a half-written record.
/// `scan_all` returns records in insertion order, which callers rely on for stable sorting.
pub trait OutpassRepository: Send + Sync {
    fn fetch(&self, id: RequestId) -> Result<Option<OutpassRequest>, RepositoryError>;
    fn put(&self, record: OutpassRequest) -> Result<(), RepositoryError>;
    fn scan_all(&self) -> Result<Vec<OutpassRequest>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Process-local store keyed by request id; ids are sequential so key order is insertion order.
#[derive(Debug, Default, Clone)]
pub struct InMemoryOutpassRepository {
    records: Arc<RwLock<BTreeMap<RequestId, OutpassRequest>>>,
}

impl InMemoryOutpassRepository {
    pub fn len(&self) -> Result<usize, RepositoryError> {
        let guard = self.records.read().map_err(poisoned)?;
        Ok(guard.len())
    }

    pub fn is_empty(&self) -> Result<bool, RepositoryError> {
        Ok(self.len()? == 0)
    }
}

fn poisoned<T>(_: T) -> RepositoryError {
    RepositoryError::Unavailable("outpass store lock poisoned".to_string())
}

impl OutpassRepository for InMemoryOutpassRepository {
    fn fetch(&self, id: RequestId) -> Result<Option<OutpassRequest>, RepositoryError> {
        let guard = self.records.read().map_err(poisoned)?;
        Ok(guard.get(&id).cloned())
    }

    fn put(&self, record: OutpassRequest) -> Result<(), RepositoryError> {
        let mut guard = self.records.write().map_err(poisoned)?;
        guard.insert(record.id(), record);
        Ok(())
    }

    fn scan_all(&self) -> Result<Vec<OutpassRequest>, RepositoryError> {
        let guard = self.records.read().map_err(poisoned)?;
        Ok(guard.values().cloned().collect())
    }
}
