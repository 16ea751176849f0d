use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use deebee_store::Store;
use serde::{Deserialize, Serialize};

use crate::collection::Collection;
use crate::error::DbError;
use crate::id::IdGenerator;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Documents indexed per write batch while `create_index` backfills.
    pub index_build_batch_size: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            index_build_batch_size: 256,
        }
    }
}

pub(crate) struct Shared<S: Store> {
    pub(crate) store: S,
    pub(crate) config: DatabaseConfig,
    pub(crate) ids: IdGenerator,
    /// One write gate per collection name, shared by every handle to it.
    gates: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S: Store> Shared<S> {
    fn gate(&self, collection: &str) -> Result<Arc<Mutex<()>>, DbError> {
        let mut gates = self
            .gates
            .lock()
            .map_err(|_| DbError::GatePoisoned(collection.to_string()))?;
        Ok(Arc::clone(gates.entry(collection.to_string()).or_default()))
    }
}

/// Named collections over one ordered store.
///
/// Cloning is cheap; clones share the store and the collection write gates.
pub struct Database<S: Store> {
    shared: Arc<Shared<S>>,
}

impl<S: Store> Database<S> {
    pub fn open(store: S, config: DatabaseConfig) -> Self {
        tracing::debug!(?config, "opened database");
        Self {
            shared: Arc::new(Shared {
                store,
                config,
                ids: IdGenerator::new(),
                gates: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Handle to the collection called `name`. Collections exist implicitly.
    pub fn collection(&self, name: &str) -> Result<Collection<S>, DbError> {
        if name.is_empty() || name.contains('\0') {
            return Err(DbError::InvalidCollectionName(name.to_string()));
        }
        let gate = self.shared.gate(name)?;
        Ok(Collection::new(Arc::clone(&self.shared), name, gate))
    }

    pub fn store(&self) -> &S {
        &self.shared.store
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.shared.config
    }
}

impl<S: Store> Clone for Database<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}
