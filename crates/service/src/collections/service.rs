use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, instrument, warn};

use super::registry::{ensure_registered, is_registered, REGISTERED_COLLECTIONS};
use super::store::{empty_document, CollectionStore};
use crate::errors::ServiceError;

/// Outcome of an import: which names were written and which were passed over.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ImportReport {
    pub imported: Vec<String>,
    pub skipped: Vec<String>,
}

/// Collections must hold an array or a plain object.
pub fn validate_document(data: &Value) -> Result<(), ServiceError> {
    match data {
        Value::Array(_) | Value::Object(_) => Ok(()),
        _ => Err(ServiceError::Validation("data must be an array or object".into())),
    }
}

/// Request-level operations over the registered collections.
#[derive(Clone)]
pub struct CollectionService {
    store: CollectionStore,
}

impl CollectionService {
    pub fn new(store: CollectionStore) -> Self { Self { store } }

    pub fn store(&self) -> &CollectionStore { &self.store }

    /// Every registered collection with its current value (`[]` when missing).
    #[instrument(skip(self))]
    pub async fn bootstrap(&self) -> Result<BTreeMap<String, Value>, ServiceError> {
        let mut out = BTreeMap::new();
        for name in REGISTERED_COLLECTIONS {
            out.insert(name.to_string(), self.store.get_or_empty(name).await?);
        }
        Ok(out)
    }

    pub async fn read(&self, name: &str) -> Result<Value, ServiceError> {
        let name = ensure_registered(name)?;
        self.store.get_or_empty(name).await
    }

    /// Wholesale overwrite. Invalid payloads leave the stored value untouched.
    #[instrument(skip(self, data))]
    pub async fn write(&self, name: &str, data: &Value) -> Result<(), ServiceError> {
        let name = ensure_registered(name)?;
        validate_document(data)?;
        self.store.set(name, data).await?;
        info!(collection = %name, "collection written");
        Ok(())
    }

    /// Soft clear: the row stays, its value becomes `[]`.
    #[instrument(skip(self))]
    pub async fn delete(&self, name: &str) -> Result<(), ServiceError> {
        let name = ensure_registered(name)?;
        self.store.set(name, &empty_document()).await?;
        info!(collection = %name, "collection cleared");
        Ok(())
    }

    /// Overwrite each registered entry in turn. Unregistered names and
    /// payloads that are neither array nor object are skipped. A failure
    /// midway leaves earlier entries written.
    #[instrument(skip(self, collections), fields(count = collections.len()))]
    pub async fn import(&self, collections: &Map<String, Value>) -> Result<ImportReport, ServiceError> {
        let mut report = ImportReport::default();
        for (name, data) in collections {
            if !is_registered(name) {
                report.skipped.push(name.clone());
                continue;
            }
            if validate_document(data).is_err() {
                warn!(collection = %name, "import entry is neither array nor object; skipped");
                report.skipped.push(name.clone());
                continue;
            }
            self.store.set(name, data).await?;
            report.imported.push(name.clone());
        }
        info!(imported = report.imported.len(), skipped = report.skipped.len(), "import finished");
        Ok(report)
    }

    /// Reset every registered collection to `[]`.
    #[instrument(skip(self))]
    pub async fn clear_all(&self) -> Result<usize, ServiceError> {
        for name in REGISTERED_COLLECTIONS {
            self.store.set(name, &empty_document()).await?;
        }
        info!(count = REGISTERED_COLLECTIONS.len(), "all collections cleared");
        Ok(REGISTERED_COLLECTIONS.len())
    }

    /// Create `[]` rows for registered names that have none yet.
    pub async fn seed(&self) -> Result<usize, ServiceError> {
        let mut created = 0;
        for name in REGISTERED_COLLECTIONS {
            if self.store.seed(name, &empty_document()).await? {
                created += 1;
            }
        }
        if created > 0 {
            info!(created, "seeded empty collections");
        }
        Ok(created)
    }
}
