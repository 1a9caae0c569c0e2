//! Append-only operation log kept in the `operationLogs` collection.
//!
//! New entries go to the front. There is no retention policy; the list grows
//! without bound.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::collections::{registry::OPERATION_LOGS, CollectionStore};
use crate::errors::ServiceError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: String,
    pub operator: String,
    pub action: String,
    pub module: String,
    pub details: String,
    pub timestamp: String,
}

#[derive(Clone)]
pub struct OperationLog {
    store: CollectionStore,
}

impl OperationLog {
    pub fn new(store: CollectionStore) -> Self { Self { store } }

    /// Prepend an entry. Read-modify-write without locking: concurrent appends
    /// may drop one another.
    pub async fn append(&self, operator: &str, action: &str, module: &str, details: &str) -> Result<LogEntry, ServiceError> {
        let entry = LogEntry {
            id: Uuid::new_v4().to_string(),
            operator: operator.to_string(),
            action: action.to_string(),
            module: module.to_string(),
            details: details.to_string(),
            timestamp: Utc::now().to_rfc3339(),
        };
        let mut entries = self.store.get_array(OPERATION_LOGS).await?;
        entries.insert(0, serde_json::to_value(&entry)?);
        self.store.set(OPERATION_LOGS, &Value::Array(entries)).await?;
        debug!(action = %entry.action, module = %entry.module, operator = %entry.operator, "operation logged");
        Ok(entry)
    }

    /// Entries newest first; elements that do not look like log entries are skipped.
    pub async fn entries(&self) -> Result<Vec<LogEntry>, ServiceError> {
        let raw = self.store.get_array(OPERATION_LOGS).await?;
        Ok(raw.into_iter().filter_map(|v| serde_json::from_value(v).ok()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn append_prepends() -> Result<(), anyhow::Error> {
        let store = CollectionStore::in_memory();
        let log = OperationLog::new(store.clone());
        log.append("admin", "login", "auth", "first").await?;
        log.append("admin", "logout", "auth", "second").await?;

        let entries = log.entries().await?;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].details, "second");
        assert_eq!(entries[1].details, "first");
        assert_ne!(entries[0].id, entries[1].id);
        Ok(())
    }

    #[tokio::test]
    async fn keeps_foreign_entries() -> Result<(), anyhow::Error> {
        let store = CollectionStore::in_memory();
        store.set(OPERATION_LOGS, &json!([{"id": 9, "note": "written by the console"}])).await?;
        let log = OperationLog::new(store.clone());
        log.append("li", "create", "members", "added member").await?;

        let raw = store.get_array(OPERATION_LOGS).await?;
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[1], json!({"id": 9, "note": "written by the console"}));
        assert_eq!(raw[0]["operator"], "li");
        Ok(())
    }

    #[tokio::test]
    async fn non_array_log_restarts() -> Result<(), anyhow::Error> {
        let store = CollectionStore::in_memory();
        store.set(OPERATION_LOGS, &json!({"broken": true})).await?;
        OperationLog::new(store.clone()).append("a", "b", "c", "d").await?;
        assert_eq!(store.get_array(OPERATION_LOGS).await?.len(), 1);
        Ok(())
    }
}
