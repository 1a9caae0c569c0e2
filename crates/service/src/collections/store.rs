use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use super::repository::{mock::MemoryCollectionRepository, CollectionRepository};
use crate::errors::ServiceError;

/// JSON-aware key/value store over a [`CollectionRepository`].
///
/// Writes replace the whole document; concurrent writers race and the last
/// one wins.
///
/// # Examples
/// ```
/// use service::collections::CollectionStore;
/// use serde_json::json;
/// let store = CollectionStore::in_memory();
/// tokio_test::block_on(store.set("members", &json!([{"id": 1}]))).unwrap();
/// let got = tokio_test::block_on(store.get("members")).unwrap();
/// assert_eq!(got, Some(json!([{"id": 1}])));
/// ```
#[derive(Clone)]
pub struct CollectionStore {
    repo: Arc<dyn CollectionRepository>,
}

impl CollectionStore {
    pub fn new(repo: Arc<dyn CollectionRepository>) -> Self {
        Self { repo }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCollectionRepository::default()))
    }

    /// Stored value, or `None` when absent. Text that fails to parse is
    /// logged and reported as absent.
    pub async fn get(&self, key: &str) -> Result<Option<Value>, ServiceError> {
        let Some(raw) = self.repo.load(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(v) => Ok(Some(v)),
            Err(e) => {
                warn!(collection = %key, err = %e, "stored collection is not valid JSON; treating as empty");
                Ok(None)
            }
        }
    }

    /// Like [`get`](Self::get) but falls back to `[]`.
    pub async fn get_or_empty(&self, key: &str) -> Result<Value, ServiceError> {
        Ok(self.get(key).await?.unwrap_or_else(empty_document))
    }

    /// Array view of a collection; anything that is not an array reads as empty.
    pub async fn get_array(&self, key: &str) -> Result<Vec<Value>, ServiceError> {
        match self.get(key).await? {
            Some(Value::Array(items)) => Ok(items),
            Some(_) => {
                warn!(collection = %key, "expected an array; treating as empty");
                Ok(Vec::new())
            }
            None => Ok(Vec::new()),
        }
    }

    pub async fn set(&self, key: &str, value: &Value) -> Result<(), ServiceError> {
        let text = serde_json::to_string(value)?;
        self.repo.save(key, text).await
    }

    pub async fn seed(&self, key: &str, value: &Value) -> Result<bool, ServiceError> {
        let text = serde_json::to_string(value)?;
        self.repo.insert_if_absent(key, text).await
    }

    pub async fn remove(&self, key: &str) -> Result<bool, ServiceError> {
        self.repo.delete(key).await
    }

    /// Delete every row.
    pub async fn clear(&self) -> Result<u64, ServiceError> {
        self.repo.delete_all().await
    }

    pub async fn exists(&self, key: &str) -> Result<bool, ServiceError> {
        self.repo.exists(key).await
    }

    pub async fn list_keys(&self) -> Result<Vec<String>, ServiceError> {
        self.repo.names().await
    }

    pub async fn ping(&self) -> Result<(), ServiceError> {
        self.repo.ping().await
    }
}

pub fn empty_document() -> Value {
    Value::Array(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn set_get_round_trip() -> Result<(), anyhow::Error> {
        let store = CollectionStore::in_memory();
        let doc = json!([{"id": "m1", "name": "Wang", "balance": 120.5, "tags": ["vip"]}]);
        store.set("members", &doc).await?;
        assert_eq!(store.get("members").await?, Some(doc));
        assert!(store.exists("members").await?);
        Ok(())
    }

    #[tokio::test]
    async fn unparseable_row_reads_as_null() -> Result<(), anyhow::Error> {
        let repo = Arc::new(MemoryCollectionRepository::default());
        repo.put_raw("members", "{not json").await;
        let store = CollectionStore::new(repo);
        assert_eq!(store.get("members").await?, None);
        assert_eq!(store.get_or_empty("members").await?, json!([]));
        assert!(store.get_array("members").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn object_is_not_an_array() -> Result<(), anyhow::Error> {
        let store = CollectionStore::in_memory();
        store.set("settings", &json!({"shopName": "Blue Spa"})).await?;
        assert!(store.get_array("settings").await?.is_empty());
        assert_eq!(store.get_or_empty("settings").await?, json!({"shopName": "Blue Spa"}));
        Ok(())
    }

    #[tokio::test]
    async fn remove_clear_and_list_keys() -> Result<(), anyhow::Error> {
        let store = CollectionStore::in_memory();
        store.set("staff", &json!([])).await?;
        store.set("cards", &json!([])).await?;
        assert_eq!(store.list_keys().await?, vec!["cards".to_string(), "staff".to_string()]);

        assert!(store.remove("cards").await?);
        assert!(!store.remove("cards").await?);
        assert_eq!(store.get("cards").await?, None);

        assert_eq!(store.clear().await?, 1);
        assert!(store.list_keys().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn seed_does_not_overwrite() -> Result<(), anyhow::Error> {
        let store = CollectionStore::in_memory();
        store.set("members", &json!([{"id": 1}])).await?;
        assert!(!store.seed("members", &empty_document()).await?);
        assert!(store.seed("cards", &empty_document()).await?);
        assert_eq!(store.get("members").await?, Some(json!([{"id": 1}])));
        Ok(())
    }
}
