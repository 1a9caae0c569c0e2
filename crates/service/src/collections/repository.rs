use async_trait::async_trait;

use crate::errors::ServiceError;

/// Persistence seam for collection rows. Values are raw JSON text; parsing is
/// left to [`crate::collections::store::CollectionStore`].
#[async_trait]
pub trait CollectionRepository: Send + Sync {
    async fn load(&self, name: &str) -> Result<Option<String>, ServiceError>;
    /// Upsert; replaces the whole document.
    async fn save(&self, name: &str, data: String) -> Result<(), ServiceError>;
    async fn insert_if_absent(&self, name: &str, data: String) -> Result<bool, ServiceError>;
    async fn delete(&self, name: &str) -> Result<bool, ServiceError>;
    async fn delete_all(&self) -> Result<u64, ServiceError>;
    async fn exists(&self, name: &str) -> Result<bool, ServiceError>;
    async fn names(&self) -> Result<Vec<String>, ServiceError>;
    async fn ping(&self) -> Result<(), ServiceError>;
}

/// In-memory repository for tests and database-less local runs.
pub mod mock {
    use super::*;
    use std::collections::BTreeMap;
    use tokio::sync::RwLock;

    #[derive(Default)]
    pub struct MemoryCollectionRepository {
        rows: RwLock<BTreeMap<String, String>>, // name -> raw JSON text
    }

    impl MemoryCollectionRepository {
        /// Store arbitrary text under `name`, bypassing any JSON handling.
        pub async fn put_raw(&self, name: &str, raw: &str) {
            self.rows.write().await.insert(name.to_string(), raw.to_string());
        }
    }

    #[async_trait]
    impl CollectionRepository for MemoryCollectionRepository {
        async fn load(&self, name: &str) -> Result<Option<String>, ServiceError> {
            Ok(self.rows.read().await.get(name).cloned())
        }

        async fn save(&self, name: &str, data: String) -> Result<(), ServiceError> {
            self.rows.write().await.insert(name.to_string(), data);
            Ok(())
        }

        async fn insert_if_absent(&self, name: &str, data: String) -> Result<bool, ServiceError> {
            let mut rows = self.rows.write().await;
            if rows.contains_key(name) {
                return Ok(false);
            }
            rows.insert(name.to_string(), data);
            Ok(true)
        }

        async fn delete(&self, name: &str) -> Result<bool, ServiceError> {
            Ok(self.rows.write().await.remove(name).is_some())
        }

        async fn delete_all(&self) -> Result<u64, ServiceError> {
            let mut rows = self.rows.write().await;
            let n = rows.len() as u64;
            rows.clear();
            Ok(n)
        }

        async fn exists(&self, name: &str) -> Result<bool, ServiceError> {
            Ok(self.rows.read().await.contains_key(name))
        }

        async fn names(&self) -> Result<Vec<String>, ServiceError> {
            Ok(self.rows.read().await.keys().cloned().collect())
        }

        async fn ping(&self) -> Result<(), ServiceError> {
            Ok(())
        }
    }
}
