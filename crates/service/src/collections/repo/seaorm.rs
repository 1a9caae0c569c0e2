use sea_orm::DatabaseConnection;

use crate::collections::repository::CollectionRepository;
use crate::errors::ServiceError;
use models::collection;

pub struct SeaOrmCollectionRepository {
    pub db: DatabaseConnection,
}

#[async_trait::async_trait]
impl CollectionRepository for SeaOrmCollectionRepository {
    async fn load(&self, name: &str) -> Result<Option<String>, ServiceError> {
        let row = collection::find(&self.db, name).await?;
        Ok(row.map(|m| m.data))
    }

    async fn save(&self, name: &str, data: String) -> Result<(), ServiceError> {
        collection::upsert(&self.db, name, data).await?;
        Ok(())
    }

    async fn insert_if_absent(&self, name: &str, data: String) -> Result<bool, ServiceError> {
        Ok(collection::insert_if_absent(&self.db, name, data).await?)
    }

    async fn delete(&self, name: &str) -> Result<bool, ServiceError> {
        Ok(collection::delete(&self.db, name).await?)
    }

    async fn delete_all(&self) -> Result<u64, ServiceError> {
        Ok(collection::delete_all(&self.db).await?)
    }

    async fn exists(&self, name: &str) -> Result<bool, ServiceError> {
        Ok(collection::exists(&self.db, name).await?)
    }

    async fn names(&self) -> Result<Vec<String>, ServiceError> {
        Ok(collection::list_names(&self.db).await?)
    }

    async fn ping(&self) -> Result<(), ServiceError> {
        self.db.ping().await.map_err(|e| ServiceError::Db(e.to_string()))
    }
}
