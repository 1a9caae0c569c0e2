#![cfg(test)]
use std::sync::Arc;

use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

use crate::collections::{repo::seaorm::SeaOrmCollectionRepository, CollectionStore};

/// Fresh in-memory SQLite database with the schema applied.
pub async fn sqlite_db() -> Result<DatabaseConnection, anyhow::Error> {
    let db = Database::connect("sqlite::memory:").await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

pub async fn sqlite_store() -> Result<CollectionStore, anyhow::Error> {
    let db = sqlite_db().await?;
    Ok(CollectionStore::new(Arc::new(SeaOrmCollectionRepository { db })))
}
