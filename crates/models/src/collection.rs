use sea_orm::{entity::prelude::*, sea_query::OnConflict, QueryOrder, QuerySelect, Set};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// One named JSON document. `data` is stored as text and parsed by the caller.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "collections")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub data: String,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn validate_name(name: &str) -> Result<(), ModelError> {
    if name.trim().is_empty() { return Err(ModelError::Validation("collection name required".into())); }
    if name.len() > 64 { return Err(ModelError::Validation("collection name too long (<=64)".into())); }
    Ok(())
}

pub async fn find<C: ConnectionTrait>(db: &C, name: &str) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find_by_id(name.to_string()).one(db).await?)
}

/// Insert or wholesale-replace the row for `name`.
pub async fn upsert<C: ConnectionTrait>(db: &C, name: &str, data: String) -> Result<(), ModelError> {
    validate_name(name)?;
    let am = ActiveModel {
        name: Set(name.to_string()),
        data: Set(data),
        updated_at: Set(Utc::now().into()),
    };
    Entity::insert(am)
        .on_conflict(
            OnConflict::column(Column::Name)
                .update_columns([Column::Data, Column::UpdatedAt])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    Ok(())
}

/// Insert `data` only when no row exists yet; returns whether a row was created.
pub async fn insert_if_absent<C: ConnectionTrait>(db: &C, name: &str, data: String) -> Result<bool, ModelError> {
    validate_name(name)?;
    let am = ActiveModel {
        name: Set(name.to_string()),
        data: Set(data),
        updated_at: Set(Utc::now().into()),
    };
    let inserted = Entity::insert(am)
        .on_conflict(OnConflict::column(Column::Name).do_nothing().to_owned())
        .exec_without_returning(db)
        .await?;
    Ok(inserted > 0)
}

pub async fn delete<C: ConnectionTrait>(db: &C, name: &str) -> Result<bool, ModelError> {
    let res = Entity::delete_by_id(name.to_string()).exec(db).await?;
    Ok(res.rows_affected > 0)
}

pub async fn delete_all<C: ConnectionTrait>(db: &C) -> Result<u64, ModelError> {
    let res = Entity::delete_many().exec(db).await?;
    Ok(res.rows_affected)
}

pub async fn exists<C: ConnectionTrait>(db: &C, name: &str) -> Result<bool, ModelError> {
    let n = Entity::find_by_id(name.to_string()).count(db).await?;
    Ok(n > 0)
}

pub async fn list_names<C: ConnectionTrait>(db: &C) -> Result<Vec<String>, ModelError> {
    let names = Entity::find()
        .select_only()
        .column(Column::Name)
        .order_by_asc(Column::Name)
        .into_tuple::<String>()
        .all(db)
        .await?;
    Ok(names)
}
