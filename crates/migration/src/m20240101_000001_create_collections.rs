//! Create the `collections` table.
//!
//! One row per registered collection name; `data` holds the JSON document as text.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Collections::Table)
                    .if_not_exists()
                    .col(string_len(Collections::Name, 64).primary_key())
                    .col(text(Collections::Data).not_null())
                    .col(timestamp_with_time_zone(Collections::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Collections::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Collections { Table, Name, Data, UpdatedAt }
