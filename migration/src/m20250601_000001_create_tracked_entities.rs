// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TrackedEntities::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TrackedEntities::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TrackedEntities::DisplayName).string().not_null())
                    .col(ColumnDef::new(TrackedEntities::LocaleHint).string().null())
                    .col(
                        ColumnDef::new(TrackedEntities::Status)
                            .string()
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(TrackedEntities::LastScraped)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tracked_entities_status")
                    .table(TrackedEntities::Table)
                    .col(TrackedEntities::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TrackedEntities::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TrackedEntities {
    Table,
    Id,
    DisplayName,
    LocaleHint,
    Status,
    LastScraped,
}
