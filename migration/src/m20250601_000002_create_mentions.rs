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
                    .table(Mentions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Mentions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Mentions::EntityId).big_integer().not_null())
                    .col(ColumnDef::new(Mentions::SourceUrl).string_len(2048).not_null())
                    .col(ColumnDef::new(Mentions::CleanedText).text().not_null())
                    .col(ColumnDef::new(Mentions::Domain).string().not_null())
                    .col(
                        ColumnDef::new(Mentions::PublishedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Mentions::ExtractionConfidence).double().not_null())
                    .col(ColumnDef::new(Mentions::SentimentScore).double().null())
                    .col(ColumnDef::new(Mentions::KeywordTags).json().not_null())
                    .col(ColumnDef::new(Mentions::ContentLength).integer().not_null())
                    .col(ColumnDef::new(Mentions::ProcessingTimeMs).big_integer().not_null())
                    .col(
                        ColumnDef::new(Mentions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // (entity_id, source_url) is the dedup key for the whole pipeline
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_mentions_entity_source_url")
                    .table(Mentions::Table)
                    .col(Mentions::EntityId)
                    .col(Mentions::SourceUrl)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_mentions_created_at")
                    .table(Mentions::Table)
                    .col(Mentions::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Mentions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Mentions {
    Table,
    Id,
    EntityId,
    SourceUrl,
    CleanedText,
    Domain,
    PublishedAt,
    ExtractionConfidence,
    SentimentScore,
    KeywordTags,
    ContentLength,
    ProcessingTimeMs,
    CreatedAt,
}
