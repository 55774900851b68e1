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
                    .table(ScrapeJobs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ScrapeJobs::JobId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ScrapeJobs::EntityId).big_integer().null())
                    .col(ColumnDef::new(ScrapeJobs::JobType).string().not_null())
                    .col(ColumnDef::new(ScrapeJobs::Status).string().not_null())
                    .col(
                        ColumnDef::new(ScrapeJobs::StartTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ScrapeJobs::EndTime)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ScrapeJobs::MentionsFound)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ScrapeJobs::UrlsProcessed)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ScrapeJobs::UrlsFailed)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(ScrapeJobs::ErrorMessage).text().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_scrape_jobs_status")
                    .table(ScrapeJobs::Table)
                    .col(ScrapeJobs::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ScrapeJobs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ScrapeJobs {
    Table,
    JobId,
    EntityId,
    JobType,
    Status,
    StartTime,
    EndTime,
    MentionsFound,
    UrlsProcessed,
    UrlsFailed,
    ErrorMessage,
}
