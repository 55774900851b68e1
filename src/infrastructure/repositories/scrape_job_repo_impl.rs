// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::models::scrape_job::{JobType, ScrapeJob};
use crate::domain::repositories::scrape_job_repository::ScrapeJobRepository;
use crate::infrastructure::database::entities::scrape_job as job_entity;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use std::sync::Arc;
use uuid::Uuid;

/// 采集任务仓库实现
#[derive(Clone)]
pub struct ScrapeJobRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl ScrapeJobRepositoryImpl {
    /// 创建新的采集任务仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn to_db_count(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl From<job_entity::Model> for ScrapeJob {
    fn from(model: job_entity::Model) -> Self {
        Self {
            job_id: model.job_id,
            entity_id: model.entity_id,
            job_type: model.job_type.parse().unwrap_or(JobType::Batch),
            status: model.status.parse().unwrap_or_default(),
            start_time: model.start_time,
            end_time: model.end_time,
            mentions_found: model.mentions_found.max(0) as u64,
            urls_processed: model.urls_processed.max(0) as u64,
            urls_failed: model.urls_failed.max(0) as u64,
            error_message: model.error_message,
        }
    }
}

impl From<&ScrapeJob> for job_entity::ActiveModel {
    fn from(job: &ScrapeJob) -> Self {
        Self {
            job_id: Set(job.job_id),
            entity_id: Set(job.entity_id),
            job_type: Set(job.job_type.to_string()),
            status: Set(job.status.to_string()),
            start_time: Set(job.start_time),
            end_time: Set(job.end_time),
            mentions_found: Set(to_db_count(job.mentions_found)),
            urls_processed: Set(to_db_count(job.urls_processed)),
            urls_failed: Set(to_db_count(job.urls_failed)),
            error_message: Set(job.error_message.clone()),
        }
    }
}

#[async_trait]
impl ScrapeJobRepository for ScrapeJobRepositoryImpl {
    async fn create(&self, job: &ScrapeJob) -> Result<(), RepositoryError> {
        let model: job_entity::ActiveModel = job.into();
        model.insert(self.db.as_ref()).await?;
        Ok(())
    }

    async fn update(&self, job: &ScrapeJob) -> Result<(), RepositoryError> {
        let model: job_entity::ActiveModel = job.into();
        model.update(self.db.as_ref()).await?;
        Ok(())
    }

    async fn find_by_id(&self, job_id: Uuid) -> Result<Option<ScrapeJob>, RepositoryError> {
        let model = job_entity::Entity::find_by_id(job_id)
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }
}
