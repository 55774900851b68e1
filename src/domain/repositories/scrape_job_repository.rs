// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::scrape_job::ScrapeJob;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use uuid::Uuid;

/// 采集任务仓库特质
#[async_trait]
pub trait ScrapeJobRepository: Send + Sync {
    /// 创建任务记录
    async fn create(&self, job: &ScrapeJob) -> Result<(), RepositoryError>;
    /// 覆盖更新任务记录
    async fn update(&self, job: &ScrapeJob) -> Result<(), RepositoryError>;
    /// 根据ID查找任务
    async fn find_by_id(&self, job_id: Uuid) -> Result<Option<ScrapeJob>, RepositoryError>;
}
