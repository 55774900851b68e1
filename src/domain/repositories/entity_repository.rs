// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::tracked_entity::TrackedEntity;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};

/// 实体目录仓库特质
///
/// 目录由外部流程维护，这里只暴露读取和 `last_scraped` 更新
#[async_trait]
pub trait EntityRepository: Send + Sync {
    /// 按 ID 升序列出活跃实体，可从 `start_id`（含）开始
    async fn list_active(&self, start_id: Option<i64>) -> Result<Vec<TrackedEntity>, RepositoryError>;
    /// 根据ID查找实体
    async fn find_by_id(&self, id: i64) -> Result<Option<TrackedEntity>, RepositoryError>;
    /// 记录最近一次采集时间
    async fn touch_last_scraped(
        &self,
        id: i64,
        at: DateTime<FixedOffset>,
    ) -> Result<(), RepositoryError>;
}
