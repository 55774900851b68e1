// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::mention::Mention;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;

/// 单行写入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// 新写入
    Inserted,
    /// `(entity_id, source_url)` 已存在
    Duplicate,
}

/// 提及记录仓库特质
///
/// 唯一约束 `(entity_id, source_url)` 是去重的最终依据，
/// 冲突行不会被视为错误
#[async_trait]
pub trait MentionRepository: Send + Sync {
    /// 检查存储是否可用
    async fn ping(&self) -> Result<(), RepositoryError>;

    /// 批量写入，冲突行被跳过
    ///
    /// # 返回值
    ///
    /// 实际新写入的行数
    async fn insert_batch(&self, mentions: &[Mention]) -> Result<u64, RepositoryError>;

    /// 写入单行
    async fn insert_one(&self, mention: &Mention) -> Result<InsertOutcome, RepositoryError>;

    /// 判断记录是否存在
    async fn exists(&self, entity_id: i64, source_url: &str) -> Result<bool, RepositoryError>;

    /// 统计实体的提及数量
    async fn count_for_entity(&self, entity_id: i64) -> Result<u64, RepositoryError>;
}
