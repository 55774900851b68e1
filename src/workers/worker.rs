// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::entity_outcome::EntityOutcome;
use crate::domain::models::tracked_entity::TrackedEntity;
use async_trait::async_trait;

/// 实体处理器 trait 定义
///
/// 编排器为每个实体调用一次；所有失败都以 `EntityOutcome` 的形式返回
#[async_trait]
pub trait EntityProcessor: Send + Sync {
    /// 处理单个实体
    async fn process(&self, entity: &TrackedEntity) -> EntityOutcome;

    /// 获取处理器名称
    fn name(&self) -> &str;
}
