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

use crate::domain::models::tracked_entity::{EntityStatus, TrackedEntity};
use crate::domain::repositories::entity_repository::EntityRepository;
use crate::infrastructure::database::entities::tracked_entity as entity_entity;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use sea_orm::{
    sea_query::Expr, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use std::sync::Arc;

/// 实体目录仓库实现
///
/// 基于SeaORM读取 `tracked_entities` 表
#[derive(Clone)]
pub struct EntityRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl EntityRepositoryImpl {
    /// 创建新的实体目录仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<entity_entity::Model> for TrackedEntity {
    fn from(model: entity_entity::Model) -> Self {
        Self {
            id: model.id,
            display_name: model.display_name,
            locale_hint: model.locale_hint.filter(|l| !l.trim().is_empty()),
            status: model.status.parse().unwrap_or(EntityStatus::Inactive),
            last_scraped: model.last_scraped,
        }
    }
}

#[async_trait]
impl EntityRepository for EntityRepositoryImpl {
    async fn list_active(&self, start_id: Option<i64>) -> Result<Vec<TrackedEntity>, RepositoryError> {
        let mut query = entity_entity::Entity::find()
            .filter(entity_entity::Column::Status.eq(EntityStatus::Active.to_string()));

        if let Some(start_id) = start_id {
            query = query.filter(entity_entity::Column::Id.gte(start_id));
        }

        let models = query
            .order_by_asc(entity_entity::Column::Id)
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<TrackedEntity>, RepositoryError> {
        let model = entity_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn touch_last_scraped(
        &self,
        id: i64,
        at: DateTime<FixedOffset>,
    ) -> Result<(), RepositoryError> {
        let result = entity_entity::Entity::update_many()
            .col_expr(entity_entity::Column::LastScraped, Expr::value(at))
            .filter(entity_entity::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
