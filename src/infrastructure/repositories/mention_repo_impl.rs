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

use crate::domain::models::mention::Mention;
use crate::domain::repositories::mention_repository::{InsertOutcome, MentionRepository};
use crate::infrastructure::database::entities::mention as mention_entity;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use sea_orm::{
    sea_query::OnConflict, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, Set, SqlErr,
};
use std::sync::Arc;

/// 提及记录仓库实现
///
/// 写入使用 `ON CONFLICT (entity_id, source_url) DO NOTHING`，
/// 冲突行只会体现为受影响行数减少
#[derive(Clone)]
pub struct MentionRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl MentionRepositoryImpl {
    /// 创建新的提及记录仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    fn on_conflict() -> OnConflict {
        OnConflict::columns([
            mention_entity::Column::EntityId,
            mention_entity::Column::SourceUrl,
        ])
        .do_nothing()
        .to_owned()
    }
}

impl From<&Mention> for mention_entity::ActiveModel {
    fn from(mention: &Mention) -> Self {
        Self {
            id: Set(mention.id),
            entity_id: Set(mention.entity_id),
            source_url: Set(mention.source_url.clone()),
            cleaned_text: Set(mention.cleaned_text.clone()),
            domain: Set(mention.domain.clone()),
            published_at: Set(mention.published_at),
            extraction_confidence: Set(mention.extraction_confidence),
            sentiment_score: Set(mention.sentiment_score),
            keyword_tags: Set(serde_json::json!(mention.keyword_tags)),
            content_length: Set(mention.content_length),
            processing_time_ms: Set(mention.processing_time_ms),
            created_at: Set(mention.created_at),
        }
    }
}

impl From<mention_entity::Model> for Mention {
    fn from(model: mention_entity::Model) -> Self {
        Self {
            id: model.id,
            entity_id: model.entity_id,
            source_url: model.source_url,
            cleaned_text: model.cleaned_text,
            domain: model.domain,
            published_at: model.published_at,
            extraction_confidence: model.extraction_confidence,
            sentiment_score: model.sentiment_score,
            keyword_tags: serde_json::from_value(model.keyword_tags).unwrap_or_default(),
            content_length: model.content_length,
            processing_time_ms: model.processing_time_ms,
            created_at: model.created_at,
        }
    }
}

#[async_trait]
impl MentionRepository for MentionRepositoryImpl {
    async fn ping(&self) -> Result<(), RepositoryError> {
        self.db.ping().await?;
        Ok(())
    }

    async fn insert_batch(&self, mentions: &[Mention]) -> Result<u64, RepositoryError> {
        if mentions.is_empty() {
            return Ok(0);
        }

        let models: Vec<mention_entity::ActiveModel> = mentions.iter().map(Into::into).collect();
        let inserted = mention_entity::Entity::insert_many(models)
            .on_conflict(Self::on_conflict())
            .exec_without_returning(self.db.as_ref())
            .await?;

        Ok(inserted)
    }

    async fn insert_one(&self, mention: &Mention) -> Result<InsertOutcome, RepositoryError> {
        let model: mention_entity::ActiveModel = mention.into();
        let result = mention_entity::Entity::insert(model)
            .on_conflict(Self::on_conflict())
            .exec_without_returning(self.db.as_ref())
            .await;

        match result {
            Ok(0) => Ok(InsertOutcome::Duplicate),
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Ok(InsertOutcome::Duplicate)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn exists(&self, entity_id: i64, source_url: &str) -> Result<bool, RepositoryError> {
        let count = mention_entity::Entity::find()
            .filter(mention_entity::Column::EntityId.eq(entity_id))
            .filter(mention_entity::Column::SourceUrl.eq(source_url))
            .count(self.db.as_ref())
            .await?;

        Ok(count > 0)
    }

    async fn count_for_entity(&self, entity_id: i64) -> Result<u64, RepositoryError> {
        let count = mention_entity::Entity::find()
            .filter(mention_entity::Column::EntityId.eq(entity_id))
            .count(self.db.as_ref())
            .await?;

        Ok(count)
    }
}
