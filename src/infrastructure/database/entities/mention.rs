// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "mentions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub entity_id: i64,
    pub source_url: String,
    #[sea_orm(column_type = "Text")]
    pub cleaned_text: String,
    pub domain: String,
    pub published_at: Option<ChronoDateTimeWithTimeZone>,
    #[sea_orm(column_type = "Double")]
    pub extraction_confidence: f64,
    #[sea_orm(column_type = "Double", nullable)]
    pub sentiment_score: Option<f64>,
    pub keyword_tags: Json,
    pub content_length: i32,
    pub processing_time_ms: i64,
    pub created_at: ChronoDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
