// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::DomainError;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 提及记录
///
/// 一条记录对应一个实体与一个外部来源 URL 的关联。
/// `(entity_id, source_url)` 全局唯一，记录只会被创建一次，不会被更新或删除。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    /// 记录 ID
    pub id: Uuid,
    /// 实体 ID
    pub entity_id: i64,
    /// 来源 URL
    pub source_url: String,
    /// 清洗后的正文
    pub cleaned_text: String,
    /// 来源域名
    pub domain: String,
    /// 发布时间
    pub published_at: Option<DateTime<FixedOffset>>,
    /// 提取置信度，取值 [0, 1]
    pub extraction_confidence: f64,
    /// 情感分值，取值 [-1, 1]，由外部提供
    pub sentiment_score: Option<f64>,
    /// 关键词标签（无重复）
    pub keyword_tags: Vec<String>,
    /// 正文字符数
    pub content_length: i32,
    /// 抓取与提取耗时（毫秒）
    pub processing_time_ms: i64,
    /// 创建时间
    pub created_at: DateTime<FixedOffset>,
}

/// 提取结果
///
/// 由 FetchExtractor 产出，尚未绑定实体
#[derive(Debug, Clone, PartialEq)]
pub struct MentionCandidate {
    pub source_url: String,
    pub cleaned_text: String,
    pub domain: String,
    pub published_at: Option<DateTime<FixedOffset>>,
    pub extraction_confidence: f64,
    pub keyword_tags: Vec<String>,
    pub processing_time_ms: u64,
}

impl MentionCandidate {
    /// 绑定实体，生成待写入的提及记录
    pub fn into_mention(self, entity_id: i64) -> Mention {
        let mut tags: Vec<String> = Vec::with_capacity(self.keyword_tags.len());
        for tag in self.keyword_tags {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }

        let content_length = i32::try_from(self.cleaned_text.chars().count()).unwrap_or(i32::MAX);

        Mention {
            id: Uuid::new_v4(),
            entity_id,
            source_url: self.source_url,
            cleaned_text: self.cleaned_text,
            domain: self.domain,
            published_at: self.published_at,
            extraction_confidence: self.extraction_confidence,
            sentiment_score: None,
            keyword_tags: tags,
            content_length,
            processing_time_ms: i64::try_from(self.processing_time_ms).unwrap_or(i64::MAX),
            created_at: Utc::now().into(),
        }
    }
}

impl Mention {
    /// 附加外部提供的情感分值
    ///
    /// # 返回值
    ///
    /// * `Ok(Mention)` - 分值位于 [-1, 1]
    /// * `Err(DomainError)` - 分值越界或非有限数
    pub fn with_sentiment(mut self, score: f64) -> Result<Self, DomainError> {
        if !score.is_finite() || !(-1.0..=1.0).contains(&score) {
            return Err(DomainError::ValidationError(format!(
                "sentiment_score {} outside [-1, 1]",
                score
            )));
        }
        self.sentiment_score = Some(score);
        Ok(self)
    }

    /// 校验写入前必须满足的不变量
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.source_url.trim().is_empty() {
            return Err(DomainError::ValidationError("source_url is empty".into()));
        }
        if self.cleaned_text.is_empty() {
            return Err(DomainError::ValidationError("cleaned_text is empty".into()));
        }
        let confidence = self.extraction_confidence;
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(DomainError::ValidationError(format!(
                "extraction_confidence {} outside [0, 1]",
                confidence
            )));
        }
        if let Some(score) = self.sentiment_score {
            if !score.is_finite() || !(-1.0..=1.0).contains(&score) {
                return Err(DomainError::ValidationError(format!(
                    "sentiment_score {} outside [-1, 1]",
                    score
                )));
            }
        }
        if self.content_length < 0 || self.processing_time_ms < 0 {
            return Err(DomainError::ValidationError("negative length or duration".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> MentionCandidate {
        MentionCandidate {
            source_url: "https://example.com/a".to_string(),
            cleaned_text: "新闻 text".to_string(),
            domain: "example.com".to_string(),
            published_at: None,
            extraction_confidence: 0.85,
            keyword_tags: vec!["新闻".into(), "text".into(), "新闻".into()],
            processing_time_ms: 42,
        }
    }

    #[test]
    fn test_into_mention_counts_chars_and_dedups_tags() {
        let mention = candidate().into_mention(7);
        assert_eq!(mention.entity_id, 7);
        assert_eq!(mention.content_length, 7);
        assert_eq!(mention.keyword_tags, vec!["新闻".to_string(), "text".to_string()]);
        assert!(mention.sentiment_score.is_none());
        assert!(mention.validate().is_ok());
    }

    #[test]
    fn test_confidence_out_of_range_is_invalid() {
        let mut mention = candidate().into_mention(1);
        mention.extraction_confidence = 1.2;
        assert!(mention.validate().is_err());
        mention.extraction_confidence = f64::NAN;
        assert!(mention.validate().is_err());
    }

    #[test]
    fn test_with_sentiment_bounds() {
        let mention = candidate().into_mention(1);
        assert!(mention.clone().with_sentiment(-1.0).is_ok());
        assert!(mention.clone().with_sentiment(1.5).is_err());

        let mut forced = mention;
        forced.sentiment_score = Some(-3.0);
        assert!(forced.validate().is_err());
    }
}
