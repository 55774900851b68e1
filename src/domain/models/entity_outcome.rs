// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 处理失败的 URL 及原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedUrl {
    pub url: String,
    pub reason: String,
    /// 失败前经历过瞬时错误重试，稍后重跑可能成功
    #[serde(default)]
    pub transient: bool,
}

impl FailedUrl {
    pub fn new(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reason: reason.into(),
            transient: false,
        }
    }

    pub fn with_transient(mut self, transient: bool) -> Self {
        self.transient = transient;
        self
    }

    /// 日志中使用的失败类别
    pub fn kind(&self) -> &'static str {
        if self.transient {
            "transient"
        } else {
            "permanent"
        }
    }
}

/// 单个实体的运行结论
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum EntityRunStatus {
    /// 至少一个 URL 成功提取
    Succeeded,
    /// 搜索没有返回任何 URL
    NoResults,
    /// 搜索失败
    SearchFailed(String),
    /// 所有 URL 都处理失败
    AllUrlsFailed,
    /// worker 异常退出
    Crashed(String),
}

impl EntityRunStatus {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            EntityRunStatus::SearchFailed(_)
                | EntityRunStatus::AllUrlsFailed
                | EntityRunStatus::Crashed(_)
        )
    }
}

impl fmt::Display for EntityRunStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EntityRunStatus::Succeeded => write!(f, "succeeded"),
            EntityRunStatus::NoResults => write!(f, "no_results"),
            EntityRunStatus::SearchFailed(reason) => write!(f, "search_failed: {}", reason),
            EntityRunStatus::AllUrlsFailed => write!(f, "all_urls_failed"),
            EntityRunStatus::Crashed(reason) => write!(f, "crashed: {}", reason),
        }
    }
}

/// 单个实体的处理结果
///
/// 计数满足 `urls_processed == mentions_found() + urls_failed`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityOutcome {
    pub entity_id: i64,
    pub status: EntityRunStatus,
    pub urls_processed: u64,
    pub mentions_inserted: u64,
    pub duplicates: u64,
    pub urls_failed: u64,
    pub failed_urls: Vec<FailedUrl>,
    pub elapsed_ms: u64,
}

impl EntityOutcome {
    /// 创建空结果
    pub fn empty(entity_id: i64, status: EntityRunStatus) -> Self {
        Self {
            entity_id,
            status,
            urls_processed: 0,
            mentions_inserted: 0,
            duplicates: 0,
            urls_failed: 0,
            failed_urls: Vec::new(),
            elapsed_ms: 0,
        }
    }

    /// 找到的提及数，包括已存在的记录
    pub fn mentions_found(&self) -> u64 {
        self.mentions_inserted + self.duplicates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mentions_found_counts_duplicates() {
        let mut outcome = EntityOutcome::empty(7, EntityRunStatus::Succeeded);
        outcome.mentions_inserted = 2;
        outcome.duplicates = 1;
        assert_eq!(outcome.mentions_found(), 3);
    }

    #[test]
    fn test_failure_classification() {
        assert!(!EntityRunStatus::Succeeded.is_failure());
        assert!(!EntityRunStatus::NoResults.is_failure());
        assert!(EntityRunStatus::AllUrlsFailed.is_failure());
        assert!(EntityRunStatus::SearchFailed("quota".into()).is_failure());
        assert!(EntityRunStatus::Crashed("panic".into()).is_failure());
    }
}
