// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::entity_outcome::EntityOutcome;
use crate::domain::models::scrape_job::{JobStatus, ScrapeJob};
use serde::Serialize;

/// 采集运行报告
///
/// 包含终态的任务记录和每个实体的处理结果
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// 终态任务记录
    pub job: ScrapeJob,
    /// 按输入顺序排列的实体结果
    pub outcomes: Vec<EntityOutcome>,
}

impl RunReport {
    pub fn failed(&self) -> bool {
        self.job.status == JobStatus::Failed
    }

    /// 搜索或处理失败的实体数
    pub fn failed_entities(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.is_failure()).count()
    }

    /// 单行摘要，用于命令行输出
    pub fn summary(&self) -> String {
        let mut line = format!(
            "job {} {}: entities={} failed_entities={} mentions_found={} urls_processed={} urls_failed={}",
            self.job.job_id,
            self.job.status,
            self.outcomes.len(),
            self.failed_entities(),
            self.job.mentions_found,
            self.job.urls_processed,
            self.job.urls_failed,
        );
        if let Some(message) = &self.job.error_message {
            line.push_str(&format!(" error=\"{}\"", message));
        }
        line
    }
}
