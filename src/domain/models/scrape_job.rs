// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::DomainError;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 采集任务记录
///
/// 描述一次采集运行（单实体或批量）的生命周期。状态只会向前推进：
/// Pending → Running → Completed/Failed，或在预检失败时 Pending → Failed。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeJob {
    /// 任务 ID
    pub job_id: Uuid,
    /// 单实体任务对应的实体 ID，批量任务为空
    pub entity_id: Option<i64>,
    /// 任务类型
    pub job_type: JobType,
    /// 任务状态
    pub status: JobStatus,
    /// 创建时间
    pub start_time: DateTime<FixedOffset>,
    /// 结束时间，仅终态设置
    pub end_time: Option<DateTime<FixedOffset>>,
    /// 找到的提及数（新写入与已存在的之和）
    pub mentions_found: u64,
    /// 已处理的 URL 数
    pub urls_processed: u64,
    /// 失败的 URL 数
    pub urls_failed: u64,
    /// 失败原因，仅 Failed 状态设置
    pub error_message: Option<String>,
}

/// 任务类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    /// 单实体
    Single,
    /// 全量批处理
    Batch,
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobType::Single => write!(f, "single"),
            JobType::Batch => write!(f, "batch"),
        }
    }
}

impl FromStr for JobType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(JobType::Single),
            "batch" => Ok(JobType::Batch),
            _ => Err(()),
        }
    }
}

/// 任务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for JobStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "running" => Ok(JobStatus::Running),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            _ => Err(()),
        }
    }
}

impl JobStatus {
    /// 是否为终态
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

fn transition_error(from: JobStatus, to: JobStatus) -> DomainError {
    DomainError::InvalidStateTransition {
        from: from.to_string(),
        to: to.to_string(),
    }
}

impl ScrapeJob {
    fn new(job_type: JobType, entity_id: Option<i64>) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            entity_id,
            job_type,
            status: JobStatus::Pending,
            start_time: Utc::now().into(),
            end_time: None,
            mentions_found: 0,
            urls_processed: 0,
            urls_failed: 0,
            error_message: None,
        }
    }

    /// 创建批量任务
    pub fn new_batch() -> Self {
        Self::new(JobType::Batch, None)
    }

    /// 创建单实体任务
    pub fn new_single(entity_id: i64) -> Self {
        Self::new(JobType::Single, Some(entity_id))
    }

    /// 开始执行
    ///
    /// 将任务状态从 Pending 变更为 Running
    ///
    /// # 返回值
    ///
    /// * `Ok(ScrapeJob)` - 已开始的任务
    /// * `Err(DomainError)` - 状态转换失败
    pub fn start(mut self) -> Result<Self, DomainError> {
        match self.status {
            JobStatus::Pending => {
                self.status = JobStatus::Running;
                Ok(self)
            }
            other => Err(transition_error(other, JobStatus::Running)),
        }
    }

    /// 累加进度计数，仅 Running 状态允许
    pub fn record_progress(
        &mut self,
        mentions_found: u64,
        urls_processed: u64,
        urls_failed: u64,
    ) -> Result<(), DomainError> {
        if self.status != JobStatus::Running {
            return Err(transition_error(self.status, JobStatus::Running));
        }
        self.mentions_found += mentions_found;
        self.urls_processed += urls_processed;
        self.urls_failed += urls_failed;
        Ok(())
    }

    /// 完成任务
    ///
    /// 将任务状态从 Running 变更为 Completed
    pub fn complete(mut self) -> Result<Self, DomainError> {
        match self.status {
            JobStatus::Running => {
                self.status = JobStatus::Completed;
                self.end_time = Some(Utc::now().into());
                Ok(self)
            }
            other => Err(transition_error(other, JobStatus::Completed)),
        }
    }

    /// 标记任务失败
    ///
    /// Pending 与 Running 均可进入 Failed，错误信息不会为空
    pub fn fail(mut self, message: impl Into<String>) -> Result<Self, DomainError> {
        match self.status {
            JobStatus::Pending | JobStatus::Running => {
                let message = message.into();
                self.status = JobStatus::Failed;
                self.end_time = Some(Utc::now().into());
                self.error_message = Some(if message.trim().is_empty() {
                    "unknown error".to_string()
                } else {
                    message
                });
                Ok(self)
            }
            other => Err(transition_error(other, JobStatus::Failed)),
        }
    }
}
