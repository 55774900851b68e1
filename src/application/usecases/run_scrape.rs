// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::run_report::RunReport;
use crate::domain::models::scrape_job::ScrapeJob;
use crate::domain::models::tracked_entity::TrackedEntity;
use crate::domain::repositories::entity_repository::EntityRepository;
use crate::domain::repositories::mention_repository::MentionRepository;
use crate::domain::repositories::scrape_job_repository::ScrapeJobRepository;
use crate::domain::services::credential_pool::CredentialPool;
use crate::domain::services::job_tracker::JobTracker;
use crate::utils::retry_policy::RetryPolicy;
use crate::workers::orchestrator::WorkerOrchestrator;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument, warn};

/// 导致整次运行失败的错误
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RunError {
    #[error("no search credentials configured")]
    NoCredentials,
    #[error("every search credential has exhausted its quota")]
    QuotaExhausted,
    #[error("mention store unreachable: {0}")]
    StoreUnreachable(String),
    #[error("entity catalog unreadable: {0}")]
    Catalog(String),
    #[error("entity {0} not found")]
    EntityNotFound(i64),
}

/// 并发参数
#[derive(Debug, Clone, Copy)]
pub struct RunLimits {
    pub concurrency: usize,
    pub super_batch_size: usize,
}

/// 采集运行用例
///
/// 创建任务记录、执行预检、驱动编排器并保证任务最终进入终态
pub struct ScrapeRunner {
    entities: Arc<dyn EntityRepository>,
    mentions: Arc<dyn MentionRepository>,
    jobs: Arc<dyn ScrapeJobRepository>,
    pool: Arc<CredentialPool>,
    orchestrator: WorkerOrchestrator,
    limits: RunLimits,
    retry: RetryPolicy,
}

impl ScrapeRunner {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        entities: Arc<dyn EntityRepository>,
        mentions: Arc<dyn MentionRepository>,
        jobs: Arc<dyn ScrapeJobRepository>,
        pool: Arc<CredentialPool>,
        orchestrator: WorkerOrchestrator,
        limits: RunLimits,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            entities,
            mentions,
            jobs,
            pool,
            orchestrator,
            limits,
            retry,
        }
    }

    /// 批量采集全部活跃实体，可从 `start_id` 继续
    #[instrument(skip(self))]
    pub async fn run_batch(&self, start_id: Option<i64>) -> RunReport {
        let tracker = self.open_job(ScrapeJob::new_batch()).await;
        if let Err(err) = self.preflight().await {
            return Self::abort(&tracker, err).await;
        }

        let entities = match self.entities.list_active(start_id).await {
            Ok(entities) => entities,
            Err(err) => return Self::abort(&tracker, RunError::Catalog(err.to_string())).await,
        };

        info!(count = entities.len(), ?start_id, "loaded active entities");
        self.drive(tracker, entities).await
    }

    /// 采集单个实体
    #[instrument(skip(self))]
    pub async fn run_single(&self, entity_id: i64) -> RunReport {
        let tracker = self.open_job(ScrapeJob::new_single(entity_id)).await;
        if let Err(err) = self.preflight().await {
            return Self::abort(&tracker, err).await;
        }

        let entity = match self.entities.find_by_id(entity_id).await {
            Ok(Some(entity)) => entity,
            Ok(None) => return Self::abort(&tracker, RunError::EntityNotFound(entity_id)).await,
            Err(err) => return Self::abort(&tracker, RunError::Catalog(err.to_string())).await,
        };

        if !entity.is_active() {
            warn!(entity_id, "entity is inactive, scraping on explicit request");
        }
        self.drive(tracker, vec![entity]).await
    }

    /// 凭证与存储的预检
    pub async fn preflight(&self) -> Result<(), RunError> {
        if self.pool.is_empty() {
            return Err(RunError::NoCredentials);
        }
        if !self.pool.has_available() {
            return Err(RunError::QuotaExhausted);
        }
        self.mentions
            .ping()
            .await
            .map_err(|e| RunError::StoreUnreachable(e.to_string()))
    }

    async fn open_job(&self, job: ScrapeJob) -> Arc<JobTracker> {
        let tracker = Arc::new(JobTracker::new(self.jobs.clone(), job, self.retry.clone()));
        if let Err(err) = tracker.create().await {
            warn!(job_id = %tracker.job_id(), error = %err, "job record not created");
        }
        tracker
    }

    async fn abort(tracker: &JobTracker, err: RunError) -> RunReport {
        warn!(job_id = %tracker.job_id(), error = %err, "run aborted");
        RunReport {
            job: tracker.fail(err.to_string()).await,
            outcomes: Vec::new(),
        }
    }

    async fn drive(&self, tracker: Arc<JobTracker>, entities: Vec<TrackedEntity>) -> RunReport {
        let outcomes = self
            .orchestrator
            .run(
                entities,
                self.limits.concurrency,
                self.limits.super_batch_size,
                tracker.clone(),
            )
            .await;

        RunReport {
            job: tracker.complete().await,
            outcomes,
        }
    }
}

/// 把运行中失败的 URL 追加到日志文件
///
/// # 返回值
///
/// 写入的 URL 条数；没有失败时不会创建文件
pub async fn write_failed_urls(path: &Path, report: &RunReport) -> std::io::Result<usize> {
    let lines: Vec<String> = report
        .outcomes
        .iter()
        .flat_map(|outcome| {
            outcome
                .failed_urls
                .iter()
                .map(move |f| {
                    format!(
                        "{}\t{}\t{}\t{}",
                        outcome.entity_id,
                        f.url,
                        f.kind(),
                        f.reason.replace('\n', " ")
                    )
                })
        })
        .collect();

    if lines.is_empty() {
        return Ok(0);
    }

    let mut block = format!("# job {} at {}\n", report.job.job_id, Utc::now().to_rfc3339());
    for line in &lines {
        block.push_str(line);
        block.push('\n');
    }

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(block.as_bytes()).await?;
    file.flush().await?;

    Ok(lines.len())
}
