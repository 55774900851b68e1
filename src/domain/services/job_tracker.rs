// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::entity_outcome::EntityOutcome;
use crate::domain::models::scrape_job::{JobStatus, ScrapeJob};
use crate::domain::repositories::scrape_job_repository::ScrapeJobRepository;
use crate::utils::errors::{DomainError, RepositoryError};
use crate::utils::retry_policy::RetryPolicy;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// 采集任务跟踪器
///
/// 持有一次运行的任务记录，负责状态推进和持久化。进度写入是尽力而为的，
/// 终态写入按重试策略重试；存储始终不可用时内存中的任务仍然是权威结果。
pub struct JobTracker {
    repo: Arc<dyn ScrapeJobRepository>,
    job: Mutex<ScrapeJob>,
    /// 串行化写入，每次写入都取持锁时的最新状态
    writes: tokio::sync::Mutex<()>,
    persisted: AtomicBool,
    retry: RetryPolicy,
}

impl JobTracker {
    pub fn new(repo: Arc<dyn ScrapeJobRepository>, job: ScrapeJob, retry: RetryPolicy) -> Self {
        Self {
            repo,
            job: Mutex::new(job),
            writes: tokio::sync::Mutex::new(()),
            persisted: AtomicBool::new(false),
            retry,
        }
    }

    pub fn job_id(&self) -> Uuid {
        self.job.lock().job_id
    }

    /// 当前任务状态的副本
    pub fn snapshot(&self) -> ScrapeJob {
        self.job.lock().clone()
    }

    /// 写入初始的 Pending 记录
    pub async fn create(&self) -> Result<(), RepositoryError> {
        self.save().await
    }

    /// 第一个 worker 启动时进入 Running，重复调用无副作用
    pub async fn mark_running(&self) {
        let started = {
            let mut guard = self.job.lock();
            if guard.status != JobStatus::Pending {
                return;
            }
            match guard.clone().start() {
                Ok(job) => {
                    *guard = job.clone();
                    job
                }
                Err(err) => {
                    warn!(error = %err, "cannot start job");
                    return;
                }
            }
        };

        info!(job_id = %started.job_id, job_type = %started.job_type, "job running");
        self.save_best_effort().await;
    }

    /// 累加一个实体的处理结果并写入进度
    pub async fn record_outcome(&self, outcome: &EntityOutcome) {
        self.mark_running().await;

        {
            let mut guard = self.job.lock();
            if let Err(err) = guard.record_progress(
                outcome.mentions_found(),
                outcome.urls_processed,
                outcome.urls_failed,
            ) {
                warn!(entity_id = outcome.entity_id, error = %err, "progress dropped");
                return;
            }
        }

        self.save_best_effort().await;
    }

    /// 完成任务
    ///
    /// 没有任何 worker 启动过的空运行会先进入 Running 再完成
    pub async fn complete(&self) -> ScrapeJob {
        self.mark_running().await;
        self.finish(|job| job.complete()).await
    }

    /// 标记任务失败，Pending 与 Running 均可
    pub async fn fail(&self, message: impl Into<String>) -> ScrapeJob {
        let message = message.into();
        self.finish(move |job| job.fail(message)).await
    }

    async fn finish<F>(&self, transition: F) -> ScrapeJob
    where
        F: FnOnce(ScrapeJob) -> Result<ScrapeJob, DomainError>,
    {
        let finished = {
            let mut guard = self.job.lock();
            match transition(guard.clone()) {
                Ok(job) => {
                    *guard = job.clone();
                    job
                }
                Err(err) => {
                    warn!(job_id = %guard.job_id, error = %err, "job already finished");
                    return guard.clone();
                }
            }
        };

        info!(
            job_id = %finished.job_id,
            status = %finished.status,
            mentions_found = finished.mentions_found,
            urls_processed = finished.urls_processed,
            urls_failed = finished.urls_failed,
            "job finished"
        );
        self.save_terminal().await;
        finished
    }

    /// 写入当前最新状态
    ///
    /// 写入按顺序执行，存储中的计数不会回退
    async fn save(&self) -> Result<(), RepositoryError> {
        let _write = self.writes.lock().await;
        let job = self.snapshot();
        if self.persisted.load(Ordering::Acquire) {
            self.repo.update(&job).await
        } else {
            self.repo.create(&job).await?;
            self.persisted.store(true, Ordering::Release);
            Ok(())
        }
    }

    async fn save_best_effort(&self) {
        if let Err(err) = self.save().await {
            warn!(job_id = %self.job_id(), error = %err, "failed to persist job progress");
        }
    }

    async fn save_terminal(&self) {
        let mut retries = 0;
        loop {
            match self.save().await {
                Ok(()) => return,
                Err(err) if self.retry.should_retry(retries) => {
                    retries += 1;
                    let delay = self.retry.calculate_backoff(retries);
                    warn!(job_id = %self.job_id(), attempt = retries, ?delay, error = %err, "retrying final job write");
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    let job = self.snapshot();
                    error!(job_id = %job.job_id, status = %job.status, error = %err, "final job state was not persisted");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "job_tracker_test.rs"]
mod tests;
