// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::entity_outcome::{EntityOutcome, EntityRunStatus};
use crate::domain::models::tracked_entity::TrackedEntity;
use crate::domain::repositories::entity_repository::EntityRepository;
use crate::domain::services::job_tracker::JobTracker;
use crate::workers::worker::EntityProcessor;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// 运行进度监听器
#[async_trait]
pub trait ProgressListener: Send + Sync {
    /// 某个实体的 worker 拿到并发许可并开始执行
    async fn on_worker_started(&self, entity_id: i64);

    /// 某个实体处理完毕，按完成顺序回调
    async fn on_outcome(&self, outcome: &EntityOutcome);
}

#[async_trait]
impl ProgressListener for JobTracker {
    async fn on_worker_started(&self, _entity_id: i64) {
        self.mark_running().await;
    }

    async fn on_outcome(&self, outcome: &EntityOutcome) {
        self.record_outcome(outcome).await;
    }
}

/// 不关心进度时使用的空监听器
pub struct NoopListener;

#[async_trait]
impl ProgressListener for NoopListener {
    async fn on_worker_started(&self, _entity_id: i64) {}

    async fn on_outcome(&self, _outcome: &EntityOutcome) {}
}

/// worker 编排器
///
/// 把实体切分为有序的超级批次，批次内最多 `concurrency` 个 worker 并行，
/// 上一批全部结束后才开始下一批
pub struct WorkerOrchestrator {
    processor: Arc<dyn EntityProcessor>,
    entities: Arc<dyn EntityRepository>,
}

impl WorkerOrchestrator {
    pub fn new(processor: Arc<dyn EntityProcessor>, entities: Arc<dyn EntityRepository>) -> Self {
        Self {
            processor,
            entities,
        }
    }

    /// 处理全部实体
    ///
    /// # 返回值
    ///
    /// 与输入一一对应、顺序相同的处理结果；异常退出的 worker 记为 `Crashed`
    pub async fn run(
        &self,
        entities: Vec<TrackedEntity>,
        concurrency: usize,
        super_batch_size: usize,
        listener: Arc<dyn ProgressListener>,
    ) -> Vec<EntityOutcome> {
        let total = entities.len();
        let concurrency = concurrency.max(1);
        let super_batch_size = super_batch_size.max(1);
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let mut outcomes: Vec<Option<EntityOutcome>> = vec![None; total];

        info!(
            total,
            concurrency,
            super_batch_size,
            processor = self.processor.name(),
            "starting workers"
        );

        for (batch_index, batch) in entities.chunks(super_batch_size).enumerate() {
            let base = batch_index * super_batch_size;
            let mut set = JoinSet::new();
            let mut tasks: HashMap<tokio::task::Id, (usize, i64)> = HashMap::with_capacity(batch.len());

            for (offset, entity) in batch.iter().cloned().enumerate() {
                let entity_id = entity.id;
                let semaphore = semaphore.clone();
                let processor = self.processor.clone();
                let listener = listener.clone();

                let handle = set.spawn(async move {
                    let _permit = semaphore.acquire_owned().await.ok();
                    listener.on_worker_started(entity.id).await;
                    processor.process(&entity).await
                });
                tasks.insert(handle.id(), (base + offset, entity_id));
            }

            while let Some(joined) = set.join_next_with_id().await {
                let (index, outcome) = match joined {
                    Ok((id, outcome)) => match tasks.get(&id) {
                        Some(&(index, _)) => (index, outcome),
                        None => continue,
                    },
                    Err(err) => {
                        let Some(&(index, entity_id)) = tasks.get(&err.id()) else {
                            continue;
                        };
                        error!(entity_id, error = %err, "worker crashed");
                        (
                            index,
                            EntityOutcome::empty(entity_id, EntityRunStatus::Crashed(err.to_string())),
                        )
                    }
                };

                listener.on_outcome(&outcome).await;
                if let Err(err) = self
                    .entities
                    .touch_last_scraped(outcome.entity_id, Utc::now().into())
                    .await
                {
                    warn!(entity_id = outcome.entity_id, error = %err, "failed to update last_scraped");
                }
                outcomes[index] = Some(outcome);
            }

            info!(
                batch = batch_index + 1,
                done = (base + batch.len()).min(total),
                total,
                "super-batch finished"
            );
        }

        outcomes
            .into_iter()
            .zip(entities.iter())
            .map(|(outcome, entity)| {
                outcome.unwrap_or_else(|| {
                    EntityOutcome::empty(
                        entity.id,
                        EntityRunStatus::Crashed("worker produced no outcome".into()),
                    )
                })
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
