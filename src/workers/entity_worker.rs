// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::IngestionSettings;
use crate::domain::models::entity_outcome::{EntityOutcome, EntityRunStatus, FailedUrl};
use crate::domain::models::tracked_entity::TrackedEntity;
use crate::domain::repositories::mention_repository::MentionRepository;
use crate::domain::services::dedup_writer::{DedupWriter, FlushStats};
use crate::domain::services::fetch_extractor::{FetchExtractor, UrlOutcome};
use crate::domain::services::query_dispatcher::QueryDispatcher;
use crate::workers::worker::EntityProcessor;
use async_trait::async_trait;
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

/// 实体 worker 的运行参数
#[derive(Debug, Clone)]
pub struct EntityWorkerConfig {
    /// 每个实体期望的搜索结果数
    pub results_per_entity: usize,
    /// 批量写入大小
    pub db_batch_size: usize,
    /// 相邻 URL 之间的间隔
    pub request_delay: Duration,
}

impl From<&IngestionSettings> for EntityWorkerConfig {
    fn from(settings: &IngestionSettings) -> Self {
        Self {
            results_per_entity: settings.results_per_entity,
            db_batch_size: settings.db_batch_size,
            request_delay: Duration::from_millis(settings.request_delay_ms),
        }
    }
}

/// 单实体采集 worker
///
/// 搜索 → 按搜索顺序逐个抓取提取 → 缓冲 → 刷写
pub struct EntityWorker {
    dispatcher: Arc<QueryDispatcher>,
    extractor: Arc<FetchExtractor>,
    mentions: Arc<dyn MentionRepository>,
    config: EntityWorkerConfig,
}

impl EntityWorker {
    pub fn new(
        dispatcher: Arc<QueryDispatcher>,
        extractor: Arc<FetchExtractor>,
        mentions: Arc<dyn MentionRepository>,
        config: EntityWorkerConfig,
    ) -> Self {
        Self {
            dispatcher,
            extractor,
            mentions,
            config,
        }
    }

    #[instrument(skip(self, entity), fields(entity_id = entity.id, name = %entity.display_name))]
    async fn run(&self, entity: &TrackedEntity) -> EntityOutcome {
        let urls = match self
            .dispatcher
            .search(entity, self.config.results_per_entity)
            .await
        {
            Ok(urls) => urls,
            Err(err) => {
                warn!(error = %err, "search failed");
                return EntityOutcome::empty(entity.id, EntityRunStatus::SearchFailed(err.to_string()));
            }
        };

        if urls.is_empty() {
            info!("search returned no results");
            return EntityOutcome::empty(entity.id, EntityRunStatus::NoResults);
        }

        let mut writer = DedupWriter::new(self.mentions.clone(), self.config.db_batch_size);
        let mut written = FlushStats::default();
        let mut fetch_failures: Vec<FailedUrl> = Vec::new();
        let mut processed = 0u64;

        for (index, url) in urls.iter().enumerate() {
            if index > 0 && !self.config.request_delay.is_zero() {
                tokio::time::sleep(self.config.request_delay).await;
            }
            processed += 1;

            match self.extractor.process(url).await {
                UrlOutcome::Extracted(candidate) => {
                    if writer.buffer(candidate.into_mention(entity.id)) {
                        written.merge(writer.flush().await);
                    }
                }
                UrlOutcome::Failed(failure) => {
                    fetch_failures
                        .push(FailedUrl::new(failure.url, failure.reason).with_transient(failure.transient));
                }
            }
        }
        written.merge(writer.flush().await);

        let mut failed_urls = fetch_failures;
        failed_urls.extend(written.failed_urls);
        let urls_failed = failed_urls.len() as u64;

        let status = if written.inserted + written.duplicates == 0 {
            EntityRunStatus::AllUrlsFailed
        } else {
            EntityRunStatus::Succeeded
        };

        counter!("urls_failed_total").increment(urls_failed);
        info!(
            processed,
            inserted = written.inserted,
            duplicates = written.duplicates,
            failed = urls_failed,
            "entity finished"
        );

        EntityOutcome {
            entity_id: entity.id,
            status,
            urls_processed: processed,
            mentions_inserted: written.inserted,
            duplicates: written.duplicates,
            urls_failed,
            failed_urls,
            elapsed_ms: 0,
        }
    }
}

#[async_trait]
impl EntityProcessor for EntityWorker {
    async fn process(&self, entity: &TrackedEntity) -> EntityOutcome {
        let started = Instant::now();
        let mut outcome = self.run(entity).await;
        let elapsed = started.elapsed();
        outcome.elapsed_ms = elapsed.as_millis() as u64;
        histogram!("entity_duration_seconds").record(elapsed.as_secs_f64());
        outcome
    }

    fn name(&self) -> &str {
        "entity_worker"
    }
}
