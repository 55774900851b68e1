// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::tracked_entity::TrackedEntity;
use crate::domain::search::engine::{PageRequest, SearchProvider, SearchQuery};
use crate::domain::services::credential_pool::CredentialPool;
use crate::utils::retry_policy::RetryPolicy;
use crate::utils::url_utils::is_fetchable;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use metrics::counter;
use std::collections::HashSet;
use std::num::NonZeroU32;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// 单个实体的搜索失败
///
/// 只影响当前实体，不会传播到其他实体
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SearchFailed {
    /// 凭证池没有剩余配额
    #[error("search quota exhausted")]
    QuotaExhausted,
    /// 所有可用凭证都被限流或拒绝
    #[error("every credential was rejected, last error: {0}")]
    CredentialsExhausted(String),
    /// 瞬时错误重试次数耗尽
    #[error("search failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
    /// 请求无效
    #[error("invalid search request: {0}")]
    Invalid(String),
}

/// 搜索调度器
///
/// 通过凭证池为单个实体发起搜索：瞬时错误按退避策略重试，
/// 限流与鉴权错误换用其他凭证，分页直到凑够期望的结果数
pub struct QueryDispatcher {
    provider: Arc<dyn SearchProvider>,
    pool: Arc<CredentialPool>,
    retry: RetryPolicy,
    limiter: Option<DefaultDirectRateLimiter>,
}

impl QueryDispatcher {
    pub fn new(provider: Arc<dyn SearchProvider>, pool: Arc<CredentialPool>, retry: RetryPolicy) -> Self {
        Self {
            provider,
            pool,
            retry,
            limiter: None,
        }
    }

    /// 限制所有 worker 合计的每秒请求数
    pub fn with_rate_limit(mut self, queries_per_second: u32) -> Self {
        self.limiter = NonZeroU32::new(queries_per_second)
            .map(|qps| RateLimiter::direct(Quota::per_second(qps)));
        self
    }

    /// 为实体搜索候选 URL
    ///
    /// # 参数
    ///
    /// * `entity` - 目标实体
    /// * `desired_count` - 期望的结果数
    ///
    /// # 返回值
    ///
    /// * `Ok(Vec<String>)` - 去重后的 URL，保持搜索返回顺序
    /// * `Err(SearchFailed)` - 第一页就失败时返回；后续页失败保留已得结果
    #[instrument(skip(self, entity), fields(entity_id = entity.id, provider = self.provider.name()))]
    pub async fn search(
        &self,
        entity: &TrackedEntity,
        desired_count: usize,
    ) -> Result<Vec<String>, SearchFailed> {
        let query = SearchQuery {
            text: entity.display_name.trim().to_string(),
            locale: entity.locale_hint.clone().filter(|l| !l.trim().is_empty()),
        };
        if query.text.is_empty() {
            return Err(SearchFailed::Invalid("entity has an empty display name".into()));
        }

        let per_call = self.provider.max_results_per_call().max(1);
        let max_pages = desired_count.div_ceil(per_call);
        let mut urls: Vec<String> = Vec::with_capacity(desired_count);
        let mut seen: HashSet<String> = HashSet::new();
        let mut offset = 0usize;
        let mut pages = 0usize;

        while urls.len() < desired_count && pages < max_pages {
            pages += 1;
            let count = (desired_count - urls.len()).min(per_call);
            let page = PageRequest { offset, count };

            match self.fetch_page(&query, page).await {
                Ok(results) => {
                    let received = results.len();
                    let before = urls.len();
                    for url in results {
                        let url = url.trim().to_string();
                        if is_fetchable(&url) && seen.insert(url.clone()) {
                            urls.push(url);
                        }
                    }
                    if received < count || urls.len() == before {
                        break;
                    }
                    offset += received;
                }
                Err(err) if offset == 0 => {
                    counter!("search_entities_failed_total").increment(1);
                    return Err(err);
                }
                Err(err) => {
                    warn!(offset, collected = urls.len(), error = %err, "later search page failed, keeping partial results");
                    break;
                }
            }
        }

        urls.truncate(desired_count);
        debug!(count = urls.len(), "search finished");
        Ok(urls)
    }

    /// 取一页结果，内部处理重试与凭证轮换
    async fn fetch_page(&self, query: &SearchQuery, page: PageRequest) -> Result<Vec<String>, SearchFailed> {
        let mut excluded: HashSet<String> = HashSet::new();
        let mut last_rejection = String::new();
        let mut retries = 0u32;

        loop {
            let credential = match self.pool.acquire_excluding(&excluded) {
                Ok(credential) => credential,
                Err(_) if excluded.is_empty() => {
                    counter!("search_requests_total", "outcome" => "quota_exhausted").increment(1);
                    return Err(SearchFailed::QuotaExhausted);
                }
                Err(_) => return Err(SearchFailed::CredentialsExhausted(last_rejection)),
            };

            if let Some(limiter) = &self.limiter {
                limiter.until_ready().await;
            }

            match self.provider.search(query, page, &credential).await {
                Ok(results) => {
                    counter!("search_requests_total", "outcome" => "ok").increment(1);
                    return Ok(results);
                }
                Err(err) if err.should_rotate() => {
                    counter!("search_requests_total", "outcome" => "rejected").increment(1);
                    warn!(
                        credential_id = %credential.id,
                        key = %credential.fingerprint(),
                        error = %err,
                        "credential rejected, rotating"
                    );
                    excluded.insert(credential.id.clone());
                    last_rejection = err.to_string();
                }
                Err(err) if err.is_transient() => {
                    let message = err.to_string();
                    counter!("search_requests_total", "outcome" => "transient").increment(1);
                    if !self.retry.should_retry(retries) {
                        return Err(SearchFailed::RetriesExhausted {
                            attempts: retries + 1,
                            last_error: message,
                        });
                    }
                    retries += 1;
                    let delay = self.retry.calculate_backoff(retries);
                    debug!(attempt = retries, ?delay, error = %message, "transient search error, backing off");
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    counter!("search_requests_total", "outcome" => "invalid").increment(1);
                    return Err(SearchFailed::Invalid(err.to_string()));
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "query_dispatcher_test.rs"]
mod tests;
