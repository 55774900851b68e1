// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::mention::MentionCandidate;
use crate::engines::traits::{FetchError, PageFetcher, RawPage};
use crate::utils::retry_policy::RetryPolicy;
use crate::utils::text_encoding::{charset_from_content_type, decode_html};
use crate::utils::text_processing::{clean_html, confidence_score, extract_keywords};
use crate::utils::url_utils::extract_domain;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// 每条提及保留的关键词数量
const KEYWORD_LIMIT: usize = 5;

/// 页面抓取失败
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FetchFailed {
    /// 不可重试的失败，例如 404
    #[error("permanent fetch failure: {0}")]
    Permanent(FetchError),
    /// 瞬时错误重试次数耗尽
    #[error("fetch failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: FetchError },
}

/// 正文提取失败，均为永久失败
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExtractError {
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),
    #[error("page has no readable text")]
    EmptyContent,
}

/// 单个 URL 的处理失败
#[derive(Debug, Clone, PartialEq)]
pub struct UrlFailure {
    pub url: String,
    pub reason: String,
    /// 失败前是否经历过瞬时错误重试
    pub transient: bool,
}

/// 单个 URL 的处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum UrlOutcome {
    Extracted(MentionCandidate),
    Failed(UrlFailure),
}

/// 页面抓取与正文提取
pub struct FetchExtractor {
    fetcher: Arc<dyn PageFetcher>,
    retry: RetryPolicy,
    timeout: Duration,
    min_content_length: usize,
}

impl FetchExtractor {
    /// 创建抓取提取器
    ///
    /// # 参数
    ///
    /// * `fetcher` - 单次抓取实现
    /// * `retry` - 瞬时错误的重试策略
    /// * `timeout` - 每次请求的超时
    /// * `min_content_length` - 最小有效正文长度，用于置信度折减
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        retry: RetryPolicy,
        timeout: Duration,
        min_content_length: usize,
    ) -> Self {
        Self {
            fetcher,
            retry,
            timeout,
            min_content_length,
        }
    }

    /// 抓取页面
    ///
    /// 429、5xx、超时和连接错误按重试策略重试；其他 4xx 立即失败
    pub async fn fetch(&self, url: &str, timeout: Duration) -> Result<RawPage, FetchFailed> {
        let mut retries = 0u32;
        loop {
            match self.fetcher.fetch_once(url, timeout).await {
                Ok(page) => {
                    debug!(
                        url,
                        final_url = %page.final_url,
                        status = page.status_code,
                        engine = self.fetcher.name(),
                        "page fetched"
                    );
                    return Ok(page);
                }
                Err(err) if !err.is_retryable() => return Err(FetchFailed::Permanent(err)),
                Err(err) => {
                    if !self.retry.should_retry(retries) {
                        return Err(FetchFailed::RetriesExhausted {
                            attempts: retries + 1,
                            last_error: err,
                        });
                    }
                    retries += 1;
                    let delay = self.retry.calculate_backoff(retries);
                    debug!(url, attempt = retries, ?delay, error = %err, "transient fetch error, backing off");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// 从页面中提取提及内容
    ///
    /// 纯 CPU 计算，不会挂起
    pub fn extract(&self, page: &RawPage) -> Result<MentionCandidate, ExtractError> {
        let started = Instant::now();

        if !is_html(&page.content_type) {
            return Err(ExtractError::UnsupportedContentType(page.content_type.clone()));
        }

        let declared = charset_from_content_type(&page.content_type);
        let (html, _) = decode_html(&page.body, declared.as_deref());
        let document = clean_html(&html);
        if document.text.is_empty() {
            return Err(ExtractError::EmptyContent);
        }

        let cleaned_chars = document.text.chars().count();
        let extraction_confidence =
            confidence_score(cleaned_chars, document.raw_chars, self.min_content_length);
        let keyword_tags = extract_keywords(&document.text, KEYWORD_LIMIT);

        Ok(MentionCandidate {
            source_url: page.url.clone(),
            domain: extract_domain(&page.url),
            published_at: document.published_at,
            extraction_confidence,
            keyword_tags,
            cleaned_text: document.text,
            processing_time_ms: page.response_time_ms + started.elapsed().as_millis() as u64,
        })
    }

    /// 抓取并提取单个 URL，结果总是以值的形式返回
    pub async fn process(&self, url: &str) -> UrlOutcome {
        let page = match self.fetch(url, self.timeout).await {
            Ok(page) => page,
            Err(err) => {
                warn!(url, error = %err, "fetch failed");
                return UrlOutcome::Failed(UrlFailure {
                    url: url.to_string(),
                    transient: matches!(err, FetchFailed::RetriesExhausted { .. }),
                    reason: err.to_string(),
                });
            }
        };

        match self.extract(&page) {
            Ok(candidate) => UrlOutcome::Extracted(candidate),
            Err(err) => {
                warn!(url, error = %err, "extraction failed");
                UrlOutcome::Failed(UrlFailure {
                    url: url.to_string(),
                    reason: err.to_string(),
                    transient: false,
                })
            }
        }
    }
}

/// 缺失的 Content-Type 按 HTML 处理
fn is_html(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    mime.is_empty() || mime == "text/html" || mime == "application/xhtml+xml"
}

#[cfg(test)]
#[path = "fetch_extractor_test.rs"]
mod tests;
