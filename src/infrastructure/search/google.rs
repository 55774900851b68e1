// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::credential::Credential;
use crate::domain::search::engine::{PageRequest, ProviderError, SearchProvider, SearchQuery};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Google 单次调用最多返回的结果数
pub const GOOGLE_MAX_RESULTS_PER_CALL: usize = 10;

/// 403 响应中表示配额或限流的原因
const QUOTA_REASONS: &[&str] = &[
    "rateLimitExceeded",
    "userRateLimitExceeded",
    "dailyLimitExceeded",
    "quotaExceeded",
];

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    link: Option<String>,
}

/// Google Programmable Search (Custom Search JSON API) 客户端
pub struct GoogleSearchProvider {
    client: Client,
    endpoint: String,
    max_results_per_call: usize,
}

impl GoogleSearchProvider {
    /// 创建 Google 搜索客户端
    ///
    /// # 参数
    ///
    /// * `endpoint` - API 端点，测试时可指向本地模拟服务
    /// * `timeout` - 单次请求超时
    /// * `max_results_per_call` - 单次调用结果上限，超过 10 时按 10 处理
    pub fn new(
        endpoint: impl Into<String>,
        timeout: Duration,
        max_results_per_call: usize,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Invalid(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            max_results_per_call: max_results_per_call.clamp(1, GOOGLE_MAX_RESULTS_PER_CALL),
        })
    }

    fn query_params(
        &self,
        query: &SearchQuery,
        page: PageRequest,
        credential: &Credential,
    ) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("q", query.text.clone()),
            ("key", credential.api_key.clone()),
            ("cx", credential.engine_id.clone()),
            ("num", page.count.clamp(1, self.max_results_per_call).to_string()),
            ("start", (page.offset + 1).to_string()),
        ];

        if let Some(locale) = query.locale.as_deref() {
            params.push(("hl", locale.to_string()));
            if let Some((_, region)) = locale.split_once(|c| c == '-' || c == '_') {
                if !region.is_empty() {
                    params.push(("gl", region.to_ascii_lowercase()));
                }
            }
        }

        params
    }
}

/// 把非 2xx 响应映射为类型化错误
fn classify_status(status: StatusCode, body: &str) -> ProviderError {
    let detail = format!("HTTP {}: {}", status.as_u16(), truncate(body, 200));
    match status {
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited(detail),
        StatusCode::FORBIDDEN if QUOTA_REASONS.iter().any(|r| body.contains(r)) => {
            ProviderError::RateLimited(detail)
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Unauthorized(detail),
        s if s.is_server_error() || s == StatusCode::REQUEST_TIMEOUT => {
            ProviderError::Transient(detail)
        }
        _ => ProviderError::Invalid(detail),
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[async_trait]
impl SearchProvider for GoogleSearchProvider {
    async fn search(
        &self,
        query: &SearchQuery,
        page: PageRequest,
        credential: &Credential,
    ) -> Result<Vec<String>, ProviderError> {
        let params = self.query_params(query, page, credential);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() || e.is_request() {
                    ProviderError::Transient(e.to_string())
                } else {
                    ProviderError::Invalid(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Transient(format!("malformed search response: {}", e)))?;

        let links: Vec<String> = body.items.into_iter().filter_map(|item| item.link).collect();
        debug!(
            credential = %credential.fingerprint(),
            offset = page.offset,
            returned = links.len(),
            "google search page"
        );
        Ok(links)
    }

    fn max_results_per_call(&self) -> usize {
        self.max_results_per_call
    }

    fn name(&self) -> &'static str {
        "google"
    }
}

#[cfg(test)]
#[path = "google_test.rs"]
mod tests;
