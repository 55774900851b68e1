// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::credential::Credential;
use async_trait::async_trait;
use thiserror::Error;

/// 搜索服务返回的类型化错误
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProviderError {
    /// 限流或配额耗尽 (429 / quota 403)
    #[error("Rate limited: {0}")]
    RateLimited(String),
    /// 凭证无效
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// 5xx、超时或网络错误
    #[error("Transient error: {0}")]
    Transient(String),
    /// 请求本身无效，重试无意义
    #[error("Invalid request: {0}")]
    Invalid(String),
}

impl ProviderError {
    /// 是否应在同一凭证上退避重试
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Transient(_))
    }

    /// 是否应换用其他凭证
    pub fn should_rotate(&self) -> bool {
        matches!(self, ProviderError::RateLimited(_) | ProviderError::Unauthorized(_))
    }
}

/// 搜索请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// 查询文本
    pub text: String,
    /// 语言/地区提示
    pub locale: Option<String>,
}

/// 分页参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 从 0 开始的结果偏移
    pub offset: usize,
    /// 本次请求的结果数，不超过 `max_results_per_call`
    pub count: usize,
}

/// 搜索服务特质
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// 执行一次搜索调用，返回按相关性排序的结果 URL
    async fn search(
        &self,
        query: &SearchQuery,
        page: PageRequest,
        credential: &Credential,
    ) -> Result<Vec<String>, ProviderError>;

    /// 单次调用最多返回的结果数
    fn max_results_per_call(&self) -> usize;

    /// 服务名称
    fn name(&self) -> &'static str;
}
