// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// 页面抓取错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    /// 请求超时
    #[error("Timeout")]
    Timeout,
    /// 连接失败
    #[error("Connection failed: {0}")]
    Connect(String),
    /// 非 2xx 状态码
    #[error("HTTP status {0}")]
    Status(u16),
    /// 读取响应体失败
    #[error("Body read failed: {0}")]
    Body(String),
    /// 无效的 URL
    #[error("Invalid url: {0}")]
    InvalidUrl(String),
    /// 其他错误
    #[error("Other error: {0}")]
    Other(String),
}

impl FetchError {
    /// 判断错误是否可重试
    ///
    /// # 返回值
    ///
    /// 超时、连接错误、429 和 5xx 返回 true；其余 4xx 为永久失败
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Timeout | FetchError::Connect(_) | FetchError::Body(_) => true,
            FetchError::Status(code) => *code == 429 || *code >= 500,
            FetchError::InvalidUrl(_) | FetchError::Other(_) => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else if err.is_connect() || err.is_request() {
            FetchError::Connect(err.to_string())
        } else if err.is_body() || err.is_decode() {
            FetchError::Body(err.to_string())
        } else if err.is_builder() {
            FetchError::InvalidUrl(err.to_string())
        } else {
            FetchError::Other(err.to_string())
        }
    }
}

/// 抓取到的原始页面
#[derive(Debug, Clone)]
pub struct RawPage {
    /// 请求的 URL
    pub url: String,
    /// 跟随重定向后的 URL
    pub final_url: String,
    /// HTTP状态码
    pub status_code: u16,
    /// 内容类型
    pub content_type: String,
    /// 原始响应字节
    pub body: Vec<u8>,
    /// 响应时间（毫秒）
    pub response_time_ms: u64,
}

/// 页面抓取特质
///
/// 实现只负责单次请求；重试由调用方按重试策略控制
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// 抓取一次页面
    ///
    /// # 参数
    ///
    /// * `url` - 目标URL
    /// * `timeout` - 本次请求的超时时间
    async fn fetch_once(&self, url: &str, timeout: Duration) -> Result<RawPage, FetchError>;

    /// 获取引擎名称
    fn name(&self) -> &'static str;
}
