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

use crate::utils::retry_policy::RetryPolicy;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;
use validator::Validate;

/// 旧版环境变量中最多支持的凭证对数量
const LEGACY_CREDENTIAL_SLOTS: usize = 5;

/// 每个凭证默认的每日配额
const DEFAULT_QUOTA_LIMIT: u64 = 100;

/// 应用程序配置设置
///
/// 包含数据库、搜索服务、采集管线、指标和日志等配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 数据库配置
    pub database: DatabaseSettings,
    /// 搜索服务配置
    pub search: SearchSettings,
    /// 采集管线配置
    pub ingestion: IngestionSettings,
    /// 指标导出配置
    pub metrics: MetricsSettings,
    /// 日志配置
    pub logging: LoggingSettings,
}

/// 数据库配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL
    pub url: String,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
    /// 启动时是否自动执行迁移
    pub auto_migrate: bool,
}

/// 搜索服务配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    /// 搜索 API 端点
    pub endpoint: String,
    /// 凭证列表
    #[serde(default)]
    pub credentials: Vec<CredentialSettings>,
    /// 单次调用最多返回的结果数
    pub max_results_per_call: usize,
    /// 全局每秒请求数上限（可选）
    pub queries_per_second: Option<u32>,
}

/// 单个搜索凭证配置
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialSettings {
    /// 凭证标识，未配置时按位置生成
    pub id: Option<String>,
    /// API 密钥
    pub api_key: String,
    /// 搜索引擎 ID (cx)
    pub engine_id: String,
    /// 每日配额
    #[serde(default = "default_quota_limit")]
    pub quota_limit: u64,
}

fn default_quota_limit() -> u64 {
    DEFAULT_QUOTA_LIMIT
}

/// 采集管线配置设置
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct IngestionSettings {
    /// 每个超级批次内的并发 worker 数
    #[validate(range(min = 1, max = 512))]
    pub concurrency: usize,
    /// 超级批次大小
    #[validate(range(min = 1))]
    pub super_batch_size: usize,
    /// 单次网络请求超时（毫秒）
    #[validate(range(min = 1))]
    pub request_timeout_ms: u64,
    /// 瞬时错误的最大重试次数
    #[validate(range(max = 10))]
    pub max_retries: u32,
    /// 初始退避时间（毫秒）
    pub initial_backoff_ms: u64,
    /// 最大退避时间（毫秒）
    pub max_backoff_ms: u64,
    /// 每个实体期望的搜索结果数
    #[validate(range(min = 1, max = 100))]
    pub results_per_entity: usize,
    /// 批量写入大小
    #[validate(range(min = 1, max = 1000))]
    pub db_batch_size: usize,
    /// 最小有效正文长度（字符）
    pub min_content_length: usize,
    /// 同一实体内相邻 URL 之间的间隔（毫秒）
    pub request_delay_ms: u64,
    /// 抓取页面使用的 User-Agent
    #[validate(length(min = 1))]
    pub user_agent: String,
    /// 失败 URL 日志文件路径（可选）
    pub failed_urls_log: Option<String>,
}

/// 指标导出配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// 是否启用 Prometheus 导出
    pub enabled: bool,
    /// 导出监听地址
    pub listen_addr: String,
}

/// 日志配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// 是否输出 JSON 格式日志
    pub json: bool,
}

impl Default for IngestionSettings {
    fn default() -> Self {
        Self {
            concurrency: 20,
            super_batch_size: 20,
            request_timeout_ms: 10_000,
            max_retries: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 8_000,
            results_per_entity: 20,
            db_batch_size: 50,
            min_content_length: 50,
            request_delay_ms: 1_000,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            failed_urls_log: None,
        }
    }
}

impl IngestionSettings {
    /// 单次请求超时
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// 根据配置构建重试策略
    ///
    /// 基础延迟每次翻倍，直到达到最大退避时间
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.initial_backoff_ms),
            Duration::from_millis(self.max_backoff_ms),
        )
    }
}

/// 默认 User-Agent
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次叠加内置默认值、配置文件和环境变量，随后追加旧版
    /// `GOOGLE_API_KEY_n` / `GOOGLE_SEARCH_ENGINE_ID_n` 凭证并校验采集参数
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let defaults = IngestionSettings::default();
        let builder = Config::builder()
            // Database
            .set_default("database.url", "sqlite://mentionrs.db?mode=rwc")?
            .set_default("database.max_connections", 20)?
            .set_default("database.min_connections", 2)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            .set_default("database.auto_migrate", true)?
            // Search provider
            .set_default("search.endpoint", "https://www.googleapis.com/customsearch/v1")?
            .set_default("search.max_results_per_call", 10)?
            // Ingestion pipeline
            .set_default("ingestion.concurrency", defaults.concurrency as u64)?
            .set_default("ingestion.super_batch_size", defaults.super_batch_size as u64)?
            .set_default("ingestion.request_timeout_ms", defaults.request_timeout_ms)?
            .set_default("ingestion.max_retries", defaults.max_retries as u64)?
            .set_default("ingestion.initial_backoff_ms", defaults.initial_backoff_ms)?
            .set_default("ingestion.max_backoff_ms", defaults.max_backoff_ms)?
            .set_default("ingestion.results_per_entity", defaults.results_per_entity as u64)?
            .set_default("ingestion.db_batch_size", defaults.db_batch_size as u64)?
            .set_default("ingestion.min_content_length", defaults.min_content_length as u64)?
            .set_default("ingestion.request_delay_ms", defaults.request_delay_ms)?
            .set_default("ingestion.user_agent", defaults.user_agent)?
            // Observability
            .set_default("metrics.enabled", false)?
            .set_default("metrics.listen_addr", "0.0.0.0:9000")?
            .set_default("logging.json", false)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("MENTIONRS").separator("__"));

        let mut settings: Settings = builder.build()?.try_deserialize()?;

        let legacy = legacy_credentials(|key| std::env::var(key).ok())?;
        settings.search.credentials.extend(legacy);

        settings
            .ingestion
            .validate()
            .map_err(|e| ConfigError::Message(format!("invalid ingestion settings: {}", e)))?;

        Ok(settings)
    }
}

/// 读取旧版的成对凭证环境变量
///
/// 密钥与引擎 ID 数量必须一致，否则视为配置错误
pub(crate) fn legacy_credentials<F>(lookup: F) -> Result<Vec<CredentialSettings>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let read = |prefix: &str| -> Vec<(usize, String)> {
        (1..=LEGACY_CREDENTIAL_SLOTS)
            .filter_map(|n| {
                lookup(&format!("{}_{}", prefix, n))
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .map(|v| (n, v))
            })
            .collect()
    };

    let keys = read("GOOGLE_API_KEY");
    let engines = read("GOOGLE_SEARCH_ENGINE_ID");

    if keys.len() != engines.len() {
        return Err(ConfigError::Message(format!(
            "found {} GOOGLE_API_KEY_n values but {} GOOGLE_SEARCH_ENGINE_ID_n values",
            keys.len(),
            engines.len()
        )));
    }

    Ok(keys
        .into_iter()
        .zip(engines)
        .map(|((n, api_key), (_, engine_id))| CredentialSettings {
            id: Some(format!("google-{}", n)),
            api_key,
            engine_id,
            quota_limit: DEFAULT_QUOTA_LIMIT,
        })
        .collect())
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
