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

use clap::{Parser, Subcommand};
use mentionrs::application::usecases::run_scrape::{write_failed_urls, RunLimits, ScrapeRunner};
use mentionrs::config::settings::Settings;
use mentionrs::domain::repositories::mention_repository::MentionRepository;
use mentionrs::domain::search::engine::{PageRequest, SearchProvider, SearchQuery};
use mentionrs::domain::services::credential_pool::CredentialPool;
use mentionrs::domain::services::fetch_extractor::FetchExtractor;
use mentionrs::domain::services::query_dispatcher::QueryDispatcher;
use mentionrs::engines::reqwest_engine::ReqwestEngine;
use mentionrs::infrastructure::database::connection;
use mentionrs::infrastructure::metrics::init_metrics;
use mentionrs::infrastructure::repositories::entity_repo_impl::EntityRepositoryImpl;
use mentionrs::infrastructure::repositories::mention_repo_impl::MentionRepositoryImpl;
use mentionrs::infrastructure::repositories::scrape_job_repo_impl::ScrapeJobRepositoryImpl;
use mentionrs::infrastructure::search::google::GoogleSearchProvider;
use mentionrs::utils::telemetry;
use mentionrs::workers::entity_worker::{EntityWorker, EntityWorkerConfig};
use mentionrs::workers::orchestrator::WorkerOrchestrator;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

/// 实体提及采集工具
#[derive(Debug, Parser)]
#[command(name = "mentionrs", version, about = "Collects web mentions of tracked entities")]
struct Cli {
    /// 输出 debug 级别日志
    #[arg(short, long, global = true)]
    verbose: bool,

    /// 覆盖配置中的并发 worker 数
    #[arg(long, global = true, value_parser = clap::value_parser!(u16).range(1..=512))]
    workers: Option<u16>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 采集全部活跃实体
    Batch {
        /// 从该实体 ID（含）开始
        #[arg(long)]
        start_id: Option<i64>,
    },
    /// 采集单个实体
    Entity {
        #[arg(long)]
        id: i64,
    },
    /// 检查数据库和每个搜索凭证是否可用
    Check,
}

/// 主函数
///
/// 加载配置、初始化日志与指标、组装采集组件并执行子命令
#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let mut settings = Settings::new()?;
    if let Some(workers) = cli.workers {
        settings.ingestion.concurrency = usize::from(workers);
    }

    telemetry::init_telemetry(cli.verbose, settings.logging.json);
    init_metrics(&settings.metrics)?;
    info!(
        credentials = settings.search.credentials.len(),
        concurrency = settings.ingestion.concurrency,
        "Starting mentionrs"
    );

    let db = match connection::create_pool(&settings.database).await {
        Ok(db) => Arc::new(db),
        Err(err) => {
            error!(error = %err, "mention store unreachable");
            return Ok(ExitCode::FAILURE);
        }
    };

    let entity_repo = Arc::new(EntityRepositoryImpl::new(db.clone()));
    let mention_repo = Arc::new(MentionRepositoryImpl::new(db.clone()));
    let job_repo = Arc::new(ScrapeJobRepositoryImpl::new(db.clone()));

    let pool = Arc::new(CredentialPool::from_settings(&settings.search.credentials));
    let provider = Arc::new(GoogleSearchProvider::new(
        settings.search.endpoint.clone(),
        settings.ingestion.request_timeout(),
        settings.search.max_results_per_call,
    )?);

    let report = match cli.command {
        Command::Check => {
            let healthy = check(mention_repo.as_ref(), provider.as_ref(), &pool).await;
            return Ok(if healthy {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            });
        }
        Command::Batch { start_id } => {
            let runner = build_runner(&settings, entity_repo, mention_repo, job_repo, pool, provider)?;
            runner.run_batch(start_id).await
        }
        Command::Entity { id } => {
            let runner = build_runner(&settings, entity_repo, mention_repo, job_repo, pool, provider)?;
            runner.run_single(id).await
        }
    };

    if let Some(path) = &settings.ingestion.failed_urls_log {
        match write_failed_urls(Path::new(path), &report).await {
            Ok(0) => {}
            Ok(count) => info!(count, path = %path, "failed URLs written"),
            Err(err) => warn!(path = %path, error = %err, "failed to write failed URL log"),
        }
    }

    println!("{}", report.summary());
    Ok(if report.failed() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// 组装采集运行所需的全部组件
fn build_runner(
    settings: &Settings,
    entity_repo: Arc<EntityRepositoryImpl>,
    mention_repo: Arc<MentionRepositoryImpl>,
    job_repo: Arc<ScrapeJobRepositoryImpl>,
    pool: Arc<CredentialPool>,
    provider: Arc<GoogleSearchProvider>,
) -> anyhow::Result<ScrapeRunner> {
    let ingestion = &settings.ingestion;
    let retry = ingestion.retry_policy();

    let mut dispatcher = QueryDispatcher::new(provider, pool.clone(), retry.clone());
    if let Some(qps) = settings.search.queries_per_second {
        dispatcher = dispatcher.with_rate_limit(qps);
    }

    let fetcher = Arc::new(ReqwestEngine::new(&ingestion.user_agent)?);
    let extractor = FetchExtractor::new(
        fetcher,
        retry.clone(),
        ingestion.request_timeout(),
        ingestion.min_content_length,
    );

    let worker = EntityWorker::new(
        Arc::new(dispatcher),
        Arc::new(extractor),
        mention_repo.clone(),
        EntityWorkerConfig::from(ingestion),
    );
    let orchestrator = WorkerOrchestrator::new(Arc::new(worker), entity_repo.clone());

    Ok(ScrapeRunner::new(
        entity_repo,
        mention_repo,
        job_repo,
        pool,
        orchestrator,
        RunLimits {
            concurrency: ingestion.concurrency,
            super_batch_size: ingestion.super_batch_size,
        },
        retry,
    ))
}

/// 连通性检查：数据库一次 ping，每个凭证一次单结果搜索
async fn check(
    mentions: &dyn MentionRepository,
    provider: &dyn SearchProvider,
    pool: &CredentialPool,
) -> bool {
    let mut healthy = true;

    match mentions.ping().await {
        Ok(()) => println!("database: ok"),
        Err(err) => {
            healthy = false;
            println!("database: FAILED ({})", err);
        }
    }

    if pool.is_empty() {
        println!("credentials: none configured");
        return false;
    }

    let probe = SearchQuery {
        text: "test".to_string(),
        locale: None,
    };
    for credential in pool.credentials() {
        let result = provider
            .search(&probe, PageRequest { offset: 0, count: 1 }, &credential)
            .await;
        pool.record_use(&credential);

        match result {
            Ok(_) => println!("credential {} ({}): ok", credential.id, credential.fingerprint()),
            Err(err) => {
                healthy = false;
                println!(
                    "credential {} ({}): FAILED ({})",
                    credential.id,
                    credential.fingerprint(),
                    err
                );
            }
        }
    }

    healthy
}
