// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use mentionrs::application::usecases::run_scrape::{RunLimits, ScrapeRunner};
use mentionrs::config::settings::IngestionSettings;
use mentionrs::domain::models::credential::Credential;
use mentionrs::domain::repositories::mention_repository::MentionRepository;
use mentionrs::domain::services::credential_pool::CredentialPool;
use mentionrs::domain::services::fetch_extractor::FetchExtractor;
use mentionrs::domain::services::query_dispatcher::QueryDispatcher;
use mentionrs::engines::reqwest_engine::ReqwestEngine;
use mentionrs::infrastructure::database::entities::tracked_entity as entity_entity;
use mentionrs::infrastructure::repositories::entity_repo_impl::EntityRepositoryImpl;
use mentionrs::infrastructure::repositories::mention_repo_impl::MentionRepositoryImpl;
use mentionrs::infrastructure::repositories::scrape_job_repo_impl::ScrapeJobRepositoryImpl;
use mentionrs::infrastructure::search::google::GoogleSearchProvider;
use mentionrs::utils::retry_policy::RetryPolicy;
use mentionrs::workers::entity_worker::{EntityWorker, EntityWorkerConfig};
use mentionrs::workers::orchestrator::WorkerOrchestrator;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// 单连接的内存 SQLite，已执行全部迁移
pub async fn setup_db() -> Arc<DatabaseConnection> {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(opt).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    Arc::new(db)
}

pub async fn seed_entity(db: &DatabaseConnection, id: i64, name: &str, active: bool) {
    entity_entity::ActiveModel {
        id: Set(id),
        display_name: Set(name.to_string()),
        locale_hint: Set(None),
        status: Set(if active { "active" } else { "inactive" }.to_string()),
        last_scraped: Set(None),
    }
    .insert(db)
    .await
    .unwrap();
}

/// 返回一段足够长的正文页面
pub fn article(title: &str) -> String {
    format!(
        r#"<html><head><title>{title}</title></head><body>
        <nav>Home | World | Sports</nav>
        <article><h1>{title}</h1>
        <p>{title} appeared at the festival on Saturday and spoke about the new album,
        the upcoming tour and the charity concert planned for next spring.</p></article>
        <footer>Copyright 2025</footer></body></html>"#
    )
}

/// 挂载一个正常返回 HTML 的页面
pub async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(body, "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

/// 挂载一个响应远超超时时间的页面
pub async fn mount_slow_page(server: &MockServer, route: &str) {
    Mock::given(method("GET"))
        .and(path(route.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(article("slow"), "text/html")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(server)
        .await;
}

/// 为指定查询挂载搜索结果
pub async fn mount_search(server: &MockServer, query: &str, links: &[String]) {
    let items: Vec<_> = links.iter().map(|link| json!({ "link": link })).collect();
    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .and(query_param("q", query))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": items })))
        .mount(server)
        .await;
}

/// 为指定查询挂载错误响应
pub async fn mount_search_error(server: &MockServer, query: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .and(query_param("q", query))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_json(json!({ "error": { "code": status, "message": "bad request" } })),
        )
        .mount(server)
        .await;
}

pub fn test_ingestion() -> IngestionSettings {
    IngestionSettings {
        concurrency: 4,
        super_batch_size: 4,
        request_timeout_ms: 200,
        max_retries: 1,
        initial_backoff_ms: 5,
        max_backoff_ms: 20,
        results_per_entity: 10,
        db_batch_size: 2,
        min_content_length: 20,
        request_delay_ms: 0,
        ..Default::default()
    }
}

pub fn test_pool(credentials: usize) -> Arc<CredentialPool> {
    Arc::new(CredentialPool::new(
        (1..=credentials)
            .map(|n| Credential::new(format!("test-{}", n), format!("key-{}", n), "cx", 100))
            .collect(),
    ))
}

/// 使用真实组件组装运行器，搜索与页面都指向本地模拟服务
pub fn build_runner(
    db: Arc<DatabaseConnection>,
    search: &MockServer,
    pool: Arc<CredentialPool>,
    mentions: Arc<dyn MentionRepository>,
    ingestion: &IngestionSettings,
) -> ScrapeRunner {
    let retry = RetryPolicy::new(
        ingestion.max_retries,
        Duration::from_millis(ingestion.initial_backoff_ms),
        Duration::from_millis(ingestion.max_backoff_ms),
    );

    let provider = Arc::new(
        GoogleSearchProvider::new(
            format!("{}/customsearch/v1", search.uri()),
            Duration::from_secs(2),
            10,
        )
        .unwrap(),
    );
    let dispatcher = QueryDispatcher::new(provider, pool.clone(), retry.clone());
    let fetcher = Arc::new(ReqwestEngine::new(&ingestion.user_agent).unwrap());
    let extractor = FetchExtractor::new(
        fetcher,
        retry.clone(),
        ingestion.request_timeout(),
        ingestion.min_content_length,
    );

    let entities = Arc::new(EntityRepositoryImpl::new(db.clone()));
    let worker = EntityWorker::new(
        Arc::new(dispatcher),
        Arc::new(extractor),
        mentions.clone(),
        EntityWorkerConfig::from(ingestion),
    );
    let orchestrator = WorkerOrchestrator::new(Arc::new(worker), entities.clone());

    ScrapeRunner::new(
        entities,
        mentions,
        Arc::new(ScrapeJobRepositoryImpl::new(db)),
        pool,
        orchestrator,
        RunLimits {
            concurrency: ingestion.concurrency,
            super_batch_size: ingestion.super_batch_size,
        },
        retry,
    )
}

pub fn mention_repo(db: &Arc<DatabaseConnection>) -> Arc<dyn MentionRepository> {
    Arc::new(MentionRepositoryImpl::new(db.clone()))
}
