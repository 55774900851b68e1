// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::*;
use async_trait::async_trait;
use mentionrs::domain::models::mention::Mention;
use mentionrs::domain::models::scrape_job::JobStatus;
use mentionrs::domain::repositories::mention_repository::{InsertOutcome, MentionRepository};
use mentionrs::domain::repositories::scrape_job_repository::ScrapeJobRepository;
use mentionrs::domain::services::credential_pool::CredentialPool;
use mentionrs::infrastructure::repositories::scrape_job_repo_impl::ScrapeJobRepositoryImpl;
use mentionrs::utils::errors::RepositoryError;
use std::sync::Arc;
use wiremock::MockServer;

/// ping 始终失败的提及存储
struct UnreachableStore;

#[async_trait]
impl MentionRepository for UnreachableStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Err(RepositoryError::DatabaseError("connection refused".into()))
    }

    async fn insert_batch(&self, _mentions: &[Mention]) -> Result<u64, RepositoryError> {
        Err(RepositoryError::DatabaseError("connection refused".into()))
    }

    async fn insert_one(&self, _mention: &Mention) -> Result<InsertOutcome, RepositoryError> {
        Err(RepositoryError::DatabaseError("connection refused".into()))
    }

    async fn exists(&self, _entity_id: i64, _source_url: &str) -> Result<bool, RepositoryError> {
        Err(RepositoryError::DatabaseError("connection refused".into()))
    }

    async fn count_for_entity(&self, _entity_id: i64) -> Result<u64, RepositoryError> {
        Err(RepositoryError::DatabaseError("connection refused".into()))
    }
}

#[tokio::test]
async fn test_unreachable_store_fails_job_before_work() {
    let db = setup_db().await;
    seed_entity(&db, 1, "Jay Chou", true).await;
    let search = MockServer::start().await;

    let runner = build_runner(
        db.clone(),
        &search,
        test_pool(1),
        Arc::new(UnreachableStore),
        &test_ingestion(),
    );
    let report = runner.run_batch(None).await;

    assert!(report.failed());
    assert!(report.outcomes.is_empty());
    let message = report.job.error_message.clone().unwrap();
    assert!(message.contains("unreachable"));

    let stored = ScrapeJobRepositoryImpl::new(db.clone())
        .find_by_id(report.job.job_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, JobStatus::Failed);
    assert_eq!(stored.urls_processed, 0);
    assert!(!stored.error_message.unwrap_or_default().is_empty());
    assert!(search.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_missing_credentials_fail_job() {
    let db = setup_db().await;
    let search = MockServer::start().await;

    let runner = build_runner(
        db.clone(),
        &search,
        Arc::new(CredentialPool::new(Vec::new())),
        mention_repo(&db),
        &test_ingestion(),
    );
    let report = runner.run_batch(None).await;

    assert_eq!(report.job.status, JobStatus::Failed);
    assert_eq!(
        report.job.error_message.as_deref(),
        Some("no search credentials configured")
    );
}

#[tokio::test]
async fn test_unknown_entity_fails_job() {
    let db = setup_db().await;
    let search = MockServer::start().await;

    let runner = build_runner(db.clone(), &search, test_pool(1), mention_repo(&db), &test_ingestion());
    let report = runner.run_single(42).await;

    assert_eq!(report.job.status, JobStatus::Failed);
    assert_eq!(report.job.entity_id, Some(42));
    assert_eq!(report.job.error_message.as_deref(), Some("entity 42 not found"));
}

#[tokio::test]
async fn test_empty_catalog_completes() {
    let db = setup_db().await;
    let search = MockServer::start().await;

    let runner = build_runner(db.clone(), &search, test_pool(1), mention_repo(&db), &test_ingestion());
    let report = runner.run_batch(None).await;

    assert_eq!(report.job.status, JobStatus::Completed);
    assert!(report.outcomes.is_empty());
    assert!(report.job.end_time.is_some());
}
