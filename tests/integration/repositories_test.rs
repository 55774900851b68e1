// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::*;
use chrono::Utc;
use mentionrs::domain::models::mention::{Mention, MentionCandidate};
use mentionrs::domain::models::scrape_job::{JobStatus, ScrapeJob};
use mentionrs::domain::repositories::entity_repository::EntityRepository;
use mentionrs::domain::repositories::mention_repository::{InsertOutcome, MentionRepository};
use mentionrs::domain::repositories::scrape_job_repository::ScrapeJobRepository;
use mentionrs::infrastructure::repositories::entity_repo_impl::EntityRepositoryImpl;
use mentionrs::infrastructure::repositories::mention_repo_impl::MentionRepositoryImpl;
use mentionrs::infrastructure::repositories::scrape_job_repo_impl::ScrapeJobRepositoryImpl;
use mentionrs::utils::errors::RepositoryError;

fn mention(entity_id: i64, url: &str) -> Mention {
    MentionCandidate {
        source_url: url.to_string(),
        cleaned_text: "周杰伦 新专辑 发布".to_string(),
        domain: "example.com".to_string(),
        published_at: None,
        extraction_confidence: 0.9,
        keyword_tags: vec!["周杰伦".into(), "新专辑".into()],
        processing_time_ms: 40,
    }
    .into_mention(entity_id)
}

#[tokio::test]
async fn test_batch_insert_skips_conflicts() {
    let db = setup_db().await;
    let repo = MentionRepositoryImpl::new(db.clone());

    let first = vec![mention(1, "https://a.example.com/1"), mention(1, "https://a.example.com/2")];
    assert_eq!(repo.insert_batch(&first).await.unwrap(), 2);

    let second = vec![mention(1, "https://a.example.com/2"), mention(1, "https://a.example.com/3")];
    assert_eq!(repo.insert_batch(&second).await.unwrap(), 1);

    assert_eq!(repo.count_for_entity(1).await.unwrap(), 3);
    assert!(repo.exists(1, "https://a.example.com/3").await.unwrap());
    assert!(!repo.exists(2, "https://a.example.com/3").await.unwrap());
    assert_eq!(repo.insert_batch(&[]).await.unwrap(), 0);
}

#[tokio::test]
async fn test_insert_one_reports_duplicate() {
    let db = setup_db().await;
    let repo = MentionRepositoryImpl::new(db.clone());

    assert_eq!(
        repo.insert_one(&mention(1, "https://a.example.com/1")).await.unwrap(),
        InsertOutcome::Inserted
    );
    assert_eq!(
        repo.insert_one(&mention(1, "https://a.example.com/1")).await.unwrap(),
        InsertOutcome::Duplicate
    );
    assert_eq!(
        repo.insert_one(&mention(2, "https://a.example.com/1")).await.unwrap(),
        InsertOutcome::Inserted
    );
    repo.ping().await.unwrap();
}

#[tokio::test]
async fn test_entity_catalog_reads_and_touches() {
    let db = setup_db().await;
    seed_entity(&db, 3, "Gamma", true).await;
    seed_entity(&db, 1, "Alpha", true).await;
    seed_entity(&db, 2, "Beta", false).await;
    let repo = EntityRepositoryImpl::new(db.clone());

    let ids: Vec<i64> = repo.list_active(None).await.unwrap().iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![1, 3]);
    let ids: Vec<i64> = repo.list_active(Some(2)).await.unwrap().iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![3]);

    let now = Utc::now().fixed_offset();
    repo.touch_last_scraped(3, now).await.unwrap();
    let gamma = repo.find_by_id(3).await.unwrap().unwrap();
    assert_eq!(gamma.last_scraped.map(|t| t.timestamp()), Some(now.timestamp()));

    assert!(matches!(
        repo.touch_last_scraped(99, now).await,
        Err(RepositoryError::NotFound)
    ));
    assert!(repo.find_by_id(99).await.unwrap().is_none());
}

#[tokio::test]
async fn test_scrape_job_lifecycle_round_trip() {
    let db = setup_db().await;
    let repo = ScrapeJobRepositoryImpl::new(db.clone());

    let job = ScrapeJob::new_single(7);
    repo.create(&job).await.unwrap();

    let mut job = job.start().unwrap();
    job.record_progress(2, 3, 1).unwrap();
    repo.update(&job).await.unwrap();

    let job = job.complete().unwrap();
    repo.update(&job).await.unwrap();

    let stored = repo.find_by_id(job.job_id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Completed);
    assert_eq!(stored.entity_id, Some(7));
    assert_eq!(
        (stored.mentions_found, stored.urls_processed, stored.urls_failed),
        (2, 3, 1)
    );
    assert!(stored.end_time.is_some());
}
