// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::*;
use mentionrs::domain::models::entity_outcome::EntityRunStatus;
use mentionrs::domain::models::scrape_job::JobStatus;
use mentionrs::domain::repositories::entity_repository::EntityRepository;
use mentionrs::domain::repositories::scrape_job_repository::ScrapeJobRepository;
use mentionrs::infrastructure::repositories::entity_repo_impl::EntityRepositoryImpl;
use mentionrs::infrastructure::repositories::scrape_job_repo_impl::ScrapeJobRepositoryImpl;
use wiremock::MockServer;

/// 1 个实体、3 个 URL，其中 1 个超时
#[tokio::test]
async fn test_partial_url_failure_still_completes() {
    let db = setup_db().await;
    seed_entity(&db, 1, "Jay Chou", true).await;

    let pages = MockServer::start().await;
    mount_page(&pages, "/a", article("Jay Chou")).await;
    mount_page(&pages, "/b", article("Jay Chou tour")).await;
    mount_slow_page(&pages, "/slow").await;

    let search = MockServer::start().await;
    let links = vec![
        format!("{}/a", pages.uri()),
        format!("{}/slow", pages.uri()),
        format!("{}/b", pages.uri()),
    ];
    mount_search(&search, "Jay Chou", &links).await;

    let mentions = mention_repo(&db);
    let runner = build_runner(db.clone(), &search, test_pool(1), mentions.clone(), &test_ingestion());

    let report = runner.run_single(1).await;

    assert_eq!(report.job.status, JobStatus::Completed);
    assert_eq!(report.job.mentions_found, 2);
    assert_eq!(report.job.urls_processed, 3);
    assert_eq!(report.job.urls_failed, 1);
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].status, EntityRunStatus::Succeeded);
    assert_eq!(report.outcomes[0].failed_urls[0].url, links[1]);
    assert!(report.outcomes[0].failed_urls[0].transient);
    assert_eq!(mentions.count_for_entity(1).await.unwrap(), 2);

    let stored = ScrapeJobRepositoryImpl::new(db.clone())
        .find_by_id(report.job.job_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, JobStatus::Completed);
    assert_eq!(
        (stored.mentions_found, stored.urls_processed, stored.urls_failed),
        (2, 3, 1)
    );

    let entity = EntityRepositoryImpl::new(db.clone())
        .find_by_id(1)
        .await
        .unwrap()
        .unwrap();
    assert!(entity.last_scraped.is_some());
}

/// 5 个实体，其中一个在所有凭证都被限流后搜索失败
#[tokio::test]
async fn test_search_failure_is_isolated_to_one_entity() {
    let db = setup_db().await;
    let pages = MockServer::start().await;
    let search = MockServer::start().await;

    for id in 1..=5 {
        let name = format!("Entity {}", id);
        seed_entity(&db, id, &name, true).await;
        if id == 3 {
            mount_search_error(&search, &name, 429).await;
        } else {
            let route = format!("/e{}", id);
            mount_page(&pages, &route, article(&name)).await;
            mount_search(&search, &name, &[format!("{}{}", pages.uri(), route)]).await;
        }
    }

    let runner = build_runner(db.clone(), &search, test_pool(2), mention_repo(&db), &test_ingestion());
    let report = runner.run_batch(None).await;

    assert_eq!(report.job.status, JobStatus::Completed);
    assert_eq!(report.outcomes.len(), 5);
    match &report.outcomes[2].status {
        EntityRunStatus::SearchFailed(reason) => {
            assert!(reason.contains("every credential was rejected"), "{}", reason)
        }
        other => panic!("expected search failure, got {:?}", other),
    }
    assert_eq!(report.outcomes[2].urls_processed, 0);
    for index in [0, 1, 3, 4] {
        assert_eq!(report.outcomes[index].status, EntityRunStatus::Succeeded);
        assert_eq!(report.outcomes[index].mentions_inserted, 1);
    }
    assert_eq!(report.job.mentions_found, 4);
    assert_eq!(report.job.urls_processed, 4);
    assert_eq!(report.job.urls_failed, 0);
    assert_eq!(report.failed_entities(), 1);
}

/// M 个实体在并发 W 下得到 M 个结果
#[tokio::test]
async fn test_every_entity_gets_an_outcome() {
    let db = setup_db().await;
    let search = MockServer::start().await;
    for id in 1..=7 {
        let name = format!("Quiet {}", id);
        seed_entity(&db, id, &name, true).await;
        mount_search(&search, &name, &[]).await;
    }

    let mut ingestion = test_ingestion();
    ingestion.concurrency = 2;
    ingestion.super_batch_size = 3;
    let runner = build_runner(db.clone(), &search, test_pool(1), mention_repo(&db), &ingestion);

    let report = runner.run_batch(None).await;

    assert_eq!(report.job.status, JobStatus::Completed);
    let ids: Vec<i64> = report.outcomes.iter().map(|o| o.entity_id).collect();
    assert_eq!(ids, (1..=7).collect::<Vec<_>>());
    assert!(report
        .outcomes
        .iter()
        .all(|o| o.status == EntityRunStatus::NoResults));
    assert_eq!(report.job.urls_processed, 0);
}

/// 重复采集同一实体时已存在的记录计为重复
#[tokio::test]
async fn test_rerun_counts_existing_mentions_as_duplicates() {
    let db = setup_db().await;
    seed_entity(&db, 1, "Jay Chou", true).await;

    let pages = MockServer::start().await;
    mount_page(&pages, "/a", article("Jay Chou")).await;
    mount_page(&pages, "/b", article("Jay Chou live")).await;
    let search = MockServer::start().await;
    mount_search(
        &search,
        "Jay Chou",
        &[format!("{}/a", pages.uri()), format!("{}/b", pages.uri())],
    )
    .await;

    let mentions = mention_repo(&db);
    let runner = build_runner(db.clone(), &search, test_pool(1), mentions.clone(), &test_ingestion());

    let first = runner.run_single(1).await;
    let second = runner.run_single(1).await;

    assert_eq!(first.outcomes[0].mentions_inserted, 2);
    assert_eq!(second.outcomes[0].mentions_inserted, 0);
    assert_eq!(second.outcomes[0].duplicates, 2);
    assert_eq!(second.job.mentions_found, 2);
    assert_eq!(second.job.status, JobStatus::Completed);
    assert_eq!(mentions.count_for_entity(1).await.unwrap(), 2);
}

/// `--start-id` 跳过更小的实体，未激活实体不参与批量
#[tokio::test]
async fn test_batch_resumes_from_start_id() {
    let db = setup_db().await;
    let search = MockServer::start().await;
    for id in 1..=4 {
        let name = format!("Resume {}", id);
        seed_entity(&db, id, &name, id != 4).await;
        mount_search(&search, &name, &[]).await;
    }

    let runner = build_runner(db.clone(), &search, test_pool(1), mention_repo(&db), &test_ingestion());
    let report = runner.run_batch(Some(2)).await;

    let ids: Vec<i64> = report.outcomes.iter().map(|o| o.entity_id).collect();
    assert_eq!(ids, vec![2, 3]);
}
