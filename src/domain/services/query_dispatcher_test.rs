// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::*;
use crate::domain::models::credential::Credential;
use crate::domain::search::engine::ProviderError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

/// 按脚本依次返回结果的搜索服务
struct ScriptedProvider {
    per_call: usize,
    script: Mutex<VecDeque<Result<Vec<String>, ProviderError>>>,
    calls: Mutex<Vec<(String, PageRequest)>>,
}

impl ScriptedProvider {
    fn new(per_call: usize, script: Vec<Result<Vec<String>, ProviderError>>) -> Arc<Self> {
        Arc::new(Self {
            per_call,
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<(String, PageRequest)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl SearchProvider for ScriptedProvider {
    async fn search(
        &self,
        _query: &SearchQuery,
        page: PageRequest,
        credential: &Credential,
    ) -> Result<Vec<String>, ProviderError> {
        self.calls.lock().push((credential.id.clone(), page));
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    fn max_results_per_call(&self) -> usize {
        self.per_call
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

fn urls(prefix: &str, n: usize) -> Vec<String> {
    (0..n).map(|i| format!("https://{}.example.com/{}", prefix, i)).collect()
}

fn pool(n: usize, quota: u64) -> Arc<CredentialPool> {
    Arc::new(CredentialPool::new(
        (1..=n)
            .map(|i| Credential::new(format!("c{}", i), format!("k{}", i), format!("x{}", i), quota))
            .collect(),
    ))
}

fn fast_retry(max_retries: u32) -> RetryPolicy {
    RetryPolicy::new(max_retries, Duration::from_millis(1), Duration::from_millis(2))
}

fn entity() -> TrackedEntity {
    TrackedEntity::new(1, "周杰伦").with_locale("zh-TW")
}

#[tokio::test]
async fn test_pages_until_desired_count() {
    let provider = ScriptedProvider::new(10, vec![Ok(urls("a", 10)), Ok(urls("b", 10))]);
    let dispatcher = QueryDispatcher::new(provider.clone(), pool(1, 100), fast_retry(0));

    let found = dispatcher.search(&entity(), 20).await.unwrap();

    assert_eq!(found.len(), 20);
    let calls = provider.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].1, PageRequest { offset: 0, count: 10 });
    assert_eq!(calls[1].1, PageRequest { offset: 10, count: 10 });
}

#[tokio::test]
async fn test_count_is_clamped_to_provider_maximum() {
    let provider = ScriptedProvider::new(10, vec![Ok(urls("a", 5))]);
    let dispatcher = QueryDispatcher::new(provider.clone(), pool(1, 100), fast_retry(0));

    let found = dispatcher.search(&entity(), 5).await.unwrap();

    assert_eq!(found.len(), 5);
    assert_eq!(provider.calls()[0].1.count, 5);
}

#[tokio::test]
async fn test_short_page_stops_paging() {
    let provider = ScriptedProvider::new(10, vec![Ok(urls("a", 3))]);
    let dispatcher = QueryDispatcher::new(provider.clone(), pool(1, 100), fast_retry(0));

    let found = dispatcher.search(&entity(), 20).await.unwrap();

    assert_eq!(found.len(), 3);
    assert_eq!(provider.calls().len(), 1);
}

#[tokio::test]
async fn test_duplicates_and_non_http_links_are_dropped() {
    let provider = ScriptedProvider::new(
        10,
        vec![Ok(vec![
            "https://a.example.com/1".to_string(),
            "https://a.example.com/1".to_string(),
            "javascript:void(0)".to_string(),
            "https://a.example.com/2".to_string(),
        ])],
    );
    let dispatcher = QueryDispatcher::new(provider, pool(1, 100), fast_retry(0));

    let found = dispatcher.search(&entity(), 10).await.unwrap();

    assert_eq!(found, vec!["https://a.example.com/1", "https://a.example.com/2"]);
}

#[tokio::test]
async fn test_transient_errors_are_retried() {
    let provider = ScriptedProvider::new(
        10,
        vec![
            Err(ProviderError::Transient("503".into())),
            Err(ProviderError::Transient("timeout".into())),
            Ok(urls("a", 2)),
        ],
    );
    let dispatcher = QueryDispatcher::new(provider.clone(), pool(1, 100), fast_retry(3));

    let found = dispatcher.search(&entity(), 10).await.unwrap();

    assert_eq!(found.len(), 2);
    assert_eq!(provider.calls().len(), 3);
}

#[tokio::test]
async fn test_transient_errors_exhaust_retries() {
    let provider = ScriptedProvider::new(
        10,
        (0..10)
            .map(|_| Err(ProviderError::Transient("503".into())))
            .collect(),
    );
    let dispatcher = QueryDispatcher::new(provider.clone(), pool(1, 100), fast_retry(2));

    let err = dispatcher.search(&entity(), 10).await.unwrap_err();

    assert!(matches!(err, SearchFailed::RetriesExhausted { attempts: 3, .. }));
    assert_eq!(provider.calls().len(), 3);
}

#[tokio::test]
async fn test_rate_limit_rotates_credential() {
    let provider = ScriptedProvider::new(
        10,
        vec![Err(ProviderError::RateLimited("429".into())), Ok(urls("a", 4))],
    );
    let dispatcher = QueryDispatcher::new(provider.clone(), pool(2, 100), fast_retry(0));

    let found = dispatcher.search(&entity(), 10).await.unwrap();

    assert_eq!(found.len(), 4);
    let calls = provider.calls();
    assert_eq!(calls.len(), 2);
    assert_ne!(calls[0].0, calls[1].0);
}

#[tokio::test]
async fn test_every_credential_rejected() {
    let provider = ScriptedProvider::new(
        10,
        vec![
            Err(ProviderError::RateLimited("429".into())),
            Err(ProviderError::Unauthorized("401".into())),
            Err(ProviderError::RateLimited("429".into())),
        ],
    );
    let dispatcher = QueryDispatcher::new(provider.clone(), pool(3, 100), fast_retry(5));

    let err = dispatcher.search(&entity(), 10).await.unwrap_err();

    assert!(matches!(err, SearchFailed::CredentialsExhausted(_)));
    assert_eq!(provider.calls().len(), 3);
}

#[tokio::test]
async fn test_quota_exhausted_is_terminal() {
    let provider = ScriptedProvider::new(10, vec![Ok(urls("a", 10))]);
    let dispatcher = QueryDispatcher::new(provider.clone(), pool(2, 0), fast_retry(3));

    let err = dispatcher.search(&entity(), 10).await.unwrap_err();

    assert_eq!(err, SearchFailed::QuotaExhausted);
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_later_page_failure_keeps_partial_results() {
    let provider = ScriptedProvider::new(
        10,
        vec![Ok(urls("a", 10)), Err(ProviderError::Invalid("400".into()))],
    );
    let dispatcher = QueryDispatcher::new(provider, pool(1, 100), fast_retry(0));

    let found = dispatcher.search(&entity(), 20).await.unwrap();

    assert_eq!(found.len(), 10);
}

#[tokio::test]
async fn test_empty_display_name_is_invalid() {
    let provider = ScriptedProvider::new(10, Vec::new());
    let dispatcher = QueryDispatcher::new(provider.clone(), pool(1, 100), fast_retry(0));

    let err = dispatcher.search(&TrackedEntity::new(9, "  "), 10).await.unwrap_err();

    assert!(matches!(err, SearchFailed::Invalid(_)));
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_rate_limited_dispatcher_still_completes() {
    let provider = ScriptedProvider::new(10, vec![Ok(urls("a", 10)), Ok(urls("b", 10))]);
    let dispatcher =
        QueryDispatcher::new(provider, pool(1, 100), fast_retry(0)).with_rate_limit(100);

    let found = dispatcher.search(&entity(), 20).await.unwrap();
    assert_eq!(found.len(), 20);
}

#[tokio::test]
async fn test_repeated_page_stops_paging() {
    let same = urls("a", 10);
    let provider = ScriptedProvider::new(10, (0..5).map(|_| Ok(same.clone())).collect());
    let dispatcher = QueryDispatcher::new(provider.clone(), pool(1, 100), fast_retry(0));

    let found = dispatcher.search(&entity(), 50).await.unwrap();

    assert_eq!(found, same);
    assert_eq!(provider.calls().len(), 2);
}

#[tokio::test]
async fn test_page_count_is_bounded_by_desired_count() {
    let page = |prefix: &str| -> Vec<String> {
        let mut half = urls(prefix, 5);
        half.extend(urls(prefix, 5));
        half
    };
    let provider = ScriptedProvider::new(
        10,
        vec![Ok(page("a")), Ok(page("b")), Ok(page("c")), Ok(page("d"))],
    );
    let dispatcher = QueryDispatcher::new(provider.clone(), pool(1, 100), fast_retry(0));

    let found = dispatcher.search(&entity(), 20).await.unwrap();

    assert_eq!(found.len(), 10);
    assert_eq!(provider.calls().len(), 2);
}
