// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::MetricsSettings;
use metrics::{describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("invalid metrics listen address {0}")]
    InvalidAddress(String),
    #[error("failed to install Prometheus exporter: {0}")]
    Install(String),
}

/// 启动 Prometheus 导出器并注册指标说明
///
/// 未启用时只注册说明，记录的指标由空记录器丢弃
pub fn init_metrics(settings: &MetricsSettings) -> Result<(), MetricsError> {
    if settings.enabled {
        let addr: SocketAddr = settings
            .listen_addr
            .parse()
            .map_err(|_| MetricsError::InvalidAddress(settings.listen_addr.clone()))?;

        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .map_err(|e| MetricsError::Install(e.to_string()))?;

        info!("Metrics exporter listening on {}", addr);
    }

    describe_metrics();
    Ok(())
}

fn describe_metrics() {
    describe_counter!("mentions_inserted_total", "Mentions newly written to the store");
    describe_counter!(
        "mentions_duplicate_total",
        "Mentions skipped because (entity_id, source_url) already existed"
    );
    describe_counter!("urls_failed_total", "URLs that could not be fetched, extracted or stored");
    describe_counter!(
        "search_requests_total",
        "Search API calls by outcome (ok, rejected, transient, invalid, quota_exhausted)"
    );
    describe_counter!(
        "search_entities_failed_total",
        "Entities whose search failed on the first page"
    );
    describe_histogram!(
        "entity_duration_seconds",
        Unit::Seconds,
        "Wall time spent on one entity"
    );
}
