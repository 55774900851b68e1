// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,mentionrs=debug,sqlx=warn";

/// 初始化日志订阅器
///
/// `verbose` 为真时忽略 `RUST_LOG`，统一输出 debug 级别
pub fn init_telemetry(verbose: bool, json: bool) {
    let filter = if verbose {
        EnvFilter::new("debug,sqlx=info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into())
    };

    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
