// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::Url;

/// 无法解析主机名时使用的域名
pub const UNKNOWN_DOMAIN: &str = "unknown";

/// 从 URL 中提取域名，去掉开头的 `www.` 标签
///
/// 解析失败或没有主机名时返回 [`UNKNOWN_DOMAIN`]
pub fn extract_domain(raw: &str) -> String {
    Url::parse(raw.trim())
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
        .map(|host| match host.strip_prefix("www.") {
            Some(rest) if !rest.is_empty() => rest.to_string(),
            _ => host,
        })
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| UNKNOWN_DOMAIN.to_string())
}

/// 是否为可抓取的 http(s) 链接
pub fn is_fetchable(raw: &str) -> bool {
    Url::parse(raw.trim())
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}
