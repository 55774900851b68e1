// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use tracing::debug;

/// 只在文档开头查找 `<meta charset>` 声明
const META_SNIFF_LIMIT: usize = 4096;

static META_CHARSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta[^>]*charset\s*=\s*["']?\s*([A-Za-z0-9_\-:.]+)"#).unwrap()
});

static HEADER_CHARSET: Lazy<regex::Regex> =
    Lazy::new(|| regex::Regex::new(r#"(?i)charset\s*=\s*["']?([^;"'\s]+)"#).unwrap());

/// 从 Content-Type 头中提取字符集标签
pub fn charset_from_content_type(content_type: &str) -> Option<String> {
    HEADER_CHARSET
        .captures(content_type)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_ascii_lowercase())
}

/// 将网页字节解码为 UTF-8 字符串
///
/// 优先级：响应头声明的字符集、文档内 `<meta charset>`、合法 UTF-8、`chardetng` 检测。
/// 非 UTF-8 字节以替换字符输出，不会失败。
///
/// # 参数
///
/// * `body` - 原始响应字节
/// * `declared` - 响应头中的字符集标签
///
/// # 返回值
///
/// 解码后的文本和实际使用的编码
pub fn decode_html(body: &[u8], declared: Option<&str>) -> (String, &'static Encoding) {
    let encoding = declared
        .and_then(|label| Encoding::for_label(label.trim().as_bytes()))
        .or_else(|| sniff_meta_charset(body))
        .unwrap_or_else(|| detect_encoding(body));

    // BOM 优先于任何声明
    let (decoded, used, had_errors) = encoding.decode(body);
    if had_errors {
        debug!(encoding = used.name(), "decoded page with replacement characters");
    }
    (decoded.into_owned(), used)
}

fn sniff_meta_charset(body: &[u8]) -> Option<&'static Encoding> {
    let head = &body[..body.len().min(META_SNIFF_LIMIT)];
    let label = META_CHARSET.captures(head)?.get(1)?;
    // meta 中声明的 UTF-16 按 UTF-8 处理
    Encoding::for_label(label.as_bytes()).map(|e| e.output_encoding())
}

fn detect_encoding(body: &[u8]) -> &'static Encoding {
    if std::str::from_utf8(body).is_ok() {
        return UTF_8;
    }
    let mut detector = EncodingDetector::new();
    detector.feed(body, true);
    let guessed = detector.guess(None, true);
    debug!(encoding = guessed.name(), "detected page encoding");
    guessed
}
