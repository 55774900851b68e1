// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 网页正文清洗工具
//!
//! 负责把 HTML 文档转换为纯文本：去掉脚本、样式和导航类标记，
//! 合并空白字符，并原样保留所有 Unicode 文字（包括中日韩等非拉丁文字）。

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::{HashMap, HashSet};

/// 整个子树都会被丢弃的标签
const SKIPPED_TAGS: &[&str] = &[
    "head", "script", "style", "noscript", "template", "iframe", "svg", "canvas", "object",
    "embed", "nav", "header", "footer", "aside", "form", "button", "select",
];

/// class / id 中出现即视为导航或广告区块的标记
const BOILERPLATE_MARKERS: &[&str] = &[
    "nav", "navbar", "navigation", "menu", "sidebar", "breadcrumb", "breadcrumbs", "ad", "ads",
    "advert", "advertisement", "banner", "cookie", "cookies", "footer", "header", "share",
    "social",
];

/// 置信度下限
const MIN_CONFIDENCE: f64 = 0.5;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static PUBLISHED_SELECTORS: Lazy<Vec<(Selector, &'static str)>> = Lazy::new(|| {
    [
        (r#"meta[property="article:published_time"]"#, "content"),
        (r#"meta[property="og:published_time"]"#, "content"),
        (r#"meta[itemprop="datePublished"]"#, "content"),
        (r#"meta[name="pubdate"]"#, "content"),
        (r#"meta[name="publishdate"]"#, "content"),
        (r#"meta[name="date"]"#, "content"),
        ("time[datetime]", "datetime"),
    ]
    .into_iter()
    .filter_map(|(css, attr)| Selector::parse(css).ok().map(|s| (s, attr)))
    .collect()
});

/// 关键词统计时忽略的常见虚词
static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "的", "了", "是", "在", "不", "我", "他", "她", "它", "们", "中", "上", "下", "和", "或",
        "及", "与", "但", "等", "个", "首", "一", "一个", "这", "那", "也", "就", "都", "而",
        "the", "and", "for", "are", "but", "not", "you", "with", "this", "that", "from", "was",
        "were", "has", "have", "had", "his", "her", "its", "our", "their", "they", "them", "will",
        "would", "can", "could", "about", "into", "than", "then", "there", "what", "when",
        "which", "who", "how", "all", "any", "more", "most", "some", "such", "only", "also",
        "been", "being", "over", "after", "before", "said", "a", "an", "of", "to", "in", "on",
        "at", "by", "is", "it", "as", "or", "be", "if", "so", "no", "up", "we", "he", "she",
    ]
    .into_iter()
    .collect()
});

/// 清洗后的文档
#[derive(Debug, Clone)]
pub struct CleanedDocument {
    /// 清洗后的正文
    pub text: String,
    /// 归一化之前收集到的文本字符数（已去除标记）
    pub raw_chars: usize,
    /// 发布时间（若页面声明）
    pub published_at: Option<DateTime<FixedOffset>>,
}

/// 清洗 HTML 文档
pub fn clean_html(html: &str) -> CleanedDocument {
    let document = Html::parse_document(html);

    let mut raw = String::with_capacity(html.len() / 4);
    collect_text(document.root_element(), &mut raw);

    CleanedDocument {
        raw_chars: raw.chars().count(),
        text: normalize_text(&raw),
        published_at: find_published_at(&document),
    }
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    if !out.is_empty() {
                        out.push(' ');
                    }
                    out.push_str(text);
                }
            }
            Node::Element(_) => {
                if let Some(el) = ElementRef::wrap(child) {
                    if !is_boilerplate(&el) {
                        collect_text(el, out);
                    }
                }
            }
            _ => {}
        }
    }
}

fn is_boilerplate(element: &ElementRef<'_>) -> bool {
    let value = element.value();
    if SKIPPED_TAGS.contains(&value.name()) {
        return true;
    }
    if value.attr("hidden").is_some() || value.attr("aria-hidden") == Some("true") {
        return true;
    }
    let marked = |token: &str| {
        let token = token.to_ascii_lowercase();
        BOILERPLATE_MARKERS.contains(&token.as_str())
    };
    value.id().is_some_and(marked) || value.classes().any(marked)
}

/// 合并空白并移除控制字符，其余字符原样保留
pub fn normalize_text(input: &str) -> String {
    let without_controls: String = input
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .collect();
    WHITESPACE
        .replace_all(&without_controls, " ")
        .trim()
        .to_string()
}

fn find_published_at(document: &Html) -> Option<DateTime<FixedOffset>> {
    PUBLISHED_SELECTORS.iter().find_map(|(selector, attr)| {
        document
            .select(selector)
            .filter_map(|el| el.value().attr(attr))
            .find_map(parse_timestamp)
    })
}

/// 解析页面中常见的时间格式
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive).fixed_offset());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive).fixed_offset());
    }
    NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive).fixed_offset())
}

/// 将数值限制在 [0, 1]，非有限值视为 0
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// 计算提取置信度
///
/// 归一化后正文占去除标记后文本的比例分档打分，最低 0.5；正文短于
/// `min_length` 时按长度比例折减。结果始终位于 [0, 1]。
///
/// # 参数
///
/// * `cleaned_chars` - 清洗后正文字符数
/// * `raw_chars` - 归一化之前的文本字符数
/// * `min_length` - 最小有效正文长度
pub fn confidence_score(cleaned_chars: usize, raw_chars: usize, min_length: usize) -> f64 {
    if cleaned_chars == 0 {
        return 0.0;
    }

    let ratio = if raw_chars == 0 {
        0.0
    } else {
        cleaned_chars as f64 / raw_chars as f64
    };
    let base = if ratio >= 0.7 {
        0.95
    } else if ratio >= 0.5 {
        0.85
    } else if ratio >= 0.3 {
        0.70
    } else if ratio >= 0.1 {
        0.50
    } else {
        MIN_CONFIDENCE
    };

    let length_factor = if min_length > 0 && cleaned_chars < min_length {
        cleaned_chars as f64 / min_length as f64
    } else {
        1.0
    };

    clamp_unit(base * length_factor)
}

/// 按词频提取前 `top_n` 个关键词
///
/// 以空白切分，去掉首尾标点、单字符词和停用词；频次相同按首次出现顺序排列
pub fn extract_keywords(text: &str, top_n: usize) -> Vec<String> {
    let mut freq: HashMap<String, (usize, usize)> = HashMap::new();

    for (position, token) in text.split_whitespace().enumerate() {
        let word = token
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        if word.chars().count() <= 1 || STOPWORDS.contains(word.as_str()) {
            continue;
        }
        freq.entry(word)
            .and_modify(|(count, _)| *count += 1)
            .or_insert((1, position));
    }

    let mut ranked: Vec<(String, usize, usize)> = freq
        .into_iter()
        .map(|(word, (count, first))| (word, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.into_iter().take(top_n).map(|(word, _, _)| word).collect()
}
