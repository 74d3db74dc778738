// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use regex::Regex;

static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-?\d+(?:\.\d+)?").expect("valid number regex"));

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// 压缩空白并去除首尾空白
pub fn clean_text(raw: &str) -> String {
    WHITESPACE_RE.replace_all(raw.trim(), " ").into_owned()
}

/// 从展示文本中解析数值
///
/// 支持 `"4.32"`、`"58.1%"`、`"#4.5"`、`"12,345"` 等格式，取第一个数字
pub fn parse_number(raw: &str) -> Option<f64> {
    let without_separators = raw.replace(',', "");
    NUMBER_RE
        .find(&without_separators)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// 从展示文本中解析整数（如 `"3 gold"`、`"1,024 games"`）
pub fn parse_integer(raw: &str) -> Option<i64> {
    parse_number(raw).map(|v| v.round() as i64)
}

/// 生成稳定的 slug：小写字母数字，其余字符折叠为单个 `-`
pub fn slugify(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    let mut pending_dash = false;
    for ch in raw.chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}
