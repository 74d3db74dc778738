// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::entity_type::EntityType;
use tracing::warn;

/// 各实体类型的默认调度，阵容变化最快，更新最频繁
pub fn default_schedule(entity: EntityType) -> &'static str {
    match entity {
        EntityType::Champions => "0 3 * * *",
        EntityType::Items => "15 3 * * *",
        EntityType::Augments => "30 3 * * *",
        EntityType::Comps => "0 */6 * * *",
    }
}

/// 从环境变量解析出的任务调度
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSpec {
    pub expression: String,
    pub enabled: bool,
}

/// 解析任务的调度配置
///
/// 读取 `<PREFIX>_<TASK>_SCHEDULE` 和 `<PREFIX>_<TASK>_ENABLED`，缺省时使用默认值
///
/// # 参数
///
/// * `prefix` - 环境变量前缀
/// * `task` - 任务名，转为大写
/// * `default_expression` - 未配置时使用的表达式
/// * `lookup` - 环境变量读取函数
pub fn resolve_schedule<F>(prefix: &str, task: &str, default_expression: &str, lookup: F) -> ScheduleSpec
where
    F: Fn(&str) -> Option<String>,
{
    let base = format!("{}_{}", prefix, task.to_uppercase());

    let expression = lookup(&format!("{}_SCHEDULE", base))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default_expression.to_string());

    let enabled_key = format!("{}_ENABLED", base);
    let enabled = match lookup(&enabled_key) {
        Some(raw) => parse_flag(&raw).unwrap_or_else(|| {
            warn!("Ignoring unparseable {}={}", enabled_key, raw);
            true
        }),
        None => true,
    };

    ScheduleSpec {
        expression,
        enabled,
    }
}

/// 读取 `<PREFIX>_RUN_ON_STARTUP`
pub fn run_on_startup<F>(prefix: &str, lookup: F) -> Option<bool>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(&format!("{}_RUN_ON_STARTUP", prefix)).and_then(|raw| parse_flag(&raw))
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

const WEEKDAYS: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

/// 将标准 5 字段 cron 转换为调度后端的秒级 6 字段格式
///
/// 后端的星期数字从 1（周日）开始，与标准格式不同，这里统一转成英文缩写。
/// 已经是 6 或 7 字段的表达式原样返回。
pub fn normalize_cron(expression: &str) -> Result<String, String> {
    let fields: Vec<&str> = expression.split_whitespace().collect();
    match fields.len() {
        5 => {
            let day_of_week = normalize_day_of_week(fields[4])?;
            Ok(format!(
                "0 {} {} {} {} {}",
                fields[0], fields[1], fields[2], fields[3], day_of_week
            ))
        }
        6 | 7 => Ok(fields.join(" ")),
        n => Err(format!("expected 5 fields, found {}", n)),
    }
}

fn normalize_day_of_week(field: &str) -> Result<String, String> {
    let items: Result<Vec<String>, String> = field
        .split(',')
        .map(|item| -> Result<String, String> {
            let (range, step) = match item.split_once('/') {
                Some((range, step)) => (range, Some(step)),
                None => (item, None),
            };
            let range = if range == "*" || range == "?" {
                range.to_string()
            } else {
                range
                    .split('-')
                    .map(weekday_name)
                    .collect::<Result<Vec<_>, _>>()?
                    .join("-")
            };
            Ok(match step {
                Some(step) => format!("{}/{}", range, step),
                None => range,
            })
        })
        .collect();
    Ok(items?.join(","))
}

fn weekday_name(value: &str) -> Result<String, String> {
    match value.parse::<usize>() {
        Ok(n) if n <= 7 => Ok(WEEKDAYS[n % 7].to_string()),
        Ok(n) => Err(format!("day of week {} out of range", n)),
        Err(_) => Ok(value.to_ascii_uppercase()),
    }
}
