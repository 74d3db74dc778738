// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 定时任务调度模块
///
/// 命名的 cron 任务注册、启停、手动触发和状态查询
pub mod schedule_config;
pub mod task;
pub mod task_scheduler;
