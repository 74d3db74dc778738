// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 抓取 → 校验 → 存储的用例编排和任务注册
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含数据集记录模型、校验服务和仓库接口
pub mod domain;

/// 引擎模块
///
/// 浏览器与 HTTP 抓取来源、会话管理和降级链
pub mod engines;

/// 基础设施模块
///
/// 数据库、仓库实现和指标导出
pub mod infrastructure;

/// 表示层模块
///
/// 调度器的 HTTP 接口
pub mod presentation;

/// 调度模块
///
/// 命名 cron 任务的注册、启停和手动触发
pub mod scheduler;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;
