// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用层模块
///
/// 编排抓取、校验和存储，并把每种实体类型注册为定时任务
pub mod use_cases;
