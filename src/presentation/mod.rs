// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 表示层模块
///
/// 调度器状态查询与手动触发的 HTTP 接口
pub mod errors;
pub mod handlers;
pub mod routes;
