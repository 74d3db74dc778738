// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 数据库实体模块
///
/// 每种实体类型一张表，阵容详情单独一张表
pub mod augment;
pub mod champion;
pub mod comp;
pub mod comp_detail;
pub mod item;
