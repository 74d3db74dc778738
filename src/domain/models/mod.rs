// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 定义数据集实体类型、抓取记录和抓取结果
pub mod entity_type;
pub mod extraction;
pub mod record;
