// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "augments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub name: String,
    pub icon_url: Option<String>,
    pub tier: Option<String>,
    #[sea_orm(column_type = "Double", nullable)]
    pub avg_placement: Option<f64>,
    #[sea_orm(column_type = "Double", nullable)]
    pub top4_rate: Option<f64>,
    #[sea_orm(column_type = "Double", nullable)]
    pub win_rate: Option<f64>,
    #[sea_orm(column_type = "Double", nullable)]
    pub pick_rate: Option<f64>,
    pub games: Option<i64>,
    pub source: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
