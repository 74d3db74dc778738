// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 统计字段，四张数据集表共用
fn stat_columns(table: &mut TableCreateStatement) {
    table
        .col(ColumnDef::new(Stats::AvgPlacement).double().null())
        .col(ColumnDef::new(Stats::Top4Rate).double().null())
        .col(ColumnDef::new(Stats::WinRate).double().null())
        .col(ColumnDef::new(Stats::PickRate).double().null())
        .col(ColumnDef::new(Stats::Games).big_integer().null())
        .col(ColumnDef::new(Stats::Source).string().not_null())
        .col(
            ColumnDef::new(Stats::CreatedAt)
                .timestamp_with_time_zone()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .col(
            ColumnDef::new(Stats::UpdatedAt)
                .timestamp_with_time_zone()
                .not_null()
                .default(Expr::current_timestamp()),
        );
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut champions = Table::create();
        champions
            .table(Champions::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(Champions::Name)
                    .string()
                    .not_null()
                    .primary_key()
                    .check(Expr::col(Champions::Name).ne("")),
            )
            .col(ColumnDef::new(Champions::IconUrl).string().null())
            .col(ColumnDef::new(Champions::Cost).integer().null())
            .col(ColumnDef::new(Champions::Tier).string().null())
            .col(ColumnDef::new(Champions::Traits).json().not_null());
        stat_columns(&mut champions);
        manager.create_table(champions.to_owned()).await?;

        let mut items = Table::create();
        items
            .table(Items::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(Items::Name)
                    .string()
                    .not_null()
                    .primary_key()
                    .check(Expr::col(Items::Name).ne("")),
            )
            .col(ColumnDef::new(Items::IconUrl).string().null())
            .col(ColumnDef::new(Items::Category).string().null())
            .col(ColumnDef::new(Items::Components).json().not_null());
        stat_columns(&mut items);
        manager.create_table(items.to_owned()).await?;

        let mut augments = Table::create();
        augments
            .table(Augments::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(Augments::Name)
                    .string()
                    .not_null()
                    .primary_key()
                    .check(Expr::col(Augments::Name).ne("")),
            )
            .col(ColumnDef::new(Augments::IconUrl).string().null())
            .col(ColumnDef::new(Augments::Tier).string().null());
        stat_columns(&mut augments);
        manager.create_table(augments.to_owned()).await?;

        let mut comps = Table::create();
        comps
            .table(Comps::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(Comps::Id)
                    .string()
                    .not_null()
                    .primary_key()
                    .check(Expr::col(Comps::Id).ne("")),
            )
            .col(ColumnDef::new(Comps::Name).string().not_null())
            .col(ColumnDef::new(Comps::Tier).string().null())
            .col(ColumnDef::new(Comps::Champions).json().not_null())
            .col(ColumnDef::new(Comps::Traits).json().not_null());
        stat_columns(&mut comps);
        manager.create_table(comps.to_owned()).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Comps::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Augments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Items::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Champions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Champions {
    Table,
    Name,
    IconUrl,
    Cost,
    Tier,
    Traits,
}

#[derive(DeriveIden)]
enum Items {
    Table,
    Name,
    IconUrl,
    Category,
    Components,
}

#[derive(DeriveIden)]
enum Augments {
    Table,
    Name,
    IconUrl,
    Tier,
}

#[derive(DeriveIden)]
enum Comps {
    Table,
    Id,
    Name,
    Tier,
    Champions,
    Traits,
}

#[derive(DeriveIden)]
enum Stats {
    AvgPlacement,
    #[sea_orm(iden = "top4_rate")]
    Top4Rate,
    WinRate,
    PickRate,
    Games,
    Source,
    CreatedAt,
    UpdatedAt,
}
