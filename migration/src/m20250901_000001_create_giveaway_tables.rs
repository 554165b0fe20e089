use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Statement;

/// Prizes (奖品表)
#[derive(DeriveIden)]
enum Prizes {
    Table,
    Id,
    Name,
    Description,
    Quantity,
    ImageUrl,
    CreatedAt,
    UpdatedAt,
}

/// Participants (参与者表)
#[derive(DeriveIden)]
enum Participants {
    Table,
    Id,
    Name,
    Email,
    Phone,
    Address,
    CreatedAt,
}

/// Winners (中奖记录表)
#[derive(DeriveIden)]
enum Winners {
    Table,
    Id,
    PrizeId,
    ParticipantId,
    DrawDate,
    Notes,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 中奖记录随奖品/参与者删除而级联删除；
/// 同一参与者对同一奖品最多一条中奖记录 (prize_id, participant_id 唯一)
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Prizes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Prizes::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Prizes::Name).string_len(100).not_null())
                    .col(
                        ColumnDef::new(Prizes::Description)
                            .string_len(500)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Prizes::Quantity)
                            .integer()
                            .not_null()
                            .check(Expr::col(Prizes::Quantity).between(0, 1000)),
                    )
                    .col(ColumnDef::new(Prizes::ImageUrl).string_len(500).null())
                    .col(
                        ColumnDef::new(Prizes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(Prizes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // 奖品名唯一
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_prizes_name_unique")
                    .table(Prizes::Table)
                    .col(Prizes::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Participants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Participants::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Participants::Name)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Participants::Email)
                            .string_len(254)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Participants::Phone).string_len(20).null())
                    .col(
                        ColumnDef::new(Participants::Address)
                            .string_len(500)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Participants::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // 邮箱大小写不敏感唯一 (表达式索引, schema builder 不支持)
        let conn = manager.get_connection();
        conn.execute(Statement::from_string(
            manager.get_database_backend(),
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_participants_email_lower_unique \
             ON participants (LOWER(email));"
                .to_string(),
        ))
        .await?;

        manager
            .create_table(
                Table::create()
                    .table(Winners::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Winners::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Winners::PrizeId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Winners::ParticipantId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Winners::DrawDate)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(ColumnDef::new(Winners::Notes).text().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_winners_prize")
                            .from(Winners::Table, Winners::PrizeId)
                            .to(Prizes::Table, Prizes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_winners_participant")
                            .from(Winners::Table, Winners::ParticipantId)
                            .to(Participants::Table, Participants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_winners_prize_participant_unique")
                    .table(Winners::Table)
                    .col(Winners::PrizeId)
                    .col(Winners::ParticipantId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 中奖历史按时间倒序查询
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_winners_draw_date")
                    .table(Winners::Table)
                    .col(Winners::DrawDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 删除顺序：中奖记录 -> 参与者 -> 奖品
        manager
            .drop_table(Table::drop().if_exists().table(Winners::Table).to_owned())
            .await?;

        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(Participants::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().if_exists().table(Prizes::Table).to_owned())
            .await?;

        Ok(())
    }
}
