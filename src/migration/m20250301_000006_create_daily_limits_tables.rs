use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum DailyPostLimits {
    Table,
    Id,
    UserId,
    Date,
    PostCount,
    MaxPosts,
}

#[derive(DeriveIden)]
enum DailyQuestionLimits {
    Table,
    Id,
    UserId,
    Date,
    QuestionCount,
    MaxQuestions,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DailyPostLimits::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DailyPostLimits::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DailyPostLimits::UserId).integer().not_null())
                    .col(ColumnDef::new(DailyPostLimits::Date).date().not_null())
                    .col(
                        ColumnDef::new(DailyPostLimits::PostCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(DailyPostLimits::MaxPosts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_daily_post_limits_user_id")
                            .from(DailyPostLimits::Table, DailyPostLimits::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_daily_post_limits_user_date")
                    .table(DailyPostLimits::Table)
                    .col(DailyPostLimits::UserId)
                    .col(DailyPostLimits::Date)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DailyQuestionLimits::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DailyQuestionLimits::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DailyQuestionLimits::UserId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DailyQuestionLimits::Date).date().not_null())
                    .col(
                        ColumnDef::new(DailyQuestionLimits::QuestionCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(DailyQuestionLimits::MaxQuestions)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_daily_question_limits_user_id")
                            .from(DailyQuestionLimits::Table, DailyQuestionLimits::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_daily_question_limits_user_date")
                    .table(DailyQuestionLimits::Table)
                    .col(DailyQuestionLimits::UserId)
                    .col(DailyQuestionLimits::Date)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DailyQuestionLimits::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DailyPostLimits::Table).to_owned())
            .await
    }
}
