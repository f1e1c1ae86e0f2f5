use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum LoginHistory {
    Table,
    Id,
    UserId,
    IpAddress,
    BrowserName,
    BrowserVersion,
    OsName,
    Device,
    Status,
    FailureReason,
    CreatedAt,
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
                    .table(LoginHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LoginHistory::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    // nullable: failed attempts may precede identification
                    .col(ColumnDef::new(LoginHistory::UserId).integer().null())
                    .col(
                        ColumnDef::new(LoginHistory::IpAddress)
                            .string_len(45)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LoginHistory::BrowserName)
                            .string_len(50)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(LoginHistory::BrowserVersion)
                            .string_len(50)
                            .null(),
                    )
                    .col(ColumnDef::new(LoginHistory::OsName).string_len(50).null())
                    .col(
                        ColumnDef::new(LoginHistory::Device)
                            .string_len(20)
                            .not_null()
                            .default("desktop"),
                    )
                    .col(ColumnDef::new(LoginHistory::Status).string_len(10).not_null())
                    .col(
                        ColumnDef::new(LoginHistory::FailureReason)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(LoginHistory::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_login_history_user_id")
                            .from(LoginHistory::Table, LoginHistory::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_login_history_user_created_at")
                    .table(LoginHistory::Table)
                    .col(LoginHistory::UserId)
                    .col(LoginHistory::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LoginHistory::Table).to_owned())
            .await
    }
}
