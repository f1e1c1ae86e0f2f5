use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum LoginOtps {
    Table,
    Id,
    UserId,
    Code,
    ExpiresAt,
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
                    .table(LoginOtps::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LoginOtps::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    // one pending code per user; a reissue replaces it
                    .col(
                        ColumnDef::new(LoginOtps::UserId)
                            .integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(LoginOtps::Code).string_len(10).not_null())
                    .col(ColumnDef::new(LoginOtps::ExpiresAt).timestamp().not_null())
                    .col(
                        ColumnDef::new(LoginOtps::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_login_otps_user_id")
                            .from(LoginOtps::Table, LoginOtps::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LoginOtps::Table).to_owned())
            .await
    }
}
