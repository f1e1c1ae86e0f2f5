use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum UserLanguages {
    Table,
    Id,
    UserId,
    Language,
    OtpCode,
    OtpExpiresAt,
    PendingLanguage,
    UpdatedAt,
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
                    .table(UserLanguages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserLanguages::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UserLanguages::UserId)
                            .integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(UserLanguages::Language)
                            .string_len(10)
                            .not_null()
                            .default("en"),
                    )
                    .col(ColumnDef::new(UserLanguages::OtpCode).string_len(10).null())
                    .col(ColumnDef::new(UserLanguages::OtpExpiresAt).timestamp().null())
                    .col(
                        ColumnDef::new(UserLanguages::PendingLanguage)
                            .string_len(10)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(UserLanguages::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_languages_user_id")
                            .from(UserLanguages::Table, UserLanguages::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserLanguages::Table).to_owned())
            .await
    }
}
