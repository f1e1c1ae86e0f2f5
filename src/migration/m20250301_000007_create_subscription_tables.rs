use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum SubscriptionPlans {
    Table,
    Id,
    Name,
    Price,
    Currency,
    MaxQuestionsPerDay,
    Description,
    Features,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum UserSubscriptions {
    Table,
    Id,
    UserId,
    PlanId,
    Status,
    StartDate,
    EndDate,
    PaymentId,
    PaymentProvider,
    PaymentAmount,
    PaymentCurrency,
    PaymentStatus,
    AutoRenew,
    CreatedAt,
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
                    .table(SubscriptionPlans::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SubscriptionPlans::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SubscriptionPlans::Name)
                            .string_len(50)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(SubscriptionPlans::Price).integer().not_null())
                    .col(
                        ColumnDef::new(SubscriptionPlans::Currency)
                            .string_len(10)
                            .not_null()
                            .default("INR"),
                    )
                    .col(
                        ColumnDef::new(SubscriptionPlans::MaxQuestionsPerDay)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SubscriptionPlans::Description)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SubscriptionPlans::Features)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(SubscriptionPlans::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(SubscriptionPlans::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserSubscriptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserSubscriptions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserSubscriptions::UserId).integer().not_null())
                    .col(ColumnDef::new(UserSubscriptions::PlanId).integer().not_null())
                    .col(
                        ColumnDef::new(UserSubscriptions::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(UserSubscriptions::StartDate)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserSubscriptions::EndDate)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserSubscriptions::PaymentId)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserSubscriptions::PaymentProvider)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserSubscriptions::PaymentAmount)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserSubscriptions::PaymentCurrency)
                            .string_len(10)
                            .not_null()
                            .default("INR"),
                    )
                    .col(
                        ColumnDef::new(UserSubscriptions::PaymentStatus)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(UserSubscriptions::AutoRenew)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(UserSubscriptions::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(UserSubscriptions::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_subscriptions_user_id")
                            .from(UserSubscriptions::Table, UserSubscriptions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_subscriptions_plan_id")
                            .from(UserSubscriptions::Table, UserSubscriptions::PlanId)
                            .to(SubscriptionPlans::Table, SubscriptionPlans::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_subscriptions_user_status")
                    .table(UserSubscriptions::Table)
                    .col(UserSubscriptions::UserId)
                    .col(UserSubscriptions::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_subscriptions_end_date")
                    .table(UserSubscriptions::Table)
                    .col(UserSubscriptions::EndDate)
                    .to_owned(),
            )
            .await?;

        // Plan catalog (static reference data)
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                INSERT INTO subscription_plans
                    (name, price, currency, max_questions_per_day, description, features, is_active)
                VALUES
                    ('Free', 0, 'INR', 1, 'Free plan with limited question posting',
                     '["1 question per day", "Basic features"]'::jsonb, true),
                    ('Bronze', 100, 'INR', 5, 'Bronze plan with 5 questions per day',
                     '["5 questions per day", "Priority support", "Advanced features"]'::jsonb, true),
                    ('Silver', 300, 'INR', 10, 'Silver plan with 10 questions per day',
                     '["10 questions per day", "Priority support", "Advanced features", "Analytics"]'::jsonb, true),
                    ('Gold', 1000, 'INR', 999, 'Gold plan with unlimited questions',
                     '["Unlimited questions", "Priority support", "All advanced features", "Analytics", "Custom branding"]'::jsonb, true)
                ON CONFLICT (name) DO NOTHING
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserSubscriptions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SubscriptionPlans::Table).to_owned())
            .await
    }
}
