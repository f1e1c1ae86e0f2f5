use sea_orm_migration::prelude::*;

mod m20250301_000001_create_users_table;
mod m20250301_000002_create_questions_tables;
mod m20250301_000003_create_votes_table;
mod m20250301_000004_create_rewards_tables;
mod m20250301_000005_create_friendships_table;
mod m20250301_000006_create_daily_limits_tables;
mod m20250301_000007_create_subscription_tables;
mod m20250301_000008_create_password_resets_table;
mod m20250301_000009_create_login_history_table;
mod m20250301_000010_create_user_languages_table;
mod m20250301_000011_create_login_otps_table;
mod m20250301_000012_create_feed_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_users_table::Migration),
            Box::new(m20250301_000002_create_questions_tables::Migration),
            Box::new(m20250301_000003_create_votes_table::Migration),
            Box::new(m20250301_000004_create_rewards_tables::Migration),
            Box::new(m20250301_000005_create_friendships_table::Migration),
            Box::new(m20250301_000006_create_daily_limits_tables::Migration),
            Box::new(m20250301_000007_create_subscription_tables::Migration),
            Box::new(m20250301_000008_create_password_resets_table::Migration),
            Box::new(m20250301_000009_create_login_history_table::Migration),
            Box::new(m20250301_000010_create_user_languages_table::Migration),
            Box::new(m20250301_000011_create_login_otps_table::Migration),
            Box::new(m20250301_000012_create_feed_tables::Migration),
        ]
    }
}
