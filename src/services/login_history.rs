use crate::{
    error::AppResult,
    models::{login_history, LoginHistory, LoginHistoryModel},
    utils::ClientInfo,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

pub struct LoginHistoryService {
    db: DatabaseConnection,
}

impl LoginHistoryService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Append one attempt to the audit log. Never fails the caller — a
    /// login must not bounce because the log write hiccupped.
    pub async fn record(
        &self,
        user_id: Option<i32>,
        ip_address: &str,
        client: &ClientInfo,
        status: &str,
        failure_reason: Option<&str>,
    ) {
        let row = login_history::ActiveModel {
            user_id: Set(user_id),
            ip_address: Set(ip_address.to_string()),
            browser_name: Set(client.browser_name.clone()),
            browser_version: Set(client.browser_version.clone()),
            os_name: Set(client.os_name.clone()),
            device: Set(client.device.as_str().to_string()),
            status: Set(status.to_string()),
            failure_reason: Set(failure_reason.map(str::to_string)),
            created_at: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        };

        if let Err(e) = row.insert(&self.db).await {
            tracing::error!("Failed to record login attempt: {:?}", e);
        }
    }

    /// Most recent attempts for a user, newest first.
    pub async fn history(&self, user_id: i32, limit: u64) -> AppResult<Vec<LoginHistoryModel>> {
        let rows = LoginHistory::find()
            .filter(login_history::Column::UserId.eq(user_id))
            .order_by_desc(login_history::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    /// IPs of the last five successful logins, for anomaly signalling.
    pub async fn recent_success_ips(&self, user_id: i32) -> AppResult<Vec<String>> {
        let rows = LoginHistory::find()
            .filter(login_history::Column::UserId.eq(user_id))
            .filter(login_history::Column::Status.eq("success"))
            .order_by_desc(login_history::Column::CreatedAt)
            .limit(5)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(|r| r.ip_address).collect())
    }

    /// Log a warning when a successful login arrives from an IP the user
    /// has not used recently. Signal only — nothing is blocked.
    pub async fn flag_unusual_login(&self, user_id: i32, current_ip: &str) {
        match self.recent_success_ips(user_id).await {
            Ok(known_ips) => {
                if !known_ips.is_empty() && !known_ips.iter().any(|ip| ip == current_ip) {
                    tracing::warn!(
                        user_id,
                        ip = current_ip,
                        "login from an IP not seen in recent history"
                    );
                }
            }
            Err(e) => tracing::error!("Unusual-login check failed: {:?}", e),
        }
    }
}
