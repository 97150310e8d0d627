// src/db/activity_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::common::{error::AppResult, response::Page};
use crate::db::ActivityStore;
use crate::models::activity::{ActivityEntry, ActivityFilter, NewActivity};

// Log + dados do autor (o autor pode não existir: login falho, seed)
const ENTRY_SELECT: &str = r#"
    SELECT l.id, l.action, l.module, l.description, l.user_id, l.created_at,
           u.email AS user_email, u.first_name AS user_first_name, u.last_name AS user_last_name
    FROM user_logs l
    LEFT JOIN users u ON u.id = l.user_id
"#;

const FILTER: &str = "($1::BIGINT IS NULL OR l.user_id = $1) AND ($2::TEXT IS NULL OR l.module = $2)";

#[derive(Clone)]
pub struct ActivityRepository {
    pool: PgPool,
}

impl ActivityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityStore for ActivityRepository {
    async fn record_activity(&self, entry: &NewActivity) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO user_logs (action, module, description, user_id) VALUES ($1, $2, $3, $4)",
        )
        .bind(entry.action)
        .bind(&entry.module)
        .bind(&entry.description)
        .bind(entry.user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_activity(
        &self,
        filter: &ActivityFilter,
        page: Page,
    ) -> AppResult<(Vec<ActivityEntry>, i64)> {
        let entries = sqlx::query_as::<_, ActivityEntry>(&format!(
            "{ENTRY_SELECT} WHERE {FILTER} ORDER BY l.created_at DESC, l.id DESC LIMIT $3 OFFSET $4"
        ))
        .bind(filter.user_id)
        .bind(&filter.module)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM user_logs l WHERE {FILTER}"
        ))
        .bind(filter.user_id)
        .bind(&filter.module)
        .fetch_one(&self.pool)
        .await?;

        Ok((entries, total))
    }

    async fn recent_activity(&self, limit: i64) -> AppResult<Vec<ActivityEntry>> {
        let entries = sqlx::query_as::<_, ActivityEntry>(&format!(
            "{ENTRY_SELECT} ORDER BY l.created_at DESC, l.id DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }
}
