// src/services/activity_service.rs

use std::sync::Arc;

use crate::common::{
    error::AppResult,
    response::{Page, Paginated},
};
use crate::db::ActivityStore;
use crate::models::activity::{ActivityEntry, ActivityFilter, NewActivity};

crate::operation!(pub LOG_LIST = "log.list", permission("log", "read"));
crate::operation!(pub LOG_RECENT = "log.recent", permission("log", "read"));

const RECENT_DEFAULT: i64 = 50;
const RECENT_MAX: i64 = 200;

/// Log de atividades persistido em `user_logs`.
#[derive(Clone)]
pub struct ActivityService {
    store: Arc<dyn ActivityStore>,
}

impl ActivityService {
    pub fn new(store: Arc<dyn ActivityStore>) -> Self {
        Self { store }
    }

    /// Grava a atividade. Uma falha aqui não desfaz nem falha a mutação que
    /// já aconteceu: fica só no log de erro.
    pub async fn record(&self, activity: NewActivity) {
        tracing::info!(
            target: "audit",
            action = ?activity.action,
            module = %activity.module,
            user_id = ?activity.user_id,
            "📝 {}",
            activity.description
        );
        if let Err(e) = self.store.record_activity(&activity).await {
            tracing::error!(error = %e, module = %activity.module, "❌ Falha ao gravar o log de atividade");
        }
    }

    /// Logs de um usuário, de um módulo ou do sistema todo (filtro vazio).
    pub async fn list_logs(
        &self,
        filter: &ActivityFilter,
        page: Page,
    ) -> AppResult<Paginated<ActivityEntry>> {
        let (entries, total) = self.store.list_activity(filter, page).await?;
        Ok(Paginated::new(entries, total, page))
    }

    pub async fn recent_activity(&self, limit: Option<i64>) -> AppResult<Vec<ActivityEntry>> {
        let limit = limit.unwrap_or(RECENT_DEFAULT).clamp(1, RECENT_MAX);
        self.store.recent_activity(limit).await
    }
}
