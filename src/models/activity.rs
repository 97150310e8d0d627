// src/models/activity.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

// Mapeia o ENUM log_action do Postgres
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "log_action", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogAction {
    Create,
    Update,
    Delete,
    Login,
    PermissionUpdate,
    RoleAssign,
}

/// Mutação auditada, declarada ao lado da operação que a produz:
///
/// ```ignore
/// pub const SCHOOL_UPDATED: AuditEvent =
///     AuditEvent::new(LogAction::Update, "School", "School details updated");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditEvent {
    pub action: LogAction,
    pub module: &'static str,
    pub description: &'static str,
}

impl AuditEvent {
    pub const fn new(action: LogAction, module: &'static str, description: &'static str) -> Self {
        Self {
            action,
            module,
            description,
        }
    }

    /// O registro deste evento, feito pelo usuário informado (se houver).
    pub fn by(&self, user_id: Option<i64>) -> NewActivity {
        NewActivity {
            action: self.action,
            module: self.module.to_string(),
            description: self.description.to_string(),
            user_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
    pub action: LogAction,
    pub module: String,
    pub description: String,
    pub user_id: Option<i64>,
}

impl NewActivity {
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

// O que sai do banco (user_logs + dados do autor)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: i64,
    pub action: LogAction,
    #[schema(example = "School")]
    pub module: String,
    #[schema(example = "School details updated")]
    pub description: String,
    pub user_id: Option<i64>,
    pub user_email: Option<String>,
    pub user_first_name: Option<String>,
    pub user_last_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Filtro da consulta: por autor, por módulo, ou nenhum (log do sistema).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityFilter {
    pub user_id: Option<i64>,
    pub module: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ActivityQuery {
    pub user_id: Option<i64>,
    #[param(example = "School")]
    pub module: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl ActivityQuery {
    pub fn filter(&self) -> ActivityFilter {
        ActivityFilter {
            user_id: self.user_id,
            module: self
                .module
                .as_deref()
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct RecentQuery {
    pub limit: Option<i64>,
}
