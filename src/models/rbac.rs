// src/models/rbac.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Cargo que ignora toda verificação de permissão.
pub const SUPER_ADMIN_ROLE: &str = "SUPER_ADMIN";

// O que sai do banco (Tabela roles)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[schema(example = 2)]
    pub id: i64,

    #[schema(example = "EDITOR")]
    pub name: String,

    #[schema(example = "Pode editar os dados da escola")]
    pub description: Option<String>,

    pub is_system_role: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// O que sai do banco (Tabela permissions)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    #[schema(example = 7)]
    pub id: i64,

    #[schema(example = "school:update")]
    pub name: String,

    #[schema(example = "school")]
    pub module: String,

    #[schema(example = "update action in school")]
    pub description: String,
}

/// Permissão declarada no código, pronta para o upsert da sincronização.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPermission {
    pub name: String,
    pub module: String,
    pub description: String,
}

impl NewPermission {
    pub fn from_declaration(module: &str, action: &str) -> Self {
        Self {
            name: format!("{module}:{action}"),
            module: module.to_string(),
            description: format!("{action} action in {module}"),
        }
    }
}

/// Resultado de um upsert de permissão.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
    Unchanged,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ModuleEntry {
    #[schema(example = "school")]
    pub module: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleWithPermissions {
    #[serde(flatten)]
    pub role: Role,
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Clone)]
pub struct NewRole {
    pub name: String,
    pub description: Option<String>,
    pub is_system_role: bool,
}

// O Payload para criar um cargo
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRolePayload {
    #[validate(length(min = 2, max = 64, message = "O nome deve ter entre 2 e 64 caracteres."))]
    #[schema(example = "EDITOR")]
    pub name: String,

    #[schema(example = "Pode editar os dados da escola")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRolePayload {
    #[validate(length(min = 2, max = 64, message = "O nome deve ter entre 2 e 64 caracteres."))]
    pub name: Option<String>,
    pub description: Option<String>,
}

/// `POST /api/roles/assign`: por lista de permissões ou por módulo inteiro.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignPermissionsPayload {
    pub role_id: i64,
    pub permission_ids: Option<Vec<i64>>,
    #[schema(example = "school")]
    pub module: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemovePermissionsPayload {
    pub role_id: i64,
    #[validate(length(min = 1, message = "Informe ao menos uma permissão."))]
    pub permission_ids: Vec<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct PermissionQuery {
    pub module: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declaration_builds_canonical_name_and_description() {
        let p = NewPermission::from_declaration("school", "update");
        assert_eq!(p.name, "school:update");
        assert_eq!(p.module, "school");
        assert_eq!(p.description, "update action in school");
    }
}
