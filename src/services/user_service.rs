// src/services/user_service.rs

use std::sync::Arc;

use crate::common::{
    error::{AppError, AppResult},
    response::{Page, Paginated},
};
use crate::db::UserStore;
use crate::models::activity::{AuditEvent, LogAction};
use crate::models::auth::{CreateUserPayload, NewUser, User, UserWithPermissions};
use crate::services::auth::hash_password;

crate::operation!(pub USER_LIST = "user.list", permission("user", "read"));
crate::operation!(pub USER_GET_WITH_PERMISSIONS = "user.get_with_permissions", permission("user", "read"));
crate::operation!(pub USER_CREATE = "user.create", permission("user", "create"));
crate::operation!(pub USER_ASSIGN_ROLES = "user.assign_roles", permission("user", "assign_roles"));
crate::operation!(pub USER_REVOKE_ROLES = "user.revoke_roles", permission("user", "assign_roles"));

pub const USER_CREATED: AuditEvent = AuditEvent::new(LogAction::Create, "User", "New user created");
pub const USER_ROLES_ASSIGNED: AuditEvent =
    AuditEvent::new(LogAction::RoleAssign, "User", "Roles assigned to user");
pub const USER_ROLES_REVOKED: AuditEvent =
    AuditEvent::new(LogAction::RoleAssign, "User", "Roles revoked from user");

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    pepper: String,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, pepper: String) -> Self {
        Self { store, pepper }
    }

    pub async fn create_user(&self, payload: &CreateUserPayload) -> AppResult<User> {
        let password_hash = hash_password(&payload.password, &self.pepper).await?;
        let user = self
            .store
            .create_user(&NewUser {
                first_name: payload.first_name.trim().to_string(),
                last_name: payload.last_name.trim().to_string(),
                email: payload.email.trim().to_lowercase(),
                password_hash,
                profile_photo: payload.profile_photo.clone(),
            })
            .await?;
        tracing::info!(target: "audit", user_id = user.id, "👤 Usuário criado por administrador");
        Ok(user)
    }

    pub async fn list_users(&self, search: Option<&str>, page: Page) -> AppResult<Paginated<User>> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        let (users, total) = self.store.list_users(search, page).await?;
        Ok(Paginated::new(users, total, page))
    }

    pub async fn get_user_with_permissions(&self, user_id: i64) -> AppResult<UserWithPermissions> {
        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;
        let roles = self.store.roles_for_user(user.id).await?;
        Ok(UserWithPermissions::new(user, roles))
    }

    pub async fn assign_roles(&self, user_id: i64, role_ids: &[i64]) -> AppResult<UserWithPermissions> {
        if role_ids.is_empty() {
            return Err(AppError::invalid_input("roleIds", "at least one role id is required"));
        }
        self.store.assign_roles(user_id, role_ids).await?;
        tracing::info!(target: "audit", user_id, ?role_ids, "🎖️ Cargos atribuídos ao usuário");
        self.get_user_with_permissions(user_id).await
    }

    pub async fn revoke_roles(&self, user_id: i64, role_ids: &[i64]) -> AppResult<UserWithPermissions> {
        if role_ids.is_empty() {
            return Err(AppError::invalid_input("roleIds", "at least one role id is required"));
        }
        self.store.revoke_roles(user_id, role_ids).await?;
        tracing::info!(target: "audit", user_id, ?role_ids, "🎖️ Cargos revogados do usuário");
        self.get_user_with_permissions(user_id).await
    }
}
