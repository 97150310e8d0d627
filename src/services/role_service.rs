// src/services/role_service.rs

use std::sync::Arc;

use crate::common::{
    error::{AppError, AppResult},
    response::{Page, Paginated},
};
use crate::db::RbacStore;
use crate::models::activity::{AuditEvent, LogAction};
use crate::models::rbac::{
    CreateRolePayload, NewRole, Role, RoleWithPermissions, SUPER_ADMIN_ROLE, UpdateRolePayload,
};

crate::operation!(pub ROLE_LIST = "role.list", public);
crate::operation!(pub ROLE_CREATE = "role.create", permission("role", "create"));
crate::operation!(pub ROLE_UPDATE = "role.update", permission("role", "update"));
crate::operation!(pub ROLE_DELETE = "role.delete", permission("role", "delete"));
crate::operation!(
    pub ROLE_ASSIGN_PERMISSIONS = "role.assign_permissions",
    permission("permission_assignment", "assign_individual_permissions_to_roles")
);
crate::operation!(
    pub ROLE_ASSIGN_MODULE_PERMISSIONS = "role.assign_module_permissions",
    permission("permission_assignment", "assign_entire_module_permissions_to_roles")
);
crate::operation!(
    pub ROLE_GET_WITH_PERMISSIONS = "role.get_with_permissions",
    permission("permission_viewing", "view_assigned_permissions_for_roles")
);
crate::operation!(
    pub ROLE_REMOVE_PERMISSIONS = "role.remove_permissions",
    permission("permission_management", "remove_permissions_from_roles")
);

pub const ROLE_CREATED: AuditEvent = AuditEvent::new(LogAction::Create, "Role", "Role created");
pub const ROLE_UPDATED: AuditEvent = AuditEvent::new(LogAction::Update, "Role", "Role updated");
pub const ROLE_DELETED: AuditEvent = AuditEvent::new(LogAction::Delete, "Role", "Role deleted");
pub const ROLE_PERMISSIONS_ASSIGNED: AuditEvent =
    AuditEvent::new(LogAction::PermissionUpdate, "Role", "Permissions assigned to role");
pub const ROLE_PERMISSIONS_REMOVED: AuditEvent =
    AuditEvent::new(LogAction::PermissionUpdate, "Role", "Permissions removed from role");

const ROLE_NAME_LEN: std::ops::RangeInclusive<usize> = 2..=64;

// Nome de cargo escolhido pelo usuário: sem espaços nas pontas e nunca o do super-admin.
fn role_name(raw: &str) -> AppResult<String> {
    let name = raw.trim();
    if !ROLE_NAME_LEN.contains(&name.chars().count()) {
        return Err(AppError::invalid_input(
            "name",
            "role name must have between 2 and 64 characters",
        ));
    }
    if name.eq_ignore_ascii_case(SUPER_ADMIN_ROLE) {
        return Err(AppError::invalid_input(
            "name",
            format!("role name '{SUPER_ADMIN_ROLE}' is reserved"),
        ));
    }
    Ok(name.to_string())
}

#[derive(Clone)]
pub struct RoleService {
    store: Arc<dyn RbacStore>,
}

impl RoleService {
    pub fn new(store: Arc<dyn RbacStore>) -> Self {
        Self { store }
    }

    pub async fn list_roles(&self, search: Option<&str>, page: Page) -> AppResult<Paginated<Role>> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        let (roles, total) = self.store.list_roles(search, page).await?;
        Ok(Paginated::new(roles, total, page))
    }

    pub async fn create_role(&self, payload: &CreateRolePayload) -> AppResult<Role> {
        let role = self
            .store
            .create_role(&NewRole {
                name: role_name(&payload.name)?,
                description: payload.description.clone(),
                is_system_role: false,
            })
            .await?;
        tracing::info!(target: "audit", role_id = role.id, role = %role.name, "➕ Cargo criado");
        Ok(role)
    }

    pub async fn update_role(&self, id: i64, changes: &UpdateRolePayload) -> AppResult<Role> {
        self.editable_role(id).await?;
        let changes = UpdateRolePayload {
            name: changes.name.as_deref().map(role_name).transpose()?,
            description: changes.description.clone(),
        };
        let role = self.store.update_role(id, &changes).await?;
        tracing::info!(target: "audit", role_id = id, "✏️ Cargo atualizado");
        Ok(role)
    }

    pub async fn delete_role(&self, id: i64) -> AppResult<()> {
        self.editable_role(id).await?;
        self.store.delete_role(id).await?;
        tracing::info!(target: "audit", role_id = id, "🗑️ Cargo removido");
        Ok(())
    }

    /// Vincula permissões específicas. Ids já vinculados são ignorados.
    pub async fn assign_permissions_to_role(
        &self,
        role_id: i64,
        permission_ids: &[i64],
    ) -> AppResult<RoleWithPermissions> {
        if permission_ids.is_empty() {
            return Err(AppError::invalid_input(
                "permissionIds",
                "at least one permission id is required",
            ));
        }
        let role = self.store.assign_permissions(role_id, permission_ids).await?;
        tracing::info!(target: "audit", role_id, total = role.permissions.len(), "🔗 Permissões vinculadas ao cargo");
        Ok(role)
    }

    /// Vincula todas as permissões de um módulo.
    pub async fn assign_module_permissions_to_role(
        &self,
        role_id: i64,
        module: &str,
    ) -> AppResult<RoleWithPermissions> {
        let module = module.trim();
        if module.is_empty() {
            return Err(AppError::invalid_input("module", "module must not be blank"));
        }
        let role = self.store.assign_module_permissions(role_id, module).await?;
        tracing::info!(target: "audit", role_id, module, "🔗 Módulo vinculado ao cargo");
        Ok(role)
    }

    pub async fn remove_permissions_from_role(
        &self,
        role_id: i64,
        permission_ids: &[i64],
    ) -> AppResult<RoleWithPermissions> {
        if permission_ids.is_empty() {
            return Err(AppError::invalid_input(
                "permissionIds",
                "at least one permission id is required",
            ));
        }
        let role = self.store.remove_permissions(role_id, permission_ids).await?;
        tracing::info!(target: "audit", role_id, "✂️ Permissões removidas do cargo");
        Ok(role)
    }

    pub async fn get_role_with_permissions(&self, role_id: i64) -> AppResult<RoleWithPermissions> {
        self.store
            .role_with_permissions(role_id)
            .await?
            .ok_or(AppError::RoleNotFound)
    }

    // Cargos de sistema não podem ser renomeados nem removidos.
    async fn editable_role(&self, id: i64) -> AppResult<Role> {
        let role = self.store.find_role(id).await?.ok_or(AppError::RoleNotFound)?;
        if role.is_system_role {
            return Err(AppError::SystemRoleProtected(role.name));
        }
        Ok(role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::ErrorKind;
    use crate::db::{MemoryStore, PermissionCatalog};
    use crate::models::rbac::{NewPermission, SUPER_ADMIN_ROLE};

    async fn setup() -> (MemoryStore, RoleService) {
        let store = MemoryStore::new();
        for (module, action) in [("school", "read"), ("school", "update"), ("user", "read")] {
            store
                .upsert_permission(&NewPermission::from_declaration(module, action))
                .await
                .unwrap();
        }
        let service = RoleService::new(Arc::new(store.clone()));
        (store, service)
    }

    async fn permission_id(store: &MemoryStore, name: &str) -> i64 {
        store
            .all_permissions()
            .await
            .unwrap()
            .into_iter()
            .find(|p| p.name == name)
            .unwrap()
            .id
    }

    fn editor() -> CreateRolePayload {
        CreateRolePayload {
            name: " EDITOR ".into(),
            description: Some("Edita a escola".into()),
        }
    }

    #[tokio::test]
    async fn created_roles_are_never_system_roles() {
        let (_, service) = setup().await;
        let role = service.create_role(&editor()).await.unwrap();
        assert_eq!(role.name, "EDITOR");
        assert!(!role.is_system_role);

        let err = service.create_role(&editor()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn blank_names_are_rejected_after_trimming() {
        let (store, service) = setup().await;
        for name in ["  ", " A "] {
            let payload = CreateRolePayload {
                name: name.into(),
                description: None,
            };
            let err = service.create_role(&payload).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ValidationFailed, "{name:?}");
        }

        let role = service.create_role(&editor()).await.unwrap();
        let blank = UpdateRolePayload {
            name: Some("   ".into()),
            description: None,
        };
        let err = service.update_role(role.id, &blank).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
        assert_eq!(store.find_role(role.id).await.unwrap().unwrap().name, "EDITOR");
    }

    #[tokio::test]
    async fn super_admin_name_is_reserved() {
        let (store, service) = setup().await;
        for name in ["SUPER_ADMIN", " super_admin "] {
            let payload = CreateRolePayload {
                name: name.into(),
                description: None,
            };
            assert!(matches!(
                service.create_role(&payload).await,
                Err(AppError::InvalidInput { ref field, .. }) if field == "name"
            ));
        }
        let (roles, _) = store.list_roles(None, Page::new(1, 10)).await.unwrap();
        assert!(roles.is_empty());

        let role = service.create_role(&editor()).await.unwrap();
        let rename = UpdateRolePayload {
            name: Some(SUPER_ADMIN_ROLE.into()),
            description: None,
        };
        let err = service.update_role(role.id, &rename).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    }

    #[tokio::test]
    async fn system_roles_cannot_be_updated_or_deleted() {
        let (store, service) = setup().await;
        let admin = store
            .ensure_role(&NewRole {
                name: SUPER_ADMIN_ROLE.into(),
                description: None,
                is_system_role: true,
            })
            .await
            .unwrap();

        let rename = UpdateRolePayload {
            name: Some("ROOT".into()),
            description: None,
        };
        assert!(matches!(
            service.update_role(admin.id, &rename).await,
            Err(AppError::SystemRoleProtected(name)) if name == SUPER_ADMIN_ROLE
        ));
        assert!(matches!(
            service.delete_role(admin.id).await,
            Err(AppError::SystemRoleProtected(_))
        ));
        assert!(store.find_role(admin.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn assigning_twice_keeps_a_single_link() {
        let (store, service) = setup().await;
        let role = service.create_role(&editor()).await.unwrap();
        let update = permission_id(&store, "school:update").await;

        service.assign_permissions_to_role(role.id, &[update]).await.unwrap();
        let again = service.assign_permissions_to_role(role.id, &[update]).await.unwrap();

        assert_eq!(again.permissions.len(), 1);
        assert_eq!(store.role_permission_links(), 1);
    }

    #[tokio::test]
    async fn unknown_permission_ids_change_nothing() {
        let (store, service) = setup().await;
        let role = service.create_role(&editor()).await.unwrap();
        let read = permission_id(&store, "school:read").await;

        let err = service
            .assign_permissions_to_role(role.id, &[read, 9999])
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
        assert_eq!(store.role_permission_links(), 0);
    }

    #[tokio::test]
    async fn module_assignment_links_every_permission_of_the_module() {
        let (_, service) = setup().await;
        let role = service.create_role(&editor()).await.unwrap();

        let role = service
            .assign_module_permissions_to_role(role.id, "school")
            .await
            .unwrap();
        let mut names: Vec<&str> = role.permissions.iter().map(|p| p.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["school:read", "school:update"]);
    }

    #[tokio::test]
    async fn unknown_module_is_rejected_without_changes() {
        let (store, service) = setup().await;
        let role = service.create_role(&editor()).await.unwrap();

        let err = service
            .assign_module_permissions_to_role(role.id, "nonexistent")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NoModulePermissions(ref m) if m == "nonexistent"));
        assert_eq!(store.role_permission_links(), 0);

        let err = service
            .assign_module_permissions_to_role(role.id, "   ")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    }

    #[tokio::test]
    async fn removing_unlinked_permissions_is_a_no_op() {
        let (store, service) = setup().await;
        let role = service.create_role(&editor()).await.unwrap();
        let read = permission_id(&store, "school:read").await;
        let update = permission_id(&store, "school:update").await;
        service.assign_permissions_to_role(role.id, &[read]).await.unwrap();

        let after_first = service
            .remove_permissions_from_role(role.id, &[update, read])
            .await
            .unwrap();
        assert!(after_first.permissions.is_empty());

        let after_second = service
            .remove_permissions_from_role(role.id, &[read])
            .await
            .unwrap();
        assert!(after_second.permissions.is_empty());
        assert_eq!(after_second.role.id, role.id);
    }

    #[tokio::test]
    async fn empty_id_lists_are_invalid_input() {
        let (_, service) = setup().await;
        let role = service.create_role(&editor()).await.unwrap();
        for result in [
            service.assign_permissions_to_role(role.id, &[]).await,
            service.remove_permissions_from_role(role.id, &[]).await,
        ] {
            assert_eq!(result.unwrap_err().kind(), ErrorKind::ValidationFailed);
        }
    }

    #[tokio::test]
    async fn missing_role_is_not_found() {
        let (_, service) = setup().await;
        let err = service.get_role_with_permissions(404).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResourceNotFound);
    }
}
