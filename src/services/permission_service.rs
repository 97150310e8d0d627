// src/services/permission_service.rs

use std::sync::Arc;

use crate::common::{
    error::AppResult,
    response::{Page, Paginated},
};
use crate::db::RbacStore;
use crate::models::rbac::{ModuleEntry, Permission};

crate::operation!(pub PERMISSION_LIST = "permission.list", public);
crate::operation!(pub PERMISSION_MODULES = "permission.modules", public);

#[derive(Clone)]
pub struct PermissionService {
    store: Arc<dyn RbacStore>,
}

impl PermissionService {
    pub fn new(store: Arc<dyn RbacStore>) -> Self {
        Self { store }
    }

    /// Verifica se o usuário pode executar `action` no `module`.
    /// Ex.: `user_has_permission(7, "school", "update")`. Sem cache: consulta o banco a cada chamada.
    pub async fn user_has_permission(
        &self,
        user_id: i64,
        module: &str,
        action: &str,
    ) -> AppResult<bool> {
        let permission_name = format!("{module}:{action}");
        self.store.user_has_permission(user_id, &permission_name).await
    }

    pub async fn get_modules(&self) -> AppResult<Vec<ModuleEntry>> {
        let modules = self.store.list_modules().await?;
        Ok(modules
            .into_iter()
            .map(|module| ModuleEntry { module })
            .collect())
    }

    pub async fn list_permissions(
        &self,
        module: Option<&str>,
        page: Page,
    ) -> AppResult<Paginated<Permission>> {
        let module = module.map(str::trim).filter(|m| !m.is_empty());
        let (permissions, total) = self.store.list_permissions(module, page).await?;
        Ok(Paginated::new(permissions, total, page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, PermissionCatalog};
    use crate::models::rbac::NewPermission;

    #[tokio::test]
    async fn unknown_user_has_no_permission() {
        let store = MemoryStore::new();
        store
            .upsert_permission(&NewPermission::from_declaration("school", "read"))
            .await
            .unwrap();
        let service = PermissionService::new(Arc::new(store));
        assert!(!service.user_has_permission(999, "school", "read").await.unwrap());
    }

    #[tokio::test]
    async fn modules_are_distinct_and_sorted() {
        let store = MemoryStore::new();
        for (module, action) in [("user", "read"), ("school", "read"), ("school", "update")] {
            store
                .upsert_permission(&NewPermission::from_declaration(module, action))
                .await
                .unwrap();
        }
        let service = PermissionService::new(Arc::new(store));
        let modules: Vec<String> = service
            .get_modules()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.module)
            .collect();
        assert_eq!(modules, vec!["school", "user"]);

        let page = service
            .list_permissions(Some("school"), Page::new(1, 1))
            .await
            .unwrap();
        assert_eq!(page.meta.total_items, 2);
        assert_eq!(page.meta.total_pages, 2);
        assert_eq!(page.data[0].name, "school:read");
    }
}
