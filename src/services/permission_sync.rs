// src/services/permission_sync.rs

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::Serialize;

use crate::common::error::AppResult;
use crate::db::PermissionCatalog;
use crate::middleware::rbac::{self, Access, OperationDef};
use crate::models::rbac::{NewPermission, UpsertOutcome};

#[derive(Debug, Clone, Serialize)]
pub struct SyncFailure {
    pub service: String,
    pub permission: String,
    pub error: String,
}

#[derive(Debug, Default, Serialize)]
pub struct SyncReport {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub unchanged: Vec<String>,
    /// No banco, mas não declaradas em nenhum serviço.
    pub orphaned: Vec<String>,
    pub pruned: u64,
    pub failures: Vec<SyncFailure>,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn synced(&self) -> usize {
        self.created.len() + self.updated.len() + self.unchanged.len()
    }
}

/// Reconcilia as permissões declaradas no código com a tabela `permissions`.
#[derive(Clone)]
pub struct PermissionSync {
    catalog: Arc<dyn PermissionCatalog>,
}

impl PermissionSync {
    pub fn new(catalog: Arc<dyn PermissionCatalog>) -> Self {
        Self { catalog }
    }

    pub async fn sync(&self, prune: bool) -> AppResult<SyncReport> {
        self.sync_declarations(rbac::operations(), prune).await
    }

    /// Falha em um serviço interrompe só as declarações daquele serviço; as
    /// demais seguem e todas as falhas vão para o relatório.
    pub async fn sync_declarations<'a>(
        &self,
        declared: impl IntoIterator<Item = &'a OperationDef>,
        prune: bool,
    ) -> AppResult<SyncReport> {
        tracing::info!("🔍 Iniciando sincronização de permissões...");

        let (groups, declared_names) = group_by_service(declared);
        let mut report = SyncReport::default();

        for (service, permissions) in groups {
            tracing::info!(service, total = permissions.len(), "📦 Sincronizando serviço");

            for permission in permissions {
                match self.catalog.upsert_permission(&permission).await {
                    Ok(outcome) => {
                        tracing::info!(permission = %permission.name, ?outcome, "✅ Permissão sincronizada");
                        match outcome {
                            UpsertOutcome::Created => report.created.push(permission.name),
                            UpsertOutcome::Updated => report.updated.push(permission.name),
                            UpsertOutcome::Unchanged => report.unchanged.push(permission.name),
                        }
                    }
                    Err(e) => {
                        tracing::error!(service, permission = %permission.name, "❌ Falha ao sincronizar: {}", e);
                        report.failures.push(SyncFailure {
                            service: service.to_string(),
                            permission: permission.name,
                            error: e.to_string(),
                        });
                        break;
                    }
                }
            }
        }

        report.orphaned = self
            .catalog
            .all_permissions()
            .await?
            .into_iter()
            .map(|p| p.name)
            .filter(|name| !declared_names.contains(name))
            .collect();

        for name in &report.orphaned {
            tracing::warn!(permission = %name, "⚠️ Permissão órfã: não declarada em nenhum serviço");
        }

        if prune && !report.orphaned.is_empty() {
            if report.is_success() {
                report.pruned = self.catalog.delete_permissions(&report.orphaned).await?;
                tracing::info!(pruned = report.pruned, "🧹 Permissões órfãs removidas");
            } else {
                tracing::warn!("Remoção de órfãs ignorada: a sincronização teve falhas");
            }
        }

        tracing::info!(
            created = report.created.len(),
            updated = report.updated.len(),
            unchanged = report.unchanged.len(),
            orphaned = report.orphaned.len(),
            failures = report.failures.len(),
            "🎯 Sincronização de permissões concluída"
        );

        Ok(report)
    }
}

type ServiceGroups = BTreeMap<&'static str, Vec<NewPermission>>;

// Agrupa por serviço; uma permissão usada por várias operações entra uma vez só.
fn group_by_service<'a>(
    declared: impl IntoIterator<Item = &'a OperationDef>,
) -> (ServiceGroups, BTreeSet<String>) {
    let mut groups: ServiceGroups = BTreeMap::new();
    let mut names = BTreeSet::new();

    for op in declared {
        if let Access::Permission { module, action } = op.access {
            let permission = NewPermission::from_declaration(module, action);
            if names.insert(permission.name.clone()) {
                groups.entry(op.service).or_default().push(permission);
            }
        }
    }

    (groups, names)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::common::error::AppError;
    use crate::db::{MemoryStore, RbacStore};
    use crate::models::rbac::{NewRole, Permission};

    const fn perm(name: &'static str, service: &'static str, module: &'static str, action: &'static str) -> OperationDef {
        OperationDef {
            name,
            service,
            access: Access::Permission { module, action },
        }
    }

    fn declarations() -> Vec<OperationDef> {
        vec![
            perm("school.get", "school_service", "school", "read"),
            perm("school.upsert", "school_service", "school", "update"),
            perm("user.list", "user_service", "user", "read"),
            perm("user.get", "user_service", "user", "read"),
            OperationDef {
                name: "role.list",
                service: "role_service",
                access: Access::Public,
            },
        ]
    }

    #[tokio::test]
    async fn first_run_creates_every_declared_permission_once() {
        let store = MemoryStore::new();
        let sync = PermissionSync::new(Arc::new(store.clone()));

        let report = sync.sync_declarations(&declarations(), false).await.unwrap();

        assert!(report.is_success());
        assert_eq!(report.created, vec!["school:read", "school:update", "user:read"]);
        assert_eq!(store.permission_count(), 3);

        let all = store.all_permissions().await.unwrap();
        let update = all.iter().find(|p| p.name == "school:update").unwrap();
        assert_eq!(update.module, "school");
        assert_eq!(update.description, "update action in school");
    }

    #[tokio::test]
    async fn second_run_is_idempotent() {
        let store = MemoryStore::new();
        let sync = PermissionSync::new(Arc::new(store.clone()));
        sync.sync_declarations(&declarations(), false).await.unwrap();
        let before = store.all_permissions().await.unwrap();

        let report = sync.sync_declarations(&declarations(), false).await.unwrap();

        assert!(report.created.is_empty());
        assert!(report.updated.is_empty());
        assert_eq!(report.unchanged.len(), 3);
        assert_eq!(store.all_permissions().await.unwrap(), before);
    }

    #[tokio::test]
    async fn drifted_fields_are_updated_in_place() {
        let store = MemoryStore::new();
        store
            .upsert_permission(&NewPermission {
                name: "school:read".into(),
                module: "escola".into(),
                description: "antiga".into(),
            })
            .await
            .unwrap();
        let id = store.all_permissions().await.unwrap()[0].id;

        let report = PermissionSync::new(Arc::new(store.clone()))
            .sync_declarations(&declarations(), false)
            .await
            .unwrap();

        assert_eq!(report.updated, vec!["school:read"]);
        let fixed = store
            .all_permissions()
            .await
            .unwrap()
            .into_iter()
            .find(|p| p.name == "school:read")
            .unwrap();
        assert_eq!(fixed.id, id);
        assert_eq!(fixed.module, "school");
        assert_eq!(fixed.description, "read action in school");
    }

    #[tokio::test]
    async fn orphans_are_reported_and_kept_without_prune() {
        let store = MemoryStore::new();
        store
            .upsert_permission(&NewPermission::from_declaration("legacy", "export"))
            .await
            .unwrap();

        let report = PermissionSync::new(Arc::new(store.clone()))
            .sync_declarations(&declarations(), false)
            .await
            .unwrap();

        assert_eq!(report.orphaned, vec!["legacy:export"]);
        assert_eq!(report.pruned, 0);
        assert_eq!(store.permission_count(), 4);
    }

    #[tokio::test]
    async fn prune_removes_orphans_and_their_links() {
        let store = MemoryStore::new();
        store
            .upsert_permission(&NewPermission::from_declaration("legacy", "export"))
            .await
            .unwrap();
        let legacy = store.all_permissions().await.unwrap()[0].id;
        let role = store
            .create_role(&NewRole {
                name: "EDITOR".into(),
                description: None,
                is_system_role: false,
            })
            .await
            .unwrap();
        store.assign_permissions(role.id, &[legacy]).await.unwrap();

        let report = PermissionSync::new(Arc::new(store.clone()))
            .sync_declarations(&declarations(), true)
            .await
            .unwrap();

        assert_eq!(report.pruned, 1);
        assert_eq!(store.permission_count(), 3);
        assert_eq!(store.role_permission_links(), 0);
    }

    // Catálogo que falha para uma permissão específica.
    struct FailingCatalog {
        inner: MemoryStore,
        fail_on: &'static str,
    }

    #[async_trait]
    impl PermissionCatalog for FailingCatalog {
        async fn upsert_permission(&self, permission: &NewPermission) -> AppResult<UpsertOutcome> {
            if permission.name == self.fail_on {
                return Err(AppError::DatabaseError(sqlx::Error::PoolTimedOut));
            }
            self.inner.upsert_permission(permission).await
        }

        async fn all_permissions(&self) -> AppResult<Vec<Permission>> {
            self.inner.all_permissions().await
        }

        async fn delete_permissions(&self, names: &[String]) -> AppResult<u64> {
            self.inner.delete_permissions(names).await
        }
    }

    #[tokio::test]
    async fn failure_is_isolated_to_its_service() {
        let store = MemoryStore::new();
        store
            .upsert_permission(&NewPermission::from_declaration("legacy", "export"))
            .await
            .unwrap();
        let sync = PermissionSync::new(Arc::new(FailingCatalog {
            inner: store.clone(),
            fail_on: "school:read",
        }));

        let report = sync.sync_declarations(&declarations(), true).await.unwrap();

        assert!(!report.is_success());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].service, "school_service");
        assert_eq!(report.failures[0].permission, "school:read");
        // school:update pertence ao mesmo serviço e não foi tentada
        assert_eq!(report.created, vec!["user:read"]);
        // com falhas, órfãs não são removidas
        assert_eq!(report.pruned, 0);
        assert_eq!(store.permission_count(), 2);
    }

    #[test]
    fn registry_declarations_group_without_duplicates() {
        let (groups, names) = group_by_service(rbac::operations());
        let total: usize = groups.values().map(Vec::len).sum();
        assert_eq!(total, names.len());
        assert!(names.contains("school:update"));
        assert!(names.contains("permission_assignment:assign_individual_permissions_to_roles"));
    }
}
