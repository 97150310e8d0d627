//! Camada de persistência. Os serviços dependem apenas dos traits abaixo;
//! `*_repo` implementam sobre PostgreSQL e `memory` mantém tudo em memória
//! (usado nos testes e em demonstrações locais).

use async_trait::async_trait;

use crate::common::{
    error::{AppError, AppResult},
    response::Page,
};
use crate::models::{
    activity::{ActivityEntry, ActivityFilter, NewActivity},
    admission::{Application, CreateApplicationPayload, CreateEnquiryPayload, Enquiry},
    auth::{NewUser, SessionRole, User},
    rbac::{
        NewPermission, NewRole, Permission, Role, RoleWithPermissions, UpdateRolePayload,
        UpsertOutcome,
    },
    school::{Branch, CreateBranchPayload, School, SchoolInput},
};

pub mod activity_repo;
pub mod admission_repo;
#[cfg(any(test, feature = "memory-store"))]
pub mod memory;
pub mod rbac_repo;
pub mod school_repo;
pub mod user_repo;

pub use activity_repo::ActivityRepository;
pub use admission_repo::AdmissionRepository;
#[cfg(any(test, feature = "memory-store"))]
pub use memory::MemoryStore;
pub use rbac_repo::RbacRepository;
pub use school_repo::SchoolRepository;
pub use user_repo::UserRepository;

/// Catálogo de permissões, tudo o que a sincronização precisa.
#[async_trait]
pub trait PermissionCatalog: Send + Sync {
    async fn upsert_permission(&self, permission: &NewPermission) -> AppResult<UpsertOutcome>;

    async fn all_permissions(&self) -> AppResult<Vec<Permission>>;

    /// Remove pelo nome; os vínculos com cargos caem em cascata.
    async fn delete_permissions(&self, names: &[String]) -> AppResult<u64>;
}

#[async_trait]
pub trait RbacStore: Send + Sync {
    async fn user_has_permission(&self, user_id: i64, permission_name: &str) -> AppResult<bool>;

    async fn list_modules(&self) -> AppResult<Vec<String>>;

    async fn list_permissions(
        &self,
        module: Option<&str>,
        page: Page,
    ) -> AppResult<(Vec<Permission>, i64)>;

    async fn create_role(&self, role: &NewRole) -> AppResult<Role>;

    /// Cria o cargo se não existir; nunca rebaixa um cargo de sistema.
    async fn ensure_role(&self, role: &NewRole) -> AppResult<Role>;

    async fn find_role(&self, id: i64) -> AppResult<Option<Role>>;

    async fn list_roles(&self, search: Option<&str>, page: Page) -> AppResult<(Vec<Role>, i64)>;

    async fn update_role(&self, id: i64, changes: &UpdateRolePayload) -> AppResult<Role>;

    async fn delete_role(&self, id: i64) -> AppResult<()>;

    async fn assign_permissions(
        &self,
        role_id: i64,
        permission_ids: &[i64],
    ) -> AppResult<RoleWithPermissions>;

    async fn assign_module_permissions(
        &self,
        role_id: i64,
        module: &str,
    ) -> AppResult<RoleWithPermissions>;

    async fn remove_permissions(
        &self,
        role_id: i64,
        permission_ids: &[i64],
    ) -> AppResult<RoleWithPermissions>;

    async fn role_with_permissions(&self, role_id: i64) -> AppResult<Option<RoleWithPermissions>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, user: &NewUser) -> AppResult<User>;

    /// Cria ou atualiza a senha do usuário com este e-mail (seed).
    async fn upsert_user_by_email(&self, user: &NewUser) -> AppResult<User>;

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>>;

    async fn list_users(&self, search: Option<&str>, page: Page) -> AppResult<(Vec<User>, i64)>;

    async fn roles_for_user(&self, user_id: i64) -> AppResult<Vec<SessionRole>>;

    async fn assign_roles(&self, user_id: i64, role_ids: &[i64]) -> AppResult<()>;

    async fn revoke_roles(&self, user_id: i64, role_ids: &[i64]) -> AppResult<()>;
}

#[async_trait]
pub trait SchoolStore: Send + Sync {
    async fn get_school(&self) -> AppResult<Option<School>>;

    async fn upsert_school(&self, input: &SchoolInput) -> AppResult<School>;

    async fn list_branches(&self, school_id: i64) -> AppResult<Vec<Branch>>;

    async fn create_branch(
        &self,
        school_id: i64,
        input: &CreateBranchPayload,
    ) -> AppResult<Branch>;
}

/// Log de atividades dos usuários, do mais recente para o mais antigo.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    async fn record_activity(&self, entry: &NewActivity) -> AppResult<()>;

    async fn list_activity(
        &self,
        filter: &ActivityFilter,
        page: Page,
    ) -> AppResult<(Vec<ActivityEntry>, i64)>;

    async fn recent_activity(&self, limit: i64) -> AppResult<Vec<ActivityEntry>>;
}

#[async_trait]
pub trait AdmissionStore: Send + Sync {
    async fn create_enquiry(&self, input: &CreateEnquiryPayload) -> AppResult<Enquiry>;

    async fn create_application(&self, input: &CreateApplicationPayload) -> AppResult<Application>;
}

/// Ids pedidos que não existem, em ordem e sem repetição.
pub(crate) fn missing_ids(requested: &[i64], found: &[i64]) -> Vec<i64> {
    let mut missing: Vec<i64> = requested
        .iter()
        .copied()
        .filter(|id| !found.contains(id))
        .collect();
    missing.sort_unstable();
    missing.dedup();
    missing
}

pub(crate) fn format_ids(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// Converte violação de chave única no erro de domínio informado.
pub(crate) fn on_unique_violation(e: sqlx::Error, err: AppError) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return err;
        }
    }
    e.into()
}
