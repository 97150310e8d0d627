// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,
        handlers::users::list_users,
        handlers::users::create_user,
        handlers::users::get_user,
        handlers::users::assign_roles,
        handlers::users::revoke_roles,

        // --- RBAC ---
        handlers::rbac::list_roles,
        handlers::rbac::create_role,
        handlers::rbac::update_role,
        handlers::rbac::delete_role,
        handlers::rbac::assign_permissions,
        handlers::rbac::get_role_permissions,
        handlers::rbac::remove_permissions,
        handlers::rbac::list_permissions,
        handlers::rbac::list_modules,

        // --- School ---
        handlers::school::get_school,
        handlers::school::upsert_school,
        handlers::school::list_branches,
        handlers::school::create_branch,

        // --- Admission ---
        handlers::admission::create_enquiry,
        handlers::admission::create_application,

        // --- Activity ---
        handlers::activity::list_logs,
        handlers::activity::recent_activity,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::CreateUserPayload,
            models::auth::AssignRolesPayload,
            models::auth::AuthResponse,
            models::auth::SessionRole,
            models::auth::UserWithPermissions,

            // --- RBAC ---
            models::rbac::Role,
            models::rbac::Permission,
            models::rbac::ModuleEntry,
            models::rbac::RoleWithPermissions,
            models::rbac::CreateRolePayload,
            models::rbac::UpdateRolePayload,
            models::rbac::AssignPermissionsPayload,
            models::rbac::RemovePermissionsPayload,

            // --- School ---
            models::school::School,
            models::school::Branch,
            models::school::SchoolView,
            models::school::SchoolInput,
            models::school::CreateBranchPayload,

            // --- Admission ---
            models::admission::Enquiry,
            models::admission::Application,
            models::admission::CreateEnquiryPayload,
            models::admission::CreateApplicationPayload,

            // --- Activity ---
            models::activity::LogAction,
            models::activity::ActivityEntry,

            crate::common::response::PageMeta,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Usuários e seus cargos"),
        (name = "RBAC", description = "Controle de Acesso (Cargos e Permissões)"),
        (name = "School", description = "Cadastro da escola e filiais"),
        (name = "Admission", description = "Consultas e inscrições de alunos"),
        (name = "Activity", description = "Log de atividades dos usuários")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
