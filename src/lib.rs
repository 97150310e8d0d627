// src/lib.rs

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post, put},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use crate::config::AppState;
use crate::docs::ApiDoc;
use crate::middleware::{auth::session_middleware, rbac};

/// Confere que toda operação exposta pelas rotas está no registro.
pub fn verify_registry() -> Result<(), rbac::RegistryError> {
    rbac::verify(handlers::ROUTED_OPERATIONS)
}

pub fn build_router(app_state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .route(
            "/",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route("/{id}", get(handlers::users::get_user))
        .route(
            "/{id}/roles",
            post(handlers::users::assign_roles).delete(handlers::users::revoke_roles),
        );

    let role_routes = Router::new()
        .route(
            "/",
            get(handlers::rbac::list_roles).post(handlers::rbac::create_role),
        )
        .route(
            "/{id}",
            put(handlers::rbac::update_role).delete(handlers::rbac::delete_role),
        )
        .route("/assign", post(handlers::rbac::assign_permissions))
        .route("/{id}/permissions", get(handlers::rbac::get_role_permissions))
        .route("/permissions/remove", post(handlers::rbac::remove_permissions));

    let permission_routes = Router::new()
        .route("/", get(handlers::rbac::list_permissions))
        .route("/modules", get(handlers::rbac::list_modules));

    let school_routes = Router::new()
        .route(
            "/school",
            get(handlers::school::get_school).put(handlers::school::upsert_school),
        )
        .route(
            "/branches",
            get(handlers::school::list_branches).post(handlers::school::create_branch),
        );

    let admission_routes = Router::new()
        .route("/enquiries", post(handlers::admission::create_enquiry))
        .route("/applications", post(handlers::admission::create_application));

    let log_routes = Router::new()
        .route("/", get(handlers::activity::list_logs))
        .route("/recent", get(handlers::activity::recent_activity));

    // Toda rota passa pelo middleware de sessão; a autorização é do Guard
    let api = Router::new()
        .route("/health", get(|| async { "OK" }))
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .nest("/roles", role_routes)
        .nest("/permissions", permission_routes)
        .nest("/admission", admission_routes)
        .nest("/logs", log_routes)
        .merge(school_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            session_middleware,
        ));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api)
        .with_state(app_state)
}
