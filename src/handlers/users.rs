// src/handlers/users.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    common::{error::ApiError, response::{ApiResponse, Page}},
    config::AppState,
    middleware::{auth::CurrentSession, i18n::Locale},
    models::{
        auth::{AssignRolesPayload, CreateUserPayload, User, UserWithPermissions},
        rbac::SearchQuery,
    },
    services::user_service,
};

// GET /api/users
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    params(SearchQuery),
    responses(
        (status = 200, description = "Usuários paginados", body = [User])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = Page::requested(query.page, query.limit);

    let users = app_state
        .guard
        .execute(session.get(), user_service::USER_LIST, || {
            app_state.user_service.list_users(query.search.as_deref(), page)
        })
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(ApiResponse::ok(users))))
}

// POST /api/users
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    request_body = CreateUserPayload,
    responses(
        (status = 201, description = "Usuário criado", body = User),
        (status = 409, description = "E-mail já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_user(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Json(payload): Json<CreateUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let user = app_state
        .guard
        .execute(session.get(), user_service::USER_CREATE, || async {
            payload.validate()?;
            app_state.user_service.create_user(&payload).await
        })
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    app_state
        .activity_service
        .record(user_service::USER_CREATED.by(session.user_id()))
        .await;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(user))))
}

// GET /api/users/{id}
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = i64, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Usuário com cargos e permissões", body = UserWithPermissions),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_user(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let user = app_state
        .guard
        .execute(session.get(), user_service::USER_GET_WITH_PERMISSIONS, || {
            app_state.user_service.get_user_with_permissions(id)
        })
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(ApiResponse::ok(user))))
}

// POST /api/users/{id}/roles
#[utoipa::path(
    post,
    path = "/api/users/{id}/roles",
    tag = "Users",
    request_body = AssignRolesPayload,
    params(("id" = i64, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Cargos atribuídos", body = UserWithPermissions)
    ),
    security(("api_jwt" = []))
)]
pub async fn assign_roles(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Path(id): Path<i64>,
    Json(payload): Json<AssignRolesPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let user = app_state
        .guard
        .execute(session.get(), user_service::USER_ASSIGN_ROLES, || async {
            payload.validate()?;
            app_state.user_service.assign_roles(id, &payload.role_ids).await
        })
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    app_state
        .activity_service
        .record(user_service::USER_ROLES_ASSIGNED.by(session.user_id()))
        .await;

    Ok((StatusCode::OK, Json(ApiResponse::ok(user))))
}

// DELETE /api/users/{id}/roles
#[utoipa::path(
    delete,
    path = "/api/users/{id}/roles",
    tag = "Users",
    request_body = AssignRolesPayload,
    params(("id" = i64, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Cargos revogados", body = UserWithPermissions)
    ),
    security(("api_jwt" = []))
)]
pub async fn revoke_roles(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Path(id): Path<i64>,
    Json(payload): Json<AssignRolesPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let user = app_state
        .guard
        .execute(session.get(), user_service::USER_REVOKE_ROLES, || async {
            payload.validate()?;
            app_state.user_service.revoke_roles(id, &payload.role_ids).await
        })
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    app_state
        .activity_service
        .record(user_service::USER_ROLES_REVOKED.by(session.user_id()))
        .await;

    Ok((StatusCode::OK, Json(ApiResponse::ok(user))))
}
