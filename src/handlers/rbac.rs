// src/handlers/rbac.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        response::{ApiResponse, Page},
    },
    config::AppState,
    middleware::{auth::CurrentSession, i18n::Locale},
    models::rbac::{
        AssignPermissionsPayload, CreateRolePayload, ModuleEntry, Permission, PermissionQuery,
        RemovePermissionsPayload, Role, RoleWithPermissions, SearchQuery, UpdateRolePayload,
    },
    services::{permission_service, role_service},
};

// =============================================================================
//  CARGOS
// =============================================================================

// GET /api/roles
#[utoipa::path(
    get,
    path = "/api/roles",
    tag = "RBAC",
    params(SearchQuery),
    responses(
        (status = 200, description = "Cargos paginados", body = [Role])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_roles(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = Page::requested(query.page, query.limit);

    let roles = app_state
        .guard
        .execute(session.get(), role_service::ROLE_LIST, || {
            app_state.role_service.list_roles(query.search.as_deref(), page)
        })
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(ApiResponse::ok(roles))))
}

// POST /api/roles
#[utoipa::path(
    post,
    path = "/api/roles",
    tag = "RBAC",
    request_body = CreateRolePayload,
    responses(
        (status = 201, description = "Cargo criado", body = Role),
        (status = 409, description = "Nome de cargo já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_role(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Json(payload): Json<CreateRolePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let role = app_state
        .guard
        .execute(session.get(), role_service::ROLE_CREATE, || async {
            payload.validate()?;
            app_state.role_service.create_role(&payload).await
        })
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    app_state
        .activity_service
        .record(role_service::ROLE_CREATED.by(session.user_id()))
        .await;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(role))))
}

// PUT /api/roles/{id}
#[utoipa::path(
    put,
    path = "/api/roles/{id}",
    tag = "RBAC",
    request_body = UpdateRolePayload,
    params(("id" = i64, Path, description = "ID do cargo")),
    responses(
        (status = 200, description = "Cargo atualizado", body = Role),
        (status = 409, description = "Cargo de sistema ou nome já existente")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_role(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateRolePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let role = app_state
        .guard
        .execute(session.get(), role_service::ROLE_UPDATE, || async {
            payload.validate()?;
            app_state.role_service.update_role(id, &payload).await
        })
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    app_state
        .activity_service
        .record(role_service::ROLE_UPDATED.by(session.user_id()))
        .await;

    Ok((StatusCode::OK, Json(ApiResponse::ok(role))))
}

// DELETE /api/roles/{id}
#[utoipa::path(
    delete,
    path = "/api/roles/{id}",
    tag = "RBAC",
    params(("id" = i64, Path, description = "ID do cargo")),
    responses(
        (status = 200, description = "Cargo removido"),
        (status = 409, description = "Cargo de sistema")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_role(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .guard
        .execute(session.get(), role_service::ROLE_DELETE, || {
            app_state.role_service.delete_role(id)
        })
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    app_state
        .activity_service
        .record(role_service::ROLE_DELETED.by(session.user_id()))
        .await;

    Ok((StatusCode::OK, Json(ApiResponse::ok(serde_json::json!({ "id": id })))))
}

// POST /api/roles/assign
// Com `module`, vincula o módulo inteiro; senão, as `permissionIds` informadas.
#[utoipa::path(
    post,
    path = "/api/roles/assign",
    tag = "RBAC",
    request_body = AssignPermissionsPayload,
    responses(
        (status = 200, description = "Cargo com as permissões atuais", body = RoleWithPermissions),
        (status = 400, description = "Módulo sem permissões ou ids desconhecidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn assign_permissions(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Json(payload): Json<AssignPermissionsPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let service = &app_state.role_service;

    let result = match (payload.module.as_deref(), payload.permission_ids.as_deref()) {
        (Some(module), _) => {
            app_state
                .guard
                .execute(session.get(), role_service::ROLE_ASSIGN_MODULE_PERMISSIONS, || {
                    service.assign_module_permissions_to_role(payload.role_id, module)
                })
                .await
        }
        (None, Some(ids)) => {
            app_state
                .guard
                .execute(session.get(), role_service::ROLE_ASSIGN_PERMISSIONS, || {
                    service.assign_permissions_to_role(payload.role_id, ids)
                })
                .await
        }
        // Sem módulo nem ids: o guardião decide antes do erro de entrada
        (None, None) => {
            app_state
                .guard
                .execute(session.get(), role_service::ROLE_ASSIGN_PERMISSIONS, || async {
                    Err::<RoleWithPermissions, _>(AppError::invalid_input(
                        "permissionIds",
                        "either permissionIds or module is required",
                    ))
                })
                .await
        }
    };

    let role = result.map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    app_state
        .activity_service
        .record(role_service::ROLE_PERMISSIONS_ASSIGNED.by(session.user_id()))
        .await;
    Ok((StatusCode::OK, Json(ApiResponse::ok(role))))
}

// GET /api/roles/{id}/permissions
#[utoipa::path(
    get,
    path = "/api/roles/{id}/permissions",
    tag = "RBAC",
    params(("id" = i64, Path, description = "ID do cargo")),
    responses(
        (status = 200, description = "Cargo com suas permissões", body = RoleWithPermissions),
        (status = 404, description = "Cargo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_role_permissions(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let role = app_state
        .guard
        .execute(session.get(), role_service::ROLE_GET_WITH_PERMISSIONS, || {
            app_state.role_service.get_role_with_permissions(id)
        })
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(ApiResponse::ok(role))))
}

// POST /api/roles/permissions/remove
#[utoipa::path(
    post,
    path = "/api/roles/permissions/remove",
    tag = "RBAC",
    request_body = RemovePermissionsPayload,
    responses(
        (status = 200, description = "Cargo com as permissões restantes", body = RoleWithPermissions)
    ),
    security(("api_jwt" = []))
)]
pub async fn remove_permissions(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Json(payload): Json<RemovePermissionsPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let role = app_state
        .guard
        .execute(session.get(), role_service::ROLE_REMOVE_PERMISSIONS, || async {
            payload.validate()?;
            app_state
                .role_service
                .remove_permissions_from_role(payload.role_id, &payload.permission_ids)
                .await
        })
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    app_state
        .activity_service
        .record(role_service::ROLE_PERMISSIONS_REMOVED.by(session.user_id()))
        .await;

    Ok((StatusCode::OK, Json(ApiResponse::ok(role))))
}

// =============================================================================
//  PERMISSÕES
// =============================================================================

// GET /api/permissions (Para o frontend saber o que mostrar na tela de cargos)
#[utoipa::path(
    get,
    path = "/api/permissions",
    tag = "RBAC",
    params(PermissionQuery),
    responses(
        (status = 200, description = "Permissões paginadas", body = [Permission])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_permissions(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Query(query): Query<PermissionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = Page::requested(query.page, query.limit);

    let permissions = app_state
        .guard
        .execute(session.get(), permission_service::PERMISSION_LIST, || {
            app_state
                .permission_service
                .list_permissions(query.module.as_deref(), page)
        })
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(ApiResponse::ok(permissions))))
}

// GET /api/permissions/modules
#[utoipa::path(
    get,
    path = "/api/permissions/modules",
    tag = "RBAC",
    responses(
        (status = 200, description = "Módulos com permissões", body = [ModuleEntry])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_modules(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
) -> Result<impl IntoResponse, ApiError> {
    let modules = app_state
        .guard
        .execute(session.get(), permission_service::PERMISSION_MODULES, || {
            app_state.permission_service.get_modules()
        })
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(ApiResponse::ok(modules))))
}
