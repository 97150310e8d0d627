// src/handlers/school.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use validator::Validate;

use crate::{
    common::{error::ApiError, response::ApiResponse},
    config::AppState,
    middleware::{auth::CurrentSession, i18n::Locale},
    models::school::{Branch, CreateBranchPayload, School, SchoolInput, SchoolView},
    services::school_service,
};

// GET /api/school
#[utoipa::path(
    get,
    path = "/api/school",
    tag = "School",
    responses(
        (status = 200, description = "Dados da escola com filiais (modelo vazio se não houver)", body = SchoolView)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_school(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
) -> Result<impl IntoResponse, ApiError> {
    let school = app_state
        .guard
        .execute(session.get(), school_service::SCHOOL_GET, || {
            app_state.school_service.get_school()
        })
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(ApiResponse::ok(school))))
}

// PUT /api/school
#[utoipa::path(
    put,
    path = "/api/school",
    tag = "School",
    request_body = SchoolInput,
    responses(
        (status = 200, description = "Escola salva", body = School),
        (status = 403, description = "Sem a permissão school:update")
    ),
    security(("api_jwt" = []))
)]
pub async fn upsert_school(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Json(payload): Json<SchoolInput>,
) -> Result<impl IntoResponse, ApiError> {
    let school = app_state
        .guard
        .execute(session.get(), school_service::SCHOOL_UPSERT, || async {
            payload.validate()?;
            app_state.school_service.upsert_school(&payload).await
        })
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    app_state
        .activity_service
        .record(school_service::SCHOOL_UPDATED.by(session.user_id()))
        .await;

    Ok((StatusCode::OK, Json(ApiResponse::ok(school))))
}

// GET /api/branches
#[utoipa::path(
    get,
    path = "/api/branches",
    tag = "School",
    responses(
        (status = 200, description = "Filiais da escola", body = [Branch])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_branches(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
) -> Result<impl IntoResponse, ApiError> {
    let branches = app_state
        .guard
        .execute(session.get(), school_service::BRANCH_LIST, || {
            app_state.school_service.list_branches()
        })
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(ApiResponse::ok(branches))))
}

// POST /api/branches
#[utoipa::path(
    post,
    path = "/api/branches",
    tag = "School",
    request_body = CreateBranchPayload,
    responses(
        (status = 201, description = "Filial criada", body = Branch),
        (status = 404, description = "Nenhuma escola cadastrada"),
        (status = 409, description = "Código de filial já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_branch(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Json(payload): Json<CreateBranchPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let branch = app_state
        .guard
        .execute(session.get(), school_service::BRANCH_CREATE, || async {
            payload.validate()?;
            app_state.school_service.create_branch(&payload).await
        })
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    app_state
        .activity_service
        .record(school_service::BRANCH_CREATED.by(session.user_id()))
        .await;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(branch))))
}
