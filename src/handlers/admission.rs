// src/handlers/admission.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use validator::Validate;

use crate::{
    common::{error::ApiError, response::ApiResponse},
    config::AppState,
    middleware::{auth::CurrentSession, i18n::Locale},
    models::admission::{Application, CreateApplicationPayload, CreateEnquiryPayload, Enquiry},
    services::admission_service,
};

// POST /api/admission/enquiries
#[utoipa::path(
    post,
    path = "/api/admission/enquiries",
    tag = "Admission",
    request_body = CreateEnquiryPayload,
    responses(
        (status = 201, description = "Consulta registrada", body = Enquiry),
        (status = 403, description = "Sem a permissão enquiry:create"),
        (status = 409, description = "Número da consulta já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_enquiry(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Json(payload): Json<CreateEnquiryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let enquiry = app_state
        .guard
        .execute(session.get(), admission_service::ENQUIRY_CREATE, || async {
            payload.validate()?;
            app_state.admission_service.create_enquiry(&payload).await
        })
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    app_state
        .activity_service
        .record(admission_service::ENQUIRY_CREATED.by(session.user_id()))
        .await;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(enquiry))))
}

// POST /api/admission/applications
#[utoipa::path(
    post,
    path = "/api/admission/applications",
    tag = "Admission",
    request_body = CreateApplicationPayload,
    responses(
        (status = 201, description = "Inscrição registrada", body = Application),
        (status = 403, description = "Sem a permissão application:create"),
        (status = 409, description = "Número da inscrição já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_application(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Json(payload): Json<CreateApplicationPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let application = app_state
        .guard
        .execute(session.get(), admission_service::APPLICATION_CREATE, || async {
            payload.validate()?;
            app_state.admission_service.create_application(&payload).await
        })
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    app_state
        .activity_service
        .record(admission_service::APPLICATION_CREATED.by(session.user_id()))
        .await;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(application))))
}
