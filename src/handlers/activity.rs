// src/handlers/activity.rs

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    common::{
        error::ApiError,
        response::{ApiResponse, Page},
    },
    config::AppState,
    middleware::{auth::CurrentSession, i18n::Locale},
    models::activity::{ActivityEntry, ActivityQuery, RecentQuery},
    services::activity_service,
};

// GET /api/logs
// `userId` e `module` filtram; sem filtro é o log do sistema inteiro.
#[utoipa::path(
    get,
    path = "/api/logs",
    tag = "Activity",
    params(ActivityQuery),
    responses(
        (status = 200, description = "Atividades paginadas, mais recentes primeiro", body = [ActivityEntry]),
        (status = 403, description = "Sem a permissão log:read")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_logs(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Query(query): Query<ActivityQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = query.filter();
    let page = Page::requested(query.page, query.limit);
    let logs = app_state
        .guard
        .execute(session.get(), activity_service::LOG_LIST, || {
            app_state.activity_service.list_logs(&filter, page)
        })
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(ApiResponse::ok(logs))))
}

// GET /api/logs/recent
#[utoipa::path(
    get,
    path = "/api/logs/recent",
    tag = "Activity",
    params(RecentQuery),
    responses(
        (status = 200, description = "Últimas atividades do sistema", body = [ActivityEntry])
    ),
    security(("api_jwt" = []))
)]
pub async fn recent_activity(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Query(query): Query<RecentQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let logs = app_state
        .guard
        .execute(session.get(), activity_service::LOG_RECENT, || {
            app_state.activity_service.recent_activity(query.limit)
        })
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(ApiResponse::ok(logs))))
}
