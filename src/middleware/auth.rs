use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};

use crate::{common::error::AppError, config::AppState, models::auth::Session};

// Resolve o token Bearer (se houver) e guarda a sessão nos "extensions".
// Token ausente ou inválido não rejeita aqui: quem decide é o Guard.
pub async fn session_middleware(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .map(|header| header.token().to_owned());

    if let Some(token) = token {
        match app_state.auth_service.resolve_session(&token).await? {
            Some(session) => {
                request.extensions_mut().insert(session);
            }
            None => tracing::debug!("Token recebido não corresponde a uma sessão válida"),
        }
    }

    Ok(next.run(request).await)
}

// Extrator para obter a sessão (opcional) diretamente nos handlers
pub struct CurrentSession(pub Option<Session>);

impl CurrentSession {
    pub fn get(&self) -> Option<&Session> {
        self.0.as_ref()
    }

    /// Autor das mutações registradas no log de atividades.
    pub fn user_id(&self) -> Option<i64> {
        self.0.as_ref().map(|s| s.user_id)
    }

    pub fn require(self) -> Result<Session, AppError> {
        self.0.ok_or(AppError::Unauthenticated)
    }
}

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentSession(parts.extensions.get::<Session>().cloned()))
    }
}
