use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;

pub type AppResult<T> = Result<T, AppError>;

/// Classificação usada na fronteira HTTP e nos logs de auditoria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unauthenticated,
    Forbidden,
    /// Operação sem registro: defeito de configuração do servidor.
    OperationNotFound,
    ValidationFailed,
    ResourceNotFound,
    Conflict,
    Unexpected,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized: no active session")]
    Unauthenticated,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Forbidden: missing {permission} permission")]
    Forbidden { permission: String },

    #[error("Service operation '{0}' not found")]
    OperationNotFound(String),

    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Campo inválido '{field}': {message}")]
    InvalidInput { field: String, message: String },

    #[error("No permissions found for module: {0}")]
    NoModulePermissions(String),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Cargo já existe")]
    RoleNameAlreadyExists,

    #[error("Código de filial já existe")]
    BranchCodeAlreadyExists,

    #[error("Número de consulta já existe")]
    EnquiryNoAlreadyExists,

    #[error("Número de inscrição já existe")]
    ApplicationNoAlreadyExists,

    #[error("System role '{0}' is protected")]
    SystemRoleProtected(String),

    #[error("Cargo não encontrado")]
    RoleNotFound,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Escola não encontrada")]
    SchoolNotFound,

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Unauthenticated | AppError::InvalidToken | AppError::InvalidCredentials => {
                ErrorKind::Unauthenticated
            }
            AppError::Forbidden { .. } => ErrorKind::Forbidden,
            AppError::OperationNotFound(_) => ErrorKind::OperationNotFound,
            AppError::ValidationError(_)
            | AppError::InvalidInput { .. }
            | AppError::NoModulePermissions(_) => ErrorKind::ValidationFailed,
            AppError::RoleNotFound | AppError::UserNotFound | AppError::SchoolNotFound => {
                ErrorKind::ResourceNotFound
            }
            AppError::EmailAlreadyExists
            | AppError::RoleNameAlreadyExists
            | AppError::BranchCodeAlreadyExists
            | AppError::EnquiryNoAlreadyExists
            | AppError::ApplicationNoAlreadyExists
            | AppError::SystemRoleProtected(_) => ErrorKind::Conflict,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => ErrorKind::Unexpected,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::ValidationFailed => StatusCode::BAD_REQUEST,
            ErrorKind::ResourceNotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::OperationNotFound | ErrorKind::Unexpected => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Converte o erro numa resposta traduzida para o idioma do cliente.
    /// Erros internos são logados por completo e devolvidos com mensagem genérica.
    pub fn to_api_error(&self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let lang = locale.0.as_str();
        let status = self.status_code();

        let (message, details) = match self {
            AppError::Unauthenticated => (i18n.translate(lang, "unauthenticated", &[]), None),
            AppError::InvalidToken => (i18n.translate(lang, "invalid_token", &[]), None),
            AppError::InvalidCredentials => {
                (i18n.translate(lang, "invalid_credentials", &[]), None)
            }
            AppError::Forbidden { permission } => (
                i18n.translate(lang, "forbidden", &[("permission", permission.as_str())]),
                Some(json!({ "permission": permission })),
            ),
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| match &e.message {
                            Some(m) => m.to_string(),
                            None => e.code.to_string(),
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                (i18n.translate(lang, "validation", &[]), Some(json!(details)))
            }
            AppError::InvalidInput { field, message } => (
                i18n.translate(lang, "invalid_input", &[("field", field.as_str()), ("message", message.as_str())]),
                Some(field_detail(field, message)),
            ),
            AppError::NoModulePermissions(module) => (
                i18n.translate(lang, "no_module_permissions", &[("module", module.as_str())]),
                None,
            ),
            AppError::EmailAlreadyExists => (i18n.translate(lang, "email_exists", &[]), None),
            AppError::RoleNameAlreadyExists => (i18n.translate(lang, "role_exists", &[]), None),
            AppError::BranchCodeAlreadyExists => {
                (i18n.translate(lang, "branch_code_exists", &[]), None)
            }
            AppError::EnquiryNoAlreadyExists => {
                (i18n.translate(lang, "enquiry_no_exists", &[]), None)
            }
            AppError::ApplicationNoAlreadyExists => {
                (i18n.translate(lang, "application_no_exists", &[]), None)
            }
            AppError::SystemRoleProtected(role) => (
                i18n.translate(lang, "system_role_protected", &[("role", role.as_str())]),
                None,
            ),
            AppError::RoleNotFound => (i18n.translate(lang, "role_not_found", &[]), None),
            AppError::UserNotFound => (i18n.translate(lang, "user_not_found", &[]), None),
            AppError::SchoolNotFound => (i18n.translate(lang, "school_not_found", &[]), None),
            AppError::OperationNotFound(name) => {
                tracing::error!(operation = %name, "🔥 Operação sem registro de permissão");
                (i18n.translate(lang, "operation_not_found", &[]), None)
            }
            e => {
                tracing::error!("🔥 Erro Interno do Servidor: {}", e);
                (i18n.translate(lang, "internal", &[]), None)
            }
        };

        ApiError {
            status,
            message,
            details,
        }
    }
}

fn field_detail(field: &str, message: &str) -> Value {
    let mut map = serde_json::Map::new();
    map.insert(field.to_string(), json!([message]));
    Value::Object(map)
}

/// Erro já pronto para a resposta HTTP (envelope `{ success: false, message, details? }`).
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "success": false,
            "message": self.message,
        });
        if let Some(details) = self.details {
            body["details"] = details;
        }
        (self.status, Json(body)).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default(), &I18nStore::new())
            .into_response()
    }
}
