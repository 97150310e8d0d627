// src/middleware/guard.rs

use std::future::Future;

use crate::{
    common::error::{AppError, AppResult},
    middleware::rbac::{self, Access},
    models::{auth::Session, rbac::SUPER_ADMIN_ROLE},
    services::permission_service::PermissionService,
};

/// Por que uma chamada foi liberada.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Operação declarada como pública.
    Ungated,
    /// Sessão com o cargo SUPER_ADMIN.
    Bypassed,
    /// O usuário possui a permissão exigida.
    Granted,
}

/// O guardião que fica na frente de toda operação de serviço.
#[derive(Clone)]
pub struct Guard {
    permissions: PermissionService,
}

impl Guard {
    pub fn new(permissions: PermissionService) -> Self {
        Self { permissions }
    }

    /// Decide se a sessão pode executar a operação, sem executá-la.
    pub async fn authorize(&self, session: Option<&Session>, operation: &str) -> AppResult<Decision> {
        // 1. Sessão
        let Some(session) = session else {
            tracing::warn!(target: "audit", operation, "⛔ Negado: nenhuma sessão ativa");
            return Err(AppError::Unauthenticated);
        };
        let user_id = session.user_id;

        // 2. Metadados da operação
        let Some(def) = rbac::lookup(operation) else {
            return Err(AppError::OperationNotFound(operation.to_string()));
        };

        let (module, action) = match def.access {
            Access::Public => {
                tracing::debug!(target: "audit", operation, user_id, "✅ Liberado: operação pública");
                return Ok(Decision::Ungated);
            }
            Access::Permission { module, action } => (module, action),
        };

        // 3. SUPER_ADMIN passa direto
        if session.has_role(SUPER_ADMIN_ROLE) {
            tracing::debug!(target: "audit", operation, user_id, "🛡️ Liberado: SUPER_ADMIN");
            return Ok(Decision::Bypassed);
        }

        // 4. Verifica no banco
        let permission = format!("{module}:{action}");
        if self
            .permissions
            .user_has_permission(user_id, module, action)
            .await?
        {
            tracing::debug!(target: "audit", operation, user_id, %permission, "🔑 Liberado");
            Ok(Decision::Granted)
        } else {
            tracing::warn!(target: "audit", operation, user_id, %permission, "⛔ Negado: permissão ausente");
            Err(AppError::Forbidden { permission })
        }
    }

    /// Executa `op` somente se a sessão puder executar `operation`.
    /// O erro da própria operação é devolvido já convertido em `AppError`.
    pub async fn execute<T, E, F, Fut>(
        &self,
        session: Option<&Session>,
        operation: &str,
        op: F,
    ) -> AppResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<AppError>,
    {
        self.authorize(session, operation).await?;
        op().await.map_err(Into::into)
    }
}
