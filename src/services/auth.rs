// src/services/auth.rs

use std::sync::Arc;

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::{
    common::error::{AppError, AppResult},
    db::UserStore,
    models::{
        activity::{AuditEvent, LogAction},
        auth::{Claims, NewUser, RegisterUserPayload, Session},
    },
    services::activity_service::ActivityService,
};

pub const USER_REGISTERED: AuditEvent =
    AuditEvent::new(LogAction::Create, "Auth", "New user registered");
pub const USER_LOGGED_IN: AuditEvent =
    AuditEvent::new(LogAction::Login, "Auth", "User logged in successfully");

/// Hash bcrypt da senha com o pepper do servidor, fora do runtime async.
pub async fn hash_password(password: &str, pepper: &str) -> AppResult<String> {
    let peppered = format!("{password}{pepper}");
    let hashed = tokio::task::spawn_blocking(move || hash(&peppered, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

pub async fn verify_password(password: &str, pepper: &str, password_hash: &str) -> AppResult<bool> {
    let peppered = format!("{password}{pepper}");
    let password_hash = password_hash.to_owned();

    // Executa a verificação em um thread separado
    let valid = tokio::task::spawn_blocking(move || verify(&peppered, &password_hash))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;
    Ok(valid)
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    activity: ActivityService,
    jwt_secret: String,
    pepper: String,
    token_ttl_days: i64,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        activity: ActivityService,
        jwt_secret: String,
        pepper: String,
        token_ttl_days: i64,
    ) -> Self {
        Self {
            users,
            activity,
            jwt_secret,
            pepper,
            token_ttl_days,
        }
    }

    /// Cria a conta e já devolve um token. A conta nasce sem cargos.
    pub async fn register_user(&self, payload: &RegisterUserPayload) -> AppResult<String> {
        let password_hash = hash_password(&payload.password, &self.pepper).await?;

        let user = self
            .users
            .create_user(&NewUser {
                first_name: payload.first_name.trim().to_string(),
                last_name: payload.last_name.trim().to_string(),
                email: payload.email.trim().to_lowercase(),
                password_hash,
                profile_photo: None,
            })
            .await?;

        self.activity.record(USER_REGISTERED.by(Some(user.id))).await;
        self.create_token(user.id)
    }

    pub async fn login_user(&self, email: &str, password: &str) -> AppResult<String> {
        let user = self
            .users
            .find_by_email(&email.trim().to_lowercase())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(password, &self.pepper, &user.password_hash).await? {
            tracing::warn!(target: "audit", user_id = user.id, "🔒 Tentativa de login com senha incorreta");
            return Err(AppError::InvalidCredentials);
        }

        self.activity
            .record(
                USER_LOGGED_IN
                    .by(Some(user.id))
                    .with_description(format!("{}: {}", USER_LOGGED_IN.description, user.email)),
            )
            .await;
        self.create_token(user.id)
    }

    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;
        Ok(token_data.claims)
    }

    /// Monta a sessão do token. Token inválido ou usuário inexistente resultam
    /// em `None`: a requisição segue sem sessão e o guardião decide.
    pub async fn resolve_session(&self, token: &str) -> AppResult<Option<Session>> {
        let Ok(claims) = self.validate_token(token) else {
            tracing::debug!("Token rejeitado; seguindo sem sessão");
            return Ok(None);
        };

        let Some(user) = self.users.find_by_id(claims.sub).await? else {
            return Ok(None);
        };
        let roles = self.users.roles_for_user(user.id).await?;

        Ok(Some(Session {
            user_id: user.id,
            email: user.email,
            roles,
        }))
    }

    pub fn create_token(&self, user_id: i64) -> AppResult<String> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(self.token_ttl_days);

        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::response::Page;
    use crate::db::MemoryStore;
    use crate::models::activity::ActivityFilter;

    fn activity(store: &MemoryStore) -> ActivityService {
        ActivityService::new(Arc::new(store.clone()))
    }

    fn service(store: &MemoryStore) -> AuthService {
        AuthService::new(
            Arc::new(store.clone()),
            activity(store),
            "segredo".into(),
            "pimenta".into(),
            7,
        )
    }

    fn payload() -> RegisterUserPayload {
        RegisterUserPayload {
            first_name: "Ana".into(),
            last_name: "Souza".into(),
            email: "Ana@Escola.com".into(),
            password: "senha123".into(),
        }
    }

    #[tokio::test]
    async fn register_then_login_resolves_the_same_user() {
        let store = MemoryStore::new();
        let auth = service(&store);

        let token = auth.register_user(&payload()).await.unwrap();
        let session = auth.resolve_session(&token).await.unwrap().unwrap();
        assert_eq!(session.email, "ana@escola.com");
        assert!(session.roles.is_empty());

        let login = auth.login_user("ana@escola.com", "senha123").await.unwrap();
        let claims = auth.validate_token(&login).unwrap();
        assert_eq!(claims.sub, session.user_id);
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let store = MemoryStore::new();
        let auth = service(&store);
        auth.register_user(&payload()).await.unwrap();

        let err = auth.login_user("ana@escola.com", "errada1").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn register_and_login_are_logged_for_the_user() {
        let store = MemoryStore::new();
        let auth = service(&store);
        auth.register_user(&payload()).await.unwrap();
        auth.login_user("ana@escola.com", "senha123").await.unwrap();
        auth.login_user("ana@escola.com", "errada1").await.unwrap_err();

        let filter = ActivityFilter {
            user_id: None,
            module: Some("Auth".into()),
        };
        let logs = activity(&store)
            .list_logs(&filter, Page::new(1, 10))
            .await
            .unwrap();
        assert_eq!(logs.meta.total_items, 2);
        assert_eq!(logs.data[0].action, LogAction::Login);
        assert_eq!(
            logs.data[0].description,
            "User logged in successfully: ana@escola.com"
        );
        assert_eq!(logs.data[0].user_email.as_deref(), Some("ana@escola.com"));
        assert_eq!(logs.data[1].action, LogAction::Create);
    }

    #[tokio::test]
    async fn pepper_is_part_of_the_hash() {
        let hashed = hash_password("senha123", "pimenta").await.unwrap();
        assert!(verify_password("senha123", "pimenta", &hashed).await.unwrap());
        assert!(!verify_password("senha123", "", &hashed).await.unwrap());
    }

    #[tokio::test]
    async fn foreign_or_garbage_tokens_resolve_to_no_session() {
        let store = MemoryStore::new();
        let auth = service(&store);
        auth.register_user(&payload()).await.unwrap();

        let other = AuthService::new(
            Arc::new(store.clone()),
            activity(&store),
            "outro".into(),
            String::new(),
            7,
        );
        let foreign = other.create_token(1).unwrap();

        assert!(auth.resolve_session(&foreign).await.unwrap().is_none());
        assert!(auth.resolve_session("lixo").await.unwrap().is_none());
        // usuário removido ou inexistente
        let ghost = auth.create_token(9999).unwrap();
        assert!(auth.resolve_session(&ghost).await.unwrap().is_none());
    }
}
