// tests/common/mod.rs
#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::Value;
use tower::ServiceExt;

use school_backend::{
    build_router,
    config::{AppState, Config, Stores},
    db::{MemoryStore, PermissionCatalog, RbacStore, UserStore},
    models::{auth::NewUser, rbac::NewRole},
};

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: MemoryStore,
}

/// App completo sobre o armazenamento em memória, com o catálogo já
/// sincronizado a partir das operações declaradas.
pub async fn setup() -> TestApp {
    let store = MemoryStore::new();
    let state = AppState::with_stores(
        Config::new("postgres://unused/test", "test-secret"),
        Stores::shared(store.clone()),
    );
    let report = state.permission_sync.sync(false).await.unwrap();
    assert!(report.is_success());

    TestApp {
        router: build_router(state.clone()),
        state,
        store,
    }
}

impl TestApp {
    /// Cria um usuário com os cargos informados e devolve `(id, token)`.
    pub async fn user_with_roles(&self, email: &str, roles: &[&str]) -> (i64, String) {
        let user = self
            .store
            .create_user(&NewUser {
                first_name: "Teste".into(),
                last_name: "Usuário".into(),
                email: email.into(),
                password_hash: "not-used".into(),
                profile_photo: None,
            })
            .await
            .unwrap();

        let mut role_ids = Vec::new();
        for name in roles {
            role_ids.push(self.role(name).await);
        }
        if !role_ids.is_empty() {
            self.store.assign_roles(user.id, &role_ids).await.unwrap();
        }

        let token = self.state.auth_service.create_token(user.id).unwrap();
        (user.id, token)
    }

    /// Id do cargo, criando-o se preciso (SUPER_ADMIN nasce como cargo de sistema).
    pub async fn role(&self, name: &str) -> i64 {
        self.store
            .ensure_role(&NewRole {
                name: name.into(),
                description: None,
                is_system_role: name == "SUPER_ADMIN",
            })
            .await
            .unwrap()
            .id
    }

    pub async fn permission_id(&self, name: &str) -> i64 {
        self.store
            .all_permissions()
            .await
            .unwrap()
            .into_iter()
            .find(|p| p.name == name)
            .unwrap_or_else(|| panic!("permissão {name} não sincronizada"))
            .id
    }

    pub async fn grant(&self, role: &str, permission: &str) {
        let role_id = self.role(role).await;
        let permission_id = self.permission_id(permission).await;
        self.store
            .assign_permissions(role_id, &[permission_id])
            .await
            .unwrap();
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }
}

pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn school_body() -> Value {
    serde_json::json!({
        "legalName": "Colégio Aurora Ltda",
        "displayName": "Colégio Aurora",
        "schoolType": "secondary",
        "status": "active",
        "city": "Curitiba"
    })
}
