// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
    common::i18n::I18nStore,
    db::{
        ActivityRepository, ActivityStore, AdmissionRepository, AdmissionStore,
        PermissionCatalog, RbacRepository, RbacStore, SchoolRepository, SchoolStore,
        UserRepository, UserStore,
    },
    middleware::guard::Guard,
    services::{
        activity_service::ActivityService, admission_service::AdmissionService,
        auth::AuthService, permission_service::PermissionService,
        permission_sync::PermissionSync, role_service::RoleService,
        school_service::SchoolService, user_service::UserService,
    },
};

pub const DEFAULT_SUPER_ADMIN_EMAIL: &str = "super@system.com";

/// Configuração lida das variáveis de ambiente (`.env` opcional).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub token_ttl_days: i64,
    pub password_pepper: String,
    pub super_admin_email: String,
    pub super_admin_password: Option<String>,
    pub prune_orphaned_permissions: bool,
}

impl Config {
    pub fn new(database_url: impl Into<String>, jwt_secret: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            jwt_secret: jwt_secret.into(),
            bind_addr: "0.0.0.0:3000".into(),
            db_max_connections: 5,
            token_ttl_days: 7,
            password_pepper: String::new(),
            super_admin_email: DEFAULT_SUPER_ADMIN_EMAIL.into(),
            super_admin_password: None,
            prune_orphaned_permissions: false,
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;
        let mut config = Self::new(database_url, jwt_secret);

        if let Ok(addr) = env::var("BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(max) = env::var("DB_MAX_CONNECTIONS") {
            config.db_max_connections = max
                .parse()
                .context("DB_MAX_CONNECTIONS deve ser um número")?;
        }
        if let Ok(days) = env::var("TOKEN_TTL_DAYS") {
            config.token_ttl_days = days.parse().context("TOKEN_TTL_DAYS deve ser um número")?;
        }
        if let Ok(pepper) = env::var("PASSWORD_PEPPER") {
            config.password_pepper = pepper;
        }
        if let Ok(email) = env::var("SUPER_ADMIN_EMAIL") {
            config.super_admin_email = email;
        }
        config.super_admin_password = env::var("SUPER_ADMIN_PASSWORD")
            .ok()
            .filter(|p| !p.is_empty());
        if let Ok(prune) = env::var("PRUNE_ORPHANED_PERMISSIONS") {
            config.prune_orphaned_permissions = parse_flag(&prune)
                .with_context(|| format!("PRUNE_ORPHANED_PERMISSIONS inválido: '{prune}'"))?;
        }

        Ok(config)
    }

    pub async fn connect(&self) -> anyhow::Result<PgPool> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let pool = PgPoolOptions::new()
            .max_connections(self.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&self.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
        Ok(pool)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Os armazenamentos usados pelos serviços.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub rbac: Arc<dyn RbacStore>,
    pub catalog: Arc<dyn PermissionCatalog>,
    pub schools: Arc<dyn SchoolStore>,
    pub activity: Arc<dyn ActivityStore>,
    pub admissions: Arc<dyn AdmissionStore>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        let rbac = RbacRepository::new(pool.clone());
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            rbac: Arc::new(rbac.clone()),
            catalog: Arc::new(rbac),
            schools: Arc::new(SchoolRepository::new(pool.clone())),
            activity: Arc::new(ActivityRepository::new(pool.clone())),
            admissions: Arc::new(AdmissionRepository::new(pool)),
        }
    }

    /// Um único armazenamento que implementa todos os traits.
    pub fn shared<S>(store: S) -> Self
    where
        S: UserStore
            + RbacStore
            + PermissionCatalog
            + SchoolStore
            + ActivityStore
            + AdmissionStore
            + Clone
            + 'static,
    {
        Self {
            users: Arc::new(store.clone()),
            rbac: Arc::new(store.clone()),
            catalog: Arc::new(store.clone()),
            schools: Arc::new(store.clone()),
            activity: Arc::new(store.clone()),
            admissions: Arc::new(store),
        }
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub i18n_store: Arc<I18nStore>,
    pub guard: Guard,
    pub auth_service: AuthService,
    pub permission_service: PermissionService,
    pub permission_sync: PermissionSync,
    pub role_service: RoleService,
    pub user_service: UserService,
    pub school_service: SchoolService,
    pub admission_service: AdmissionService,
    pub activity_service: ActivityService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<(Self, PgPool)> {
        let pool = config.connect().await?;
        let state = Self::with_stores(config, Stores::postgres(pool.clone()));
        Ok((state, pool))
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_stores(config: Config, stores: Stores) -> Self {
        let permission_service = PermissionService::new(stores.rbac.clone());
        let guard = Guard::new(permission_service.clone());
        let activity_service = ActivityService::new(stores.activity.clone());
        let auth_service = AuthService::new(
            stores.users.clone(),
            activity_service.clone(),
            config.jwt_secret.clone(),
            config.password_pepper.clone(),
            config.token_ttl_days,
        );

        Self {
            i18n_store: Arc::new(I18nStore::new()),
            guard,
            auth_service,
            permission_sync: PermissionSync::new(stores.catalog.clone()),
            role_service: RoleService::new(stores.rbac.clone()),
            user_service: UserService::new(stores.users.clone(), config.password_pepper.clone()),
            school_service: SchoolService::new(stores.schools.clone()),
            admission_service: AdmissionService::new(stores.admissions.clone()),
            activity_service,
            permission_service,
        }
    }
}
