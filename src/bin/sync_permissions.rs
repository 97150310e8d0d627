// src/bin/sync_permissions.rs
//
// Roda no deploy: migrações, seed do SUPER_ADMIN e sincronização das
// permissões declaradas. Sai com código 1 em qualquer falha.

use std::process::ExitCode;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use school_backend::{
    config::{Config, Stores},
    services::{permission_sync::PermissionSync, seed::seed_super_admin},
};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    match run().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            tracing::error!("❌ Sincronização terminou com falhas");
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!("❌ Falha na sincronização de permissões: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<bool> {
    let config = Config::from_env()?;
    let pool = config.connect().await?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados")?;

    let stores = Stores::postgres(pool);

    seed_super_admin(&config, stores.rbac.as_ref(), stores.users.as_ref())
        .await
        .context("Falha no seed do SUPER_ADMIN")?;

    let report = PermissionSync::new(stores.catalog)
        .sync(config.prune_orphaned_permissions)
        .await
        .context("Falha ao ler o catálogo de permissões")?;

    for failure in &report.failures {
        tracing::error!(
            service = %failure.service,
            permission = %failure.permission,
            "{}",
            failure.error
        );
    }

    Ok(report.is_success())
}
