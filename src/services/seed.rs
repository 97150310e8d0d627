// src/services/seed.rs

use crate::{
    common::error::AppResult,
    config::Config,
    db::{RbacStore, UserStore},
    models::{
        auth::NewUser,
        rbac::{NewRole, Role, SUPER_ADMIN_ROLE},
    },
    services::auth::hash_password,
};

/// Garante o cargo SUPER_ADMIN e, com `SUPER_ADMIN_PASSWORD` definida, o
/// usuário administrador vinculado a ele. Pode rodar várias vezes.
pub async fn seed_super_admin(
    config: &Config,
    rbac: &dyn RbacStore,
    users: &dyn UserStore,
) -> AppResult<Role> {
    let role = rbac
        .ensure_role(&NewRole {
            name: SUPER_ADMIN_ROLE.into(),
            description: Some("Acesso total ao sistema".into()),
            is_system_role: true,
        })
        .await?;
    tracing::info!(role_id = role.id, "🛡️ Cargo SUPER_ADMIN garantido");

    let Some(password) = config.super_admin_password.as_deref() else {
        tracing::warn!("⚠️ SUPER_ADMIN_PASSWORD não definida; usuário administrador não foi criado");
        return Ok(role);
    };

    let password_hash = hash_password(password, &config.password_pepper).await?;
    let admin = users
        .upsert_user_by_email(&NewUser {
            first_name: "Super".into(),
            last_name: "Admin".into(),
            email: config.super_admin_email.trim().to_lowercase(),
            password_hash,
            profile_photo: None,
        })
        .await?;
    users.assign_roles(admin.id, &[role.id]).await?;

    tracing::info!(user_id = admin.id, email = %admin.email, "✅ Usuário SUPER_ADMIN pronto");
    Ok(role)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    #[tokio::test]
    async fn seeding_twice_keeps_one_admin_with_the_role() {
        let store = MemoryStore::new();
        let mut config = Config::new("postgres://localhost/escola", "segredo");
        config.super_admin_password = Some("trocar123".into());

        let first = seed_super_admin(&config, &store, &store).await.unwrap();
        let second = seed_super_admin(&config, &store, &store).await.unwrap();
        assert_eq!(first.id, second.id);
        assert!(second.is_system_role);

        let admin = store
            .find_by_email("super@system.com")
            .await
            .unwrap()
            .unwrap();
        let roles = store.roles_for_user(admin.id).await.unwrap();
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].name, SUPER_ADMIN_ROLE);
    }

    #[tokio::test]
    async fn without_password_only_the_role_is_created() {
        let store = MemoryStore::new();
        let config = Config::new("postgres://localhost/escola", "segredo");

        seed_super_admin(&config, &store, &store).await.unwrap();
        assert!(store.find_by_email("super@system.com").await.unwrap().is_none());
    }
}
