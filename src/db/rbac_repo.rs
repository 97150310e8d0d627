// src/db/rbac_repo.rs

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use crate::common::{
    error::{AppError, AppResult},
    response::Page,
};
use crate::db::{PermissionCatalog, RbacStore, format_ids, missing_ids, on_unique_violation};
use crate::models::rbac::{
    NewPermission, NewRole, Permission, Role, RoleWithPermissions, UpdateRolePayload,
    UpsertOutcome,
};

const ROLE_COLUMNS: &str = "id, name, description, is_system_role, created_at, updated_at";

#[derive(Clone)]
pub struct RbacRepository {
    pool: PgPool,
}

impl RbacRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Trava a linha do cargo até o fim da transação.
async fn lock_role(conn: &mut PgConnection, role_id: i64) -> AppResult<()> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM roles WHERE id = $1 FOR UPDATE")
        .bind(role_id)
        .fetch_optional(&mut *conn)
        .await?
        .map(|_| ())
        .ok_or(AppError::RoleNotFound)
}

async fn role_snapshot(
    conn: &mut PgConnection,
    role_id: i64,
) -> AppResult<Option<RoleWithPermissions>> {
    let role = sqlx::query_as::<_, Role>(&format!(
        "SELECT {ROLE_COLUMNS} FROM roles WHERE id = $1"
    ))
    .bind(role_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(role) = role else {
        return Ok(None);
    };

    let permissions = sqlx::query_as::<_, Permission>(
        r#"
        SELECT p.id, p.name, p.module, p.description
        FROM permissions p
        JOIN role_permissions rp ON rp.permission_id = p.id
        WHERE rp.role_id = $1
        ORDER BY p.name
        "#,
    )
    .bind(role_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(RoleWithPermissions { role, permissions }))
}

// Inserção em massa usando UNNEST; vínculos já existentes são ignorados
async fn link_permissions(
    conn: &mut PgConnection,
    role_id: i64,
    permission_ids: &[i64],
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO role_permissions (role_id, permission_id)
        SELECT $1, unnest($2::bigint[])
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(role_id)
    .bind(permission_ids)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

#[async_trait]
impl PermissionCatalog for RbacRepository {
    async fn upsert_permission(&self, permission: &NewPermission) -> AppResult<UpsertOutcome> {
        // Sem linha retornada = nada mudou (o WHERE do DO UPDATE filtrou).
        let inserted = sqlx::query_scalar::<_, bool>(
            r#"
            INSERT INTO permissions (name, module, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO UPDATE
            SET module = EXCLUDED.module,
                description = EXCLUDED.description,
                updated_at = now()
            WHERE permissions.module IS DISTINCT FROM EXCLUDED.module
               OR permissions.description IS DISTINCT FROM EXCLUDED.description
            RETURNING (xmax = 0) AS inserted
            "#,
        )
        .bind(&permission.name)
        .bind(&permission.module)
        .bind(&permission.description)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match inserted {
            Some(true) => UpsertOutcome::Created,
            Some(false) => UpsertOutcome::Updated,
            None => UpsertOutcome::Unchanged,
        })
    }

    async fn all_permissions(&self) -> AppResult<Vec<Permission>> {
        let permissions = sqlx::query_as::<_, Permission>(
            "SELECT id, name, module, description FROM permissions ORDER BY module, name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(permissions)
    }

    async fn delete_permissions(&self, names: &[String]) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM permissions WHERE name = ANY($1)")
            .bind(names)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl RbacStore for RbacRepository {
    async fn user_has_permission(&self, user_id: i64, permission_name: &str) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM user_roles ur
                JOIN role_permissions rp ON rp.role_id = ur.role_id
                JOIN permissions p ON p.id = rp.permission_id
                WHERE ur.user_id = $1
                  AND p.name = $2
            )
            "#,
        )
        .bind(user_id)
        .bind(permission_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn list_modules(&self) -> AppResult<Vec<String>> {
        let modules =
            sqlx::query_scalar::<_, String>("SELECT DISTINCT module FROM permissions ORDER BY module")
                .fetch_all(&self.pool)
                .await?;
        Ok(modules)
    }

    async fn list_permissions(
        &self,
        module: Option<&str>,
        page: Page,
    ) -> AppResult<(Vec<Permission>, i64)> {
        let permissions = sqlx::query_as::<_, Permission>(
            r#"
            SELECT id, name, module, description
            FROM permissions
            WHERE ($1::text IS NULL OR module = $1)
            ORDER BY module, name
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(module)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM permissions WHERE ($1::text IS NULL OR module = $1)",
        )
        .bind(module)
        .fetch_one(&self.pool)
        .await?;

        Ok((permissions, total))
    }

    async fn create_role(&self, role: &NewRole) -> AppResult<Role> {
        sqlx::query_as::<_, Role>(&format!(
            "INSERT INTO roles (name, description, is_system_role) VALUES ($1, $2, $3) RETURNING {ROLE_COLUMNS}"
        ))
        .bind(&role.name)
        .bind(&role.description)
        .bind(role.is_system_role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| on_unique_violation(e, AppError::RoleNameAlreadyExists))
    }

    async fn ensure_role(&self, role: &NewRole) -> AppResult<Role> {
        let role = sqlx::query_as::<_, Role>(&format!(
            r#"
            INSERT INTO roles (name, description, is_system_role)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO UPDATE
            SET is_system_role = roles.is_system_role OR EXCLUDED.is_system_role
            RETURNING {ROLE_COLUMNS}
            "#
        ))
        .bind(&role.name)
        .bind(&role.description)
        .bind(role.is_system_role)
        .fetch_one(&self.pool)
        .await?;
        Ok(role)
    }

    async fn find_role(&self, id: i64) -> AppResult<Option<Role>> {
        let role = sqlx::query_as::<_, Role>(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(role)
    }

    async fn list_roles(&self, search: Option<&str>, page: Page) -> AppResult<(Vec<Role>, i64)> {
        let roles = sqlx::query_as::<_, Role>(&format!(
            r#"
            SELECT {ROLE_COLUMNS} FROM roles
            WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%')
            ORDER BY name
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(search)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM roles WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%')",
        )
        .bind(search)
        .fetch_one(&self.pool)
        .await?;

        Ok((roles, total))
    }

    async fn update_role(&self, id: i64, changes: &UpdateRolePayload) -> AppResult<Role> {
        sqlx::query_as::<_, Role>(&format!(
            r#"
            UPDATE roles
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                updated_at = now()
            WHERE id = $1
            RETURNING {ROLE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| on_unique_violation(e, AppError::RoleNameAlreadyExists))?
        .ok_or(AppError::RoleNotFound)
    }

    async fn delete_role(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::RoleNotFound);
        }
        Ok(())
    }

    async fn assign_permissions(
        &self,
        role_id: i64,
        permission_ids: &[i64],
    ) -> AppResult<RoleWithPermissions> {
        let mut tx = self.pool.begin().await?;

        lock_role(&mut tx, role_id).await?;

        let found = sqlx::query_scalar::<_, i64>("SELECT id FROM permissions WHERE id = ANY($1)")
            .bind(permission_ids)
            .fetch_all(&mut *tx)
            .await?;

        let missing = missing_ids(permission_ids, &found);
        if !missing.is_empty() {
            return Err(AppError::invalid_input(
                "permissionIds",
                format!("unknown permission ids: {}", format_ids(&missing)),
            ));
        }

        link_permissions(&mut tx, role_id, permission_ids).await?;
        let snapshot = role_snapshot(&mut tx, role_id).await?;
        tx.commit().await?;

        snapshot.ok_or(AppError::RoleNotFound)
    }

    async fn assign_module_permissions(
        &self,
        role_id: i64,
        module: &str,
    ) -> AppResult<RoleWithPermissions> {
        let mut tx = self.pool.begin().await?;

        lock_role(&mut tx, role_id).await?;

        let module_ids = sqlx::query_scalar::<_, i64>("SELECT id FROM permissions WHERE module = $1")
            .bind(module)
            .fetch_all(&mut *tx)
            .await?;

        if module_ids.is_empty() {
            return Err(AppError::NoModulePermissions(module.to_string()));
        }

        link_permissions(&mut tx, role_id, &module_ids).await?;
        let snapshot = role_snapshot(&mut tx, role_id).await?;
        tx.commit().await?;

        snapshot.ok_or(AppError::RoleNotFound)
    }

    async fn remove_permissions(
        &self,
        role_id: i64,
        permission_ids: &[i64],
    ) -> AppResult<RoleWithPermissions> {
        let mut tx = self.pool.begin().await?;

        lock_role(&mut tx, role_id).await?;

        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1 AND permission_id = ANY($2)")
            .bind(role_id)
            .bind(permission_ids)
            .execute(&mut *tx)
            .await?;

        let snapshot = role_snapshot(&mut tx, role_id).await?;
        tx.commit().await?;

        snapshot.ok_or(AppError::RoleNotFound)
    }

    async fn role_with_permissions(&self, role_id: i64) -> AppResult<Option<RoleWithPermissions>> {
        let mut conn = self.pool.acquire().await?;
        role_snapshot(&mut conn, role_id).await
    }
}
