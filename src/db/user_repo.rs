use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use crate::common::{
    error::{AppError, AppResult},
    response::Page,
};
use crate::db::{UserStore, format_ids, missing_ids, on_unique_violation};
use crate::models::auth::{NewUser, SessionRole, User};

// O repositório de usuários, responsável pelas tabelas 'users' e 'user_roles'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn lock_user(conn: &mut PgConnection, user_id: i64) -> AppResult<()> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?
        .map(|_| ())
        .ok_or(AppError::UserNotFound)
}

#[async_trait]
impl UserStore for UserRepository {
    async fn create_user(&self, user: &NewUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (first_name, last_name, email, password_hash, profile_photo)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.profile_photo)
        .fetch_one(&self.pool)
        .await
        // Converte erro de violação de chave única em um erro mais amigável
        .map_err(|e| on_unique_violation(e, AppError::EmailAlreadyExists))
    }

    async fn upsert_user_by_email(&self, user: &NewUser) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (first_name, last_name, email, password_hash, profile_photo)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO UPDATE
            SET password_hash = EXCLUDED.password_hash, updated_at = now()
            RETURNING *
            "#,
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.profile_photo)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    // Busca um usuário pelo seu e-mail
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    // Busca um usuário pelo seu ID
    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn list_users(&self, search: Option<&str>, page: Page) -> AppResult<(Vec<User>, i64)> {
        const FILTER: &str = r#"
            ($1::text IS NULL
             OR first_name ILIKE '%' || $1 || '%'
             OR last_name ILIKE '%' || $1 || '%'
             OR email ILIKE '%' || $1 || '%')
        "#;

        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT * FROM users WHERE {FILTER} ORDER BY id LIMIT $2 OFFSET $3"
        ))
        .bind(search)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM users WHERE {FILTER}"))
            .bind(search)
            .fetch_one(&self.pool)
            .await?;

        Ok((users, total))
    }

    async fn roles_for_user(&self, user_id: i64) -> AppResult<Vec<SessionRole>> {
        let rows = sqlx::query_as::<_, (String, Vec<String>)>(
            r#"
            SELECT r.name,
                   COALESCE(
                       array_agg(p.name ORDER BY p.name) FILTER (WHERE p.name IS NOT NULL),
                       '{}'
                   ) AS permissions
            FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            LEFT JOIN role_permissions rp ON rp.role_id = r.id
            LEFT JOIN permissions p ON p.id = rp.permission_id
            WHERE ur.user_id = $1
            GROUP BY r.id, r.name
            ORDER BY r.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(name, permissions)| SessionRole { name, permissions })
            .collect())
    }

    async fn assign_roles(&self, user_id: i64, role_ids: &[i64]) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        lock_user(&mut tx, user_id).await?;

        let found = sqlx::query_scalar::<_, i64>("SELECT id FROM roles WHERE id = ANY($1)")
            .bind(role_ids)
            .fetch_all(&mut *tx)
            .await?;

        let missing = missing_ids(role_ids, &found);
        if !missing.is_empty() {
            return Err(AppError::invalid_input(
                "roleIds",
                format!("unknown role ids: {}", format_ids(&missing)),
            ));
        }

        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_id)
            SELECT $1, unnest($2::bigint[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(role_ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn revoke_roles(&self, user_id: i64, role_ids: &[i64]) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        lock_user(&mut tx, user_id).await?;

        sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role_id = ANY($2)")
            .bind(user_id)
            .bind(role_ids)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
