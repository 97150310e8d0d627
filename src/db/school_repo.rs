// src/db/school_repo.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, postgres::PgArguments, query::QueryAs};

use crate::common::error::{AppError, AppResult};
use crate::db::{SchoolStore, on_unique_violation};
use crate::models::school::{Branch, CreateBranchPayload, School, SchoolInput};

type SchoolQuery<'q> = QueryAs<'q, Postgres, School, PgArguments>;

// Campos do formulário na ordem $1..$11
fn bind_school<'q>(query: SchoolQuery<'q>, input: &'q SchoolInput) -> SchoolQuery<'q> {
    query
        .bind(&input.legal_name)
        .bind(&input.display_name)
        .bind(&input.school_type)
        .bind(&input.status)
        .bind(&input.registration_number)
        .bind(&input.email)
        .bind(&input.phone_main)
        .bind(&input.website)
        .bind(&input.address_line1)
        .bind(&input.city)
        .bind(&input.motto)
}

#[derive(Clone)]
pub struct SchoolRepository {
    pool: PgPool,
}

impl SchoolRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SchoolStore for SchoolRepository {
    async fn get_school(&self) -> AppResult<Option<School>> {
        let school = sqlx::query_as::<_, School>("SELECT * FROM schools ORDER BY id LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(school)
    }

    // A aplicação gerencia uma única escola: atualiza se existir, senão cria
    async fn upsert_school(&self, input: &SchoolInput) -> AppResult<School> {
        let mut tx = self.pool.begin().await?;

        let current =
            sqlx::query_scalar::<_, i64>("SELECT id FROM schools ORDER BY id LIMIT 1 FOR UPDATE")
                .fetch_optional(&mut *tx)
                .await?;

        let school = match current {
            Some(id) => {
                bind_school(
                    sqlx::query_as::<_, School>(
                        r#"
                        UPDATE schools
                        SET legal_name = $1, display_name = $2, school_type = $3, status = $4,
                            registration_number = $5, email = $6, phone_main = $7, website = $8,
                            address_line1 = $9, city = $10, motto = $11, updated_at = now()
                        WHERE id = $12
                        RETURNING *
                        "#,
                    ),
                    input,
                )
                .bind(id)
                .fetch_one(&mut *tx)
                .await?
            }
            None => {
                bind_school(
                    sqlx::query_as::<_, School>(
                        r#"
                        INSERT INTO schools (legal_name, display_name, school_type, status,
                            registration_number, email, phone_main, website, address_line1, city, motto)
                        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                        RETURNING *
                        "#,
                    ),
                    input,
                )
                .fetch_one(&mut *tx)
                .await?
            }
        };

        tx.commit().await?;
        Ok(school)
    }

    async fn list_branches(&self, school_id: i64) -> AppResult<Vec<Branch>> {
        let branches = sqlx::query_as::<_, Branch>(
            "SELECT * FROM branches WHERE school_id = $1 ORDER BY branch_name",
        )
        .bind(school_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(branches)
    }

    async fn create_branch(
        &self,
        school_id: i64,
        input: &CreateBranchPayload,
    ) -> AppResult<Branch> {
        sqlx::query_as::<_, Branch>(
            r#"
            INSERT INTO branches (school_id, branch_name, branch_code, branch_email, branch_phone_number)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(school_id)
        .bind(&input.branch_name)
        .bind(&input.branch_code)
        .bind(&input.branch_email)
        .bind(&input.branch_phone_number)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_foreign_key_violation() {
                    return AppError::SchoolNotFound;
                }
            }
            on_unique_violation(e, AppError::BranchCodeAlreadyExists)
        })
    }
}
