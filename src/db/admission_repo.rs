// src/db/admission_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::common::error::{AppError, AppResult};
use crate::db::{AdmissionStore, on_unique_violation};
use crate::models::admission::{
    Application, CreateApplicationPayload, CreateEnquiryPayload, Enquiry,
};

#[derive(Clone)]
pub struct AdmissionRepository {
    pool: PgPool,
}

impl AdmissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdmissionStore for AdmissionRepository {
    async fn create_enquiry(&self, input: &CreateEnquiryPayload) -> AppResult<Enquiry> {
        sqlx::query_as::<_, Enquiry>(
            r#"
            INSERT INTO enquiries (enquiry_no, student_first_name, student_middle_name,
                student_last_name, guardian_first_name, guardian_last_name, contact_number,
                email, academic_year, source_of_enquiry, status, remarks, next_follow_up_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(&input.enquiry_no)
        .bind(&input.student_first_name)
        .bind(&input.student_middle_name)
        .bind(&input.student_last_name)
        .bind(&input.guardian_first_name)
        .bind(&input.guardian_last_name)
        .bind(&input.contact_number)
        .bind(&input.email)
        .bind(input.academic_year)
        .bind(&input.source_of_enquiry)
        .bind(&input.status)
        .bind(&input.remarks)
        .bind(input.next_follow_up_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| on_unique_violation(e, AppError::EnquiryNoAlreadyExists))
    }

    async fn create_application(&self, input: &CreateApplicationPayload) -> AppResult<Application> {
        sqlx::query_as::<_, Application>(
            r#"
            INSERT INTO applications (application_no, enquiry_no, student_first_name,
                student_middle_name, student_last_name, guardian_first_name, guardian_last_name,
                dob, gender, religion, previous_school, previous_class, academic_year,
                class_applied, address, document, application_status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING *
            "#,
        )
        .bind(&input.application_no)
        .bind(&input.enquiry_no)
        .bind(&input.student_first_name)
        .bind(&input.student_middle_name)
        .bind(&input.student_last_name)
        .bind(&input.guardian_first_name)
        .bind(&input.guardian_last_name)
        .bind(input.dob)
        .bind(input.gender)
        .bind(&input.religion)
        .bind(&input.previous_school)
        .bind(&input.previous_class)
        .bind(input.academic_year)
        .bind(&input.class_applied)
        .bind(&input.address)
        .bind(&input.document)
        .bind(&input.application_status)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| on_unique_violation(e, AppError::ApplicationNoAlreadyExists))
    }
}
