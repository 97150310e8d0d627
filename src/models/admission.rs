// src/models/admission.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidateEmail, ValidationError};

// Números de protocolo: letras, dígitos, '_' e '-'
fn validate_code(value: &str) -> Result<(), ValidationError> {
    let valid = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        let mut err = ValidationError::new("code");
        err.message = Some("Use apenas letras, números, '_' e '-'.".into());
        return Err(err);
    }
    Ok(())
}

fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let valid = value
        .chars()
        .all(|c| c.is_ascii_digit() || "+-() ".contains(c));
    if !valid {
        let mut err = ValidationError::new("phone");
        err.message = Some("Telefone de contato inválido.".into());
        return Err(err);
    }
    Ok(())
}

// O formulário manda "" quando o e-mail não é informado
fn validate_email_or_blank(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || value.validate_email() {
        return Ok(());
    }
    let mut err = ValidationError::new("email");
    err.message = Some("O e-mail fornecido é inválido.".into());
    Err(err)
}

fn validate_not_in_future(value: &NaiveDate) -> Result<(), ValidationError> {
    if *value > Utc::now().date_naive() {
        let mut err = ValidationError::new("dob");
        err.message = Some("A data de nascimento não pode estar no futuro.".into());
        return Err(err);
    }
    Ok(())
}

// --- Consultas (pré-matrícula) ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Enquiry {
    pub id: i64,
    #[schema(example = "ENQ-2026-001")]
    pub enquiry_no: String,
    pub student_first_name: String,
    pub student_middle_name: Option<String>,
    pub student_last_name: String,
    pub guardian_first_name: String,
    pub guardian_last_name: String,
    pub contact_number: String,
    pub email: Option<String>,
    #[schema(example = 2026)]
    pub academic_year: i32,
    #[schema(example = "website")]
    pub source_of_enquiry: String,
    #[schema(example = "open")]
    pub status: String,
    pub remarks: Option<String>,
    pub next_follow_up_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEnquiryPayload {
    #[validate(
        length(min = 1, max = 64, message = "O número da consulta é obrigatório."),
        custom(function = "validate_code")
    )]
    #[schema(example = "ENQ-2026-001")]
    pub enquiry_no: String,

    #[validate(length(min = 1, message = "O nome do aluno é obrigatório."))]
    pub student_first_name: String,
    pub student_middle_name: Option<String>,
    #[validate(length(min = 1, message = "O sobrenome do aluno é obrigatório."))]
    pub student_last_name: String,

    #[validate(length(min = 1, message = "O nome do responsável é obrigatório."))]
    pub guardian_first_name: String,
    #[validate(length(min = 1, message = "O sobrenome do responsável é obrigatório."))]
    pub guardian_last_name: String,

    #[validate(
        length(min = 7, max = 15, message = "O telefone deve ter entre 7 e 15 dígitos."),
        custom(function = "validate_phone")
    )]
    #[schema(example = "(41) 99999-0000")]
    pub contact_number: String,

    #[validate(custom(function = "validate_email_or_blank"))]
    pub email: Option<String>,

    #[validate(range(min = 1, message = "O ano letivo deve ser positivo."))]
    #[schema(example = 2026)]
    pub academic_year: i32,

    #[validate(length(min = 1, message = "A origem da consulta é obrigatória."))]
    pub source_of_enquiry: String,
    #[validate(length(min = 1, message = "O status é obrigatório."))]
    pub status: String,
    pub remarks: Option<String>,
    pub next_follow_up_date: Option<NaiveDate>,
}

// --- Inscrições ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: i64,
    #[schema(example = "APP-2026-001")]
    pub application_no: String,
    pub enquiry_no: Option<String>,
    pub student_first_name: String,
    pub student_middle_name: Option<String>,
    pub student_last_name: String,
    pub guardian_first_name: String,
    pub guardian_last_name: String,
    pub dob: NaiveDate,
    /// 0 = masculino, 1 = feminino
    pub gender: i16,
    pub religion: Option<String>,
    pub previous_school: Option<String>,
    pub previous_class: Option<String>,
    pub academic_year: i32,
    #[schema(example = "6º ano")]
    pub class_applied: String,
    pub address: String,
    pub document: Option<String>,
    #[schema(example = "submitted")]
    pub application_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateApplicationPayload {
    #[validate(
        length(min = 1, max = 64, message = "O número da inscrição é obrigatório."),
        custom(function = "validate_code")
    )]
    #[schema(example = "APP-2026-001")]
    pub application_no: String,

    #[validate(
        length(min = 1, max = 64, message = "O número da consulta é inválido."),
        custom(function = "validate_code")
    )]
    pub enquiry_no: Option<String>,

    #[validate(length(min = 1, message = "O nome do aluno é obrigatório."))]
    pub student_first_name: String,
    pub student_middle_name: Option<String>,
    #[validate(length(min = 1, message = "O sobrenome do aluno é obrigatório."))]
    pub student_last_name: String,

    #[validate(length(min = 1, message = "O nome do responsável é obrigatório."))]
    pub guardian_first_name: String,
    #[validate(length(min = 1, message = "O sobrenome do responsável é obrigatório."))]
    pub guardian_last_name: String,

    #[validate(custom(function = "validate_not_in_future"))]
    #[schema(example = "2014-03-21")]
    pub dob: NaiveDate,

    #[validate(range(min = 0, max = 1, message = "Gênero inválido."))]
    pub gender: i16,

    pub religion: Option<String>,
    pub previous_school: Option<String>,
    pub previous_class: Option<String>,

    #[validate(range(min = 1, message = "O ano letivo deve ser positivo."))]
    pub academic_year: i32,

    #[validate(length(min = 1, message = "A turma pretendida é obrigatória."))]
    pub class_applied: String,
    #[validate(length(min = 1, message = "O endereço é obrigatório."))]
    pub address: String,

    pub document: Option<String>,

    #[validate(length(min = 1, message = "O status da inscrição é obrigatório."))]
    pub application_status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enquiry() -> CreateEnquiryPayload {
        CreateEnquiryPayload {
            enquiry_no: "ENQ-001".into(),
            student_first_name: "Lia".into(),
            student_middle_name: None,
            student_last_name: "Prado".into(),
            guardian_first_name: "Rita".into(),
            guardian_last_name: "Prado".into(),
            contact_number: "(41) 9999-0000".into(),
            email: Some(String::new()),
            academic_year: 2026,
            source_of_enquiry: "website".into(),
            status: "open".into(),
            remarks: None,
            next_follow_up_date: None,
        }
    }

    #[test]
    fn blank_email_is_accepted_but_malformed_is_not() {
        assert!(enquiry().validate().is_ok());

        let mut bad = enquiry();
        bad.email = Some("rita-at-prado".into());
        let errors = bad.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
    }

    #[test]
    fn protocol_numbers_and_phones_are_checked() {
        let mut bad = enquiry();
        bad.enquiry_no = "ENQ 001!".into();
        bad.contact_number = "ligue-me p.f.".into();
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("enquiry_no"));
        assert!(fields.contains_key("contact_number"));
    }

    #[test]
    fn birth_date_cannot_be_in_the_future() {
        let tomorrow = Utc::now().date_naive() + chrono::Duration::days(1);
        assert!(validate_not_in_future(&tomorrow).is_err());
        assert!(validate_not_in_future(&Utc::now().date_naive()).is_ok());
    }
}
