// src/models/school.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct School {
    pub id: i64,
    #[schema(example = "Colégio Aurora Ltda")]
    pub legal_name: String,
    #[schema(example = "Colégio Aurora")]
    pub display_name: String,
    #[schema(example = "secondary")]
    pub school_type: String,
    #[schema(example = "active")]
    pub status: String,
    pub registration_number: Option<String>,
    pub email: Option<String>,
    pub phone_main: Option<String>,
    pub website: Option<String>,
    pub address_line1: Option<String>,
    pub city: Option<String>,
    pub motto: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub id: i64,
    pub school_id: i64,
    #[schema(example = "Unidade Centro")]
    pub branch_name: String,
    #[schema(example = "CTR-01")]
    pub branch_code: String,
    pub branch_email: Option<String>,
    pub branch_phone_number: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Escola com as filiais, no formato da tela de configuração.
/// Sem escola cadastrada, `id` vem nulo e os campos com os valores padrão.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchoolView {
    pub id: Option<i64>,
    pub legal_name: String,
    pub display_name: String,
    pub school_type: String,
    pub status: String,
    pub registration_number: Option<String>,
    pub email: Option<String>,
    pub phone_main: Option<String>,
    pub website: Option<String>,
    pub address_line1: Option<String>,
    pub city: Option<String>,
    pub motto: Option<String>,
    pub branches: Vec<Branch>,
}

impl SchoolView {
    pub fn empty() -> Self {
        Self {
            id: None,
            legal_name: String::new(),
            display_name: String::new(),
            school_type: "secondary".into(),
            status: "active".into(),
            registration_number: None,
            email: None,
            phone_main: None,
            website: None,
            address_line1: None,
            city: None,
            motto: None,
            branches: Vec::new(),
        }
    }

    pub fn new(school: School, branches: Vec<Branch>) -> Self {
        Self {
            id: Some(school.id),
            legal_name: school.legal_name,
            display_name: school.display_name,
            school_type: school.school_type,
            status: school.status,
            registration_number: school.registration_number,
            email: school.email,
            phone_main: school.phone_main,
            website: school.website,
            address_line1: school.address_line1,
            city: school.city,
            motto: school.motto,
            branches,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchoolInput {
    #[validate(length(min = 1, message = "A razão social é obrigatória."))]
    pub legal_name: String,
    #[validate(length(min = 1, message = "O nome de exibição é obrigatório."))]
    pub display_name: String,
    #[schema(example = "secondary")]
    pub school_type: String,
    #[schema(example = "active")]
    pub status: String,
    pub registration_number: Option<String>,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,
    pub phone_main: Option<String>,
    pub website: Option<String>,
    pub address_line1: Option<String>,
    pub city: Option<String>,
    pub motto: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBranchPayload {
    #[validate(length(min = 1, message = "O nome da filial é obrigatório."))]
    pub branch_name: String,
    #[validate(length(min = 1, max = 32, message = "O código deve ter até 32 caracteres."))]
    pub branch_code: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub branch_email: Option<String>,
    pub branch_phone_number: Option<String>,
}
