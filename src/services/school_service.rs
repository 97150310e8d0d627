// src/services/school_service.rs

use std::sync::Arc;

use crate::common::error::{AppError, AppResult};
use crate::db::SchoolStore;
use crate::models::activity::{AuditEvent, LogAction};
use crate::models::school::{Branch, CreateBranchPayload, School, SchoolInput, SchoolView};

crate::operation!(pub SCHOOL_GET = "school.get", permission("school", "read"));
crate::operation!(pub SCHOOL_UPSERT = "school.upsert", permission("school", "update"));
crate::operation!(pub BRANCH_LIST = "branch.list", permission("branch", "read"));
crate::operation!(pub BRANCH_CREATE = "branch.create", permission("branch", "create"));

pub const SCHOOL_UPDATED: AuditEvent =
    AuditEvent::new(LogAction::Update, "School", "School details updated");
pub const BRANCH_CREATED: AuditEvent = AuditEvent::new(LogAction::Create, "Branch", "New branch created");

/// Cadastro da escola (há no máximo uma) e das suas filiais.
#[derive(Clone)]
pub struct SchoolService {
    store: Arc<dyn SchoolStore>,
}

impl SchoolService {
    pub fn new(store: Arc<dyn SchoolStore>) -> Self {
        Self { store }
    }

    pub async fn get_school(&self) -> AppResult<SchoolView> {
        match self.store.get_school().await? {
            Some(school) => {
                let branches = self.store.list_branches(school.id).await?;
                Ok(SchoolView::new(school, branches))
            }
            None => Ok(SchoolView::empty()),
        }
    }

    pub async fn upsert_school(&self, input: &SchoolInput) -> AppResult<School> {
        let school = self.store.upsert_school(input).await?;
        tracing::info!(target: "audit", school_id = school.id, "🏫 Dados da escola salvos");
        Ok(school)
    }

    pub async fn list_branches(&self) -> AppResult<Vec<Branch>> {
        match self.store.get_school().await? {
            Some(school) => self.store.list_branches(school.id).await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn create_branch(&self, input: &CreateBranchPayload) -> AppResult<Branch> {
        let school = self.store.get_school().await?.ok_or(AppError::SchoolNotFound)?;
        let branch = self.store.create_branch(school.id, input).await?;
        tracing::info!(target: "audit", branch_id = branch.id, code = %branch.branch_code, "🏢 Filial criada");
        Ok(branch)
    }
}
