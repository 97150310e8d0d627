// src/services/admission_service.rs

use std::sync::Arc;

use crate::common::error::AppResult;
use crate::db::AdmissionStore;
use crate::models::activity::{AuditEvent, LogAction};
use crate::models::admission::{
    Application, CreateApplicationPayload, CreateEnquiryPayload, Enquiry,
};

crate::operation!(pub ENQUIRY_CREATE = "enquiry.create", permission("enquiry", "create"));
crate::operation!(pub APPLICATION_CREATE = "application.create", permission("application", "create"));

pub const ENQUIRY_CREATED: AuditEvent =
    AuditEvent::new(LogAction::Create, "Enquiry", "New Enquiry Created");
pub const APPLICATION_CREATED: AuditEvent =
    AuditEvent::new(LogAction::Create, "Application", "New Application Created");

fn trimmed(value: &str) -> String {
    value.trim().to_string()
}

// "" e "   " viram NULL
fn optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Consultas e inscrições do processo de admissão.
#[derive(Clone)]
pub struct AdmissionService {
    store: Arc<dyn AdmissionStore>,
}

impl AdmissionService {
    pub fn new(store: Arc<dyn AdmissionStore>) -> Self {
        Self { store }
    }

    pub async fn create_enquiry(&self, payload: &CreateEnquiryPayload) -> AppResult<Enquiry> {
        let input = CreateEnquiryPayload {
            enquiry_no: trimmed(&payload.enquiry_no),
            student_first_name: trimmed(&payload.student_first_name),
            student_middle_name: optional(&payload.student_middle_name),
            student_last_name: trimmed(&payload.student_last_name),
            guardian_first_name: trimmed(&payload.guardian_first_name),
            guardian_last_name: trimmed(&payload.guardian_last_name),
            contact_number: trimmed(&payload.contact_number),
            email: optional(&payload.email).map(|e| e.to_lowercase()),
            academic_year: payload.academic_year,
            source_of_enquiry: trimmed(&payload.source_of_enquiry),
            status: trimmed(&payload.status),
            remarks: optional(&payload.remarks),
            next_follow_up_date: payload.next_follow_up_date,
        };
        let enquiry = self.store.create_enquiry(&input).await?;
        tracing::info!(enquiry_id = enquiry.id, enquiry_no = %enquiry.enquiry_no, "📋 Consulta registrada");
        Ok(enquiry)
    }

    pub async fn create_application(
        &self,
        payload: &CreateApplicationPayload,
    ) -> AppResult<Application> {
        let input = CreateApplicationPayload {
            application_no: trimmed(&payload.application_no),
            enquiry_no: optional(&payload.enquiry_no),
            student_first_name: trimmed(&payload.student_first_name),
            student_middle_name: optional(&payload.student_middle_name),
            student_last_name: trimmed(&payload.student_last_name),
            guardian_first_name: trimmed(&payload.guardian_first_name),
            guardian_last_name: trimmed(&payload.guardian_last_name),
            dob: payload.dob,
            gender: payload.gender,
            religion: optional(&payload.religion),
            previous_school: optional(&payload.previous_school),
            previous_class: optional(&payload.previous_class),
            academic_year: payload.academic_year,
            class_applied: trimmed(&payload.class_applied),
            address: trimmed(&payload.address),
            document: optional(&payload.document),
            application_status: trimmed(&payload.application_status),
        };
        let application = self.store.create_application(&input).await?;
        tracing::info!(
            application_id = application.id,
            application_no = %application.application_no,
            "📝 Inscrição registrada"
        );
        Ok(application)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::common::error::ErrorKind;
    use crate::db::MemoryStore;

    fn enquiry(no: &str) -> CreateEnquiryPayload {
        CreateEnquiryPayload {
            enquiry_no: no.into(),
            student_first_name: " Lia ".into(),
            student_middle_name: Some("  ".into()),
            student_last_name: "Prado".into(),
            guardian_first_name: "Rita".into(),
            guardian_last_name: "Prado".into(),
            contact_number: "41999990000".into(),
            email: Some(String::new()),
            academic_year: 2026,
            source_of_enquiry: "website".into(),
            status: "open".into(),
            remarks: None,
            next_follow_up_date: None,
        }
    }

    fn application(no: &str) -> CreateApplicationPayload {
        CreateApplicationPayload {
            application_no: no.into(),
            enquiry_no: Some("ENQ-001".into()),
            student_first_name: "Lia".into(),
            student_middle_name: None,
            student_last_name: "Prado".into(),
            guardian_first_name: "Rita".into(),
            guardian_last_name: "Prado".into(),
            dob: NaiveDate::from_ymd_opt(2014, 3, 21).unwrap(),
            gender: 1,
            religion: None,
            previous_school: Some("".into()),
            previous_class: Some("5º ano".into()),
            academic_year: 2026,
            class_applied: "6º ano".into(),
            address: "Rua das Flores, 10".into(),
            document: None,
            application_status: "submitted".into(),
        }
    }

    fn service() -> AdmissionService {
        AdmissionService::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn enquiry_input_is_normalized() {
        let enquiry = service().create_enquiry(&enquiry(" ENQ-001 ")).await.unwrap();
        assert_eq!(enquiry.enquiry_no, "ENQ-001");
        assert_eq!(enquiry.student_first_name, "Lia");
        assert_eq!(enquiry.student_middle_name, None);
        assert_eq!(enquiry.email, None);
    }

    #[tokio::test]
    async fn enquiry_numbers_are_unique() {
        let service = service();
        service.create_enquiry(&enquiry("ENQ-001")).await.unwrap();
        let err = service.create_enquiry(&enquiry(" ENQ-001")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.status_code(), axum::http::StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn application_numbers_are_unique() {
        let service = service();
        let created = service.create_application(&application("APP-001")).await.unwrap();
        assert_eq!(created.previous_school, None);
        assert_eq!(created.enquiry_no.as_deref(), Some("ENQ-001"));

        let err = service
            .create_application(&application("APP-001"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }
}
