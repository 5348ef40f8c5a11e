// src/db/store.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        checklist::ChecklistItemResult,
        intake::{NewServiceRequest, NewTechnician, ServiceRequest, ServiceRequestFilter, ServiceRequestStatus, Technician},
        report::ReportHeader,
        signature::{Signature, SignatureRole},
        validation::{ReviewRecord, ValidationFilter, ValidationRequest},
        work_order::{NewWorkOrder, WorkOrder, WorkOrderFilter, WorkOrderStatus},
    },
};

/// Resultado de `open_validation_request`.
#[derive(Debug, Clone)]
pub struct OpenedValidation {
    pub request: ValidationRequest,
    /// `true` quando a linha foi criada agora ou reaberta após rejeição.
    pub opened: bool,
}

/// Efeito de um parecer sobre a OS e o pedido de origem.
#[derive(Debug, Clone, Copy)]
pub struct ReviewEffects {
    pub work_order_status: WorkOrderStatus,
    /// Aplicado só se a OS tiver pedido de origem.
    pub service_request_status: Option<ServiceRequestStatus>,
}

/// Resultado de `apply_review`.
#[derive(Debug, Clone)]
pub struct AppliedReview {
    pub request: ValidationRequest,
    pub work_order: WorkOrder,
}

/// Contrato de persistência usado pelos serviços.
///
/// Cada método é uma operação isolada. O lote de `upsert_checklist_items`
/// e as escritas de `apply_review` são aplicados inteiros ou não são aplicados.
#[async_trait]
pub trait InspectionStore: Send + Sync {
    // --- Pedidos ---
    async fn create_service_request(&self, input: &NewServiceRequest) -> Result<ServiceRequest, AppError>;
    async fn get_service_request(&self, id: Uuid) -> Result<Option<ServiceRequest>, AppError>;
    async fn list_service_requests(&self, filter: &ServiceRequestFilter) -> Result<Vec<ServiceRequest>, AppError>;
    async fn set_service_request_status(&self, id: Uuid, status: ServiceRequestStatus) -> Result<(), AppError>;

    // --- Técnicos ---
    async fn create_technician(&self, input: &NewTechnician) -> Result<Technician, AppError>;
    async fn get_technician(&self, id: Uuid) -> Result<Option<Technician>, AppError>;
    async fn list_technicians(&self) -> Result<Vec<Technician>, AppError>;

    // --- Ordens de serviço ---
    async fn create_work_order(&self, input: &NewWorkOrder) -> Result<WorkOrder, AppError>;
    async fn get_work_order(&self, id: Uuid) -> Result<Option<WorkOrder>, AppError>;
    async fn list_work_orders(&self, filter: &WorkOrderFilter) -> Result<Vec<WorkOrder>, AppError>;
    async fn schedule_work_order(
        &self,
        id: Uuid,
        scheduled_at: DateTime<Utc>,
        technician_id: Option<Uuid>,
    ) -> Result<WorkOrder, AppError>;
    /// Grava o status. Completed/Closed mantêm o `completed_at` existente ou carimbam `now`;
    /// os demais status limpam o carimbo.
    async fn apply_work_order_status(
        &self,
        id: Uuid,
        status: WorkOrderStatus,
        now: DateTime<Utc>,
    ) -> Result<WorkOrder, AppError>;

    // --- Checklist ---
    async fn upsert_checklist_items(&self, rows: &[ChecklistItemResult]) -> Result<(), AppError>;
    async fn count_checklist_items(&self, work_order_id: Uuid) -> Result<i64, AppError>;
    async fn list_checklist_items(&self, work_order_id: Uuid) -> Result<Vec<ChecklistItemResult>, AppError>;

    // --- Validações ---
    /// No máximo uma linha por OS: cria, reabre uma rejeitada ou devolve a existente.
    async fn open_validation_request(&self, work_order_id: Uuid) -> Result<OpenedValidation, AppError>;
    async fn get_validation_request(&self, id: Uuid) -> Result<Option<ValidationRequest>, AppError>;
    async fn find_validation_for_work_order(&self, work_order_id: Uuid) -> Result<Option<ValidationRequest>, AppError>;
    async fn list_validation_requests(&self, filter: &ValidationFilter) -> Result<Vec<ValidationRequest>, AppError>;
    /// Grava o parecer e os status da OS e do pedido numa escrita só.
    /// `None` quando a validação não existe ou não está pendente.
    async fn apply_review(
        &self,
        id: Uuid,
        review: &ReviewRecord,
        effects: ReviewEffects,
    ) -> Result<Option<AppliedReview>, AppError>;
    async fn assign_reviewer(&self, id: Uuid, reviewer_id: &str) -> Result<Option<ValidationRequest>, AppError>;

    // --- Assinaturas ---
    async fn upsert_signature(
        &self,
        work_order_id: Uuid,
        role: SignatureRole,
        image_ref: &str,
    ) -> Result<Signature, AppError>;
    async fn list_signatures(&self, work_order_id: Uuid) -> Result<Vec<Signature>, AppError>;

    // --- Relatório ---
    async fn report_header(&self, work_order_id: Uuid) -> Result<Option<ReportHeader>, AppError>;
}
