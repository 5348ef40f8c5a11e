// src/db/memory_store.rs
//
// Implementação em memória do InspectionStore. Usada nos testes e para rodar
// a API sem banco (ex.: demonstração local).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::{AppliedReview, InspectionStore, OpenedValidation, ReviewEffects},
    models::{
        checklist::ChecklistItemResult,
        intake::{NewServiceRequest, NewTechnician, ServiceRequest, ServiceRequestFilter, ServiceRequestStatus, Technician},
        report::ReportHeader,
        signature::{Signature, SignatureRole},
        validation::{ReviewRecord, ValidationFilter, ValidationRequest, ValidationStatus},
        work_order::{NewWorkOrder, WorkOrder, WorkOrderFilter, WorkOrderStatus},
    },
    services::status::completion_stamp,
};

#[derive(Default)]
struct Tables {
    service_requests: HashMap<Uuid, ServiceRequest>,
    technicians: HashMap<Uuid, Technician>,
    work_orders: HashMap<Uuid, WorkOrder>,
    checklist: HashMap<(Uuid, String), ChecklistItemResult>,
    validations: HashMap<Uuid, ValidationRequest>,
    signatures: HashMap<(Uuid, SignatureRole), Signature>,
}

#[derive(Default)]
pub struct MemoryInspectionStore {
    tables: RwLock<Tables>,
    fail_writes: AtomicBool,
}

impl MemoryInspectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Faz toda escrita falhar com `StorageUnavailable` (simula queda do banco).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::StorageUnavailable("escrita desabilitada".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl InspectionStore for MemoryInspectionStore {
    // --- Pedidos ---

    async fn create_service_request(&self, input: &NewServiceRequest) -> Result<ServiceRequest, AppError> {
        self.check_writable()?;
        let request = ServiceRequest {
            id: Uuid::new_v4(),
            client_name: input.client_name.clone(),
            contact_phone: input.contact_phone.clone(),
            contact_email: input.contact_email.clone(),
            address: input.address.clone(),
            city: input.city.clone(),
            status: ServiceRequestStatus::Open,
            created_at: Utc::now(),
        };
        self.tables.write().await.service_requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn get_service_request(&self, id: Uuid) -> Result<Option<ServiceRequest>, AppError> {
        Ok(self.tables.read().await.service_requests.get(&id).cloned())
    }

    async fn list_service_requests(&self, filter: &ServiceRequestFilter) -> Result<Vec<ServiceRequest>, AppError> {
        let tables = self.tables.read().await;
        let mut requests: Vec<ServiceRequest> = tables
            .service_requests
            .values()
            .filter(|r| filter.status.is_none_or(|s| s == r.status))
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn set_service_request_status(&self, id: Uuid, status: ServiceRequestStatus) -> Result<(), AppError> {
        self.check_writable()?;
        let mut tables = self.tables.write().await;
        let request = tables
            .service_requests
            .get_mut(&id)
            .ok_or_else(|| AppError::ResourceNotFound(format!("Pedido {id}")))?;
        request.status = status;
        Ok(())
    }

    // --- Técnicos ---

    async fn create_technician(&self, input: &NewTechnician) -> Result<Technician, AppError> {
        self.check_writable()?;
        let technician = Technician {
            id: Uuid::new_v4(),
            name: input.name.clone(),
            email: input.email.clone(),
            active: true,
            created_at: Utc::now(),
        };
        self.tables.write().await.technicians.insert(technician.id, technician.clone());
        Ok(technician)
    }

    async fn get_technician(&self, id: Uuid) -> Result<Option<Technician>, AppError> {
        Ok(self.tables.read().await.technicians.get(&id).cloned())
    }

    async fn list_technicians(&self) -> Result<Vec<Technician>, AppError> {
        let mut technicians: Vec<Technician> = self.tables.read().await.technicians.values().cloned().collect();
        technicians.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(technicians)
    }

    // --- Ordens de serviço ---

    async fn create_work_order(&self, input: &NewWorkOrder) -> Result<WorkOrder, AppError> {
        self.check_writable()?;
        let mut tables = self.tables.write().await;
        if tables.work_orders.values().any(|o| o.number == input.number) {
            return Err(AppError::WorkOrderNumberTaken(input.number.clone()));
        }

        let now = Utc::now();
        let order = WorkOrder {
            id: Uuid::new_v4(),
            number: input.number.clone(),
            status: WorkOrderStatus::Pending,
            client_id: input.client_id,
            technician_id: input.technician_id,
            norm_id: input.norm_id.clone(),
            inspection_type: input.inspection_type,
            address: Some(input.address.clone()),
            city: Some(input.city.clone()),
            state: input.state.clone(),
            postal_code: input.postal_code.clone(),
            description: input.description.clone(),
            notes: input.notes.clone(),
            scheduled_at: Some(input.scheduled_at),
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        tables.work_orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get_work_order(&self, id: Uuid) -> Result<Option<WorkOrder>, AppError> {
        Ok(self.tables.read().await.work_orders.get(&id).cloned())
    }

    async fn list_work_orders(&self, filter: &WorkOrderFilter) -> Result<Vec<WorkOrder>, AppError> {
        let tables = self.tables.read().await;
        let mut orders: Vec<WorkOrder> = tables.work_orders.values().filter(|o| filter.matches(o)).cloned().collect();
        // Mesma ordem do repositório: sem agenda por último
        orders.sort_by(|a, b| match (a.scheduled_at, b.scheduled_at) {
            (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.number.cmp(&b.number)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.number.cmp(&b.number),
        });
        Ok(orders)
    }

    async fn schedule_work_order(
        &self,
        id: Uuid,
        scheduled_at: DateTime<Utc>,
        technician_id: Option<Uuid>,
    ) -> Result<WorkOrder, AppError> {
        self.check_writable()?;
        let mut tables = self.tables.write().await;
        let order = tables
            .work_orders
            .get_mut(&id)
            .ok_or_else(|| AppError::ResourceNotFound(format!("OS {id}")))?;
        order.scheduled_at = Some(scheduled_at);
        if technician_id.is_some() {
            order.technician_id = technician_id;
        }
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn apply_work_order_status(
        &self,
        id: Uuid,
        status: WorkOrderStatus,
        now: DateTime<Utc>,
    ) -> Result<WorkOrder, AppError> {
        self.check_writable()?;
        let mut tables = self.tables.write().await;
        let order = tables
            .work_orders
            .get_mut(&id)
            .ok_or_else(|| AppError::ResourceNotFound(format!("OS {id}")))?;
        order.completed_at = completion_stamp(status, order.completed_at, now);
        order.status = status;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    // --- Checklist ---

    async fn upsert_checklist_items(&self, rows: &[ChecklistItemResult]) -> Result<(), AppError> {
        self.check_writable()?;
        let mut tables = self.tables.write().await;
        for row in rows {
            tables
                .checklist
                .insert((row.work_order_id, row.item_id.clone()), row.clone());
        }
        Ok(())
    }

    async fn count_checklist_items(&self, work_order_id: Uuid) -> Result<i64, AppError> {
        let tables = self.tables.read().await;
        let count = tables.checklist.keys().filter(|(wo, _)| *wo == work_order_id).count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn list_checklist_items(&self, work_order_id: Uuid) -> Result<Vec<ChecklistItemResult>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .checklist
            .values()
            .filter(|row| row.work_order_id == work_order_id)
            .cloned()
            .collect())
    }

    // --- Validações ---

    async fn open_validation_request(&self, work_order_id: Uuid) -> Result<OpenedValidation, AppError> {
        self.check_writable()?;
        let mut tables = self.tables.write().await;
        let now = Utc::now();

        if let Some(existing) = tables.validations.values_mut().find(|v| v.work_order_id == work_order_id) {
            if existing.status != ValidationStatus::Rejected {
                return Ok(OpenedValidation { request: existing.clone(), opened: false });
            }
            existing.status = ValidationStatus::Pending;
            existing.verdict = None;
            existing.comment = None;
            existing.reviewed_at = None;
            existing.updated_at = now;
            return Ok(OpenedValidation { request: existing.clone(), opened: true });
        }

        let request = ValidationRequest {
            id: Uuid::new_v4(),
            work_order_id,
            status: ValidationStatus::Pending,
            reviewer_id: None,
            verdict: None,
            comment: None,
            reviewed_at: None,
            created_at: now,
            updated_at: now,
        };
        tables.validations.insert(request.id, request.clone());
        Ok(OpenedValidation { request, opened: true })
    }

    async fn get_validation_request(&self, id: Uuid) -> Result<Option<ValidationRequest>, AppError> {
        Ok(self.tables.read().await.validations.get(&id).cloned())
    }

    async fn find_validation_for_work_order(&self, work_order_id: Uuid) -> Result<Option<ValidationRequest>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.validations.values().find(|v| v.work_order_id == work_order_id).cloned())
    }

    async fn list_validation_requests(&self, filter: &ValidationFilter) -> Result<Vec<ValidationRequest>, AppError> {
        let tables = self.tables.read().await;
        let mut requests: Vec<ValidationRequest> = tables
            .validations
            .values()
            .filter(|v| filter.status.is_none_or(|s| s == v.status))
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn apply_review(
        &self,
        id: Uuid,
        review: &ReviewRecord,
        effects: ReviewEffects,
    ) -> Result<Option<AppliedReview>, AppError> {
        self.check_writable()?;
        let mut tables = self.tables.write().await;

        // confere tudo antes de mexer em qualquer tabela
        let Some(request) = tables.validations.get(&id) else {
            return Ok(None);
        };
        if request.status != ValidationStatus::Pending {
            return Ok(None);
        }
        let work_order_id = request.work_order_id;
        let client_id = tables
            .work_orders
            .get(&work_order_id)
            .ok_or_else(|| AppError::ResourceNotFound(format!("OS {work_order_id}")))?
            .client_id;
        let service_request = match (effects.service_request_status, client_id) {
            (Some(status), Some(client_id)) => {
                if !tables.service_requests.contains_key(&client_id) {
                    return Err(AppError::ResourceNotFound(format!("Pedido {client_id}")));
                }
                Some((client_id, status))
            }
            _ => None,
        };

        let now = Utc::now();
        let Some(request) = tables.validations.get_mut(&id) else {
            return Ok(None);
        };
        request.status = review.status;
        request.verdict = Some(review.verdict);
        request.reviewer_id = Some(review.reviewer_id.clone());
        request.comment = review.comment.clone();
        request.reviewed_at = Some(review.reviewed_at);
        request.updated_at = now;
        let request = request.clone();

        let Some(order) = tables.work_orders.get_mut(&work_order_id) else {
            return Err(AppError::ResourceNotFound(format!("OS {work_order_id}")));
        };
        order.completed_at = completion_stamp(effects.work_order_status, order.completed_at, review.reviewed_at);
        order.status = effects.work_order_status;
        order.updated_at = now;
        let work_order = order.clone();

        if let Some((client_id, status)) = service_request {
            if let Some(service_request) = tables.service_requests.get_mut(&client_id) {
                service_request.status = status;
            }
        }

        Ok(Some(AppliedReview { request, work_order }))
    }

    async fn assign_reviewer(&self, id: Uuid, reviewer_id: &str) -> Result<Option<ValidationRequest>, AppError> {
        self.check_writable()?;
        let mut tables = self.tables.write().await;
        Ok(tables.validations.get_mut(&id).map(|request| {
            request.reviewer_id = Some(reviewer_id.to_string());
            request.updated_at = Utc::now();
            request.clone()
        }))
    }

    // --- Assinaturas ---

    async fn upsert_signature(
        &self,
        work_order_id: Uuid,
        role: SignatureRole,
        image_ref: &str,
    ) -> Result<Signature, AppError> {
        self.check_writable()?;
        let signature = Signature {
            work_order_id,
            role,
            image_ref: image_ref.to_string(),
            captured_at: Utc::now(),
        };
        self.tables
            .write()
            .await
            .signatures
            .insert((work_order_id, role), signature.clone());
        Ok(signature)
    }

    async fn list_signatures(&self, work_order_id: Uuid) -> Result<Vec<Signature>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .signatures
            .values()
            .filter(|s| s.work_order_id == work_order_id)
            .cloned()
            .collect())
    }

    // --- Relatório ---

    async fn report_header(&self, work_order_id: Uuid) -> Result<Option<ReportHeader>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.work_orders.get(&work_order_id).map(|order| ReportHeader {
            work_order_number: Some(order.number.clone()),
            client_name: order
                .client_id
                .and_then(|id| tables.service_requests.get(&id))
                .map(|r| r.client_name.clone()),
            technician_name: order
                .technician_id
                .and_then(|id| tables.technicians.get(&id))
                .map(|t| t.name.clone()),
            completed_at: order.completed_at,
        }))
    }
}
