// src/services/work_order_service.rs

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::InspectionStore,
    models::{
        intake::{NewServiceRequest, NewTechnician, ServiceRequest, ServiceRequestFilter, ServiceRequestStatus, Technician},
        signature::{Signature, SignatureRole},
        work_order::{NewWorkOrder, WorkOrder, WorkOrderFilter, WorkOrderStatus},
    },
};

#[derive(Clone)]
pub struct WorkOrderService {
    store: Arc<dyn InspectionStore>,
}

impl WorkOrderService {
    pub fn new(store: Arc<dyn InspectionStore>) -> Self {
        Self { store }
    }

    // --- PEDIDOS ---

    pub async fn create_service_request(&self, input: &NewServiceRequest) -> Result<ServiceRequest, AppError> {
        let request = self.store.create_service_request(input).await?;
        tracing::info!(service_request = %request.id, "Pedido registrado");
        Ok(request)
    }

    pub async fn list_service_requests(&self, filter: &ServiceRequestFilter) -> Result<Vec<ServiceRequest>, AppError> {
        self.store.list_service_requests(filter).await
    }

    // --- TÉCNICOS ---

    pub async fn create_technician(&self, input: &NewTechnician) -> Result<Technician, AppError> {
        self.store.create_technician(input).await
    }

    pub async fn list_technicians(&self) -> Result<Vec<Technician>, AppError> {
        self.store.list_technicians().await
    }

    // --- ORDENS DE SERVIÇO ---

    pub async fn create_work_order(&self, input: &NewWorkOrder) -> Result<WorkOrder, AppError> {
        if let Some(client_id) = input.client_id {
            if self.store.get_service_request(client_id).await?.is_none() {
                return Err(AppError::ResourceNotFound(format!("Pedido {client_id}")));
            }
        }
        if let Some(technician_id) = input.technician_id {
            if self.store.get_technician(technician_id).await?.is_none() {
                return Err(AppError::ResourceNotFound(format!("Técnico {technician_id}")));
            }
        }

        let order = self.store.create_work_order(input).await?;

        if let Some(client_id) = order.client_id {
            self.store
                .set_service_request_status(client_id, ServiceRequestStatus::Scheduled)
                .await?;
        }

        tracing::info!(work_order = %order.id, number = %order.number, "OS criada");
        Ok(order)
    }

    pub async fn get_work_order(&self, id: Uuid) -> Result<WorkOrder, AppError> {
        self.store
            .get_work_order(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("OS {id}")))
    }

    pub async fn list_work_orders(&self, filter: &WorkOrderFilter) -> Result<Vec<WorkOrder>, AppError> {
        self.store.list_work_orders(filter).await
    }

    /// Agenda ou reatribui a OS enquanto ela ainda não foi finalizada.
    pub async fn schedule(
        &self,
        id: Uuid,
        scheduled_at: DateTime<Utc>,
        technician_id: Option<Uuid>,
    ) -> Result<WorkOrder, AppError> {
        let order = self.get_work_order(id).await?;
        if !order.status.is_editable() {
            return Err(AppError::WorkOrderLocked(order.status));
        }
        if let Some(technician_id) = technician_id {
            if self.store.get_technician(technician_id).await?.is_none() {
                return Err(AppError::ResourceNotFound(format!("Técnico {technician_id}")));
            }
        }
        self.store.schedule_work_order(id, scheduled_at, technician_id).await
    }

    pub async fn cancel(&self, id: Uuid) -> Result<WorkOrder, AppError> {
        let order = self.get_work_order(id).await?;
        if !order.status.is_editable() {
            return Err(AppError::WorkOrderLocked(order.status));
        }
        let order = self
            .store
            .apply_work_order_status(id, WorkOrderStatus::Cancelled, Utc::now())
            .await?;
        tracing::info!(work_order = %id, "OS cancelada");
        Ok(order)
    }

    // --- ASSINATURAS ---

    pub async fn save_signature(
        &self,
        work_order_id: Uuid,
        role: SignatureRole,
        image_ref: &str,
    ) -> Result<Signature, AppError> {
        let order = self.get_work_order(work_order_id).await?;
        if order.status == WorkOrderStatus::Cancelled {
            return Err(AppError::WorkOrderLocked(order.status));
        }
        self.store.upsert_signature(work_order_id, role, image_ref).await
    }

    pub async fn list_signatures(&self, work_order_id: Uuid) -> Result<Vec<Signature>, AppError> {
        self.get_work_order(work_order_id).await?;
        self.store.list_signatures(work_order_id).await
    }
}
