// src/models/work_order.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "work_order_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkOrderStatus {
    Pending,
    InProgress,
    Completed,
    Closed,
    Cancelled,
}

impl WorkOrderStatus {
    /// Estados em que o checklist ainda aceita alterações.
    pub fn is_editable(self) -> bool {
        matches!(self, WorkOrderStatus::Pending | WorkOrderStatus::InProgress)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "inspection_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InspectionType {
    #[default]
    Residential,
    Commercial,
}

// --- Structs ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrder {
    pub id: Uuid,
    #[schema(example = "OS-2024-009")]
    pub number: String,
    pub status: WorkOrderStatus,
    /// Pedido (solicitação do cliente) que originou a OS.
    pub client_id: Option<Uuid>,
    pub technician_id: Option<Uuid>,
    #[schema(example = "NBR 15526")]
    pub norm_id: Option<String>,
    pub inspection_type: InspectionType,
    pub address: Option<String>,
    pub city: Option<String>,
    #[schema(example = "SP")]
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkOrder {
    #[validate(length(min = 1, max = 64, message = "required"))]
    #[schema(example = "OS-2024-009")]
    pub number: String,
    pub client_id: Option<Uuid>,
    pub technician_id: Option<Uuid>,
    pub norm_id: Option<String>,
    #[serde(default)]
    pub inspection_type: InspectionType,
    #[validate(length(min = 1, message = "required"))]
    pub address: String,
    #[validate(length(min = 1, message = "required"))]
    pub city: String,
    #[validate(length(equal = 2))]
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub scheduled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleWorkOrder {
    pub scheduled_at: DateTime<Utc>,
    pub technician_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct WorkOrderFilter {
    pub status: Option<WorkOrderStatus>,
    pub technician_id: Option<Uuid>,
    /// Agendadas a partir de (inclusive).
    pub from: Option<DateTime<Utc>>,
    /// Agendadas até (exclusive).
    pub to: Option<DateTime<Utc>>,
}

impl WorkOrderFilter {
    pub fn matches(&self, order: &WorkOrder) -> bool {
        if self.status.is_some_and(|s| s != order.status) {
            return false;
        }
        if self.technician_id.is_some() && self.technician_id != order.technician_id {
            return false;
        }
        match (self.from, self.to, order.scheduled_at) {
            (None, None, _) => true,
            (_, _, None) => false,
            (from, to, Some(at)) => from.is_none_or(|f| at >= f) && to.is_none_or(|t| at < t),
        }
    }
}

/// Resultado de um salvamento do checklist.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
    /// Linhas enviadas neste salvamento.
    pub saved: usize,
    /// Total de linhas persistidas para a OS.
    pub persisted: i64,
    /// Status resultante; `None` quando nada mudou.
    pub status: Option<WorkOrderStatus>,
    pub completed_at: Option<DateTime<Utc>>,
}
