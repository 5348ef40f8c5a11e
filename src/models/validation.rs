// src/models/validation.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "validation_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationStatus {
    Pending,
    Approved,
    Rejected,
}

/// Parecer do validador.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "validation_verdict", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Fit,
    Unfit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRequest {
    pub id: Uuid,
    pub work_order_id: Uuid,
    pub status: ValidationStatus,
    /// Id opaco do provedor de identidade.
    pub reviewer_id: Option<String>,
    pub verdict: Option<Verdict>,
    pub comment: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Dados gravados quando o validador aprova ou rejeita.
#[derive(Debug, Clone)]
pub struct ReviewRecord {
    pub status: ValidationStatus,
    pub verdict: Verdict,
    pub reviewer_id: String,
    pub comment: Option<String>,
    pub reviewed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPayload {
    #[validate(length(max = 4000))]
    #[schema(example = "Instalação de acordo com a norma.")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignReviewerPayload {
    #[validate(length(min = 1, message = "required"))]
    pub reviewer_id: String,
}

#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ValidationFilter {
    pub status: Option<ValidationStatus>,
}
