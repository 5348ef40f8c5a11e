// src/models/signature.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "signature_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "lowercase")]
pub enum SignatureRole {
    Technician,
    Client,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    pub work_order_id: Uuid,
    pub role: SignatureRole,
    /// Imagem capturada no canvas (`data:image/png;base64,...`).
    pub image_ref: String,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignaturePayload {
    #[validate(length(min = 1, message = "required"))]
    pub image_ref: String,
}
