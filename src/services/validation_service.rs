// src/services/validation_service.rs

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{AppliedReview, InspectionStore, ReviewEffects},
    models::{
        intake::ServiceRequestStatus,
        validation::{ReviewRecord, ValidationFilter, ValidationRequest, ValidationStatus, Verdict},
        work_order::WorkOrderStatus,
    },
};

#[derive(Clone)]
pub struct ValidationService {
    store: Arc<dyn InspectionStore>,
}

impl ValidationService {
    pub fn new(store: Arc<dyn InspectionStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, filter: &ValidationFilter) -> Result<Vec<ValidationRequest>, AppError> {
        self.store.list_validation_requests(filter).await
    }

    pub async fn get(&self, id: Uuid) -> Result<ValidationRequest, AppError> {
        self.store
            .get_validation_request(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Validação {id}")))
    }

    pub async fn assign_reviewer(&self, id: Uuid, reviewer_id: &str) -> Result<ValidationRequest, AppError> {
        let request = self.get(id).await?;
        if request.status != ValidationStatus::Pending {
            return Err(AppError::ValidationAlreadyReviewed);
        }
        self.store
            .assign_reviewer(id, reviewer_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Validação {id}")))
    }

    // --- APROVAR ---
    /// Parecer "apto": a OS é encerrada e o pedido concluído.
    pub async fn approve(
        &self,
        id: Uuid,
        reviewer_id: &str,
        comment: Option<String>,
    ) -> Result<ValidationRequest, AppError> {
        let review = ReviewRecord {
            status: ValidationStatus::Approved,
            verdict: Verdict::Fit,
            reviewer_id: reviewer_id.to_string(),
            comment: normalize_comment(comment),
            reviewed_at: Utc::now(),
        };
        let effects = ReviewEffects {
            work_order_status: WorkOrderStatus::Closed,
            service_request_status: Some(ServiceRequestStatus::Concluded),
        };
        let applied = self.review(id, &review, effects).await?;

        tracing::info!(validation = %id, work_order = %applied.work_order.id, reviewer = %reviewer_id, "OS aprovada");
        Ok(applied.request)
    }

    // --- REJEITAR ---
    /// Parecer "inapto": a OS volta para correção.
    pub async fn reject(
        &self,
        id: Uuid,
        reviewer_id: &str,
        comment: Option<String>,
    ) -> Result<ValidationRequest, AppError> {
        let review = ReviewRecord {
            status: ValidationStatus::Rejected,
            verdict: Verdict::Unfit,
            reviewer_id: reviewer_id.to_string(),
            comment: normalize_comment(comment),
            reviewed_at: Utc::now(),
        };
        let effects = ReviewEffects {
            work_order_status: WorkOrderStatus::InProgress,
            service_request_status: None,
        };
        let applied = self.review(id, &review, effects).await?;

        tracing::info!(validation = %id, work_order = %applied.work_order.id, reviewer = %reviewer_id, "OS rejeitada");
        Ok(applied.request)
    }

    async fn review(&self, id: Uuid, review: &ReviewRecord, effects: ReviewEffects) -> Result<AppliedReview, AppError> {
        // Distingue "não existe" de "já revisada"
        self.get(id).await?;
        self.store
            .apply_review(id, review, effects)
            .await?
            .ok_or(AppError::ValidationAlreadyReviewed)
    }
}

fn normalize_comment(comment: Option<String>) -> Option<String> {
    comment
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}
