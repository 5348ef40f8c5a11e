// src/db/inspection_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::{AppliedReview, InspectionStore, OpenedValidation, ReviewEffects},
    models::{
        checklist::{ChecklistItemResult, ItemResult, PhotoAttachment, PhotoMetadata},
        intake::{NewServiceRequest, NewTechnician, ServiceRequest, ServiceRequestFilter, ServiceRequestStatus, Technician},
        report::ReportHeader,
        signature::{Signature, SignatureRole},
        validation::{ReviewRecord, ValidationFilter, ValidationRequest},
        work_order::{NewWorkOrder, WorkOrder, WorkOrderFilter, WorkOrderStatus},
    },
};

// Usado por `apply_work_order_status` e dentro da transação de `apply_review`
const APPLY_WORK_ORDER_STATUS: &str = r#"
    UPDATE work_orders
    SET status = $2,
        completed_at = CASE
            WHEN $2 IN ('COMPLETED', 'CLOSED') THEN COALESCE(completed_at, $3)
            ELSE NULL
        END,
        updated_at = NOW()
    WHERE id = $1
    RETURNING *
"#;

// Repositório PostgreSQL de tudo que envolve a inspeção
#[derive(Clone)]
pub struct PgInspectionRepository {
    pool: PgPool,
}

impl PgInspectionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Linha crua da tabela checklist_items (resultado em texto, metadados em JSONB)
#[derive(FromRow)]
struct ChecklistRow {
    work_order_id: Uuid,
    item_id: String,
    category: String,
    description: String,
    result: Option<String>,
    observation: Option<String>,
    photo_ref: Option<String>,
    photo_metadata: Option<Json<PhotoMetadata>>,
    updated_at: DateTime<Utc>,
}

impl From<ChecklistRow> for ChecklistItemResult {
    fn from(row: ChecklistRow) -> Self {
        let updated_at = row.updated_at;
        let photo = row.photo_ref.map(|photo_ref| PhotoAttachment {
            photo_ref,
            metadata: row.photo_metadata.map(|m| m.0).unwrap_or(PhotoMetadata {
                captured_at: updated_at,
                latitude: None,
                longitude: None,
                accuracy: None,
                filename: None,
            }),
        });

        ChecklistItemResult {
            work_order_id: row.work_order_id,
            item_id: row.item_id,
            category: row.category,
            description: row.description,
            result: ItemResult::from_db(row.result.as_deref()),
            observation: row.observation,
            photo,
            updated_at,
        }
    }
}

#[async_trait]
impl InspectionStore for PgInspectionRepository {
    // =========================================================================
    //  PEDIDOS
    // =========================================================================

    async fn create_service_request(&self, input: &NewServiceRequest) -> Result<ServiceRequest, AppError> {
        let request = sqlx::query_as::<_, ServiceRequest>(
            r#"
            INSERT INTO service_requests (client_name, contact_phone, contact_email, address, city)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&input.client_name)
        .bind(&input.contact_phone)
        .bind(&input.contact_email)
        .bind(&input.address)
        .bind(&input.city)
        .fetch_one(&self.pool)
        .await?;

        Ok(request)
    }

    async fn get_service_request(&self, id: Uuid) -> Result<Option<ServiceRequest>, AppError> {
        let request = sqlx::query_as::<_, ServiceRequest>("SELECT * FROM service_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(request)
    }

    async fn list_service_requests(&self, filter: &ServiceRequestFilter) -> Result<Vec<ServiceRequest>, AppError> {
        let requests = sqlx::query_as::<_, ServiceRequest>(
            r#"
            SELECT * FROM service_requests
            WHERE ($1::service_request_status IS NULL OR status = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.status)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    async fn set_service_request_status(&self, id: Uuid, status: ServiceRequestStatus) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE service_requests SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound(format!("Pedido {id}")));
        }
        Ok(())
    }

    // =========================================================================
    //  TÉCNICOS
    // =========================================================================

    async fn create_technician(&self, input: &NewTechnician) -> Result<Technician, AppError> {
        let technician = sqlx::query_as::<_, Technician>(
            "INSERT INTO technicians (name, email) VALUES ($1, $2) RETURNING *",
        )
        .bind(&input.name)
        .bind(&input.email)
        .fetch_one(&self.pool)
        .await?;

        Ok(technician)
    }

    async fn get_technician(&self, id: Uuid) -> Result<Option<Technician>, AppError> {
        let technician = sqlx::query_as::<_, Technician>("SELECT * FROM technicians WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(technician)
    }

    async fn list_technicians(&self) -> Result<Vec<Technician>, AppError> {
        let technicians = sqlx::query_as::<_, Technician>("SELECT * FROM technicians ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(technicians)
    }

    // =========================================================================
    //  ORDENS DE SERVIÇO
    // =========================================================================

    async fn create_work_order(&self, input: &NewWorkOrder) -> Result<WorkOrder, AppError> {
        sqlx::query_as::<_, WorkOrder>(
            r#"
            INSERT INTO work_orders (
                number, client_id, technician_id, norm_id, inspection_type,
                address, city, state, postal_code, description, notes, scheduled_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(&input.number)
        .bind(input.client_id)
        .bind(input.technician_id)
        .bind(&input.norm_id)
        .bind(input.inspection_type)
        .bind(&input.address)
        .bind(&input.city)
        .bind(&input.state)
        .bind(&input.postal_code)
        .bind(&input.description)
        .bind(&input.notes)
        .bind(input.scheduled_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // Número de OS duplicado vira um erro de negócio
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::WorkOrderNumberTaken(input.number.clone());
                }
            }
            AppError::DatabaseError(e)
        })
    }

    async fn get_work_order(&self, id: Uuid) -> Result<Option<WorkOrder>, AppError> {
        let order = sqlx::query_as::<_, WorkOrder>("SELECT * FROM work_orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    async fn list_work_orders(&self, filter: &WorkOrderFilter) -> Result<Vec<WorkOrder>, AppError> {
        let orders = sqlx::query_as::<_, WorkOrder>(
            r#"
            SELECT * FROM work_orders
            WHERE ($1::work_order_status IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR technician_id = $2)
              AND ($3::timestamptz IS NULL OR scheduled_at >= $3)
              AND ($4::timestamptz IS NULL OR scheduled_at < $4)
            ORDER BY scheduled_at ASC NULLS LAST, number ASC
            "#,
        )
        .bind(filter.status)
        .bind(filter.technician_id)
        .bind(filter.from)
        .bind(filter.to)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    async fn schedule_work_order(
        &self,
        id: Uuid,
        scheduled_at: DateTime<Utc>,
        technician_id: Option<Uuid>,
    ) -> Result<WorkOrder, AppError> {
        sqlx::query_as::<_, WorkOrder>(
            r#"
            UPDATE work_orders
            SET scheduled_at = $2, technician_id = COALESCE($3, technician_id), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(scheduled_at)
        .bind(technician_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::ResourceNotFound(format!("OS {id}")))
    }

    async fn apply_work_order_status(
        &self,
        id: Uuid,
        status: WorkOrderStatus,
        now: DateTime<Utc>,
    ) -> Result<WorkOrder, AppError> {
        // COALESCE mantém o primeiro carimbo: regravar Completed não o altera
        sqlx::query_as::<_, WorkOrder>(APPLY_WORK_ORDER_STATUS)
            .bind(id)
            .bind(status)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("OS {id}")))
    }

    // =========================================================================
    //  CHECKLIST
    // =========================================================================

    async fn upsert_checklist_items(&self, rows: &[ChecklistItemResult]) -> Result<(), AppError> {
        // O lote inteiro na mesma transação: ou grava tudo ou nada
        let mut tx = self.pool.begin().await?;

        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO checklist_items (
                    work_order_id, item_id, category, description,
                    result, observation, photo_ref, photo_metadata, updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ON CONFLICT (work_order_id, item_id)
                DO UPDATE SET
                    category = EXCLUDED.category,
                    description = EXCLUDED.description,
                    result = EXCLUDED.result,
                    observation = EXCLUDED.observation,
                    photo_ref = EXCLUDED.photo_ref,
                    photo_metadata = EXCLUDED.photo_metadata,
                    updated_at = EXCLUDED.updated_at
                "#,
            )
            .bind(row.work_order_id)
            .bind(&row.item_id)
            .bind(&row.category)
            .bind(&row.description)
            .bind(row.result.as_db_str())
            .bind(&row.observation)
            .bind(row.photo.as_ref().map(|p| p.photo_ref.as_str()))
            .bind(row.photo.as_ref().map(|p| Json(&p.metadata)))
            .bind(row.updated_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn count_checklist_items(&self, work_order_id: Uuid) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM checklist_items WHERE work_order_id = $1",
        )
        .bind(work_order_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn list_checklist_items(&self, work_order_id: Uuid) -> Result<Vec<ChecklistItemResult>, AppError> {
        let rows = sqlx::query_as::<_, ChecklistRow>(
            r#"
            SELECT work_order_id, item_id, category, description, result,
                   observation, photo_ref, photo_metadata, updated_at
            FROM checklist_items
            WHERE work_order_id = $1
            "#,
        )
        .bind(work_order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ChecklistItemResult::from).collect())
    }

    // =========================================================================
    //  VALIDAÇÕES
    // =========================================================================

    async fn open_validation_request(&self, work_order_id: Uuid) -> Result<OpenedValidation, AppError> {
        // Cria ou reabre uma rejeitada; pendente/aprovada não retorna linha
        let opened = sqlx::query_as::<_, ValidationRequest>(
            r#"
            INSERT INTO validation_requests (work_order_id, status)
            VALUES ($1, 'PENDING')
            ON CONFLICT (work_order_id)
            DO UPDATE SET
                status = 'PENDING',
                verdict = NULL,
                comment = NULL,
                reviewed_at = NULL,
                updated_at = NOW()
            WHERE validation_requests.status = 'REJECTED'
            RETURNING *
            "#,
        )
        .bind(work_order_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(request) = opened {
            return Ok(OpenedValidation { request, opened: true });
        }

        let request = self
            .find_validation_for_work_order(work_order_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Validação da OS {work_order_id}")))?;

        Ok(OpenedValidation { request, opened: false })
    }

    async fn get_validation_request(&self, id: Uuid) -> Result<Option<ValidationRequest>, AppError> {
        let request = sqlx::query_as::<_, ValidationRequest>("SELECT * FROM validation_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(request)
    }

    async fn find_validation_for_work_order(&self, work_order_id: Uuid) -> Result<Option<ValidationRequest>, AppError> {
        let request = sqlx::query_as::<_, ValidationRequest>(
            "SELECT * FROM validation_requests WHERE work_order_id = $1",
        )
        .bind(work_order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    async fn list_validation_requests(&self, filter: &ValidationFilter) -> Result<Vec<ValidationRequest>, AppError> {
        let requests = sqlx::query_as::<_, ValidationRequest>(
            r#"
            SELECT * FROM validation_requests
            WHERE ($1::validation_status IS NULL OR status = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.status)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    async fn apply_review(
        &self,
        id: Uuid,
        review: &ReviewRecord,
        effects: ReviewEffects,
    ) -> Result<Option<AppliedReview>, AppError> {
        // Parecer, OS e pedido na mesma transação; qualquer erro desfaz tudo
        let mut tx = self.pool.begin().await?;

        let request = sqlx::query_as::<_, ValidationRequest>(
            r#"
            UPDATE validation_requests
            SET status = $2, verdict = $3, reviewer_id = $4, comment = $5,
                reviewed_at = $6, updated_at = NOW()
            WHERE id = $1 AND status = 'PENDING'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(review.status)
        .bind(review.verdict)
        .bind(&review.reviewer_id)
        .bind(&review.comment)
        .bind(review.reviewed_at)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(request) = request else {
            tx.rollback().await?;
            return Ok(None);
        };

        let work_order = sqlx::query_as::<_, WorkOrder>(APPLY_WORK_ORDER_STATUS)
            .bind(request.work_order_id)
            .bind(effects.work_order_status)
            .bind(review.reviewed_at)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("OS {}", request.work_order_id)))?;

        if let (Some(status), Some(client_id)) = (effects.service_request_status, work_order.client_id) {
            let result = sqlx::query("UPDATE service_requests SET status = $2 WHERE id = $1")
                .bind(client_id)
                .bind(status)
                .execute(&mut *tx)
                .await?;
            if result.rows_affected() == 0 {
                return Err(AppError::ResourceNotFound(format!("Pedido {client_id}")));
            }
        }

        tx.commit().await?;
        Ok(Some(AppliedReview { request, work_order }))
    }

    async fn assign_reviewer(&self, id: Uuid, reviewer_id: &str) -> Result<Option<ValidationRequest>, AppError> {
        let request = sqlx::query_as::<_, ValidationRequest>(
            r#"
            UPDATE validation_requests
            SET reviewer_id = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(reviewer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    // =========================================================================
    //  ASSINATURAS
    // =========================================================================

    async fn upsert_signature(
        &self,
        work_order_id: Uuid,
        role: SignatureRole,
        image_ref: &str,
    ) -> Result<Signature, AppError> {
        let signature = sqlx::query_as::<_, Signature>(
            r#"
            INSERT INTO work_order_signatures (work_order_id, role, image_ref)
            VALUES ($1, $2, $3)
            ON CONFLICT (work_order_id, role)
            DO UPDATE SET image_ref = EXCLUDED.image_ref, captured_at = NOW()
            RETURNING *
            "#,
        )
        .bind(work_order_id)
        .bind(role)
        .bind(image_ref)
        .fetch_one(&self.pool)
        .await?;

        Ok(signature)
    }

    async fn list_signatures(&self, work_order_id: Uuid) -> Result<Vec<Signature>, AppError> {
        let signatures = sqlx::query_as::<_, Signature>(
            "SELECT * FROM work_order_signatures WHERE work_order_id = $1",
        )
        .bind(work_order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(signatures)
    }

    // =========================================================================
    //  RELATÓRIO
    // =========================================================================

    async fn report_header(&self, work_order_id: Uuid) -> Result<Option<ReportHeader>, AppError> {
        let header = sqlx::query_as::<_, ReportHeader>(
            r#"
            SELECT
                w.number AS work_order_number,
                s.client_name AS client_name,
                t.name AS technician_name,
                w.completed_at AS completed_at
            FROM work_orders w
            LEFT JOIN service_requests s ON s.id = w.client_id
            LEFT JOIN technicians t ON t.id = w.technician_id
            WHERE w.id = $1
            "#,
        )
        .bind(work_order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(header)
    }
}
