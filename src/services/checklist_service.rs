// src/services/checklist_service.rs

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::InspectionStore,
    models::{
        checklist::{sort_by_item_id, ChecklistDraft, ChecklistEntry, ChecklistItemResult},
        work_order::{SaveOutcome, WorkOrder, WorkOrderStatus},
    },
    services::{catalog::ChecklistCatalog, status::derive_status},
};

/// Escopo de uma operação de checklist: a OS e quem está agindo.
#[derive(Debug, Clone)]
pub struct InspectionContext {
    pub work_order_id: Uuid,
    pub actor_id: String,
}

impl InspectionContext {
    pub fn new(work_order_id: Uuid, actor_id: impl Into<String>) -> Self {
        Self { work_order_id, actor_id: actor_id.into() }
    }
}

#[derive(Clone)]
pub struct ChecklistService {
    store: Arc<dyn InspectionStore>,
    catalog: Arc<ChecklistCatalog>,
}

impl ChecklistService {
    pub fn new(store: Arc<dyn InspectionStore>, catalog: Arc<ChecklistCatalog>) -> Self {
        Self { store, catalog }
    }

    pub fn catalog(&self) -> &ChecklistCatalog {
        &self.catalog
    }

    // --- SALVAR RASCUNHO ---
    pub async fn save_draft(
        &self,
        ctx: &InspectionContext,
        entries: &[ChecklistEntry],
    ) -> Result<SaveOutcome, AppError> {
        let order = self.load_work_order(ctx.work_order_id).await?;
        if !order.status.is_editable() {
            return Err(AppError::WorkOrderLocked(order.status));
        }

        self.ensure_known_items(entries)?;

        let rows = self.build_rows(ctx.work_order_id, entries);
        if rows.is_empty() {
            // Nada respondido: não toca no armazenamento
            return Ok(SaveOutcome {
                saved: 0,
                persisted: self.store.count_checklist_items(ctx.work_order_id).await?,
                status: None,
                completed_at: order.completed_at,
            });
        }

        tracing::info!(
            work_order = %ctx.work_order_id,
            actor = %ctx.actor_id,
            items = rows.len(),
            "Salvando rascunho do checklist"
        );

        self.persist_and_derive(ctx, rows).await
    }

    // --- FINALIZAR ---
    pub async fn submit_final(
        &self,
        ctx: &InspectionContext,
        entries: &[ChecklistEntry],
    ) -> Result<SaveOutcome, AppError> {
        let order = self.load_work_order(ctx.work_order_id).await?;
        match order.status {
            WorkOrderStatus::Completed | WorkOrderStatus::Closed => {
                // Segunda finalização não reescreve nada
                tracing::info!(
                    work_order = %ctx.work_order_id,
                    status = ?order.status,
                    "Checklist já finalizado"
                );
                return Ok(SaveOutcome {
                    saved: 0,
                    persisted: self.store.count_checklist_items(ctx.work_order_id).await?,
                    status: Some(order.status),
                    completed_at: order.completed_at,
                });
            }
            WorkOrderStatus::Cancelled => return Err(AppError::WorkOrderLocked(order.status)),
            WorkOrderStatus::Pending | WorkOrderStatus::InProgress => {}
        }

        self.ensure_known_items(entries)?;

        let missing = self
            .catalog
            .required_items()
            .filter(|item| {
                !entries
                    .iter()
                    .any(|entry| entry.item_id == item.id && entry.result.is_set())
            })
            .count();
        if missing > 0 {
            return Err(AppError::MissingRequiredItems { missing });
        }

        let rows = self.build_rows(ctx.work_order_id, entries);

        tracing::info!(
            work_order = %ctx.work_order_id,
            actor = %ctx.actor_id,
            items = rows.len(),
            "Finalizando checklist"
        );

        self.persist_and_derive(ctx, rows).await
    }

    // --- RETOMAR ---
    /// Estado do formulário para continuar uma inspeção em andamento.
    pub async fn load_in_progress(&self, work_order_id: Uuid) -> Result<ChecklistDraft, AppError> {
        let order = self.load_work_order(work_order_id).await?;
        if order.status != WorkOrderStatus::InProgress {
            return Ok(ChecklistDraft::default());
        }
        let rows = self.store.list_checklist_items(work_order_id).await?;
        Ok(ChecklistDraft::from_rows(&rows))
    }

    pub async fn list_results(&self, work_order_id: Uuid) -> Result<Vec<ChecklistItemResult>, AppError> {
        self.load_work_order(work_order_id).await?;
        let mut rows = self.store.list_checklist_items(work_order_id).await?;
        sort_by_item_id(&mut rows);
        Ok(rows)
    }

    // --- Internos ---

    async fn load_work_order(&self, id: Uuid) -> Result<WorkOrder, AppError> {
        self.store
            .get_work_order(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("OS {id}")))
    }

    fn ensure_known_items(&self, entries: &[ChecklistEntry]) -> Result<(), AppError> {
        match entries.iter().find(|entry| self.catalog.get(&entry.item_id).is_none()) {
            Some(entry) => Err(AppError::UnknownChecklistItem(entry.item_id.clone())),
            None => Ok(()),
        }
    }

    fn build_rows(&self, work_order_id: Uuid, entries: &[ChecklistEntry]) -> Vec<ChecklistItemResult> {
        let now = Utc::now();
        entries
            .iter()
            .filter(|entry| entry.has_content())
            .filter_map(|entry| {
                let item = self.catalog.get(&entry.item_id)?;
                Some(ChecklistItemResult {
                    work_order_id,
                    item_id: item.id.clone(),
                    category: item.category.clone(),
                    description: item.text.clone(),
                    result: entry.result,
                    observation: entry.normalized_observation(),
                    photo: entry.photo.clone(),
                    updated_at: now,
                })
            })
            .collect()
    }

    // upsert -> contagem -> status, nessa ordem
    async fn persist_and_derive(
        &self,
        ctx: &InspectionContext,
        rows: Vec<ChecklistItemResult>,
    ) -> Result<SaveOutcome, AppError> {
        let saved = rows.len();
        if saved > 0 {
            self.store.upsert_checklist_items(&rows).await?;
        }

        let persisted = self.store.count_checklist_items(ctx.work_order_id).await?;
        let Some(status) = derive_status(persisted, self.catalog.len()) else {
            return Ok(SaveOutcome { saved, persisted, status: None, completed_at: None });
        };

        let order = self
            .store
            .apply_work_order_status(ctx.work_order_id, status, Utc::now())
            .await?;

        if status == WorkOrderStatus::Completed {
            let opened = self.store.open_validation_request(ctx.work_order_id).await?;
            if opened.opened {
                tracing::info!(
                    work_order = %ctx.work_order_id,
                    validation = %opened.request.id,
                    "Solicitação de validação aberta"
                );
            }
        }

        Ok(SaveOutcome {
            saved,
            persisted,
            status: Some(order.status),
            completed_at: order.completed_at,
        })
    }
}
