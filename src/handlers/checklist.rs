// src/handlers/checklist.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::{
        checklist::{ChecklistDraft, ChecklistItemResult, ChecklistPayload},
        work_order::SaveOutcome,
    },
    services::{catalog::CatalogItem, checklist_service::InspectionContext},
};

// GET /api/checklist/catalog
#[utoipa::path(
    get,
    path = "/api/checklist/catalog",
    tag = "Checklist",
    responses(
        (status = 200, description = "Catálogo padronizado de itens", body = Vec<CatalogItem>)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_catalog(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    Ok((StatusCode::OK, Json(app_state.catalog.items().to_vec())))
}

// GET /api/work-orders/{id}/checklist
#[utoipa::path(
    get,
    path = "/api/work-orders/{id}/checklist",
    tag = "Checklist",
    params(("id" = Uuid, Path, description = "ID da OS")),
    responses(
        (status = 200, description = "Respostas gravadas, em ordem de item", body = Vec<ChecklistItemResult>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_results(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = app_state.checklist_service
        .list_results(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(rows)))
}

// GET /api/work-orders/{id}/checklist/draft
#[utoipa::path(
    get,
    path = "/api/work-orders/{id}/checklist/draft",
    tag = "Checklist",
    params(("id" = Uuid, Path, description = "ID da OS")),
    responses(
        (status = 200, description = "Estado do formulário (vazio se a OS não está em andamento)", body = ChecklistDraft)
    ),
    security(("api_jwt" = []))
)]
pub async fn load_draft(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = app_state.checklist_service
        .load_in_progress(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(draft)))
}

// POST /api/work-orders/{id}/checklist/draft
#[utoipa::path(
    post,
    path = "/api/work-orders/{id}/checklist/draft",
    tag = "Checklist",
    request_body = ChecklistPayload,
    params(("id" = Uuid, Path, description = "ID da OS")),
    responses(
        (status = 200, description = "Rascunho salvo", body = SaveOutcome),
        (status = 400, description = "Item desconhecido ou dados inválidos"),
        (status = 409, description = "OS bloqueada")
    ),
    security(("api_jwt" = []))
)]
pub async fn save_draft(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChecklistPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let ctx = InspectionContext::new(id, user.id);
    let outcome = app_state.checklist_service
        .save_draft(&ctx, &payload.items)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(outcome)))
}

// POST /api/work-orders/{id}/checklist/submit
#[utoipa::path(
    post,
    path = "/api/work-orders/{id}/checklist/submit",
    tag = "Checklist",
    request_body = ChecklistPayload,
    params(("id" = Uuid, Path, description = "ID da OS")),
    responses(
        (status = 200, description = "Checklist finalizado", body = SaveOutcome),
        (status = 422, description = "Itens obrigatórios sem resposta")
    ),
    security(("api_jwt" = []))
)]
pub async fn submit_checklist(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChecklistPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let ctx = InspectionContext::new(id, user.id);
    let outcome = app_state.checklist_service
        .submit_final(&ctx, &payload.items)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(outcome)))
}
