// src/handlers/validations.rs

use axum::{
    extract::{Path, Query, State},
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
    models::validation::{AssignReviewerPayload, ReviewPayload, ValidationFilter, ValidationRequest},
};

// GET /api/validations
#[utoipa::path(
    get,
    path = "/api/validations",
    tag = "Validations",
    params(ValidationFilter),
    responses(
        (status = 200, description = "Solicitações de validação", body = Vec<ValidationRequest>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_validations(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Query(filter): Query<ValidationFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let requests = app_state.validation_service
        .list(&filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(requests)))
}

// GET /api/validations/{id}
#[utoipa::path(
    get,
    path = "/api/validations/{id}",
    tag = "Validations",
    params(("id" = Uuid, Path, description = "ID da validação")),
    responses(
        (status = 200, description = "Solicitação de validação", body = ValidationRequest),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_validation(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let request = app_state.validation_service
        .get(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(request)))
}

// PUT /api/validations/{id}/reviewer
#[utoipa::path(
    put,
    path = "/api/validations/{id}/reviewer",
    tag = "Validations",
    request_body = AssignReviewerPayload,
    params(("id" = Uuid, Path, description = "ID da validação")),
    responses(
        (status = 200, description = "Validador atribuído", body = ValidationRequest),
        (status = 409, description = "Validação já revisada")
    ),
    security(("api_jwt" = []))
)]
pub async fn assign_reviewer(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignReviewerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let request = app_state.validation_service
        .assign_reviewer(id, payload.reviewer_id.trim())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(request)))
}

// POST /api/validations/{id}/approve
#[utoipa::path(
    post,
    path = "/api/validations/{id}/approve",
    tag = "Validations",
    request_body = ReviewPayload,
    params(("id" = Uuid, Path, description = "ID da validação")),
    responses(
        (status = 200, description = "Aprovada; OS encerrada", body = ValidationRequest),
        (status = 409, description = "Validação já revisada")
    ),
    security(("api_jwt" = []))
)]
pub async fn approve_validation(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReviewPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let request = app_state.validation_service
        .approve(id, &user.id, payload.comment)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(request)))
}

// POST /api/validations/{id}/reject
#[utoipa::path(
    post,
    path = "/api/validations/{id}/reject",
    tag = "Validations",
    request_body = ReviewPayload,
    params(("id" = Uuid, Path, description = "ID da validação")),
    responses(
        (status = 200, description = "Rejeitada; OS volta para correção", body = ValidationRequest),
        (status = 409, description = "Validação já revisada")
    ),
    security(("api_jwt" = []))
)]
pub async fn reject_validation(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReviewPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let request = app_state.validation_service
        .reject(id, &user.id, payload.comment)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(request)))
}
