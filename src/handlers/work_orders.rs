// src/handlers/work_orders.rs

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
    models::{
        intake::{NewServiceRequest, NewTechnician, ServiceRequest, ServiceRequestFilter, Technician},
        signature::{Signature, SignaturePayload, SignatureRole},
        work_order::{NewWorkOrder, ScheduleWorkOrder, WorkOrder, WorkOrderFilter},
    },
};

// =============================================================================
//  PEDIDOS
// =============================================================================

// POST /api/service-requests
#[utoipa::path(
    post,
    path = "/api/service-requests",
    tag = "Intake",
    request_body = NewServiceRequest,
    responses(
        (status = 201, description = "Pedido registrado", body = ServiceRequest),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_service_request(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Json(payload): Json<NewServiceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let request = app_state.work_order_service
        .create_service_request(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(request)))
}

// GET /api/service-requests
#[utoipa::path(
    get,
    path = "/api/service-requests",
    tag = "Intake",
    params(ServiceRequestFilter),
    responses(
        (status = 200, description = "Pedidos", body = Vec<ServiceRequest>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_service_requests(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Query(filter): Query<ServiceRequestFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let requests = app_state.work_order_service
        .list_service_requests(&filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(requests)))
}

// =============================================================================
//  TÉCNICOS
// =============================================================================

// POST /api/technicians
#[utoipa::path(
    post,
    path = "/api/technicians",
    tag = "Intake",
    request_body = NewTechnician,
    responses(
        (status = 201, description = "Técnico cadastrado", body = Technician)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_technician(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Json(payload): Json<NewTechnician>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let technician = app_state.work_order_service
        .create_technician(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(technician)))
}

// GET /api/technicians
#[utoipa::path(
    get,
    path = "/api/technicians",
    tag = "Intake",
    responses(
        (status = 200, description = "Técnicos", body = Vec<Technician>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_technicians(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let technicians = app_state.work_order_service
        .list_technicians()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(technicians)))
}

// =============================================================================
//  ORDENS DE SERVIÇO
// =============================================================================

// POST /api/work-orders
#[utoipa::path(
    post,
    path = "/api/work-orders",
    tag = "Work Orders",
    request_body = NewWorkOrder,
    responses(
        (status = 201, description = "OS criada (Pendente)", body = WorkOrder),
        (status = 409, description = "Número de OS já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_work_order(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Json(payload): Json<NewWorkOrder>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let order = app_state.work_order_service
        .create_work_order(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(order)))
}

// GET /api/work-orders
#[utoipa::path(
    get,
    path = "/api/work-orders",
    tag = "Work Orders",
    params(WorkOrderFilter),
    responses(
        (status = 200, description = "OS filtradas", body = Vec<WorkOrder>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_work_orders(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Query(filter): Query<WorkOrderFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let orders = app_state.work_order_service
        .list_work_orders(&filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(orders)))
}

// GET /api/work-orders/{id}
#[utoipa::path(
    get,
    path = "/api/work-orders/{id}",
    tag = "Work Orders",
    params(("id" = Uuid, Path, description = "ID da OS")),
    responses(
        (status = 200, description = "OS", body = WorkOrder),
        (status = 404, description = "OS não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_work_order(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = app_state.work_order_service
        .get_work_order(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(order)))
}

// PUT /api/work-orders/{id}/schedule
#[utoipa::path(
    put,
    path = "/api/work-orders/{id}/schedule",
    tag = "Work Orders",
    request_body = ScheduleWorkOrder,
    params(("id" = Uuid, Path, description = "ID da OS")),
    responses(
        (status = 200, description = "OS agendada", body = WorkOrder),
        (status = 409, description = "OS não pode mais ser alterada")
    ),
    security(("api_jwt" = []))
)]
pub async fn schedule_work_order(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ScheduleWorkOrder>,
) -> Result<impl IntoResponse, ApiError> {
    let order = app_state.work_order_service
        .schedule(id, payload.scheduled_at, payload.technician_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(order)))
}

// POST /api/work-orders/{id}/cancel
#[utoipa::path(
    post,
    path = "/api/work-orders/{id}/cancel",
    tag = "Work Orders",
    params(("id" = Uuid, Path, description = "ID da OS")),
    responses(
        (status = 200, description = "OS cancelada", body = WorkOrder),
        (status = 409, description = "OS não pode mais ser alterada")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_work_order(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(work_order = %id, actor = %user.id, "Cancelamento solicitado");

    let order = app_state.work_order_service
        .cancel(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(order)))
}

// =============================================================================
//  ASSINATURAS
// =============================================================================

// PUT /api/work-orders/{id}/signatures/{role}
#[utoipa::path(
    put,
    path = "/api/work-orders/{id}/signatures/{role}",
    tag = "Work Orders",
    request_body = SignaturePayload,
    params(
        ("id" = Uuid, Path, description = "ID da OS"),
        ("role" = SignatureRole, Path, description = "technician ou client")
    ),
    responses(
        (status = 200, description = "Assinatura gravada", body = Signature)
    ),
    security(("api_jwt" = []))
)]
pub async fn save_signature(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path((id, role)): Path<(Uuid, SignatureRole)>,
    Json(payload): Json<SignaturePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let signature = app_state.work_order_service
        .save_signature(id, role, &payload.image_ref)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(signature)))
}

// GET /api/work-orders/{id}/signatures
#[utoipa::path(
    get,
    path = "/api/work-orders/{id}/signatures",
    tag = "Work Orders",
    params(("id" = Uuid, Path, description = "ID da OS")),
    responses(
        (status = 200, description = "Assinaturas gravadas", body = Vec<Signature>),
        (status = 404, description = "OS não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_signatures(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let signatures = app_state.work_order_service
        .list_signatures(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(signatures)))
}
