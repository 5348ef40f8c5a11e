// src/handlers/reports.rs

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
};

// GET /api/work-orders/{id}/report
#[utoipa::path(
    get,
    path = "/api/work-orders/{id}/report",
    tag = "Reports",
    params(("id" = Uuid, Path, description = "ID da OS")),
    responses(
        (status = 200, description = "Relatório de inspeção em PDF", body = Vec<u8>, content_type = "application/pdf"),
        (status = 404, description = "OS não encontrada"),
        (status = 500, description = "Falha ao gerar o PDF")
    ),
    security(("api_jwt" = []))
)]
pub async fn download_report(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let report = app_state.report_service
        .render(id, &locale)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    // Configura os Headers para o navegador baixar o PDF
    let disposition = format!("attachment; filename=\"{}\"", report.file_name);
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (header::CONTENT_DISPOSITION, disposition),
    ];

    Ok((headers, report.bytes).into_response())
}
