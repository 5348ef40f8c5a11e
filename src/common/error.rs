use std::sync::LazyLock;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::{
    common::i18n::{I18nStore, DEFAULT_LANG},
    middleware::i18n::Locale,
    models::work_order::WorkOrderStatus,
};

// Erro único da aplicação. Os handlers convertem em `ApiError` já traduzido.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    /// Itens obrigatórios sem resposta na finalização do checklist.
    #[error("{missing} itens obrigatórios não foram preenchidos")]
    MissingRequiredItems { missing: usize },

    #[error("Item de checklist desconhecido: {0}")]
    UnknownChecklistItem(String),

    #[error("Ordem de serviço bloqueada ({0:?})")]
    WorkOrderLocked(WorkOrderStatus),

    #[error("Validação já revisada")]
    ValidationAlreadyReviewed,

    #[error("Número de OS já existe: {0}")]
    WorkOrderNumberTaken(String),

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    #[error("Token inválido")]
    InvalidToken,

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Armazenamento indisponível: {0}")]
    StorageUnavailable(String),

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    #[error("Falha ao gerar o relatório: {0}")]
    RenderError(String),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),
}

/// Corpo de erro devolvido ao cliente.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub error: String,
    pub details: Option<Value>,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::UnknownChecklistItem(_) => StatusCode::BAD_REQUEST,
            AppError::MissingRequiredItems { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::WorkOrderLocked(_)
            | AppError::ValidationAlreadyReviewed
            | AppError::WorkOrderNumberTaken(_) => StatusCode::CONFLICT,
            AppError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::DatabaseError(_)
            | AppError::FontNotFound(_)
            | AppError::RenderError(_)
            | AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::MissingRequiredItems { .. } => "MISSING_REQUIRED_ITEMS",
            AppError::UnknownChecklistItem(_) => "UNKNOWN_CHECKLIST_ITEM",
            AppError::WorkOrderLocked(_) => "WORK_ORDER_LOCKED",
            AppError::ValidationAlreadyReviewed => "ALREADY_REVIEWED",
            AppError::WorkOrderNumberTaken(_) => "WORK_ORDER_NUMBER_TAKEN",
            AppError::ResourceNotFound(_) => "NOT_FOUND",
            AppError::InvalidToken => "INVALID_TOKEN",
            AppError::DatabaseError(_) | AppError::StorageUnavailable(_) => "PERSISTENCE_ERROR",
            AppError::FontNotFound(_) | AppError::RenderError(_) => "RENDER_ERROR",
            AppError::InternalServerError(_) => "INTERNAL_ERROR",
        }
    }

    /// Traduz o erro para o idioma da requisição.
    pub fn to_api_error(self, locale: &Locale, store: &I18nStore) -> ApiError {
        let lang = locale.0.as_str();
        let status = self.status_code();
        let code = self.code();

        if status.is_server_error() {
            // O detalhe fica só no log.
            tracing::error!("Erro Interno do Servidor: {}", self);
        }

        let (error, details) = match &self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), json!(messages));
                }
                (store.text(lang, "errors.validation"), Some(Value::Object(details)))
            }
            AppError::MissingRequiredItems { missing } => (
                store.translate(
                    lang,
                    "errors.missing_required_items",
                    &[("count", missing.to_string().as_str())],
                ),
                Some(json!({ "missing": missing })),
            ),
            AppError::UnknownChecklistItem(item) => (
                store.translate(lang, "errors.unknown_item", &[("item", item.as_str())]),
                None,
            ),
            AppError::WorkOrderLocked(status) => (
                store.translate(
                    lang,
                    "errors.work_order_locked",
                    &[("status", format!("{status:?}").as_str())],
                ),
                None,
            ),
            AppError::ValidationAlreadyReviewed => (store.text(lang, "errors.already_reviewed"), None),
            AppError::WorkOrderNumberTaken(number) => (
                store.translate(lang, "errors.number_taken", &[("number", number.as_str())]),
                None,
            ),
            AppError::ResourceNotFound(resource) => (
                store.translate(lang, "errors.not_found", &[("resource", resource.as_str())]),
                None,
            ),
            AppError::InvalidToken => (store.text(lang, "errors.invalid_token"), None),
            AppError::DatabaseError(_) | AppError::StorageUnavailable(_) => {
                (store.text(lang, "errors.storage"), None)
            }
            AppError::FontNotFound(_) | AppError::RenderError(_) => {
                (store.text(lang, "errors.render"), None)
            }
            AppError::InternalServerError(_) => (store.text(lang, "errors.internal"), None),
        };

        ApiError { status, code, error, details }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({ "code": self.code, "error": self.error });
        if let Some(details) = self.details {
            body["details"] = details;
        }
        (self.status, Json(body)).into_response()
    }
}

// Catálogo embutido, carregado uma vez só
static FALLBACK_I18N: LazyLock<I18nStore> = LazyLock::new(|| I18nStore::embedded().unwrap_or_default());

// Usado quando não há locale nem catálogo à mão (ex.: rejeição de extratores).
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale(DEFAULT_LANG.to_string()), &FALLBACK_I18N)
            .into_response()
    }
}
