#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value;
use tower::ServiceExt;

use inspecao_backend::app::build_router;
use inspecao_backend::config::{AppState, Settings};
use inspecao_backend::db::MemoryInspectionStore;
use inspecao_backend::models::auth::Claims;
use inspecao_backend::models::checklist::{ChecklistEntry, ItemResult};
use inspecao_backend::models::intake::{NewServiceRequest, NewTechnician};
use inspecao_backend::models::work_order::{InspectionType, NewWorkOrder, WorkOrder};
use inspecao_backend::services::catalog::ChecklistCatalog;

pub const JWT_SECRET: &str = "segredo-de-teste";

/// Settings for tests: no database, fonts pointing nowhere.
pub fn test_settings() -> Settings {
    Settings {
        database_url: String::new(),
        jwt_secret: JWT_SECRET.to_string(),
        jwt_audience: None,
        bind_addr: "127.0.0.1:0".to_string(),
        db_max_connections: 1,
        report_font_dir: "./fonts-inexistentes".to_string(),
        report_font_family: "Roboto".to_string(),
        report_logo_path: None,
        report_photo_base_url: None,
    }
}

pub struct TestEnv {
    pub store: Arc<MemoryInspectionStore>,
    pub state: AppState,
}

pub fn test_env() -> TestEnv {
    let store = Arc::new(MemoryInspectionStore::new());
    let state = AppState::from_store(store.clone(), &test_settings()).unwrap();
    TestEnv { store, state }
}

impl TestEnv {
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// OS pendente ligada a um pedido e a um técnico.
    pub async fn seed_work_order(&self, number: &str) -> WorkOrder {
        let service = &self.state.work_order_service;
        let request = service
            .create_service_request(&NewServiceRequest {
                client_name: "Condomínio Jardim das Flores".into(),
                contact_phone: Some("11 99999-0000".into()),
                contact_email: None,
                address: Some("Rua das Acácias, 100".into()),
                city: Some("São Paulo".into()),
            })
            .await
            .unwrap();
        let technician = service
            .create_technician(&NewTechnician {
                name: "Carlos Souza".into(),
                email: Some("carlos@exemplo.com".into()),
            })
            .await
            .unwrap();

        service
            .create_work_order(&new_work_order(number, Some(request.id), Some(technician.id)))
            .await
            .unwrap()
    }
}

pub fn new_work_order(number: &str, client_id: Option<uuid::Uuid>, technician_id: Option<uuid::Uuid>) -> NewWorkOrder {
    NewWorkOrder {
        number: number.to_string(),
        client_id,
        technician_id,
        norm_id: Some("NBR 15526".into()),
        inspection_type: InspectionType::Residential,
        address: "Rua das Acácias, 100".into(),
        city: "São Paulo".into(),
        state: Some("SP".into()),
        postal_code: Some("01000-000".into()),
        description: None,
        notes: None,
        scheduled_at: Utc::now(),
    }
}

pub fn entry(item_id: &str, result: ItemResult) -> ChecklistEntry {
    ChecklistEntry {
        item_id: item_id.to_string(),
        result,
        observation: None,
        photo: None,
    }
}

/// Uma resposta para cada item do catálogo.
pub fn full_entries(result: ItemResult) -> Vec<ChecklistEntry> {
    ChecklistCatalog::embedded()
        .unwrap()
        .items()
        .iter()
        .map(|item| entry(&item.id, result))
        .collect()
}

pub fn token(sub: &str) -> String {
    let claims = Claims {
        sub: sub.to_string(),
        exp: (Utc::now().timestamp() + 3600) as usize,
        iat: Some(Utc::now().timestamp() as usize),
        email: None,
        aud: None,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(JWT_SECRET.as_ref())).unwrap()
}

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
