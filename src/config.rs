// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use reqwest::Url;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{InspectionStore, PgInspectionRepository},
    services::{
        auth::AuthService,
        catalog::ChecklistCatalog,
        checklist_service::ChecklistService,
        report::{pdf::FontSettings, photos::PhotoLoader, ReportService},
        validation_service::ValidationService,
        work_order_service::WorkOrderService,
    },
};

/// Configuração lida do ambiente (`.env` opcional).
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_audience: Option<String>,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub report_font_dir: String,
    pub report_font_family: String,
    pub report_logo_path: Option<String>,
    /// Base aceita para fotos remotas; sem ela só `data:` é carregado.
    pub report_photo_base_url: Option<String>,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let db_max_connections = match optional("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("DB_MAX_CONNECTIONS inválido: {raw}"))?,
            None => 5,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_audience: optional("JWT_AUDIENCE"),
            bind_addr: optional("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            db_max_connections,
            report_font_dir: optional("REPORT_FONT_DIR").unwrap_or_else(|| "./fonts".to_string()),
            report_font_family: optional("REPORT_FONT_FAMILY").unwrap_or_else(|| "Roboto".to_string()),
            report_logo_path: optional("REPORT_LOGO_PATH"),
            report_photo_base_url: optional("REPORT_PHOTO_BASE_URL"),
        })
    }

    fn font_settings(&self) -> FontSettings {
        FontSettings {
            dir: self.report_font_dir.clone(),
            family: self.report_font_family.clone(),
        }
    }

    fn photo_loader(&self) -> anyhow::Result<PhotoLoader> {
        let base = self
            .report_photo_base_url
            .as_deref()
            .map(|raw| Url::parse(raw).with_context(|| format!("REPORT_PHOTO_BASE_URL inválida: {raw}")))
            .transpose()?;
        Ok(PhotoLoader::new(base))
    }
}

// Variável vazia conta como ausente
fn optional(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: Option<PgPool>,
    pub i18n_store: Arc<I18nStore>,
    pub auth_service: AuthService,
    pub catalog: Arc<ChecklistCatalog>,
    pub checklist_service: ChecklistService,
    pub validation_service: ValidationService,
    pub work_order_service: WorkOrderService,
    pub report_service: ReportService,
}

impl AppState {
    // Conecta ao banco e monta o gráfico de dependências
    pub async fn new(settings: &Settings) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(settings.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&settings.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let store: Arc<dyn InspectionStore> = Arc::new(PgInspectionRepository::new(db_pool.clone()));
        let mut state = Self::from_store(store, settings)?;
        state.db_pool = Some(db_pool);
        Ok(state)
    }

    /// Monta o estado sobre qualquer armazenamento (ex.: memória nos testes).
    pub fn from_store(store: Arc<dyn InspectionStore>, settings: &Settings) -> anyhow::Result<Self> {
        let i18n_store = Arc::new(I18nStore::embedded()?);
        let catalog = Arc::new(ChecklistCatalog::embedded()?);

        Ok(Self {
            db_pool: None,
            auth_service: AuthService::new(settings.jwt_secret.clone(), settings.jwt_audience.clone()),
            checklist_service: ChecklistService::new(store.clone(), catalog.clone()),
            validation_service: ValidationService::new(store.clone()),
            work_order_service: WorkOrderService::new(store.clone()),
            report_service: ReportService::new(
                store,
                i18n_store.clone(),
                settings.photo_loader()?,
                settings.font_settings(),
                settings.report_logo_path.clone(),
            ),
            i18n_store,
            catalog,
        })
    }
}
