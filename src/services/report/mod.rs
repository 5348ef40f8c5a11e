// src/services/report/mod.rs

pub mod layout;
pub mod pdf;
pub mod photos;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use image::{DynamicImage, GenericImageView};
use uuid::Uuid;

use crate::{
    common::{error::AppError, i18n::I18nStore},
    db::InspectionStore,
    middleware::i18n::Locale,
    models::{
        checklist::sort_by_item_id,
        report::ReportRow,
        signature::SignatureRole,
    },
};

use layout::{ImageSlot, LaidOutDocument, LayoutInput, LayoutRow, ReportLabels, SignatureSlot, TextMetrics};
use pdf::FontSettings;
use photos::PhotoLoader;

/// Relatório diagramado e as imagens referenciadas por índice.
#[derive(Debug)]
pub struct ComposedReport {
    pub file_name: String,
    pub title: String,
    pub document: LaidOutDocument,
    pub images: Vec<Arc<DynamicImage>>,
}

#[derive(Debug)]
pub struct RenderedReport {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn InspectionStore>,
    i18n: Arc<I18nStore>,
    photos: PhotoLoader,
    fonts: FontSettings,
    logo_path: Option<String>,
}

impl ReportService {
    pub fn new(
        store: Arc<dyn InspectionStore>,
        i18n: Arc<I18nStore>,
        photos: PhotoLoader,
        fonts: FontSettings,
        logo_path: Option<String>,
    ) -> Self {
        Self { store, i18n, photos, fonts, logo_path }
    }

    /// Carrega dados, fotos e assinaturas e diagrama. Não depende de fontes.
    pub async fn compose(&self, work_order_id: Uuid, locale: &Locale) -> Result<ComposedReport, AppError> {
        self.compose_at(work_order_id, locale, Utc::now()).await
    }

    pub async fn compose_at(
        &self,
        work_order_id: Uuid,
        locale: &Locale,
        issued_at: DateTime<Utc>,
    ) -> Result<ComposedReport, AppError> {
        let header = self
            .store
            .report_header(work_order_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("OS {work_order_id}")))?;

        let mut rows = self.store.list_checklist_items(work_order_id).await?;
        sort_by_item_id(&mut rows);
        let rows: Vec<ReportRow> = rows.iter().map(ReportRow::from).collect();

        let signatures = self.store.list_signatures(work_order_id).await?;

        let mut images = ImageSet::default();

        let logo = match &self.logo_path {
            Some(path) => load_logo(path).await.map(|img| images.push(img)),
            None => None,
        };

        let mut layout_rows = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut photos = Vec::with_capacity(row.photo_refs.len());
            for reference in &row.photo_refs {
                if let Some(slot) = images.load(&self.photos, reference).await {
                    photos.push(slot);
                }
            }
            layout_rows.push(self.layout_row(row, locale, photos));
        }

        let mut technician = SignatureSlot { image: None, name: header.technician_name.clone() };
        let mut client = SignatureSlot { image: None, name: header.client_name.clone() };
        for signature in &signatures {
            let slot = images.load(&self.photos, &signature.image_ref).await;
            match signature.role {
                SignatureRole::Technician => technician.image = slot,
                SignatureRole::Client => client.image = slot,
            }
        }

        let labels = self.labels(locale);
        let title = match &header.work_order_number {
            Some(number) => format!("{} {}", labels.title, number),
            None => labels.title.clone(),
        };

        let input = LayoutInput {
            labels,
            logo,
            work_order_number: header.work_order_number.clone(),
            client_name: header.client_name.clone(),
            technician_name: header.technician_name.clone(),
            completed_at: header
                .completed_at
                .map(|at| at.format(locale.short_date_format()).to_string()),
            issued_at: issued_at.format(locale.short_datetime_format()).to_string(),
            rows: layout_rows,
            technician,
            client,
        };

        let document = layout::lay_out(&input, &TextMetrics);

        tracing::info!(
            work_order = %work_order_id,
            pages = document.page_count(),
            images = images.store.len(),
            "Relatório diagramado"
        );

        Ok(ComposedReport {
            file_name: report_file_name(header.work_order_number.as_deref()),
            title,
            document,
            images: images.store,
        })
    }

    /// `compose` + PDF.
    pub async fn render(&self, work_order_id: Uuid, locale: &Locale) -> Result<RenderedReport, AppError> {
        let composed = self.compose(work_order_id, locale).await?;
        let file_name = composed.file_name.clone();
        let fonts = self.fonts.clone();

        // genpdf é síncrono e pesado
        let bytes = tokio::task::spawn_blocking(move || {
            pdf::render_pdf(&composed.document, &composed.images, &fonts, &composed.title)
        })
        .await
        .map_err(|e| AppError::RenderError(e.to_string()))??;

        tracing::info!(work_order = %work_order_id, bytes = bytes.len(), "Relatório gerado");
        Ok(RenderedReport { file_name, bytes })
    }

    fn labels(&self, locale: &Locale) -> ReportLabels {
        let lang = locale.0.as_str();
        let t = |key: &str| self.i18n.text(lang, key);
        ReportLabels {
            title: t("report.title"),
            work_order_number: t("report.work_order_number"),
            client_name: t("report.client_name"),
            technician_name: t("report.technician_name"),
            completed_at: t("report.completed_at"),
            checklist_heading: t("report.checklist_heading"),
            issued_at: t("report.issued_at"),
            technician_signature: t("report.technician_signature"),
            client_signature: t("report.client_signature"),
            page_footer: t("report.page_footer"),
        }
    }

    fn layout_row(&self, row: &ReportRow, locale: &Locale, photos: Vec<ImageSlot>) -> LayoutRow {
        let lang = locale.0.as_str();
        let result = row
            .result
            .label_key()
            .map(|key| self.i18n.text(lang, key))
            .unwrap_or_else(|| layout::EMPTY_VALUE.to_string());

        LayoutRow {
            title: format!("{} - {}", row.item_id, row.description),
            result_line: self.i18n.translate(lang, "report.result", &[("result", result.as_str())]),
            observation: row
                .observation
                .as_deref()
                .map(str::trim)
                .filter(|obs| !obs.is_empty())
                .map(|obs| self.i18n.translate(lang, "report.observation", &[("observation", obs)])),
            photos,
        }
    }
}

/// `relatorio_inspecao_<número>.pdf`; sequências fora de `[A-Za-z0-9_-]` viram `_`.
pub fn report_file_name(number: Option<&str>) -> String {
    let number = number.map(str::trim).filter(|n| !n.is_empty()).unwrap_or("sem_os");
    let mut sanitized = String::with_capacity(number.len());
    let mut in_run = false;
    for c in number.chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            sanitized.push(c);
            in_run = false;
        } else if !in_run {
            sanitized.push('_');
            in_run = true;
        }
    }
    format!("relatorio_inspecao_{sanitized}.pdf")
}

// Imagens do relatório, sem repetir a mesma referência
#[derive(Default)]
struct ImageSet {
    store: Vec<Arc<DynamicImage>>,
    by_reference: HashMap<String, Option<ImageSlot>>,
}

impl ImageSet {
    fn push(&mut self, img: DynamicImage) -> ImageSlot {
        let (width, height) = img.dimensions();
        let slot = ImageSlot { index: self.store.len(), width, height };
        self.store.push(Arc::new(img));
        slot
    }

    async fn load(&mut self, loader: &PhotoLoader, reference: &str) -> Option<ImageSlot> {
        if let Some(cached) = self.by_reference.get(reference) {
            return *cached;
        }
        let slot = loader.load(reference).await.map(|img| self.push(img));
        self.by_reference.insert(reference.to_string(), slot);
        slot
    }
}

async fn load_logo(path: &str) -> Option<DynamicImage> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(path = %path, "Logo não encontrada: {}", e);
            return None;
        }
    };
    match image::load_from_memory(&bytes) {
        Ok(img) => Some(img),
        Err(e) => {
            tracing::warn!(path = %path, "Logo inválida: {}", e);
            None
        }
    }
}
