// src/models/report.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::models::checklist::{ChecklistItemResult, ItemResult};

/// Bloco de identificação do relatório. Campos ausentes saem como "—".
#[derive(Debug, Clone, Default, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReportHeader {
    pub work_order_number: Option<String>,
    pub client_name: Option<String>,
    pub technician_name: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub item_id: String,
    pub description: String,
    pub result: ItemResult,
    pub observation: Option<String>,
    pub photo_refs: Vec<String>,
}

impl From<&ChecklistItemResult> for ReportRow {
    fn from(row: &ChecklistItemResult) -> Self {
        Self {
            item_id: row.item_id.clone(),
            description: row.description.clone(),
            result: row.result,
            observation: row.observation.clone(),
            photo_refs: row.photo.iter().map(|p| p.photo_ref.clone()).collect(),
        }
    }
}
