// src/models/checklist.rs

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- Enums ---

/// Resultado de um item do checklist. `Unset` = ainda não respondido (NULL no banco).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemResult {
    Conforming,
    NonConforming,
    NotApplicable,
    #[default]
    Unset,
}

impl ItemResult {
    pub fn is_set(self) -> bool {
        !matches!(self, ItemResult::Unset)
    }

    pub fn as_db_str(self) -> Option<&'static str> {
        match self {
            ItemResult::Conforming => Some("CONFORMING"),
            ItemResult::NonConforming => Some("NON_CONFORMING"),
            ItemResult::NotApplicable => Some("NOT_APPLICABLE"),
            ItemResult::Unset => None,
        }
    }

    /// Valores desconhecidos viram `Unset` (linha legada ou editada à mão).
    pub fn from_db(value: Option<&str>) -> Self {
        match value {
            Some("CONFORMING") => ItemResult::Conforming,
            Some("NON_CONFORMING") => ItemResult::NonConforming,
            Some("NOT_APPLICABLE") => ItemResult::NotApplicable,
            _ => ItemResult::Unset,
        }
    }

    /// Chave i18n do rótulo impresso no relatório.
    pub fn label_key(self) -> Option<&'static str> {
        match self {
            ItemResult::Conforming => Some("report.result.conforming"),
            ItemResult::NonConforming => Some("report.result.non_conforming"),
            ItemResult::NotApplicable => Some("report.result.not_applicable"),
            ItemResult::Unset => None,
        }
    }
}

// --- Fotos ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PhotoMetadata {
    pub captured_at: DateTime<Utc>,
    #[schema(example = -23.5505)]
    pub latitude: Option<f64>,
    #[schema(example = -46.6333)]
    pub longitude: Option<f64>,
    pub accuracy: Option<f64>,
    #[schema(example = "abrigo_medidor.jpg")]
    pub filename: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PhotoAttachment {
    /// `data:image/...;base64,...` ou URL http(s).
    pub photo_ref: String,
    pub metadata: PhotoMetadata,
}

// --- Linhas persistidas ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItemResult {
    pub work_order_id: Uuid,
    #[schema(example = "12.3")]
    pub item_id: String,
    #[schema(example = "Instalação")]
    pub category: String,
    pub description: String,
    pub result: ItemResult,
    pub observation: Option<String>,
    pub photo: Option<PhotoAttachment>,
    pub updated_at: DateTime<Utc>,
}

// --- Entrada do formulário ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistEntry {
    #[validate(length(min = 1, max = 16, message = "required"))]
    #[schema(example = "1.1")]
    pub item_id: String,

    #[serde(default)]
    pub result: ItemResult,

    #[validate(length(max = 4000))]
    pub observation: Option<String>,

    pub photo: Option<PhotoAttachment>,
}

impl ChecklistEntry {
    /// Observação só é mantida quando o item não está conforme/não aplicável.
    pub fn normalized_observation(&self) -> Option<String> {
        match self.result {
            ItemResult::Conforming | ItemResult::NotApplicable => None,
            ItemResult::NonConforming | ItemResult::Unset => self
                .observation
                .as_deref()
                .map(str::trim)
                .filter(|obs| !obs.is_empty())
                .map(str::to_owned),
        }
    }

    /// Entrada totalmente vazia representa "não respondido" e não vira linha.
    pub fn has_content(&self) -> bool {
        self.result.is_set()
            || self
                .observation
                .as_deref()
                .is_some_and(|obs| !obs.trim().is_empty())
            || self.photo.is_some()
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistPayload {
    #[validate(nested)]
    pub items: Vec<ChecklistEntry>,
}

// --- Estado reconstruído do formulário ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistDraft {
    pub results: BTreeMap<String, ItemResult>,
    pub observations: BTreeMap<String, String>,
    pub photos: BTreeMap<String, PhotoAttachment>,
}

impl ChecklistDraft {
    pub fn from_rows(rows: &[ChecklistItemResult]) -> Self {
        let mut draft = ChecklistDraft::default();
        for row in rows {
            if row.result.is_set() {
                draft.results.insert(row.item_id.clone(), row.result);
            }
            if let Some(obs) = &row.observation {
                draft.observations.insert(row.item_id.clone(), obs.clone());
            }
            if let Some(photo) = &row.photo {
                draft.photos.insert(row.item_id.clone(), photo.clone());
            }
        }
        draft
    }
}

/// Compara ordinais do tipo "12.3" segmento a segmento, numericamente.
/// "2.10" vem depois de "2.9". Segmentos não numéricos vão depois dos numéricos.
pub fn compare_item_ids(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ord = match (l.trim().parse::<u64>(), r.trim().parse::<u64>()) {
                    (Ok(x), Ok(y)) => x.cmp(&y),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => l.cmp(r),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

pub fn sort_by_item_id(rows: &mut [ChecklistItemResult]) {
    rows.sort_by(|a, b| compare_item_ids(&a.item_id, &b.item_id));
}
