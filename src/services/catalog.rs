// src/services/catalog.rs

use std::collections::HashMap;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const EMBEDDED_CATALOG: &str = include_str!("../../data/checklist_catalog.json");

/// Uma pergunta fixa do checklist de inspeção.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    #[schema(example = "1.1")]
    pub id: String,
    #[schema(example = "Instalação")]
    pub category: String,
    pub text: String,
    pub required: bool,
    pub photo_required: bool,
}

/// Catálogo padronizado (54 itens). `len()` é o N da regra de status.
#[derive(Debug, Clone)]
pub struct ChecklistCatalog {
    items: Vec<CatalogItem>,
    index: HashMap<String, usize>,
}

impl ChecklistCatalog {
    pub fn embedded() -> anyhow::Result<Self> {
        let items: Vec<CatalogItem> =
            serde_json::from_str(EMBEDDED_CATALOG).context("catálogo do checklist inválido")?;
        Self::new(items)
    }

    pub fn new(items: Vec<CatalogItem>) -> anyhow::Result<Self> {
        let mut index = HashMap::with_capacity(items.len());
        for (pos, item) in items.iter().enumerate() {
            if index.insert(item.id.clone(), pos).is_some() {
                anyhow::bail!("item {} duplicado no catálogo", item.id);
            }
        }
        Ok(Self { items, index })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, item_id: &str) -> Option<&CatalogItem> {
        self.index.get(item_id).map(|&pos| &self.items[pos])
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn required_items(&self) -> impl Iterator<Item = &CatalogItem> {
        self.items.iter().filter(|item| item.required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_catalog_has_54_items_in_4_categories() {
        let catalog = ChecklistCatalog::embedded().unwrap();
        assert_eq!(catalog.len(), 54);

        let mut categories: Vec<&str> = catalog.items().iter().map(|i| i.category.as_str()).collect();
        categories.dedup();
        assert_eq!(categories, vec!["Instalação", "Vazamentos", "Segurança", "Finalização"]);

        assert_eq!(catalog.get("26.1").map(|i| i.required), Some(true));
        assert!(catalog.get("1.1").is_some_and(|i| i.photo_required));
        assert!(catalog.get("99.9").is_none());
    }

    #[test]
    fn rejects_duplicated_ids() {
        let item = CatalogItem {
            id: "1.1".into(),
            category: "Instalação".into(),
            text: "x".into(),
            required: true,
            photo_required: false,
        };
        assert!(ChecklistCatalog::new(vec![item.clone(), item]).is_err());
    }
}
