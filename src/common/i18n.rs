// src/common/i18n.rs

use std::collections::HashMap;

use anyhow::Context;

pub const DEFAULT_LANG: &str = "pt";

const PT_MESSAGES: &str = include_str!("../../locales/pt.json");
const EN_MESSAGES: &str = include_str!("../../locales/en.json");

/// Catálogo de mensagens por idioma. Chave ausente cai para `pt` e depois para a própria chave.
#[derive(Debug, Clone, Default)]
pub struct I18nStore {
    catalogs: HashMap<String, HashMap<String, String>>,
}

impl I18nStore {
    pub fn embedded() -> anyhow::Result<Self> {
        Self::from_sources(&[("pt", PT_MESSAGES), ("en", EN_MESSAGES)])
    }

    pub fn from_sources(sources: &[(&str, &str)]) -> anyhow::Result<Self> {
        let mut catalogs = HashMap::new();
        for (lang, raw) in sources {
            let messages: HashMap<String, String> = serde_json::from_str(raw)
                .with_context(|| format!("catálogo de mensagens '{lang}' inválido"))?;
            catalogs.insert(lang.to_string(), messages);
        }
        Ok(Self { catalogs })
    }

    pub fn supports(&self, lang: &str) -> bool {
        self.catalogs.contains_key(lang)
    }

    pub fn translate(&self, lang: &str, key: &str, params: &[(&str, &str)]) -> String {
        let template = self
            .catalogs
            .get(lang)
            .and_then(|messages| messages.get(key))
            .or_else(|| {
                self.catalogs
                    .get(DEFAULT_LANG)
                    .and_then(|messages| messages.get(key))
            })
            .map(String::as_str)
            .unwrap_or(key);

        let mut message = template.to_string();
        for (name, value) in params {
            message = message.replace(&format!("{{{name}}}"), value);
        }
        message
    }

    pub fn text(&self, lang: &str, key: &str) -> String {
        self.translate(lang, key, &[])
    }
}
