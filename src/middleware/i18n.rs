// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::common::i18n::DEFAULT_LANG;

// Extrator de idioma a partir do Accept-Language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale(pub String);

impl Default for Locale {
    fn default() -> Self {
        Locale(DEFAULT_LANG.to_string())
    }
}

impl Locale {
    pub fn from_header(header_str: &str) -> Self {
        accept_language::parse(header_str)
            .first() // Pega o primeiro idioma (ex: "pt-BR")
            .map(|tag| {
                // "pt-BR" -> "pt"
                tag.split('-').next().unwrap_or(tag).to_lowercase()
            })
            .filter(|lang| !lang.is_empty())
            .map(Locale)
            .unwrap_or_default()
    }

    /// Formato curto de data do idioma.
    pub fn short_date_format(&self) -> &'static str {
        match self.0.as_str() {
            "en" => "%m/%d/%Y",
            _ => "%d/%m/%Y",
        }
    }

    pub fn short_datetime_format(&self) -> &'static str {
        match self.0.as_str() {
            "en" => "%m/%d/%Y %I:%M %p",
            _ => "%d/%m/%Y %H:%M",
        }
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let locale = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|header_value| header_value.to_str().ok())
            .map(Locale::from_header)
            .unwrap_or_default();

        Ok(locale)
    }
}
