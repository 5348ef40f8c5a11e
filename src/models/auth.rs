// src/models/auth.rs

use serde::{Deserialize, Serialize};

/// Usuário autenticado pelo provedor de identidade externo.
/// O `id` é tratado como string opaca (vai para `reviewer_id`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: String,
    pub email: Option<String>,
}

// Estrutura de dados ("claims") dentro do JWT do provedor
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (ID do usuário no provedor)
    pub exp: usize,  // Expiration time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}
