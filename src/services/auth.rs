// src/services/auth.rs
//
// Os tokens são emitidos pelo provedor de identidade; aqui só validamos.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use crate::{
    common::error::AppError,
    models::auth::{Claims, CurrentUser},
};

#[derive(Clone)]
pub struct AuthService {
    jwt_secret: String,
    audience: Option<String>,
}

impl AuthService {
    pub fn new(jwt_secret: String, audience: Option<String>) -> Self {
        Self { jwt_secret, audience }
    }

    pub fn validate_token(&self, token: &str) -> Result<CurrentUser, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        match &self.audience {
            Some(aud) => validation.set_audience(&[aud.as_str()]),
            None => validation.validate_aud = false,
        }

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|e| {
            tracing::debug!("Token rejeitado: {}", e);
            AppError::InvalidToken
        })?;

        if token_data.claims.sub.trim().is_empty() {
            return Err(AppError::InvalidToken);
        }

        Ok(CurrentUser {
            id: token_data.claims.sub,
            email: token_data.claims.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &str, sub: &str, aud: Option<&str>) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
            iat: None,
            email: Some("validador@exemplo.com".into()),
            aud: aud.map(str::to_string),
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_ref())).unwrap()
    }

    #[test]
    fn accepts_valid_token() {
        let service = AuthService::new("segredo".into(), None);
        let user = service.validate_token(&token("segredo", "user-42", None)).unwrap();
        assert_eq!(user.id, "user-42");
        assert_eq!(user.email.as_deref(), Some("validador@exemplo.com"));
    }

    #[test]
    fn rejects_wrong_secret_and_audience() {
        let service = AuthService::new("segredo".into(), Some("inspecao".into()));
        assert_matches!(
            service.validate_token(&token("outro", "user-42", Some("inspecao"))),
            Err(AppError::InvalidToken)
        );
        assert_matches!(
            service.validate_token(&token("segredo", "user-42", Some("outro-app"))),
            Err(AppError::InvalidToken)
        );
        assert!(service.validate_token(&token("segredo", "user-42", Some("inspecao"))).is_ok());
    }
}
