use actix_web::{dev::Payload, error::ResponseError, http::StatusCode, web, FromRequest, HttpRequest, HttpResponse};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};

use crate::models::ErrorResponse;
use crate::routes::AppState;

/// Claims carried by the hosted-auth provider's JWTs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: usize,
}

/// The authenticated caller, extracted from a bearer token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}

/// Optional-auth variant: `None` when no (valid) token was presented
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

/// Authentication failure, rendered as a 401 JSON body
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct AuthError {
    message: String,
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::Unauthorized().json(ErrorResponse {
            error: "unauthorized".to_string(),
            message: self.message.clone(),
            status_code: 401,
        })
    }
}

/// Decode and validate a bearer token against the configured secret
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    // Hosted-auth tokens carry an audience claim we don't pin
    validation.validate_aud = false;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn authenticate(req: &HttpRequest) -> Result<AuthUser, AuthError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AuthError {
            message: "Authentication not configured".to_string(),
        })?;

    let token = bearer_token(req).ok_or_else(|| AuthError {
        message: "Unauthorized. Please log in.".to_string(),
    })?;

    let claims = decode_token(token, &state.jwt_secret).map_err(|e| {
        tracing::debug!("Token validation failed: {}", e);
        AuthError {
            message: "Authentication failed".to_string(),
        }
    })?;

    Ok(AuthUser {
        id: claims.sub,
        email: claims.email,
    })
}

impl FromRequest for AuthUser {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

impl FromRequest for MaybeAuthUser {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        // A bad or absent token degrades to anonymous access
        ready(Ok(MaybeAuthUser(authenticate(req).ok())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn make_token(secret: &str, exp_offset: i64) -> String {
        let claims = Claims {
            sub: "user-123".to_string(),
            email: Some("user@example.com".to_string()),
            exp: (chrono::Utc::now().timestamp() + exp_offset) as usize,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_decode_valid_token() {
        let token = make_token("secret", 3600);
        let claims = decode_token(&token, "secret").unwrap();

        assert_eq!(claims.sub, "user-123");
        assert_eq!(claims.email.as_deref(), Some("user@example.com"));
    }

    #[test]
    fn test_decode_rejects_wrong_secret() {
        let token = make_token("secret", 3600);
        assert!(decode_token(&token, "other-secret").is_err());
    }

    #[test]
    fn test_decode_rejects_expired_token() {
        let token = make_token("secret", -3600);
        assert!(decode_token(&token, "secret").is_err());
    }
}
