//! Bearer token verification
//!
//! Tokens are issued by the platform's auth service; this side only checks
//! the HS256 signature and expiry.

use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub username: String,
    pub role: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
}

/// Authentication service
pub struct AuthService;

impl AuthService {
    /// Verify JWT token and extract claims
    pub fn verify_token(token: &str, secret: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use jsonwebtoken::{EncodingKey, Header, encode};

    use super::*;

    fn token(secret: &str, expires_in: Duration) -> String {
        let claims = Claims {
            sub: uuid::Uuid::new_v4().to_string(),
            username: "ada".to_string(),
            role: "student".to_string(),
            exp: (Utc::now() + expires_in).timestamp(),
            iat: Utc::now().timestamp(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_verify_valid_token() {
        let claims = AuthService::verify_token(&token("s3cret", Duration::hours(1)), "s3cret").unwrap();
        assert_eq!(claims.username, "ada");
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let err = AuthService::verify_token(&token("s3cret", Duration::hours(1)), "other").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_TOKEN");
    }

    #[test]
    fn test_expired_token() {
        let err = AuthService::verify_token(&token("s3cret", Duration::hours(-2)), "s3cret").unwrap_err();
        assert_eq!(err.error_code(), "TOKEN_EXPIRED");
    }
}
