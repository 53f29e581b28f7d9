//! JWT token handling for learner sessions
//!
//! Tokens are HS256-signed and carry the learner's id and NIM. The server
//! never trusts a token it cannot verify against its own secret.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::LingoError;

/// Minimum secret length accepted outside dev mode
pub const MIN_SECRET_LEN: usize = 32;

/// Payload stored in JWT token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub user_id: i64,
    /// Student number used to log in
    pub nim: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// The authenticated caller of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub nim: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.user_id,
            nim: claims.nim,
        }
    }
}

/// Why a token was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    Expired,
    InvalidSignature,
    Malformed,
}

/// JWT validator and generator
#[derive(Clone)]
pub struct JwtValidator {
    secret: String,
    expiry_seconds: u64,
}

impl JwtValidator {
    /// Create a new JWT validator
    ///
    /// Returns an error if the secret is empty or too short
    pub fn new(secret: String, expiry_seconds: u64) -> Result<Self, LingoError> {
        if secret.is_empty() {
            return Err(LingoError::Config(
                "JWT_SECRET is required in production mode".into(),
            ));
        }

        if secret.len() < MIN_SECRET_LEN {
            return Err(LingoError::Config(format!(
                "JWT_SECRET must be at least {MIN_SECRET_LEN} characters"
            )));
        }

        Ok(Self {
            secret,
            expiry_seconds,
        })
    }

    /// Create a validator for dev mode
    pub fn new_dev() -> Self {
        Self {
            secret: "dev-mode-secret-not-for-production-use-123456".into(),
            expiry_seconds: 7 * 24 * 60 * 60,
        }
    }

    /// Generate a token for an authenticated user
    pub fn generate_token(&self, user_id: i64, nim: &str) -> Result<String, LingoError> {
        let now = unix_now()?;

        let claims = Claims {
            user_id,
            nim: nim.to_string(),
            iat: now,
            exp: now + self.expiry_seconds,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| LingoError::Auth(format!("Failed to generate token: {}", e)))
    }

    /// Verify and decode a token
    pub fn verify_token(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|err| {
            use jsonwebtoken::errors::ErrorKind;
            match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            }
        })
    }

    pub fn expiry_seconds(&self) -> u64 {
        self.expiry_seconds
    }
}

fn unix_now() -> Result<u64, LingoError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| LingoError::Auth(format!("System time error: {}", e)))
}

/// Extract token from Authorization header ("Bearer <token>")
pub fn extract_token_from_header(auth_header: Option<&str>) -> Option<&str> {
    let token = auth_header?.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_validator() -> JwtValidator {
        JwtValidator::new(
            "test-secret-that-is-at-least-32-characters-long".into(),
            3600,
        )
        .unwrap()
    }

    #[test]
    fn test_generate_and_verify_token() {
        let validator = test_validator();

        let token = validator.generate_token(42, "2301001").unwrap();
        let claims = validator.verify_token(&token).unwrap();

        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.nim, "2301001");
        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(
            AuthUser::from(claims),
            AuthUser {
                id: 42,
                nim: "2301001".into()
            }
        );
    }

    #[test]
    fn test_garbage_token() {
        assert_eq!(
            test_validator().verify_token("invalid-token"),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn test_unsigned_base64_blob_rejected() {
        // {"id":1,"nim":"2301001"} base64-encoded, no signature
        let blob = "eyJpZCI6MSwibmltIjoiMjMwMTAwMSJ9";
        assert!(test_validator().verify_token(blob).is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let other = JwtValidator::new(
            "different-secret-that-is-at-least-32-characters".into(),
            3600,
        )
        .unwrap();

        let token = test_validator().generate_token(1, "2301001").unwrap();
        assert_eq!(other.verify_token(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_extract_token_from_header() {
        assert_eq!(
            extract_token_from_header(Some("Bearer abc123")),
            Some("abc123")
        );
        assert_eq!(extract_token_from_header(None), None);
        assert_eq!(extract_token_from_header(Some("")), None);
        assert_eq!(extract_token_from_header(Some("Bearer ")), None);
        assert_eq!(extract_token_from_header(Some("Basic abc123")), None);
    }

    #[test]
    fn test_secret_validation() {
        assert!(JwtValidator::new("short".into(), 3600).is_err());
        assert!(JwtValidator::new("".into(), 3600).is_err());
        assert!(JwtValidator::new("this-secret-is-at-least-32-chars-long".into(), 3600).is_ok());
    }
}
