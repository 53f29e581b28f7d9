//! Authentication for LingoBee
//!
//! Provides:
//! - JWT token generation and validation
//! - Password hashing with Argon2

pub mod jwt;
pub mod password;

pub use jwt::{extract_token_from_header, AuthUser, Claims, JwtValidator, TokenError};
pub use password::{hash_password, verify_password, MIN_PASSWORD_LEN};
