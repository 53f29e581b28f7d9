//! Registration, login and profile

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{hash_password, verify_password, JwtValidator, MIN_PASSWORD_LEN};
use crate::db::schemas::UserDoc;
use crate::db::Store;
use crate::types::{LingoError, Result};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: Option<String>,
    pub nim: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub nim: Option<String>,
    pub password: Option<String>,
}

/// A user as returned by the API; never includes the password hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserView {
    pub id: i64,
    pub full_name: String,
    pub nim: String,
    pub level: i64,
    pub xp: i64,
    pub streak: i64,
}

impl From<&UserDoc> for UserView {
    fn from(user: &UserDoc) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name.clone(),
            nim: user.nim.clone(),
            level: user.level,
            xp: user.xp,
            streak: user.streak,
        }
    }
}

/// User plus a freshly issued token
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub user: UserView,
    pub token: String,
}

fn required(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub async fn register(
    store: &dyn Store,
    jwt: &JwtValidator,
    request: RegisterRequest,
) -> Result<AuthSession> {
    let (Some(full_name), Some(nim), Some(password)) = (
        required(request.full_name),
        required(request.nim),
        request.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(LingoError::bad_request("All fields are required"));
    };

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(LingoError::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    if store.find_user_by_nim(&nim).await?.is_some() {
        return Err(LingoError::bad_request("NIM already registered"));
    }

    let password_hash = hash_password(&password)?;
    let user = store
        .create_user(UserDoc::new(full_name, nim, password_hash))
        .await?;

    info!(user_id = user.id, nim = %user.nim, "User registered");

    let token = jwt.generate_token(user.id, &user.nim)?;
    Ok(AuthSession {
        user: UserView::from(&user),
        token,
    })
}

pub async fn login(
    store: &dyn Store,
    jwt: &JwtValidator,
    request: LoginRequest,
) -> Result<AuthSession> {
    let (Some(nim), Some(password)) = (
        required(request.nim),
        request.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(LingoError::bad_request("NIM and password are required"));
    };

    let invalid = || LingoError::Unauthorized("Invalid NIM or password".into());

    let user = store.find_user_by_nim(&nim).await?.ok_or_else(invalid)?;
    if !verify_password(&password, &user.password_hash)? {
        return Err(invalid());
    }

    info!(user_id = user.id, nim = %user.nim, "Login successful");

    let token = jwt.generate_token(user.id, &user.nim)?;
    Ok(AuthSession {
        user: UserView::from(&user),
        token,
    })
}

pub async fn profile(store: &dyn Store, user_id: i64) -> Result<UserView> {
    store
        .find_user(user_id)
        .await?
        .map(|user| UserView::from(&user))
        .ok_or_else(|| LingoError::not_found("User not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn register_request(nim: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            full_name: Some("Siti Aminah".into()),
            nim: Some(nim.into()),
            password: Some(password.into()),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let store = MemoryStore::new();
        let jwt = JwtValidator::new_dev();

        let session = register(&store, &jwt, register_request("2301001", "secret1"))
            .await
            .unwrap();
        assert_eq!(session.user.level, 1);
        assert_eq!(session.user.xp, 0);
        assert_eq!(jwt.verify_token(&session.token).unwrap().user_id, session.user.id);

        let again = login(
            &store,
            &jwt,
            LoginRequest {
                nim: Some("2301001".into()),
                password: Some("secret1".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(again.user, session.user);
    }

    #[tokio::test]
    async fn test_register_validation() {
        let store = MemoryStore::new();
        let jwt = JwtValidator::new_dev();

        let missing = register(&store, &jwt, RegisterRequest::default()).await;
        assert!(matches!(missing, Err(LingoError::BadRequest(_))));

        let short = register(&store, &jwt, register_request("2301001", "12345")).await;
        assert!(matches!(short, Err(LingoError::BadRequest(_))));

        register(&store, &jwt, register_request("2301001", "123456"))
            .await
            .unwrap();
        let duplicate = register(&store, &jwt, register_request("2301001", "123456")).await;
        match duplicate {
            Err(LingoError::BadRequest(msg)) => assert_eq!(msg, "NIM already registered"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_login_failures_are_unauthorized() {
        let store = MemoryStore::new();
        let jwt = JwtValidator::new_dev();
        register(&store, &jwt, register_request("2301001", "secret1"))
            .await
            .unwrap();

        for (nim, password) in [("2301001", "wrong-pass"), ("9999999", "secret1")] {
            let result = login(
                &store,
                &jwt,
                LoginRequest {
                    nim: Some(nim.into()),
                    password: Some(password.into()),
                },
            )
            .await;
            assert!(matches!(result, Err(LingoError::Unauthorized(_))));
        }
    }

    #[tokio::test]
    async fn test_profile_of_missing_user() {
        let store = MemoryStore::new();
        assert!(matches!(
            profile(&store, 42).await,
            Err(LingoError::NotFound(_))
        ));
    }
}
