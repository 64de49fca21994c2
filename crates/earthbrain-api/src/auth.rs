use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::info;

use earthbrain_types::api::{
    Claims, LoginRequest, LoginResponse, RegisterRequest, SessionResponse,
};
use earthbrain_types::models::{Account, Role};

use crate::error::ApiError;
use crate::site::Site;
use crate::{AppState, blocking};

const MIN_PASSWORD_LEN: usize = 8;

/// POST /auth/register: create a member account for the community wall.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let st = state.clone();
    let account = blocking(move || {
        let password_hash = hash_password(&req.password)?;
        st.site.create_account(
            &req.email,
            &req.display_name,
            req.photo_url,
            password_hash,
            Role::Member,
        )
    })
    .await?;

    let token = create_token(&state.jwt_secret, &account, state.token_days)?;

    Ok((
        StatusCode::CREATED,
        Json(LoginResponse {
            user_id: account.id,
            display_name: account.display_name,
            role: account.role,
            token,
        }),
    ))
}

/// POST /auth/login: admins and members sign in the same way.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let st = state.clone();
    let account = blocking(move || {
        let account = st
            .site
            .account_by_email(&req.email)?
            .ok_or(ApiError::Unauthorized)?;

        // Verify password
        let parsed_hash = PasswordHash::new(&account.password_hash)
            .map_err(|e| anyhow::anyhow!("Stored hash for {} is invalid: {}", account.id, e))?;
        Argon2::default()
            .verify_password(req.password.as_bytes(), &parsed_hash)
            .map_err(|_| ApiError::Unauthorized)?;

        Ok(account)
    })
    .await?;

    let token = create_token(&state.jwt_secret, &account, state.token_days)?;
    info!("{} signed in ({:?})", account.id, account.role);

    Ok(Json(LoginResponse {
        user_id: account.id,
        display_name: account.display_name,
        role: account.role,
        token,
    }))
}

/// GET /auth/me
pub async fn me(Extension(session): Extension<Claims>) -> Json<SessionResponse> {
    Json(SessionResponse::from(&session))
}

/// Make sure the configured organizer account exists with the configured
/// password and admin role.
pub fn seed_admin(site: &Site, email: &str, password: &str) -> Result<(), ApiError> {
    let password_hash = hash_password(password)?;

    match site.account_by_email(email)? {
        Some(account) => {
            site.update_account(&account.id, password_hash, Role::Admin)?;
            info!("Admin account {} refreshed", account.id);
        }
        None => {
            let account =
                site.create_account(email, "Organizer", None, password_hash, Role::Admin)?;
            info!("Admin account {} created", account.id);
        }
    }
    Ok(())
}

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

pub fn create_token(secret: &str, account: &Account, days: i64) -> anyhow::Result<String> {
    let lifetime = chrono::Duration::try_days(days)
        .filter(|d| *d > chrono::Duration::zero())
        .ok_or_else(|| anyhow::anyhow!("Invalid token lifetime: {} days", days))?;
    let expires = chrono::Utc::now()
        .checked_add_signed(lifetime)
        .ok_or_else(|| anyhow::anyhow!("Token expiry out of range: {} days", days))?;

    let claims = Claims {
        sub: account.id.clone(),
        name: account.display_name.clone(),
        photo: account.photo_url.clone(),
        role: account.role,
        exp: expires.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::verify_token;
    use earthbrain_db::MemoryStore;
    use std::sync::Arc;

    #[test]
    fn token_roundtrip_carries_role() {
        let account = Account {
            id: "a1".into(),
            email: "org@example.org".into(),
            display_name: "Organizer".into(),
            photo_url: None,
            password_hash: String::new(),
            role: Role::Admin,
            timestamp: chrono::Utc::now(),
        };

        let token = create_token("secret", &account, 1).unwrap();
        let claims = verify_token("secret", &token).unwrap();
        assert_eq!(claims.sub, "a1");
        assert!(claims.is_admin());

        assert!(matches!(
            verify_token("other-secret", &token),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn out_of_range_lifetimes_are_errors() {
        let account = Account {
            id: "a1".into(),
            email: "org@example.org".into(),
            display_name: "Organizer".into(),
            photo_url: None,
            password_hash: String::new(),
            role: Role::Member,
            timestamp: chrono::Utc::now(),
        };

        assert!(create_token("secret", &account, i64::MAX).is_err());
        assert!(create_token("secret", &account, 0).is_err());
        assert!(create_token("secret", &account, -1).is_err());
        assert!(create_token("secret", &account, 365).is_ok());
    }

    #[test]
    fn seed_admin_promotes_existing_member() {
        let site = Site::new(Arc::new(MemoryStore::new()));
        site.create_account("org@example.org", "Org", None, "x".into(), Role::Member)
            .unwrap();

        seed_admin(&site, "org@example.org", "correct horse").unwrap();

        let account = site.account_by_email("org@example.org").unwrap().unwrap();
        assert_eq!(account.role, Role::Admin);
        let parsed = PasswordHash::new(&account.password_hash).unwrap();
        assert!(Argon2::default()
            .verify_password(b"correct horse", &parsed)
            .is_ok());
    }
}
