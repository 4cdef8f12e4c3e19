//! Password hashing, JWT issuance, and bearer-token checks.

use anyhow::anyhow;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Role, User};

pub const SESSION_TTL_HOURS: i64 = 24;
pub const RESET_TTL_HOURS: i64 = 1;
pub const VERIFICATION_TTL_MINUTES: i64 = 15;
pub const MIN_PASSWORD_LEN: usize = 8;

const RESET_PURPOSE: &str = "reset";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: String,
    pub email: String,
    pub role: Role,
    pub exp: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    /// Salt of the password hash a reset token was issued against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

impl Claims {
    pub fn is(&self, role: Role) -> bool {
        self.role == role
    }

    pub fn require(&self, role: Role) -> Result<(), AppError> {
        if self.role == role {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!("{} access required", role.as_str())))
        }
    }
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow!("failed to hash password: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Salt segment of a PHC hash string. Every rehash draws a new salt, so a
/// reset token stops matching once the password it was issued for changes.
pub fn password_fingerprint(hash: &str) -> String {
    PasswordHash::new(hash)
        .ok()
        .and_then(|parsed| parsed.salt.map(|salt| salt.as_str().to_string()))
        .unwrap_or_default()
}

fn sign(claims: &Claims, secret: &str) -> Result<String, AppError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow!("failed to sign token: {e}")))
}

pub fn issue_session_token(user: &User, secret: &str) -> Result<String, AppError> {
    let exp = (Utc::now() + Duration::hours(SESSION_TTL_HOURS)).timestamp() as usize;
    sign(
        &Claims {
            user_id: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            exp,
            purpose: None,
            fingerprint: None,
        },
        secret,
    )
}

pub fn issue_reset_token(user: &User, secret: &str) -> Result<String, AppError> {
    let exp = (Utc::now() + Duration::hours(RESET_TTL_HOURS)).timestamp() as usize;
    sign(
        &Claims {
            user_id: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            exp,
            purpose: Some(RESET_PURPOSE.to_string()),
            fingerprint: Some(password_fingerprint(&user.password_hash)),
        },
        secret,
    )
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!(error = %e, "rejected token");
        AppError::Unauthorized("invalid or expired token".to_string())
    })
}

/// Claims of a session token; reset tokens are refused.
pub fn decode_session_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let claims = decode_token(token, secret)?;
    if claims.purpose.is_some() {
        return Err(AppError::Unauthorized("invalid or expired token".to_string()));
    }
    Ok(claims)
}

pub fn decode_reset_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let claims = decode_token(token, secret)?;
    if claims.purpose.as_deref() != Some(RESET_PURPOSE) {
        return Err(AppError::Validation("invalid reset token".to_string()));
    }
    Ok(claims)
}

/// Reads `Authorization: Bearer <jwt>` and validates it.
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<Claims, AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("").trim();
    if token.is_empty() {
        return Err(AppError::Unauthorized("missing bearer token".to_string()));
    }
    decode_session_token(token, secret)
}

/// Six-digit email verification code.
pub fn generate_verification_code() -> String {
    let n = Uuid::new_v4().as_u128() % 1_000_000;
    format!("{n:06}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn user(role: Role) -> User {
        let now = Utc::now().naive_utc();
        User {
            id: "u1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: String::new(),
            role,
            phone: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
        assert!(!verify_password("correct horse", "not-a-hash"));
    }

    #[test]
    fn test_session_token_carries_identity() {
        let token = issue_session_token(&user(Role::Vendor), "secret").unwrap();
        let claims = decode_session_token(&token, "secret").unwrap();
        assert_eq!(claims.user_id, "u1");
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.role, Role::Vendor);
        assert!(claims.require(Role::Vendor).is_ok());
        assert!(matches!(claims.require(Role::Admin), Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_token_payload_uses_camel_case() {
        let token = issue_session_token(&user(Role::User), "secret").unwrap();
        let claims = decode_token(&token, "secret").unwrap();
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["role"], "user");
        assert!(json.get("purpose").is_none());
    }

    #[test]
    fn test_wrong_secret_is_unauthorized() {
        let token = issue_session_token(&user(Role::User), "secret").unwrap();
        assert!(matches!(
            decode_session_token(&token, "other"),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_reset_token_is_not_a_session() {
        let token = issue_reset_token(&user(Role::User), "secret").unwrap();
        assert!(decode_session_token(&token, "secret").is_err());
        assert_eq!(decode_reset_token(&token, "secret").unwrap().user_id, "u1");

        let session = issue_session_token(&user(Role::User), "secret").unwrap();
        assert!(decode_reset_token(&session, "secret").is_err());
    }

    #[test]
    fn test_reset_token_is_bound_to_current_hash() {
        let mut ada = user(Role::User);
        ada.password_hash = hash_password("first password").unwrap();
        let token = issue_reset_token(&ada, "secret").unwrap();
        let claims = decode_reset_token(&token, "secret").unwrap();
        assert_eq!(
            claims.fingerprint.as_deref(),
            Some(password_fingerprint(&ada.password_hash).as_str())
        );
        assert!(!password_fingerprint(&ada.password_hash).is_empty());

        let rehashed = hash_password("first password").unwrap();
        assert_ne!(password_fingerprint(&rehashed), password_fingerprint(&ada.password_hash));
        assert_eq!(password_fingerprint("not-a-hash"), "");
    }

    #[test]
    fn test_authenticate_header() {
        let token = issue_session_token(&user(Role::Admin), "secret").unwrap();
        let mut headers = HeaderMap::new();
        assert!(matches!(
            authenticate(&headers, "secret"),
            Err(AppError::Unauthorized(_))
        ));

        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        assert_eq!(authenticate(&headers, "secret").unwrap().role, Role::Admin);
    }

    #[test]
    fn test_verification_code_is_six_digits() {
        for _ in 0..20 {
            let code = generate_verification_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
