use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::{ok, ok_with_message, required};
use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::models::{Role, TempUser, User};
use crate::services::auth::{self, MIN_PASSWORD_LEN, VERIFICATION_TTL_MINUTES};
use crate::services::notifications::{self, Email};
use crate::state::AppState;

fn normalize_email(raw: Option<&str>) -> AppResult<String> {
    let email = required(raw, "email")?.to_lowercase();
    let valid = email
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.starts_with('.'))
        .unwrap_or(false);
    if !valid {
        return Err(AppError::Validation("email is invalid".to_string()));
    }
    Ok(email)
}

fn check_password(password: Option<&str>) -> AppResult<&str> {
    let password = password.unwrap_or("");
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(password)
}

fn session_payload(user: &User, token: String) -> Value {
    serde_json::json!({ "token": token, "user": user })
}

// POST /auth/signup
#[derive(Deserialize)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub phone: Option<String>,
}

pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignupRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let name = required(body.name.as_deref(), "name")?.to_string();
    let email = normalize_email(body.email.as_deref())?;
    let password = check_password(body.password.as_deref())?;
    let role = match body.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        None => Role::User,
        Some(raw) => match Role::parse(raw) {
            Some(role @ (Role::User | Role::Vendor)) => role,
            _ => return Err(AppError::Validation(format!("invalid role: {raw}"))),
        },
    };

    {
        let db = state.db()?;
        if queries::get_user_by_email(&db, &email)?.is_some() {
            return Err(AppError::Conflict("email is already registered".to_string()));
        }
    }

    let password_hash = auth::hash_password(password)?;
    let code = auth::generate_verification_code();
    let temp = TempUser {
        id: Uuid::new_v4().to_string(),
        name,
        email: email.clone(),
        password_hash,
        role,
        phone: body.phone.filter(|p| !p.trim().is_empty()),
        code: code.clone(),
        expires_at: (Utc::now() + Duration::minutes(VERIFICATION_TTL_MINUTES)).naive_utc(),
    };

    {
        let db = state.db()?;
        queries::upsert_temp_user(&db, &temp)?;
    }

    tracing::info!(email = %email, "signup pending verification");
    notifications::dispatch(
        Arc::clone(&state.mailer),
        vec![Email {
            to: email.clone(),
            subject: "Verify your SkillLink account".to_string(),
            body: format!(
                "Your verification code is {code}. It expires in {VERIFICATION_TTL_MINUTES} minutes."
            ),
        }],
    );

    Ok((
        StatusCode::CREATED,
        ok_with_message(
            "verification code sent",
            serde_json::json!({ "email": email }),
        ),
    ))
}

// POST /auth/verify
#[derive(Deserialize)]
pub struct VerifyRequest {
    pub email: Option<String>,
    pub code: Option<String>,
}

pub async fn verify(
    State(state): State<Arc<AppState>>,
    Json(body): Json<VerifyRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let email = normalize_email(body.email.as_deref())?;
    let code = required(body.code.as_deref(), "code")?;

    let user = {
        let mut db = state.db()?;
        let tx = db.transaction()?;

        let temp = queries::get_temp_user_by_email(&tx, &email)?
            .ok_or_else(|| AppError::Validation("no pending signup for this email".to_string()))?;
        if temp.expires_at < Utc::now().naive_utc() {
            return Err(AppError::Validation("verification code has expired".to_string()));
        }
        if temp.code != code {
            return Err(AppError::Validation("verification code is incorrect".to_string()));
        }
        if queries::get_user_by_email(&tx, &email)?.is_some() {
            return Err(AppError::Conflict("email is already registered".to_string()));
        }

        let now = Utc::now().naive_utc();
        let user = User {
            id: temp.id,
            name: temp.name,
            email: temp.email,
            password_hash: temp.password_hash,
            role: temp.role,
            phone: temp.phone,
            created_at: now,
            updated_at: now,
        };
        queries::insert_user(&tx, &user)?;
        queries::delete_temp_user(&tx, &email)?;
        tx.commit()?;
        user
    };

    tracing::info!(user_id = %user.id, role = %user.role.as_str(), "account verified");
    let token = auth::issue_session_token(&user, &state.config.jwt_secret)?;
    Ok((StatusCode::CREATED, ok(session_payload(&user, token))))
}

// POST /auth/signin
#[derive(Deserialize)]
pub struct SigninRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

pub async fn signin(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SigninRequest>,
) -> AppResult<Json<Value>> {
    let email = normalize_email(body.email.as_deref())?;
    let password = required(body.password.as_deref(), "password")?;

    let user = {
        let db = state.db()?;
        queries::get_user_by_email(&db, &email)?
    };

    let user = match user {
        Some(user) if auth::verify_password(password, &user.password_hash) => user,
        _ => {
            tracing::info!(email = %email, "failed sign-in");
            return Err(AppError::Unauthorized("invalid email or password".to_string()));
        }
    };

    let token = auth::issue_session_token(&user, &state.config.jwt_secret)?;
    Ok(ok(session_payload(&user, token)))
}

// POST /auth/forgot-password
#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ForgotPasswordRequest>,
) -> AppResult<Json<Value>> {
    let email = normalize_email(body.email.as_deref())?;

    let user = {
        let db = state.db()?;
        queries::get_user_by_email(&db, &email)?
    };

    // Same response either way so the endpoint cannot probe for accounts.
    if let Some(user) = user {
        let token = auth::issue_reset_token(&user, &state.config.jwt_secret)?;
        notifications::dispatch(
            Arc::clone(&state.mailer),
            vec![Email {
                to: user.email.clone(),
                subject: "Reset your SkillLink password".to_string(),
                body: format!(
                    "Use this token to reset your password within the next hour:\n\n{token}\n"
                ),
            }],
        );
    }

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "if the account exists, a reset link has been sent",
    })))
}

// POST /auth/reset-password
#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub token: Option<String>,
    pub password: Option<String>,
}

pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ResetPasswordRequest>,
) -> AppResult<Json<Value>> {
    let token = required(body.token.as_deref(), "token")?;
    let password = check_password(body.password.as_deref())?;
    let claims = auth::decode_reset_token(token, &state.config.jwt_secret)?;

    let password_hash = auth::hash_password(password)?;
    {
        let db = state.db()?;
        let user = queries::get_user_by_id(&db, &claims.user_id)?
            .ok_or_else(|| AppError::NotFound("user".to_string()))?;
        // A token is spent once the hash it was issued against is replaced.
        let current = auth::password_fingerprint(&user.password_hash);
        if claims.fingerprint.as_deref() != Some(current.as_str()) {
            return Err(AppError::Validation(
                "reset token has already been used".to_string(),
            ));
        }
        if !queries::update_password(&db, &claims.user_id, &password_hash)? {
            return Err(AppError::NotFound("user".to_string()));
        }
    }

    tracing::info!(user_id = %claims.user_id, "password reset");
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "password updated",
    })))
}

// GET /auth/me
pub async fn me(State(state): State<Arc<AppState>>, headers: HeaderMap) -> AppResult<Json<Value>> {
    let claims = auth::authenticate(&headers, &state.config.jwt_secret)?;
    let user = {
        let db = state.db()?;
        queries::get_user_by_id(&db, &claims.user_id)?
    };
    user.map(ok)
        .ok_or_else(|| AppError::NotFound("user".to_string()))
}
