use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::otp::{self, OtpPurpose};
use crate::auth::password::{hash_password_blocking, verify_login_password};
use crate::auth::store::{self, NewCandidate, NewEmployer};
use crate::auth::token::issue_token;
use crate::auth::validation::{check_password_policy, normalize_email, optional, required};
use crate::auth::{AccountRole, AuthUser};
use crate::errors::AppError;
use crate::mail::templates::otp_mail;
use crate::models::account::{CandidateAccount, EmployerAccount};
use crate::state::AppState;

const BAD_CREDENTIALS: &str = "Invalid email or password";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct EmployerSignupRequest {
    pub company_name: String,
    pub contact_name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub industry: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateSignupRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "account_type", rename_all = "snake_case")]
pub enum AccountView {
    Employer(EmployerAccount),
    Candidate(CandidateAccount),
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub account: AccountView,
}

#[derive(Debug, Deserialize)]
pub struct SendOtpRequest {
    pub email: String,
    pub account_type: AccountRole,
    pub purpose: OtpPurpose,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub account_type: AccountRole,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub account_type: AccountRole,
    pub code: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn session(state: &AppState, id: uuid::Uuid, role: AccountRole, email: &str) -> Result<String, AppError> {
    issue_token(&state.config.jwt_secret, state.config.jwt_ttl_hours, id, role, email)
        .map_err(|e| AppError::Internal(e.into()))
}

// ────────────────────────────────────────────────────────────────────────────
// Signup / login
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/auth/employer-signup
pub async fn handle_employer_signup(
    State(state): State<AppState>,
    Json(req): Json<EmployerSignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let email = normalize_email(&req.email)?;
    let company_name = required("company_name", &req.company_name)?;
    let contact_name = required("contact_name", &req.contact_name)?;
    check_password_policy(&req.password)?;

    let password_hash = hash_password_blocking(req.password).await?;
    let phone = optional(req.phone);
    let website = optional(req.website);
    let industry = optional(req.industry);

    let employer = store::insert_employer(
        &state.db,
        NewEmployer {
            company_name: &company_name,
            contact_name: &contact_name,
            email: &email,
            password_hash: &password_hash,
            phone: phone.as_deref(),
            website: website.as_deref(),
            industry: industry.as_deref(),
        },
    )
    .await?;

    info!("Employer account {} created for {}", employer.id, employer.company_name);
    let token = session(&state, employer.id, AccountRole::Employer, &employer.email)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            account: AccountView::Employer(employer.into()),
        }),
    ))
}

/// POST /api/auth/employer-login
pub async fn handle_employer_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = normalize_email(&req.email)
        .map_err(|_| AppError::Unauthorized(BAD_CREDENTIALS.to_string()))?;
    let found = store::find_employer_by_email(&state.db, &email).await?;
    let stored_hash = found.as_ref().map(|a| a.password_hash.clone());
    let verified = verify_login_password(req.password, stored_hash).await;

    let employer = match found {
        Some(account) if verified => account,
        _ => {
            warn!("Failed employer login for {email}");
            return Err(AppError::Unauthorized(BAD_CREDENTIALS.to_string()));
        }
    };

    let token = session(&state, employer.id, AccountRole::Employer, &employer.email)?;
    Ok(Json(AuthResponse {
        token,
        account: AccountView::Employer(employer.into()),
    }))
}

/// POST /api/auth/candidate-signup
pub async fn handle_candidate_signup(
    State(state): State<AppState>,
    Json(req): Json<CandidateSignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let email = normalize_email(&req.email)?;
    let full_name = required("full_name", &req.full_name)?;
    check_password_policy(&req.password)?;

    let password_hash = hash_password_blocking(req.password).await?;
    let phone = optional(req.phone);

    let candidate = store::insert_candidate(
        &state.db,
        NewCandidate {
            full_name: &full_name,
            email: &email,
            password_hash: &password_hash,
            phone: phone.as_deref(),
        },
    )
    .await?;

    info!("Candidate account {} created", candidate.id);
    let token = session(&state, candidate.id, AccountRole::Candidate, &candidate.email)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            account: AccountView::Candidate(candidate.into()),
        }),
    ))
}

/// POST /api/auth/candidate-login
pub async fn handle_candidate_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = normalize_email(&req.email)
        .map_err(|_| AppError::Unauthorized(BAD_CREDENTIALS.to_string()))?;
    let found = store::find_candidate_by_email(&state.db, &email).await?;
    let stored_hash = found.as_ref().map(|a| a.password_hash.clone());
    let verified = verify_login_password(req.password, stored_hash).await;

    let candidate = match found {
        Some(account) if verified => account,
        _ => {
            warn!("Failed candidate login for {email}");
            return Err(AppError::Unauthorized(BAD_CREDENTIALS.to_string()));
        }
    };

    let token = session(&state, candidate.id, AccountRole::Candidate, &candidate.email)?;
    Ok(Json(AuthResponse {
        token,
        account: AccountView::Candidate(candidate.into()),
    }))
}

/// GET /api/auth/me
pub async fn handle_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<AccountView>, AppError> {
    let view = match user.role {
        AccountRole::Employer => {
            AccountView::Employer(store::find_employer(&state.db, user.id).await?.into())
        }
        AccountRole::Candidate => {
            AccountView::Candidate(store::find_candidate(&state.db, user.id).await?.into())
        }
    };
    Ok(Json(view))
}

// ────────────────────────────────────────────────────────────────────────────
// One-time codes
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/auth/send-otp
///
/// Responds identically whether or not the account exists.
pub async fn handle_send_otp(
    State(state): State<AppState>,
    Json(req): Json<SendOtpRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let email = normalize_email(&req.email)?;

    if store::account_exists(&state.db, req.account_type, &email).await? {
        let code = otp::issue(
            state.otp.as_ref(),
            state.config.otp_ttl_secs,
            req.account_type,
            req.purpose,
            &email,
        )
        .await?;

        state
            .mailer
            .send(otp_mail(&email, req.purpose, &code, state.config.otp_ttl_secs))
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to deliver code: {e:#}")))?;
    } else {
        info!("Code requested for unknown {} account", req.account_type.as_str());
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse {
            message: "If an account exists for this email, a code has been sent".to_string(),
        }),
    ))
}

/// POST /api/auth/verify-otp
pub async fn handle_verify_otp(
    State(state): State<AppState>,
    Json(req): Json<VerifyOtpRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = normalize_email(&req.email)?;
    otp::verify(
        state.otp.as_ref(),
        state.config.otp_max_attempts,
        req.account_type,
        OtpPurpose::VerifyEmail,
        &email,
        &req.code,
    )
    .await?;

    store::mark_email_verified(&state.db, req.account_type, &email).await?;
    info!("Verified email for {} account {email}", req.account_type.as_str());

    Ok(Json(MessageResponse {
        message: "Email verified".to_string(),
    }))
}

/// POST /api/auth/reset-password
pub async fn handle_reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = normalize_email(&req.email)?;
    check_password_policy(&req.new_password)?;

    otp::verify(
        state.otp.as_ref(),
        state.config.otp_max_attempts,
        req.account_type,
        OtpPurpose::ResetPassword,
        &email,
        &req.code,
    )
    .await?;

    let password_hash = hash_password_blocking(req.new_password).await?;
    store::update_password_hash(&state.db, req.account_type, &email, &password_hash).await?;
    info!("Password reset for {} account {email}", req.account_type.as_str());

    Ok(Json(MessageResponse {
        message: "Password updated".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_account_view_is_tagged() {
        let view = AccountView::Candidate(CandidateAccount {
            id: Uuid::nil(),
            full_name: "Asha Rao".to_string(),
            email: "asha@example.com".to_string(),
            phone: None,
            email_verified: false,
            created_at: Utc::now(),
        });
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["account_type"], "candidate");
        assert_eq!(json["full_name"], "Asha Rao");
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn test_send_otp_request_parses() {
        let req: SendOtpRequest = serde_json::from_str(
            r#"{"email": "a@b.io", "account_type": "employer", "purpose": "reset_password"}"#,
        )
        .unwrap();
        assert_eq!(req.account_type, AccountRole::Employer);
        assert_eq!(req.purpose, OtpPurpose::ResetPassword);
    }
}
