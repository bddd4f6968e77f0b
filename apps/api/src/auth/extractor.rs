use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::debug;
use uuid::Uuid;

use crate::auth::token::{verify_token, TokenError};
use crate::auth::AccountRole;
use crate::errors::AppError;
use crate::state::AppState;

/// The account behind a request's `Authorization: Bearer <jwt>` header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: AccountRole,
    pub email: String,
}

impl AuthUser {
    pub fn require(&self, role: AccountRole) -> Result<&Self, AppError> {
        if self.role == role {
            Ok(self)
        } else {
            Err(AppError::Forbidden)
        }
    }

    pub fn require_employer(&self) -> Result<Uuid, AppError> {
        self.require(AccountRole::Employer).map(|u| u.id)
    }

    pub fn require_candidate(&self) -> Result<Uuid, AppError> {
        self.require(AccountRole::Candidate).map(|u| u.id)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

        let token = bearer_token(header).ok_or_else(|| {
            AppError::Unauthorized("Authorization header must use the Bearer scheme".to_string())
        })?;

        let claims = verify_token(&state.config.jwt_secret, token).map_err(|e| {
            debug!("Rejected session token: {e}");
            match e {
                TokenError::Expired => AppError::Unauthorized("Session has expired".to_string()),
                _ => AppError::Unauthorized("Invalid session token".to_string()),
            }
        })?;

        Ok(AuthUser {
            id: claims.sub,
            role: claims.role,
            email: claims.email,
        })
    }
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Bearer"), None);
    }

    #[test]
    fn test_role_guards() {
        let user = AuthUser {
            id: Uuid::new_v4(),
            role: AccountRole::Candidate,
            email: "c@example.com".to_string(),
        };
        assert_eq!(user.require_candidate().unwrap(), user.id);
        assert!(matches!(user.require_employer(), Err(AppError::Forbidden)));
    }
}
