use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::store::find_employer;
use crate::auth::validation::{optional, required};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::jobs::store::jobs_for_employer;
use crate::models::account::{CompanyProfile, EmployerAccount, EmployerRow};
use crate::models::job::JobPostingRow;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateEmployerRequest {
    pub company_name: String,
    pub contact_name: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub industry: Option<String>,
    pub description: Option<String>,
}

/// GET /api/employers/:id
pub async fn handle_get_company(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CompanyProfile>, AppError> {
    Ok(Json(find_employer(&state.db, id).await?.into()))
}

/// PUT /api/employers/me
pub async fn handle_update_employer(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<UpdateEmployerRequest>,
) -> Result<Json<EmployerAccount>, AppError> {
    let employer_id = user.require_employer()?;
    let company_name = required("company_name", &req.company_name)?;
    let contact_name = required("contact_name", &req.contact_name)?;

    let updated = sqlx::query_as::<_, EmployerRow>(
        r#"
        UPDATE employers
        SET company_name = $2, contact_name = $3, phone = $4, website = $5,
            industry = $6, description = $7, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(employer_id)
    .bind(company_name)
    .bind(contact_name)
    .bind(optional(req.phone))
    .bind(optional(req.website))
    .bind(optional(req.industry))
    .bind(optional(req.description))
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Employer {employer_id} not found")))?;

    info!("Employer {employer_id} updated company profile");
    Ok(Json(updated.into()))
}

/// GET /api/employers/me/jobs
pub async fn handle_my_jobs(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<JobPostingRow>>, AppError> {
    let employer_id = user.require_employer()?;
    Ok(Json(jobs_for_employer(&state.db, employer_id).await?))
}
