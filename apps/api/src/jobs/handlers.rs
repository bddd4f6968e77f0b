use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::jobs::input::JobInput;
use crate::jobs::store::{self, JobFilters};
use crate::models::job::JobPostingRow;
use crate::pagination::Paginated;
use crate::state::AppState;

/// POST /api/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<JobInput>,
) -> Result<(StatusCode, Json<JobPostingRow>), AppError> {
    let employer_id = user.require_employer()?;
    let job = input.validate()?;

    let created = store::insert_job(&state.db, employer_id, &job).await?;
    info!("Employer {employer_id} posted job {} ({})", created.id, created.title);
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/jobs
///
/// Public board. Defaults to open postings, newest first.
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    Query(filters): Query<JobFilters>,
) -> Result<Json<Paginated<JobPostingRow>>, AppError> {
    let jobs = store::search_jobs(&state.db, &filters).await?;
    Ok(Json(Paginated::new(jobs, filters.page())))
}

/// GET /api/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobPostingRow>, AppError> {
    Ok(Json(store::find_job(&state.db, id).await?))
}

/// PUT /api/jobs/:id
pub async fn handle_update_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<JobInput>,
) -> Result<Json<JobPostingRow>, AppError> {
    let employer_id = user.require_employer()?;
    let job = input.validate()?;
    store::find_owned_job(&state.db, id, employer_id).await?;

    let updated = store::update_job(&state.db, id, &job).await?;
    info!("Job {id} updated (status {})", updated.status);
    Ok(Json(updated))
}

/// DELETE /api/jobs/:id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let employer_id = user.require_employer()?;
    store::find_owned_job(&state.db, id, employer_id).await?;

    store::delete_job(&state.db, id).await?;
    info!("Job {id} deleted by employer {employer_id}");
    Ok(StatusCode::NO_CONTENT)
}
