use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::{AccountRole, AuthUser};
use crate::candidates::completeness::{compute_completeness_report, CompletenessReport};
use crate::candidates::input::ProfileInput;
use crate::candidates::store::{self, CandidateFilters};
use crate::errors::AppError;
use crate::models::profile::{CandidateProfile, CandidateSummaryRow};
use crate::pagination::Paginated;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub profile: CandidateProfile,
    pub completeness: CompletenessReport,
}

impl From<CandidateProfile> for ProfileResponse {
    fn from(profile: CandidateProfile) -> Self {
        let completeness = compute_completeness_report(&profile);
        Self {
            profile,
            completeness,
        }
    }
}

/// GET /api/candidate-profile
pub async fn handle_get_own_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ProfileResponse>, AppError> {
    let candidate_id = user.require_candidate()?;
    let profile = store::find_profile(&state.db, candidate_id).await?;
    Ok(Json(profile.into()))
}

/// PUT /api/candidate-profile
pub async fn handle_update_own_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<ProfileInput>,
) -> Result<Json<ProfileResponse>, AppError> {
    let candidate_id = user.require_candidate()?;
    let valid = input.validate()?;

    // The stored resume file is only replaced by an upload.
    let existing = store::find_profile(&state.db, candidate_id).await?;
    let profile = CandidateProfile {
        candidate_id,
        headline: valid.headline,
        personal_info: valid.personal_info,
        experience: valid.experience,
        education: valid.education,
        skills: valid.skills,
        projects: valid.projects,
        resume_key: existing.resume_key,
        updated_at: None,
    };

    let saved = store::save_profile(&state.db, &profile).await?;
    info!("Candidate {candidate_id} updated their profile");
    Ok(Json(saved.into()))
}

/// GET /api/candidates/profile/:id
///
/// Visible to employers and to the candidate themself.
pub async fn handle_get_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Path(candidate_id): Path<Uuid>,
) -> Result<Json<ProfileResponse>, AppError> {
    if user.role == AccountRole::Candidate && user.id != candidate_id {
        return Err(AppError::Forbidden);
    }
    let profile = store::find_profile(&state.db, candidate_id).await?;
    Ok(Json(profile.into()))
}

/// GET /api/candidates/all
pub async fn handle_list_candidates(
    State(state): State<AppState>,
    user: AuthUser,
    Query(filters): Query<CandidateFilters>,
) -> Result<Json<Paginated<CandidateSummaryRow>>, AppError> {
    user.require_employer()?;
    let candidates = store::search_candidates(&state.db, &filters).await?;
    Ok(Json(Paginated::new(candidates, filters.page())))
}
