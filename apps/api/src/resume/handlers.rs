use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::candidates::handlers::ProfileResponse;
use crate::candidates::store as profile_store;
use crate::errors::AppError;
use crate::models::upload::ResumeUploadRow;
use crate::resume::extract::ExtractionMethod;
use crate::resume::intake::{read_resume_field, FileKind};
use crate::resume::merge::merge_into_profile;
use crate::resume::parser::ParsedResume;
use crate::resume::storage;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ParseResponse {
    pub upload_id: Uuid,
    pub file_kind: FileKind,
    pub method: ExtractionMethod,
    pub parsed: ParsedResume,
}

#[derive(Debug, Serialize)]
pub struct ApplyResumeResponse {
    pub upload_id: Uuid,
    pub method: ExtractionMethod,
    #[serde(flatten)]
    pub profile: ProfileResponse,
}

struct Ingested {
    upload: ResumeUploadRow,
    kind: FileKind,
    method: ExtractionMethod,
    parsed: ParsedResume,
}

/// Intake, extraction, structuring and storage for one uploaded file.
async fn ingest(state: &AppState, candidate_id: Uuid, multipart: Multipart) -> Result<Ingested, AppError> {
    let file = read_resume_field(multipart).await?;
    info!(
        "Candidate {candidate_id} uploaded '{}' ({} bytes, {})",
        file.file_name,
        file.bytes.len(),
        file.kind.as_str()
    );

    let extracted = state.text_extractor.extract(&file).await?;
    let parsed = state.resume_parser.parse(&extracted.text).await?;

    let upload = storage::store_upload(
        &state.db,
        &state.s3,
        &state.config.s3_bucket,
        candidate_id,
        &file,
        &extracted,
    )
    .await?;

    info!(
        "Resume {} parsed by {}: {} experience, {} education, {} skills, {} projects",
        upload.id,
        state.resume_parser.name(),
        parsed.experience.len(),
        parsed.education.len(),
        parsed.skills.len(),
        parsed.projects.len()
    );

    Ok(Ingested {
        upload,
        kind: file.kind,
        method: extracted.method,
        parsed,
    })
}

/// POST /api/resume/parse
///
/// Parses without touching the profile, so the client can review the result.
pub async fn handle_parse_resume(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> Result<Json<ParseResponse>, AppError> {
    let candidate_id = user.require_candidate()?;
    let ingested = ingest(&state, candidate_id, multipart).await?;

    Ok(Json(ParseResponse {
        upload_id: ingested.upload.id,
        file_kind: ingested.kind,
        method: ingested.method,
        parsed: ingested.parsed,
    }))
}

/// POST /api/candidate-profile/resume
pub async fn handle_apply_resume(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> Result<Json<ApplyResumeResponse>, AppError> {
    let candidate_id = user.require_candidate()?;
    let ingested = ingest(&state, candidate_id, multipart).await?;

    let existing = profile_store::find_profile(&state.db, candidate_id).await?;
    let merged = merge_into_profile(existing, ingested.parsed, ingested.upload.s3_key.clone());
    let saved = profile_store::save_profile(&state.db, &merged).await?;
    info!("Candidate {candidate_id} profile updated from resume {}", ingested.upload.id);

    Ok(Json(ApplyResumeResponse {
        upload_id: ingested.upload.id,
        method: ingested.method,
        profile: saved.into(),
    }))
}

/// GET /api/resume/uploads
pub async fn handle_list_uploads(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<ResumeUploadRow>>, AppError> {
    let candidate_id = user.require_candidate()?;
    Ok(Json(storage::uploads_for_candidate(&state.db, candidate_id).await?))
}
