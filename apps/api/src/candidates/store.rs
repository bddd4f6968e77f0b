use serde::Deserialize;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::{CandidateProfile, CandidateProfileRow, CandidateSummaryRow};
use crate::pagination::{like_pattern, Page};

/// Query-string filters for the employer-facing candidate directory.
#[derive(Debug, Default, Deserialize)]
pub struct CandidateFilters {
    pub q: Option<String>,
    pub skill: Option<String>,
    pub location: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl CandidateFilters {
    pub fn page(&self) -> Page {
        Page::from_query(self.limit, self.offset)
    }
}

pub async fn find_profile(pool: &PgPool, candidate_id: Uuid) -> Result<CandidateProfile, AppError> {
    sqlx::query_as::<_, CandidateProfileRow>(
        "SELECT * FROM candidate_profiles WHERE candidate_id = $1",
    )
    .bind(candidate_id)
    .fetch_optional(pool)
    .await?
    .map(CandidateProfile::from)
    .ok_or_else(|| AppError::NotFound(format!("Profile for candidate {candidate_id} not found")))
}

/// Writes every section of the profile, creating the row if needed.
pub async fn save_profile(pool: &PgPool, profile: &CandidateProfile) -> Result<CandidateProfile, AppError> {
    let row = sqlx::query_as::<_, CandidateProfileRow>(
        r#"
        INSERT INTO candidate_profiles
            (candidate_id, headline, personal_info, experience, education, skills, projects, resume_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (candidate_id) DO UPDATE SET
            headline = EXCLUDED.headline,
            personal_info = EXCLUDED.personal_info,
            experience = EXCLUDED.experience,
            education = EXCLUDED.education,
            skills = EXCLUDED.skills,
            projects = EXCLUDED.projects,
            resume_key = EXCLUDED.resume_key,
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(profile.candidate_id)
    .bind(&profile.headline)
    .bind(Json(&profile.personal_info))
    .bind(Json(&profile.experience))
    .bind(Json(&profile.education))
    .bind(&profile.skills)
    .bind(Json(&profile.projects))
    .bind(&profile.resume_key)
    .fetch_one(pool)
    .await?;

    Ok(row.into())
}

pub fn build_candidate_search(filters: &CandidateFilters) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new(
        r#"
        SELECT c.id AS candidate_id, c.full_name, p.headline,
               p.personal_info->>'location' AS location, p.skills, p.updated_at
        FROM candidates c
        JOIN candidate_profiles p ON p.candidate_id = c.id
        WHERE TRUE
        "#,
    );

    if let Some(q) = filters.q.as_deref().filter(|q| !q.trim().is_empty()) {
        let pattern = like_pattern(q);
        qb.push(" AND (c.full_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.headline ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.personal_info->>'summary' ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(skill) = filters.skill.as_deref().filter(|s| !s.trim().is_empty()) {
        qb.push(" AND ")
            .push_bind(skill.trim().to_lowercase())
            .push(" = ANY(p.skills)");
    }
    if let Some(location) = filters.location.as_deref().filter(|l| !l.trim().is_empty()) {
        qb.push(" AND p.personal_info->>'location' ILIKE ")
            .push_bind(like_pattern(location));
    }

    let page = filters.page();
    qb.push(" ORDER BY p.updated_at DESC LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset);
    qb
}

pub async fn search_candidates(
    pool: &PgPool,
    filters: &CandidateFilters,
) -> Result<Vec<CandidateSummaryRow>, AppError> {
    let mut qb = build_candidate_search(filters);
    Ok(qb.build_query_as::<CandidateSummaryRow>().fetch_all(pool).await?)
}
