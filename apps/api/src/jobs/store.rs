use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::input::ValidJob;
use crate::models::job::{EmploymentType, JobPostingRow, JobStatus};
use crate::pagination::{like_pattern, Page};

const JOB_SELECT: &str = r#"
    SELECT j.*, e.company_name
    FROM job_postings j
    JOIN employers e ON e.id = j.employer_id
"#;

/// Query-string filters for the public job board.
#[derive(Debug, Default, Deserialize)]
pub struct JobFilters {
    pub q: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<EmploymentType>,
    pub skill: Option<String>,
    pub remote: Option<bool>,
    pub status: Option<JobStatus>,
    pub employer_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl JobFilters {
    pub fn page(&self) -> Page {
        Page::from_query(self.limit, self.offset)
    }
}

pub fn build_job_search(filters: &JobFilters) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new(JOB_SELECT);
    qb.push(" WHERE j.status = ")
        .push_bind(filters.status.unwrap_or_default().as_str());

    if let Some(q) = filters.q.as_deref().filter(|q| !q.trim().is_empty()) {
        let pattern = like_pattern(q);
        qb.push(" AND (j.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR j.description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR e.company_name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(location) = filters.location.as_deref().filter(|l| !l.trim().is_empty()) {
        qb.push(" AND j.location ILIKE ").push_bind(like_pattern(location));
    }
    if let Some(kind) = filters.employment_type {
        qb.push(" AND j.employment_type = ").push_bind(kind.as_str());
    }
    if let Some(skill) = filters.skill.as_deref().filter(|s| !s.trim().is_empty()) {
        qb.push(" AND ")
            .push_bind(skill.trim().to_lowercase())
            .push(" = ANY(j.skills)");
    }
    if let Some(remote) = filters.remote {
        qb.push(" AND j.remote = ").push_bind(remote);
    }
    if let Some(employer_id) = filters.employer_id {
        qb.push(" AND j.employer_id = ").push_bind(employer_id);
    }

    let page = filters.page();
    qb.push(" ORDER BY j.created_at DESC LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset);
    qb
}

pub async fn search_jobs(pool: &PgPool, filters: &JobFilters) -> Result<Vec<JobPostingRow>, AppError> {
    let mut qb = build_job_search(filters);
    Ok(qb.build_query_as::<JobPostingRow>().fetch_all(pool).await?)
}

pub async fn find_job(pool: &PgPool, id: Uuid) -> Result<JobPostingRow, AppError> {
    let sql = format!("{JOB_SELECT} WHERE j.id = $1");
    sqlx::query_as::<_, JobPostingRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))
}

/// Every posting of one employer, open or closed, newest first.
pub async fn jobs_for_employer(pool: &PgPool, employer_id: Uuid) -> Result<Vec<JobPostingRow>, AppError> {
    let sql = format!("{JOB_SELECT} WHERE j.employer_id = $1 ORDER BY j.created_at DESC");
    Ok(sqlx::query_as::<_, JobPostingRow>(&sql)
        .bind(employer_id)
        .fetch_all(pool)
        .await?)
}

pub async fn insert_job(pool: &PgPool, employer_id: Uuid, job: &ValidJob) -> Result<JobPostingRow, AppError> {
    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO job_postings
            (employer_id, title, description, location, employment_type, remote,
             salary_min, salary_max, currency, skills, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING id
        "#,
    )
    .bind(employer_id)
    .bind(&job.title)
    .bind(&job.description)
    .bind(&job.location)
    .bind(job.employment_type.as_str())
    .bind(job.remote)
    .bind(job.salary_min)
    .bind(job.salary_max)
    .bind(&job.currency)
    .bind(&job.skills)
    .bind(job.status.as_str())
    .fetch_one(pool)
    .await?;

    find_job(pool, id).await
}

pub async fn update_job(pool: &PgPool, id: Uuid, job: &ValidJob) -> Result<JobPostingRow, AppError> {
    sqlx::query(
        r#"
        UPDATE job_postings
        SET title = $2, description = $3, location = $4, employment_type = $5, remote = $6,
            salary_min = $7, salary_max = $8, currency = $9, skills = $10, status = $11,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(&job.title)
    .bind(&job.description)
    .bind(&job.location)
    .bind(job.employment_type.as_str())
    .bind(job.remote)
    .bind(job.salary_min)
    .bind(job.salary_max)
    .bind(&job.currency)
    .bind(&job.skills)
    .bind(job.status.as_str())
    .execute(pool)
    .await?;

    find_job(pool, id).await
}

pub async fn delete_job(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
    sqlx::query("DELETE FROM job_postings WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Loads a posting and checks that `employer_id` owns it.
pub async fn find_owned_job(pool: &PgPool, id: Uuid, employer_id: Uuid) -> Result<JobPostingRow, AppError> {
    let job = find_job(pool, id).await?;
    if job.employer_id != employer_id {
        return Err(AppError::Forbidden);
    }
    Ok(job)
}
