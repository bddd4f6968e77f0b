use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::AccountRole;
use crate::errors::{conflict_on_unique, AppError};
use crate::models::account::{CandidateRow, EmployerRow};

pub struct NewEmployer<'a> {
    pub company_name: &'a str,
    pub contact_name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub phone: Option<&'a str>,
    pub website: Option<&'a str>,
    pub industry: Option<&'a str>,
}

pub struct NewCandidate<'a> {
    pub full_name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub phone: Option<&'a str>,
}

fn table(role: AccountRole) -> &'static str {
    match role {
        AccountRole::Employer => "employers",
        AccountRole::Candidate => "candidates",
    }
}

pub async fn insert_employer(pool: &PgPool, new: NewEmployer<'_>) -> Result<EmployerRow, AppError> {
    sqlx::query_as::<_, EmployerRow>(
        r#"
        INSERT INTO employers
            (company_name, contact_name, email, password_hash, phone, website, industry)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(new.company_name)
    .bind(new.contact_name)
    .bind(new.email)
    .bind(new.password_hash)
    .bind(new.phone)
    .bind(new.website)
    .bind(new.industry)
    .fetch_one(pool)
    .await
    .map_err(|e| conflict_on_unique(e, "An employer account with this email already exists"))
}

/// Creates the candidate and an empty profile seeded with their contact details.
pub async fn insert_candidate(
    pool: &PgPool,
    new: NewCandidate<'_>,
) -> Result<CandidateRow, AppError> {
    let mut tx = pool.begin().await?;

    let candidate = sqlx::query_as::<_, CandidateRow>(
        r#"
        INSERT INTO candidates (full_name, email, password_hash, phone)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(new.full_name)
    .bind(new.email)
    .bind(new.password_hash)
    .bind(new.phone)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| conflict_on_unique(e, "A candidate account with this email already exists"))?;

    let personal_info = json!({
        "full_name": new.full_name,
        "email": new.email,
        "phone": new.phone,
    });
    sqlx::query("INSERT INTO candidate_profiles (candidate_id, personal_info) VALUES ($1, $2)")
        .bind(candidate.id)
        .bind(personal_info)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(candidate)
}

pub async fn find_employer_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<EmployerRow>, AppError> {
    Ok(
        sqlx::query_as::<_, EmployerRow>("SELECT * FROM employers WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await?,
    )
}

pub async fn find_candidate_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<CandidateRow>, AppError> {
    Ok(
        sqlx::query_as::<_, CandidateRow>("SELECT * FROM candidates WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await?,
    )
}

pub async fn find_employer(pool: &PgPool, id: Uuid) -> Result<EmployerRow, AppError> {
    sqlx::query_as::<_, EmployerRow>("SELECT * FROM employers WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Employer {id} not found")))
}

pub async fn find_candidate(pool: &PgPool, id: Uuid) -> Result<CandidateRow, AppError> {
    sqlx::query_as::<_, CandidateRow>("SELECT * FROM candidates WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Candidate {id} not found")))
}

pub async fn account_exists(pool: &PgPool, role: AccountRole, email: &str) -> Result<bool, AppError> {
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE email = $1)", table(role));
    Ok(sqlx::query_scalar::<_, bool>(&sql)
        .bind(email)
        .fetch_one(pool)
        .await?)
}

pub async fn mark_email_verified(pool: &PgPool, role: AccountRole, email: &str) -> Result<(), AppError> {
    let sql = format!(
        "UPDATE {} SET email_verified = TRUE, updated_at = NOW() WHERE email = $1",
        table(role)
    );
    let result = sqlx::query(&sql).bind(email).execute(pool).await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Account not found".to_string()));
    }
    Ok(())
}

pub async fn update_password_hash(
    pool: &PgPool,
    role: AccountRole,
    email: &str,
    password_hash: &str,
) -> Result<(), AppError> {
    let sql = format!(
        "UPDATE {} SET password_hash = $1, updated_at = NOW() WHERE email = $2",
        table(role)
    );
    let result = sqlx::query(&sql)
        .bind(password_hash)
        .bind(email)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Account not found".to_string()));
    }
    Ok(())
}
