use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::validation::optional;
use crate::auth::AuthUser;
use crate::errors::{conflict_on_unique, AppError};
use crate::jobs::store::{find_job, find_owned_job};
use crate::mail::templates::application_received_mail;
use crate::mail::Mailer;
use crate::models::application::{
    ApplicantRow, ApplicationRow, ApplicationStatus, NewApplicationRow, SentApplicationRow,
};
use crate::state::AppState;

const MAX_COVER_LETTER_CHARS: usize = 5_000;

#[derive(Debug, Default, Deserialize)]
pub struct ApplyRequest {
    pub cover_letter: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: ApplicationStatus,
}

fn check_cover_letter(cover_letter: Option<String>) -> Result<Option<String>, AppError> {
    let cover_letter = optional(cover_letter);
    if let Some(text) = &cover_letter {
        if text.chars().count() > MAX_COVER_LETTER_CHARS {
            return Err(AppError::Validation(format!(
                "cover_letter cannot exceed {MAX_COVER_LETTER_CHARS} characters"
            )));
        }
    }
    Ok(cover_letter)
}

/// Best effort: a missing recipient or a failed delivery is logged, the application
/// already stands.
async fn notify_employer(
    mailer: &dyn Mailer,
    employer_email: Option<&str>,
    job_title: &str,
    candidate_name: Option<&str>,
) -> bool {
    let Some(employer_email) = employer_email else {
        warn!("No employer address for a new application to '{job_title}'");
        return false;
    };
    let candidate_name = candidate_name.unwrap_or("A candidate");
    let mail = application_received_mail(employer_email, job_title, candidate_name);
    match mailer.send(mail).await {
        Ok(()) => true,
        Err(e) => {
            warn!("Could not notify {employer_email} about a new application: {e:#}");
            false
        }
    }
}

/// POST /api/jobs/:id/apply
pub async fn handle_apply(
    State(state): State<AppState>,
    user: AuthUser,
    Path(job_id): Path<Uuid>,
    Json(req): Json<ApplyRequest>,
) -> Result<(StatusCode, Json<ApplicationRow>), AppError> {
    let candidate_id = user.require_candidate()?;
    let cover_letter = check_cover_letter(req.cover_letter)?;

    let job = find_job(&state.db, job_id).await?;
    if !job.is_open() {
        return Err(AppError::UnprocessableEntity(format!(
            "Job {job_id} is no longer accepting applications"
        )));
    }

    let inserted = sqlx::query_as::<_, NewApplicationRow>(
        r#"
        WITH inserted AS (
            INSERT INTO job_applications (job_id, candidate_id, cover_letter)
            VALUES ($1, $2, $3)
            RETURNING *
        )
        SELECT inserted.*, e.email AS employer_email, c.full_name AS candidate_name
        FROM inserted
        LEFT JOIN job_postings j ON j.id = inserted.job_id
        LEFT JOIN employers e ON e.id = j.employer_id
        LEFT JOIN candidates c ON c.id = inserted.candidate_id
        "#,
    )
    .bind(job_id)
    .bind(candidate_id)
    .bind(cover_letter)
    .fetch_one(&state.db)
    .await
    .map_err(|e| conflict_on_unique(e, "You have already applied to this job"))?;

    info!("Candidate {candidate_id} applied to job {job_id}");

    notify_employer(
        state.mailer.as_ref(),
        inserted.employer_email.as_deref(),
        &job.title,
        inserted.candidate_name.as_deref(),
    )
    .await;

    let application = inserted.application;
    Ok((StatusCode::CREATED, Json(application)))
}

/// GET /api/jobs/:id/applications
pub async fn handle_list_applicants(
    State(state): State<AppState>,
    user: AuthUser,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Vec<ApplicantRow>>, AppError> {
    let employer_id = user.require_employer()?;
    find_owned_job(&state.db, job_id, employer_id).await?;

    let applicants = sqlx::query_as::<_, ApplicantRow>(
        r#"
        SELECT a.id, a.candidate_id, c.full_name, c.email, p.headline,
               a.cover_letter, a.status, a.created_at
        FROM job_applications a
        JOIN candidates c ON c.id = a.candidate_id
        LEFT JOIN candidate_profiles p ON p.candidate_id = a.candidate_id
        WHERE a.job_id = $1
        ORDER BY a.created_at ASC
        "#,
    )
    .bind(job_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(applicants))
}

/// GET /api/candidates/me/applications
pub async fn handle_my_applications(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<SentApplicationRow>>, AppError> {
    let candidate_id = user.require_candidate()?;

    let applications = sqlx::query_as::<_, SentApplicationRow>(
        r#"
        SELECT a.id, a.job_id, j.title AS job_title, e.company_name, a.status, a.created_at
        FROM job_applications a
        JOIN job_postings j ON j.id = a.job_id
        JOIN employers e ON e.id = j.employer_id
        WHERE a.candidate_id = $1
        ORDER BY a.created_at DESC
        "#,
    )
    .bind(candidate_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(applications))
}

/// PATCH /api/applications/:id/status
pub async fn handle_update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(application_id): Path<Uuid>,
    Json(req): Json<StatusUpdate>,
) -> Result<Json<ApplicationRow>, AppError> {
    let employer_id = user.require_employer()?;

    let application = sqlx::query_as::<_, ApplicationRow>(
        "SELECT * FROM job_applications WHERE id = $1",
    )
    .bind(application_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Application {application_id} not found")))?;

    find_owned_job(&state.db, application.job_id, employer_id).await?;

    let updated = sqlx::query_as::<_, ApplicationRow>(
        r#"
        UPDATE job_applications
        SET status = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(application_id)
    .bind(req.status.as_str())
    .fetch_one(&state.db)
    .await?;

    info!("Application {application_id} moved to {}", updated.status);
    Ok(Json(updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::testing::RecordingMailer;
    use crate::mail::OutgoingMail;

    struct DownMailer;

    #[async_trait::async_trait]
    impl Mailer for DownMailer {
        async fn send(&self, _mail: OutgoingMail) -> anyhow::Result<()> {
            anyhow::bail!("relay unreachable")
        }
    }

    #[tokio::test]
    async fn test_employer_notification_is_sent() {
        let mailer = RecordingMailer::default();
        assert!(notify_employer(&mailer, Some("hr@acme.io"), "Rust Engineer", Some("Asha Rao")).await);

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "hr@acme.io");
        assert!(sent[0].subject.contains("Rust Engineer"));
        assert!(sent[0].body.contains("Asha Rao"));
    }

    #[tokio::test]
    async fn test_notification_failure_is_swallowed() {
        assert!(!notify_employer(&DownMailer, Some("hr@acme.io"), "Rust Engineer", Some("Asha Rao")).await);
    }

    #[tokio::test]
    async fn test_missing_recipient_skips_notification() {
        let mailer = RecordingMailer::default();
        assert!(!notify_employer(&mailer, None, "Rust Engineer", Some("Asha Rao")).await);
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_candidate_name_still_notifies() {
        let mailer = RecordingMailer::default();
        assert!(notify_employer(&mailer, Some("hr@acme.io"), "Rust Engineer", None).await);
        assert!(mailer.sent.lock().unwrap()[0].body.starts_with("A candidate applied"));
    }

    #[test]
    fn test_cover_letter_blank_becomes_none() {
        assert_eq!(check_cover_letter(Some("   ".to_string())).unwrap(), None);
    }

    #[test]
    fn test_cover_letter_length_limit() {
        let long = "a".repeat(MAX_COVER_LETTER_CHARS + 1);
        assert!(check_cover_letter(Some(long)).is_err());
    }

    #[test]
    fn test_status_update_parses() {
        let update: StatusUpdate = serde_json::from_str(r#"{"status": "shortlisted"}"#).unwrap();
        assert_eq!(update.status, ApplicationStatus::Shortlisted);
        assert!(serde_json::from_str::<StatusUpdate>(r#"{"status": "ghosted"}"#).is_err());
    }
}
