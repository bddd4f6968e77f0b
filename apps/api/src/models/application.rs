use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Submitted,
    Reviewing,
    Shortlisted,
    Rejected,
    Hired,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::Reviewing => "reviewing",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Hired => "hired",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicationRow {
    pub id: Uuid,
    pub job_id: Uuid,
    pub candidate_id: Uuid,
    pub cover_letter: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A freshly inserted application plus the people the notification mentions.
#[derive(Debug, Clone, FromRow)]
pub struct NewApplicationRow {
    #[sqlx(flatten)]
    pub application: ApplicationRow,
    pub employer_email: Option<String>,
    pub candidate_name: Option<String>,
}

/// An application as seen by the employer reviewing a posting.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicantRow {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub headline: Option<String>,
    pub cover_letter: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// An application as seen by the candidate who sent it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SentApplicationRow {
    pub id: Uuid,
    pub job_id: Uuid,
    pub job_title: String,
    pub company_name: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
