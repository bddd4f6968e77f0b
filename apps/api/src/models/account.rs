use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct EmployerRow {
    pub id: Uuid,
    pub company_name: String,
    pub contact_name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub industry: Option<String>,
    pub description: Option<String>,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct CandidateRow {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Employer account as returned to its owner. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployerAccount {
    pub id: Uuid,
    pub company_name: String,
    pub contact_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub industry: Option<String>,
    pub description: Option<String>,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<EmployerRow> for EmployerAccount {
    fn from(row: EmployerRow) -> Self {
        Self {
            id: row.id,
            company_name: row.company_name,
            contact_name: row.contact_name,
            email: row.email,
            phone: row.phone,
            website: row.website,
            industry: row.industry,
            description: row.description,
            email_verified: row.email_verified,
            created_at: row.created_at,
        }
    }
}

/// Company view shown to anyone browsing postings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub id: Uuid,
    pub company_name: String,
    pub website: Option<String>,
    pub industry: Option<String>,
    pub description: Option<String>,
}

impl From<EmployerRow> for CompanyProfile {
    fn from(row: EmployerRow) -> Self {
        Self {
            id: row.id,
            company_name: row.company_name,
            website: row.website,
            industry: row.industry,
            description: row.description,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateAccount {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<CandidateRow> for CandidateAccount {
    fn from(row: CandidateRow) -> Self {
        Self {
            id: row.id,
            full_name: row.full_name,
            email: row.email,
            phone: row.phone,
            email_verified: row.email_verified,
            created_at: row.created_at,
        }
    }
}
