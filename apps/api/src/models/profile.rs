use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalInfo {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub website: Option<String>,
    pub summary: Option<String>,
}

impl PersonalInfo {
    /// Fills blank fields from `other`, keeping what is already set.
    pub fn fill_blanks_from(&mut self, other: PersonalInfo) {
        fn fill(slot: &mut Option<String>, value: Option<String>) {
            let blank = slot.as_deref().map(|s| s.trim().is_empty()).unwrap_or(true);
            if blank {
                if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
                    *slot = Some(v);
                }
            }
        }
        fill(&mut self.full_name, other.full_name);
        fill(&mut self.email, other.email);
        fill(&mut self.phone, other.phone);
        fill(&mut self.location, other.location);
        fill(&mut self.linkedin, other.linkedin);
        fill(&mut self.github, other.github);
        fill(&mut self.website, other.website);
        fill(&mut self.summary, other.summary);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Experience {
    pub company: Option<String>,
    pub title: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub current: bool,
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
    pub institution: Option<String>,
    pub degree: Option<String>,
    pub field_of_study: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub grade: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub name: Option<String>,
    pub description: Option<String>,
    pub technologies: Vec<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct CandidateProfileRow {
    pub candidate_id: Uuid,
    pub headline: Option<String>,
    pub personal_info: Json<PersonalInfo>,
    pub experience: Json<Vec<Experience>>,
    pub education: Json<Vec<Education>>,
    pub skills: Vec<String>,
    pub projects: Json<Vec<Project>>,
    pub resume_key: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Structured resume data associated with a candidate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub candidate_id: Uuid,
    pub headline: Option<String>,
    pub personal_info: PersonalInfo,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub skills: Vec<String>,
    pub projects: Vec<Project>,
    pub resume_key: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<CandidateProfileRow> for CandidateProfile {
    fn from(row: CandidateProfileRow) -> Self {
        Self {
            candidate_id: row.candidate_id,
            headline: row.headline,
            personal_info: row.personal_info.0,
            experience: row.experience.0,
            education: row.education.0,
            skills: row.skills,
            projects: row.projects.0,
            resume_key: row.resume_key,
            updated_at: Some(row.updated_at),
        }
    }
}

/// One row of the employer-facing candidate directory.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateSummaryRow {
    pub candidate_id: Uuid,
    pub full_name: String,
    pub headline: Option<String>,
    pub location: Option<String>,
    pub skills: Vec<String>,
    pub updated_at: DateTime<Utc>,
}
