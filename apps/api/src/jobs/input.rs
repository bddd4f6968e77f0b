use serde::Deserialize;

use crate::auth::validation::{optional, required};
use crate::errors::AppError;
use crate::models::job::{EmploymentType, JobStatus};
use crate::skills::normalize_skills;

/// Body of create and update requests for a posting.
#[derive(Debug, Clone, Deserialize)]
pub struct JobInput {
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub employment_type: EmploymentType,
    #[serde(default)]
    pub remote: bool,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub currency: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub status: JobStatus,
}

/// A posting that passed validation, ready to bind into SQL.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidJob {
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub employment_type: EmploymentType,
    pub remote: bool,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub currency: Option<String>,
    pub skills: Vec<String>,
    pub status: JobStatus,
}

impl JobInput {
    pub fn validate(self) -> Result<ValidJob, AppError> {
        let title = required("title", &self.title)?;
        let description = required("description", &self.description)?;

        for (field, value) in [("salary_min", self.salary_min), ("salary_max", self.salary_max)] {
            if matches!(value, Some(v) if v < 0) {
                return Err(AppError::Validation(format!("{field} cannot be negative")));
            }
        }
        if let (Some(min), Some(max)) = (self.salary_min, self.salary_max) {
            if min > max {
                return Err(AppError::Validation(
                    "salary_min cannot exceed salary_max".to_string(),
                ));
            }
        }

        let currency = optional(self.currency).map(|c| c.to_uppercase());
        if let Some(c) = &currency {
            if c.len() != 3 || !c.chars().all(|ch| ch.is_ascii_alphabetic()) {
                return Err(AppError::Validation(format!(
                    "currency must be a 3-letter ISO code, got '{c}'"
                )));
            }
        }

        Ok(ValidJob {
            title,
            description,
            location: optional(self.location),
            employment_type: self.employment_type,
            remote: self.remote,
            salary_min: self.salary_min,
            salary_max: self.salary_max,
            currency,
            skills: normalize_skills(&self.skills),
            status: self.status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> JobInput {
        serde_json::from_str(
            r#"{
                "title": "  Backend Engineer ",
                "description": "Own the matching service.",
                "location": " Berlin ",
                "employment_type": "full_time",
                "salary_min": 60000,
                "salary_max": 80000,
                "currency": "eur",
                "skills": ["Rust", "rust", " PostgreSQL "]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_valid_job_is_normalized() {
        let job = input().validate().unwrap();
        assert_eq!(job.title, "Backend Engineer");
        assert_eq!(job.location.as_deref(), Some("Berlin"));
        assert_eq!(job.currency.as_deref(), Some("EUR"));
        assert_eq!(job.skills, vec!["rust", "postgresql"]);
        assert_eq!(job.status, JobStatus::Open);
        assert!(!job.remote);
    }

    #[test]
    fn test_inverted_salary_range_rejected() {
        let mut bad = input();
        bad.salary_min = Some(90000);
        assert!(matches!(bad.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_negative_salary_rejected() {
        let mut bad = input();
        bad.salary_min = Some(-1);
        bad.salary_max = None;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_blank_title_rejected() {
        let mut bad = input();
        bad.title = "   ".to_string();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_bad_currency_rejected() {
        let mut bad = input();
        bad.currency = Some("euro".to_string());
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_unknown_employment_type_fails_to_parse() {
        let parsed: Result<JobInput, _> = serde_json::from_str(
            r#"{"title": "x", "description": "y", "employment_type": "gig"}"#,
        );
        assert!(parsed.is_err());
    }
}
