use serde::Deserialize;

use crate::auth::validation::optional;
use crate::errors::AppError;
use crate::models::profile::{Education, Experience, PersonalInfo, Project};
use crate::skills::normalize_skills;

/// Full replacement of the editable profile sections.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileInput {
    pub headline: Option<String>,
    pub personal_info: PersonalInfo,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub skills: Vec<String>,
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidProfile {
    pub headline: Option<String>,
    pub personal_info: PersonalInfo,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub skills: Vec<String>,
    pub projects: Vec<Project>,
}

fn trim_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn clean_personal_info(info: PersonalInfo) -> PersonalInfo {
    PersonalInfo {
        full_name: optional(info.full_name),
        email: optional(info.email).map(|e| e.to_lowercase()),
        phone: optional(info.phone),
        location: optional(info.location),
        linkedin: optional(info.linkedin),
        github: optional(info.github),
        website: optional(info.website),
        summary: optional(info.summary),
    }
}

pub fn clean_experience(entry: Experience) -> Experience {
    let end_date = optional(entry.end_date);
    Experience {
        company: optional(entry.company),
        title: optional(entry.title),
        location: optional(entry.location),
        start_date: optional(entry.start_date),
        current: entry.current && end_date.is_none(),
        end_date,
        highlights: trim_list(entry.highlights),
    }
}

pub fn clean_education(entry: Education) -> Education {
    Education {
        institution: optional(entry.institution),
        degree: optional(entry.degree),
        field_of_study: optional(entry.field_of_study),
        start_date: optional(entry.start_date),
        end_date: optional(entry.end_date),
        grade: optional(entry.grade),
    }
}

pub fn clean_project(entry: Project) -> Project {
    Project {
        name: optional(entry.name),
        description: optional(entry.description),
        technologies: normalize_skills(entry.technologies),
        url: optional(entry.url),
    }
}

impl ProfileInput {
    pub fn validate(self) -> Result<ValidProfile, AppError> {
        let experience: Vec<Experience> = self.experience.into_iter().map(clean_experience).collect();
        if let Some(i) = experience
            .iter()
            .position(|e| e.company.is_none() && e.title.is_none())
        {
            return Err(AppError::Validation(format!(
                "experience[{i}] needs a company or a title"
            )));
        }

        let education: Vec<Education> = self.education.into_iter().map(clean_education).collect();
        if let Some(i) = education.iter().position(|e| e.institution.is_none()) {
            return Err(AppError::Validation(format!(
                "education[{i}] needs an institution"
            )));
        }

        let projects: Vec<Project> = self.projects.into_iter().map(clean_project).collect();
        if let Some(i) = projects.iter().position(|p| p.name.is_none()) {
            return Err(AppError::Validation(format!("projects[{i}] needs a name")));
        }

        Ok(ValidProfile {
            headline: optional(self.headline),
            personal_info: clean_personal_info(self.personal_info),
            experience,
            education,
            skills: normalize_skills(self.skills),
            projects,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_profile_is_cleaned() {
        let input: ProfileInput = serde_json::from_str(
            r#"{
                "headline": "  Backend engineer ",
                "personal_info": {"full_name": " Asha Rao ", "email": "Asha@Example.com", "phone": ""},
                "experience": [{"company": "Acme", "title": "Engineer", "end_date": "2022", "current": true,
                                "highlights": [" Shipped billing ", ""]}],
                "education": [{"institution": "UT Austin"}],
                "skills": ["Rust", "RUST", "Go"],
                "projects": [{"name": "hirehub", "technologies": ["Axum", "axum"]}]
            }"#,
        )
        .unwrap();

        let profile = input.validate().unwrap();
        assert_eq!(profile.headline.as_deref(), Some("Backend engineer"));
        assert_eq!(profile.personal_info.full_name.as_deref(), Some("Asha Rao"));
        assert_eq!(profile.personal_info.email.as_deref(), Some("asha@example.com"));
        assert!(profile.personal_info.phone.is_none());
        assert!(!profile.experience[0].current, "an end date overrides current");
        assert_eq!(profile.experience[0].highlights, vec!["Shipped billing"]);
        assert_eq!(profile.skills, vec!["rust", "go"]);
        assert_eq!(profile.projects[0].technologies, vec!["axum"]);
    }

    #[test]
    fn test_experience_needs_company_or_title() {
        let input = ProfileInput {
            experience: vec![Experience {
                company: Some("  ".into()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let err = input.validate().unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m.contains("experience[0]")));
    }

    #[test]
    fn test_education_needs_institution() {
        let input = ProfileInput {
            education: vec![Education {
                degree: Some("BSc".into()),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_empty_body_is_a_valid_empty_profile() {
        let input: ProfileInput = serde_json::from_str("{}").unwrap();
        let profile = input.validate().unwrap();
        assert!(profile.experience.is_empty());
        assert!(profile.skills.is_empty());
    }
}
