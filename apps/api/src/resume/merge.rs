use crate::models::profile::CandidateProfile;
use crate::resume::parser::ParsedResume;
use crate::skills::merge_skills;

/// Folds a parsed resume into a stored profile.
///
/// Non-empty parsed sections replace the stored ones, personal-info fields
/// only fill blanks, and skills are unioned.
pub fn merge_into_profile(
    mut profile: CandidateProfile,
    parsed: ParsedResume,
    resume_key: String,
) -> CandidateProfile {
    if !parsed.experience.is_empty() {
        profile.experience = parsed.experience;
    }
    if !parsed.education.is_empty() {
        profile.education = parsed.education;
    }
    if !parsed.projects.is_empty() {
        profile.projects = parsed.projects;
    }
    profile.personal_info.fill_blanks_from(parsed.personal_info);
    profile.skills = merge_skills(&profile.skills, &parsed.skills);

    let headline_blank = profile
        .headline
        .as_deref()
        .map_or(true, |h| h.trim().is_empty());
    if headline_blank {
        profile.headline = parsed.headline;
    }

    profile.resume_key = Some(resume_key);
    profile
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::{Education, Experience, PersonalInfo};
    use uuid::Uuid;

    fn stored() -> CandidateProfile {
        CandidateProfile {
            candidate_id: Uuid::nil(),
            headline: Some("Platform engineer".into()),
            personal_info: PersonalInfo {
                full_name: Some("Asha Rao".into()),
                email: Some("asha@example.com".into()),
                ..Default::default()
            },
            experience: vec![Experience {
                company: Some("Old Co".into()),
                ..Default::default()
            }],
            education: vec![Education {
                institution: Some("UT Austin".into()),
                ..Default::default()
            }],
            skills: vec!["go".into(), "kubernetes".into()],
            ..Default::default()
        }
    }

    #[test]
    fn test_parsed_sections_replace_and_blanks_fill() {
        let parsed = ParsedResume {
            headline: Some("Senior Backend Engineer".into()),
            personal_info: PersonalInfo {
                full_name: Some("A. Rao".into()),
                phone: Some("+1 415 555 0100".into()),
                ..Default::default()
            },
            experience: vec![Experience {
                company: Some("Acme".into()),
                ..Default::default()
            }],
            skills: vec!["rust".into(), "go".into()],
            ..Default::default()
        };

        let merged = merge_into_profile(stored(), parsed, "resumes/x/y.pdf".into());
        assert_eq!(merged.experience[0].company.as_deref(), Some("Acme"));
        assert_eq!(
            merged.education[0].institution.as_deref(),
            Some("UT Austin"),
            "empty parsed section keeps the stored one"
        );
        assert_eq!(merged.personal_info.full_name.as_deref(), Some("Asha Rao"));
        assert_eq!(merged.personal_info.phone.as_deref(), Some("+1 415 555 0100"));
        assert_eq!(merged.skills, vec!["go", "kubernetes", "rust"]);
        assert_eq!(merged.headline.as_deref(), Some("Platform engineer"));
        assert_eq!(merged.resume_key.as_deref(), Some("resumes/x/y.pdf"));
    }

    #[test]
    fn test_blank_headline_is_filled() {
        let profile = CandidateProfile {
            headline: None,
            ..stored()
        };
        let parsed = ParsedResume {
            headline: Some("Data Engineer".into()),
            ..Default::default()
        };
        let merged = merge_into_profile(profile, parsed, "k".into());
        assert_eq!(merged.headline.as_deref(), Some("Data Engineer"));
    }
}
