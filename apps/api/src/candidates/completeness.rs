use serde::{Deserialize, Serialize};

use crate::models::profile::CandidateProfile;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    Strong,
    Moderate,
    Weak,
    Missing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionHealth {
    pub section: String,
    pub score: f64,
    pub entry_count: usize,
    pub status: SectionStatus,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletenessReport {
    pub overall_score: f64,
    pub sections: Vec<SectionHealth>,
    pub missing_sections: Vec<String>,
}

const SECTION_WEIGHTS: &[(&str, f64)] = &[
    ("personal_info", 0.20),
    ("experience", 0.30),
    ("education", 0.20),
    ("skills", 0.20),
    ("projects", 0.10),
];

/// Skills count at which the skills section is considered full.
const TARGET_SKILLS: usize = 8;

fn present(value: &Option<String>) -> bool {
    value.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false)
}

fn fraction(filled: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (filled as f64 / total as f64).clamp(0.0, 1.0)
    }
}

/// Returns (score, entry_count, recommendations) for one section.
fn score_section(section: &str, profile: &CandidateProfile) -> (f64, usize, Vec<String>) {
    let mut recommendations = Vec::new();
    match section {
        "personal_info" => {
            let info = &profile.personal_info;
            let fields = [
                ("full name", &info.full_name),
                ("email", &info.email),
                ("phone", &info.phone),
                ("location", &info.location),
                ("summary", &info.summary),
            ];
            let filled = fields.iter().filter(|(_, v)| present(v)).count();
            for (label, value) in fields {
                if !present(value) {
                    recommendations.push(format!("Add your {label}"));
                }
            }
            let count = usize::from(filled > 0);
            (fraction(filled, fields.len()), count, recommendations)
        }
        "experience" => {
            let entries = &profile.experience;
            if entries.is_empty() {
                return (0.0, 0, recommendations);
            }
            let per_entry: f64 = entries
                .iter()
                .map(|e| {
                    let checks = [
                        present(&e.company),
                        present(&e.title),
                        present(&e.start_date),
                        !e.highlights.is_empty(),
                    ];
                    fraction(checks.iter().filter(|c| **c).count(), checks.len())
                })
                .sum();
            let without_highlights = entries.iter().filter(|e| e.highlights.is_empty()).count();
            if without_highlights > 0 {
                recommendations.push(format!(
                    "{without_highlights} experience entries have no highlights; describe what you achieved"
                ));
            }
            (per_entry / entries.len() as f64, entries.len(), recommendations)
        }
        "education" => {
            let entries = &profile.education;
            if entries.is_empty() {
                return (0.0, 0, recommendations);
            }
            let per_entry: f64 = entries
                .iter()
                .map(|e| {
                    let checks = [present(&e.institution), present(&e.degree), present(&e.end_date)];
                    fraction(checks.iter().filter(|c| **c).count(), checks.len())
                })
                .sum();
            (per_entry / entries.len() as f64, entries.len(), recommendations)
        }
        "skills" => {
            let count = profile.skills.len();
            if count > 0 && count < TARGET_SKILLS {
                recommendations.push(format!(
                    "List at least {TARGET_SKILLS} skills so employers can find you in searches"
                ));
            }
            (fraction(count, TARGET_SKILLS), count, recommendations)
        }
        "projects" => {
            let entries = &profile.projects;
            if entries.is_empty() {
                return (0.0, 0, recommendations);
            }
            let per_entry: f64 = entries
                .iter()
                .map(|p| {
                    let checks = [present(&p.name), present(&p.description), !p.technologies.is_empty()];
                    fraction(checks.iter().filter(|c| **c).count(), checks.len())
                })
                .sum();
            (per_entry / entries.len() as f64, entries.len(), recommendations)
        }
        _ => (0.0, 0, recommendations),
    }
}

pub fn compute_completeness_report(profile: &CandidateProfile) -> CompletenessReport {
    let mut sections = Vec::new();
    let mut missing_sections = Vec::new();
    let mut weighted_score_sum = 0.0;

    for (section_key, weight) in SECTION_WEIGHTS {
        let (score, entry_count, mut recommendations) = score_section(section_key, profile);

        if entry_count == 0 {
            missing_sections.push(section_key.to_string());
            recommendations.insert(
                0,
                format!("Add your {} to strengthen your profile", section_key.replace('_', " ")),
            );
        }

        let status = match score {
            _ if entry_count == 0 => SectionStatus::Missing,
            s if s >= 0.8 => SectionStatus::Strong,
            s if s >= 0.5 => SectionStatus::Moderate,
            _ => SectionStatus::Weak,
        };

        weighted_score_sum += score * weight;
        sections.push(SectionHealth {
            section: section_key.to_string(),
            score,
            entry_count,
            status,
            recommendations,
        });
    }

    let total_weight: f64 = SECTION_WEIGHTS.iter().map(|(_, w)| w).sum();
    let overall_score = if total_weight > 0.0 {
        (weighted_score_sum / total_weight).clamp(0.0, 1.0)
    } else {
        0.0
    };

    CompletenessReport {
        overall_score,
        sections,
        missing_sections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::{Education, Experience, PersonalInfo, Project};

    fn full_profile() -> CandidateProfile {
        CandidateProfile {
            personal_info: PersonalInfo {
                full_name: Some("Asha Rao".into()),
                email: Some("asha@example.com".into()),
                phone: Some("+14155550100".into()),
                location: Some("Austin, TX".into()),
                summary: Some("Backend engineer".into()),
                ..Default::default()
            },
            experience: vec![Experience {
                company: Some("Acme".into()),
                title: Some("Engineer".into()),
                start_date: Some("2020-01".into()),
                highlights: vec!["Cut p99 latency by 40%".into()],
                ..Default::default()
            }],
            education: vec![Education {
                institution: Some("UT Austin".into()),
                degree: Some("BSc".into()),
                end_date: Some("2019".into()),
                ..Default::default()
            }],
            skills: (0..8).map(|i| format!("skill{i}")).collect(),
            projects: vec![Project {
                name: Some("hirehub".into()),
                description: Some("Job board".into()),
                technologies: vec!["rust".into()],
                url: None,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_profile_scores_zero() {
        let report = compute_completeness_report(&CandidateProfile::default());
        assert_eq!(report.overall_score, 0.0);
        assert_eq!(report.missing_sections.len(), SECTION_WEIGHTS.len());
        assert!(report.sections.iter().all(|s| s.status == SectionStatus::Missing));
    }

    #[test]
    fn test_full_profile_scores_one() {
        let report = compute_completeness_report(&full_profile());
        assert!((report.overall_score - 1.0).abs() < 1e-9, "score {}", report.overall_score);
        assert!(report.missing_sections.is_empty());
        assert!(report.sections.iter().all(|s| s.status == SectionStatus::Strong));
    }

    #[test]
    fn test_missing_projects_costs_their_weight() {
        let mut profile = full_profile();
        profile.projects.clear();
        let report = compute_completeness_report(&profile);
        assert!((report.overall_score - 0.9).abs() < 1e-9);
        assert_eq!(report.missing_sections, vec!["projects".to_string()]);
    }

    #[test]
    fn test_experience_without_highlights_is_flagged() {
        let mut profile = full_profile();
        profile.experience[0].highlights.clear();
        let report = compute_completeness_report(&profile);
        let exp = report.sections.iter().find(|s| s.section == "experience").unwrap();
        assert!((exp.score - 0.75).abs() < 1e-9);
        assert_eq!(exp.status, SectionStatus::Moderate);
        assert!(exp.recommendations[0].contains("no highlights"));
    }

    #[test]
    fn test_few_skills_are_weak() {
        let mut profile = full_profile();
        profile.skills.truncate(2);
        let report = compute_completeness_report(&profile);
        let skills = report.sections.iter().find(|s| s.section == "skills").unwrap();
        assert_eq!(skills.status, SectionStatus::Weak);
    }
}
