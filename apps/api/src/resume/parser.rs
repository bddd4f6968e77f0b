//! Resume structuring: turns extracted text into profile sections.
//!
//! Carried in `AppState` as `Arc<dyn ResumeParser>`. The heuristic parser is
//! the default; the LLM parser is enabled by configuration and falls back to
//! the heuristic one when the model call fails.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::candidates::input::{clean_education, clean_experience, clean_personal_info, clean_project};
use crate::config::Config;
use crate::errors::AppError;
use crate::llm_client::{self, LlmClient};
use crate::models::profile::{Education, Experience, PersonalInfo, Project};
use crate::resume::fields::{
    contact_pieces, extract_email, extract_github, extract_linkedin, extract_phone, extract_website,
    guess_name, is_contact_line, looks_like_location,
};
use crate::resume::prompts::{RESUME_PARSE_PROMPT_TEMPLATE, RESUME_PARSE_SYSTEM};
use crate::resume::sections::{
    parse_education, parse_experience, parse_projects, parse_skills, parse_summary, split_sections, Section,
};
use crate::skills::normalize_skills;

/// Longest resume text sent to the model.
const MAX_LLM_INPUT_CHARS: usize = 20_000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsedResume {
    pub headline: Option<String>,
    pub personal_info: PersonalInfo,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub skills: Vec<String>,
    pub projects: Vec<Project>,
}

impl ParsedResume {
    /// Applies the same cleaning as a manual profile edit and drops entries a
    /// profile would reject.
    pub fn cleaned(self) -> Self {
        Self {
            headline: self
                .headline
                .map(|h| h.trim().to_string())
                .filter(|h| !h.is_empty()),
            personal_info: clean_personal_info(self.personal_info),
            experience: self
                .experience
                .into_iter()
                .map(clean_experience)
                .filter(|e| e.company.is_some() || e.title.is_some())
                .collect(),
            education: self
                .education
                .into_iter()
                .map(clean_education)
                .filter(|e| e.institution.is_some())
                .collect(),
            skills: normalize_skills(self.skills),
            projects: self
                .projects
                .into_iter()
                .map(clean_project)
                .filter(|p| p.name.is_some())
                .collect(),
        }
    }
}

#[async_trait]
pub trait ResumeParser: Send + Sync {
    /// Backend label used in logs.
    fn name(&self) -> &'static str;

    async fn parse(&self, text: &str) -> Result<ParsedResume, AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// HeuristicResumeParser: default backend
// ────────────────────────────────────────────────────────────────────────────

/// Pure-Rust parser built on section headings and regexes. Deterministic, no network.
pub struct HeuristicResumeParser;

#[async_trait]
impl ResumeParser for HeuristicResumeParser {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    async fn parse(&self, text: &str) -> Result<ParsedResume, AppError> {
        Ok(parse_resume_text(text))
    }
}

fn guess_headline(header: &[&str], name: Option<&str>) -> Option<String> {
    header
        .iter()
        .filter(|line| !is_contact_line(line))
        .filter(|line| name.map_or(true, |n| !line.eq_ignore_ascii_case(n)))
        .filter(|line| contact_pieces(line).all(|p| looks_like_location(p).is_none()))
        .find(|line| {
            let words = line.split_whitespace().count();
            let lower = line.to_lowercase();
            (2..=12).contains(&words)
                && !line.contains(':')
                && !lower.contains("resume")
                && !lower.contains("curriculum vitae")
        })
        .map(|line| line.to_string())
}

pub fn parse_resume_text(text: &str) -> ParsedResume {
    let blocks = split_sections(text);

    let header: Vec<&str> = blocks
        .iter()
        .filter(|b| b.section == Section::Header)
        .flat_map(|b| b.lines.iter().copied())
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let header_text = header.join("\n");
    // Contact details usually sit in the header but sometimes in a footer.
    let find = |extract: fn(&str) -> Option<String>| extract(&header_text).or_else(|| extract(text));

    let full_name = guess_name(header.iter().copied().filter(|line| !is_contact_line(line)));
    let location = header
        .iter()
        .flat_map(|line| contact_pieces(line))
        .find_map(looks_like_location);
    let headline = guess_headline(&header, full_name.as_deref());

    let mut parsed = ParsedResume {
        headline,
        personal_info: PersonalInfo {
            full_name,
            email: find(extract_email),
            phone: find(extract_phone),
            location,
            linkedin: find(extract_linkedin),
            github: find(extract_github),
            website: find(extract_website),
            summary: None,
        },
        ..Default::default()
    };

    let mut summary: Vec<String> = Vec::new();
    for block in &blocks {
        match block.section {
            Section::Summary => summary.extend(parse_summary(&block.lines)),
            Section::Experience => parsed.experience.extend(parse_experience(&block.lines)),
            Section::Education => parsed.education.extend(parse_education(&block.lines)),
            Section::Skills => parsed.skills.extend(parse_skills(&block.lines)),
            Section::Projects => parsed.projects.extend(parse_projects(&block.lines)),
            Section::Header | Section::Certifications | Section::Other => {}
        }
    }
    if !summary.is_empty() {
        parsed.personal_info.summary = Some(summary.join(" "));
    }

    parsed.cleaned()
}

// ────────────────────────────────────────────────────────────────────────────
// LlmResumeParser: opt-in via ENABLE_LLM_RESUME_PARSING
// ────────────────────────────────────────────────────────────────────────────

pub struct LlmResumeParser {
    llm: LlmClient,
}

impl LlmResumeParser {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[async_trait]
impl ResumeParser for LlmResumeParser {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn parse(&self, text: &str) -> Result<ParsedResume, AppError> {
        let prompt =
            RESUME_PARSE_PROMPT_TEMPLATE.replace("{resume_text}", truncate_chars(text, MAX_LLM_INPUT_CHARS));

        match self.llm.call_json::<ParsedResume>(&prompt, RESUME_PARSE_SYSTEM).await {
            Ok(parsed) => Ok(parsed.cleaned()),
            Err(e) => {
                warn!("LLM resume parsing failed, using heuristics instead: {e}");
                Ok(parse_resume_text(text))
            }
        }
    }
}

/// Picks the parser backend from configuration.
pub fn build_resume_parser(config: &Config) -> Result<Arc<dyn ResumeParser>, AppError> {
    let parser: Arc<dyn ResumeParser> = match config.anthropic_api_key.clone() {
        Some(key) if config.llm_parsing_enabled() => {
            let llm = LlmClient::new(key).map_err(|e| AppError::Llm(e.to_string()))?;
            info!("LLM resume parsing enabled (model: {})", llm_client::MODEL);
            Arc::new(LlmResumeParser::new(llm))
        }
        _ => Arc::new(HeuristicResumeParser),
    };
    info!("Resume parser backend: {}", parser.name());
    Ok(parser)
}
