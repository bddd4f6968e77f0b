//! Splits resume text into headed sections and turns section bodies into entries.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::profile::{Education, Experience, Project};
use crate::resume::fields::{first_url, looks_like_location};
use crate::skills::split_skill_list;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Everything above the first heading: name, contact line, headline.
    Header,
    Summary,
    Experience,
    Education,
    Skills,
    Projects,
    Certifications,
    Other,
}

const HEADINGS: &[(&str, Section)] = &[
    ("summary", Section::Summary),
    ("professional summary", Section::Summary),
    ("career summary", Section::Summary),
    ("profile", Section::Summary),
    ("professional profile", Section::Summary),
    ("objective", Section::Summary),
    ("career objective", Section::Summary),
    ("about", Section::Summary),
    ("about me", Section::Summary),
    ("experience", Section::Experience),
    ("work experience", Section::Experience),
    ("professional experience", Section::Experience),
    ("relevant experience", Section::Experience),
    ("employment", Section::Experience),
    ("employment history", Section::Experience),
    ("work history", Section::Experience),
    ("career history", Section::Experience),
    ("internships", Section::Experience),
    ("internship experience", Section::Experience),
    ("education", Section::Education),
    ("academic background", Section::Education),
    ("academics", Section::Education),
    ("education and training", Section::Education),
    ("qualifications", Section::Education),
    ("academic qualifications", Section::Education),
    ("skills", Section::Skills),
    ("technical skills", Section::Skills),
    ("key skills", Section::Skills),
    ("core skills", Section::Skills),
    ("core competencies", Section::Skills),
    ("technologies", Section::Skills),
    ("tools and technologies", Section::Skills),
    ("skills and tools", Section::Skills),
    ("projects", Section::Projects),
    ("personal projects", Section::Projects),
    ("academic projects", Section::Projects),
    ("key projects", Section::Projects),
    ("selected projects", Section::Projects),
    ("side projects", Section::Projects),
    ("certifications", Section::Certifications),
    ("certificates", Section::Certifications),
    ("licenses and certifications", Section::Certifications),
    ("courses", Section::Certifications),
    ("awards", Section::Other),
    ("achievements", Section::Other),
    ("honors and awards", Section::Other),
    ("publications", Section::Other),
    ("languages", Section::Other),
    ("interests", Section::Other),
    ("hobbies", Section::Other),
    ("volunteering", Section::Other),
    ("volunteer experience", Section::Other),
    ("references", Section::Other),
];

const MONTH: &str = r"(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)";

static DATE_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    let date = format!(r"(?:{MONTH}\.?,?\s+\d{{4}}|\d{{1,2}}/\d{{4}}|\d{{4}})");
    Regex::new(&format!(
        r"(?i)\b(?P<start>{date})\s*(?:-|–|—|to)\s*(?P<end>{date}|present|current|now|ongoing|till\s+date|today)\b"
    ))
    .unwrap()
});
static ONGOING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:present|current|now|ongoing|till\s+date|today)$").unwrap());
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap());
static HEADER_SPLIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+[–—-]\s+|\s*\|\s*|\t|\s{3,}").unwrap());
static AT_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\s+(?:at|@)\s+").unwrap());
static LABEL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z ]{1,20}:\s*\S").unwrap());
static JOB_TITLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:engineer|developer|manager|intern|analyst|designer|lead|consultant|scientist|architect|specialist|director|officer|administrator|coordinator|head|executive|assistant|technician|researcher|programmer|founder|co-founder|cto|ceo|vp|president|sde)\b",
    )
    .unwrap()
});
static INSTITUTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:university|college|institute|school|academy|polytechnic|iit|nit)\b").unwrap()
});
static DEGREE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:bachelor|master|doctor(?:ate)?|diploma|associate|ph\.?\s?d|mba|high school|secondary|b\.?\s?(?:sc|tech|eng|com|e|a|s)|m\.?\s?(?:sc|tech|eng|com|e|a|s))\b",
    )
    .unwrap()
});
static GRADE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:c?gpa|grade|percentage|score)\s*[:\-]?\s*(\d+(?:\.\d+)?\s*(?:/\s*\d+(?:\.\d+)?)?\s*%?)",
    )
    .unwrap()
});
static TECH_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:tech(?:nologies|nology)?(?:\s+used)?|tech\s+stack|stack|built\s+with|tools(?:\s+used)?)\s*[:\-–]\s*(.+)$",
    )
    .unwrap()
});

const BULLETS: &[char] = &['-', '*', '•', '◦', '▪', '‣', '–', '·', '●', '○', '➢', '✓'];

pub fn classify_heading(line: &str) -> Option<Section> {
    let trimmed = line.trim().trim_matches(|c: char| {
        matches!(c, '#' | '*' | '_' | ':' | '=' | '-') || c.is_whitespace()
    });
    if trimmed.is_empty() || trimmed.chars().count() > 40 {
        return None;
    }
    let key = trimmed
        .to_lowercase()
        .replace('&', " and ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    HEADINGS
        .iter()
        .find(|(heading, _)| *heading == key)
        .map(|(_, section)| *section)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionBlock<'a> {
    pub section: Section,
    pub lines: Vec<&'a str>,
}

/// Walks the text line by line, opening a new block at every recognised heading.
///
/// Above the first heading, a labelled line such as "Skills: Rust, Go" is
/// treated as a one-line section so unstructured text still yields fields.
pub fn split_sections(text: &str) -> Vec<SectionBlock<'_>> {
    let mut blocks = vec![SectionBlock {
        section: Section::Header,
        lines: Vec::new(),
    }];

    for line in text.lines() {
        if let Some(section) = classify_heading(line) {
            blocks.push(SectionBlock {
                section,
                lines: Vec::new(),
            });
            continue;
        }

        let in_header = blocks.last().is_some_and(|b| b.section == Section::Header);
        if in_header {
            if let Some((label, rest)) = line.split_once(':') {
                if let Some(section) = classify_heading(label).filter(|_| !rest.trim().is_empty()) {
                    blocks.push(SectionBlock {
                        section,
                        lines: vec![rest.trim()],
                    });
                    blocks.push(SectionBlock {
                        section: Section::Header,
                        lines: Vec::new(),
                    });
                    continue;
                }
            }
        }

        if let Some(current) = blocks.last_mut() {
            current.lines.push(line);
        }
    }

    blocks.retain(|b| b.section == Section::Header || b.lines.iter().any(|l| !l.trim().is_empty()));
    blocks
}

// ────────────────────────────────────────────────────────────────────────────
// Dates
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub start: String,
    pub end: Option<String>,
    pub current: bool,
}

fn tidy_date(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Finds ranges like "Jan 2020 - Present", "2018 – 2020" or "03/2019 - 06/2021".
pub fn find_date_range(line: &str) -> Option<(DateRange, Range<usize>)> {
    let caps = DATE_RANGE_RE.captures(line)?;
    let whole = caps.get(0)?;
    let start = tidy_date(caps.name("start")?.as_str());
    let end = caps.name("end")?.as_str();
    let current = ONGOING_RE.is_match(end.trim());
    let range = DateRange {
        start,
        end: (!current).then(|| tidy_date(end)),
        current,
    };
    Some((range, whole.range()))
}

// ────────────────────────────────────────────────────────────────────────────
// Entry splitting
// ────────────────────────────────────────────────────────────────────────────

pub fn strip_bullet(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let first = trimmed.chars().next()?;
    if !BULLETS.contains(&first) {
        return None;
    }
    let rest = &trimmed[first.len_utf8()..];
    // "-5% latency" is text, "- Cut latency" is a bullet.
    if matches!(first, '-' | '*' | '–') && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(rest.trim())
}

fn is_url_line(line: &str) -> bool {
    let lower = line.to_ascii_lowercase();
    (lower.starts_with("http") || lower.starts_with("www.")) && !line.contains(' ')
}

/// A wrapped bullet: lowercase start right after a bullet line.
fn is_continuation(line: &str, after_detail: bool) -> bool {
    after_detail && line.chars().next().is_some_and(char::is_lowercase) && !is_url_line(line)
}

/// Groups section lines into entries: blank lines separate entries, and so
/// does a fresh heading line after bullets or after a line that already had dates.
/// Labelled lines ("Tech stack: ...") and bare links stay with the entry above.
pub fn split_entries<'a>(lines: &[&'a str]) -> Vec<Vec<&'a str>> {
    let mut entries: Vec<Vec<&'a str>> = Vec::new();
    let mut current: Vec<&'a str> = Vec::new();
    let mut seen_bullet = false;
    let mut seen_dates = false;
    let mut after_detail = false;

    for &line in lines {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                entries.push(std::mem::take(&mut current));
            }
            seen_bullet = false;
            seen_dates = false;
            after_detail = false;
            continue;
        }

        let bullet = strip_bullet(line).is_some();
        let continuation = is_continuation(line, after_detail);
        let has_dates = find_date_range(line).is_some();
        let starts_new = !bullet
            && !continuation
            && !LABEL_RE.is_match(line)
            && !is_url_line(line)
            && !current.is_empty()
            && (seen_bullet || (has_dates && seen_dates));
        if starts_new {
            entries.push(std::mem::take(&mut current));
            seen_bullet = false;
            seen_dates = false;
        }

        seen_bullet |= bullet;
        seen_dates |= has_dates;
        after_detail = bullet || continuation;
        current.push(line);
    }
    if !current.is_empty() {
        entries.push(current);
    }

    // Extracted PDFs often put blank lines between a heading line and its bullets.
    let mut merged: Vec<Vec<&'a str>> = Vec::new();
    for entry in entries {
        let orphan = entry
            .first()
            .is_some_and(|first| strip_bullet(first).is_some());
        if orphan {
            if let Some(previous) = merged.last_mut() {
                previous.extend(entry);
                continue;
            }
        }
        merged.push(entry);
    }
    merged
}

fn tidy_piece(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace("( )", "")
        .replace("()", "")
        .trim_matches(|c: char| matches!(c, '|' | ',' | '-' | '–' | '—' | '/' | ':') || c.is_whitespace())
        .to_string()
}

#[derive(Debug, Default)]
struct EntryParts {
    header: Vec<String>,
    details: Vec<String>,
    dates: Option<DateRange>,
}

fn entry_parts(lines: &[&str]) -> EntryParts {
    let mut parts = EntryParts::default();
    let mut after_detail = false;

    for &line in lines {
        if let Some(bullet) = strip_bullet(line) {
            after_detail = !bullet.is_empty();
            if after_detail {
                parts.details.push(bullet.to_string());
            }
            continue;
        }
        if is_continuation(line.trim(), after_detail) {
            if let Some(last) = parts.details.last_mut() {
                last.push(' ');
                last.push_str(line.trim());
            }
            continue;
        }
        after_detail = false;

        let mut text = line.to_string();
        if parts.dates.is_none() {
            if let Some((range, span)) = find_date_range(line) {
                parts.dates = Some(range);
                text = format!("{} {}", &line[..span.start], &line[span.end..]);
            }
        }
        let text = tidy_piece(&text);
        if text.is_empty() {
            continue;
        }

        if parts.header.len() < 4 && text.chars().count() <= 80 && !text.ends_with('.') {
            parts.header.extend(
                HEADER_SPLIT_RE
                    .split(&text)
                    .map(tidy_piece)
                    .filter(|p| !p.is_empty() && !is_url_line(p)),
            );
        } else {
            parts.details.push(text);
        }
    }
    parts
}

fn take_matching(pieces: &mut Vec<String>, matches: impl Fn(&str) -> bool) -> Option<String> {
    let idx = pieces.iter().position(|p| matches(p))?;
    Some(pieces.remove(idx))
}

// ────────────────────────────────────────────────────────────────────────────
// Section parsers
// ────────────────────────────────────────────────────────────────────────────

pub fn parse_experience(lines: &[&str]) -> Vec<Experience> {
    split_entries(lines)
        .iter()
        .filter_map(|entry| experience_entry(entry))
        .collect()
}

fn experience_entry(lines: &[&str]) -> Option<Experience> {
    let EntryParts {
        header,
        details,
        dates,
    } = entry_parts(lines);

    // "Engineer at Acme" and "Engineer @ Acme"
    let mut header: Vec<String> = header
        .iter()
        .flat_map(|piece| AT_SPLIT_RE.split(piece).map(tidy_piece).collect::<Vec<_>>())
        .filter(|p| !p.is_empty())
        .collect();

    let location = if header.len() > 1 {
        take_matching(&mut header, |p| looks_like_location(p).is_some())
            .and_then(|p| looks_like_location(&p))
    } else {
        None
    };
    let (title, company) = match take_matching(&mut header, |p| JOB_TITLE_RE.is_match(p)) {
        Some(title) => (Some(title), header.first().cloned()),
        None => (header.first().cloned(), header.get(1).cloned()),
    };
    if title.is_none() && company.is_none() {
        return None;
    }

    let dates = dates.unwrap_or(DateRange {
        start: String::new(),
        end: None,
        current: false,
    });
    Some(Experience {
        company,
        title,
        location,
        start_date: Some(dates.start).filter(|s| !s.is_empty()),
        end_date: dates.end,
        current: dates.current,
        highlights: details,
    })
}

pub fn parse_education(lines: &[&str]) -> Vec<Education> {
    split_entries(lines)
        .iter()
        .filter_map(|entry| education_entry(entry))
        .collect()
}

fn education_entry(lines: &[&str]) -> Option<Education> {
    let parts = entry_parts(lines);

    let mut grade = None;
    let mut years: Vec<String> = Vec::new();
    let mut pieces: Vec<String> = Vec::new();
    for piece in parts.header.iter().chain(parts.details.iter()) {
        let mut piece = piece.clone();
        if let Some(caps) = GRADE_RE.captures(&piece) {
            if grade.is_none() {
                grade = caps.get(1).map(|g| tidy_date(g.as_str()));
            }
            piece = GRADE_RE.replace(&piece, "").into_owned();
        }
        years.extend(YEAR_RE.find_iter(&piece).map(|m| m.as_str().to_string()));
        let piece = YEAR_RE.replace_all(&piece, "");
        pieces.extend(piece.split(", ").map(tidy_piece).filter(|p| !p.is_empty()));
    }

    let institution = take_matching(&mut pieces, |p| INSTITUTION_RE.is_match(p));
    let degree_piece = take_matching(&mut pieces, |p| DEGREE_RE.is_match(p));
    pieces.retain(|p| looks_like_location(p).is_none());
    let institution = institution.or_else(|| (!pieces.is_empty()).then(|| pieces.remove(0)));
    let degree_piece = degree_piece.or_else(|| pieces.first().cloned());

    let (degree, field_of_study) = match degree_piece {
        Some(d) => match d.split_once(" in ") {
            Some((degree, field)) => (Some(tidy_piece(degree)), Some(tidy_piece(field))),
            None => (Some(d), None),
        },
        None => (None, None),
    };

    let (start_date, end_date) = match parts.dates {
        Some(range) if range.current => (Some(range.start), None),
        Some(range) => (Some(range.start), range.end),
        None => match years.as_slice() {
            [] => (None, None),
            [only] => (None, Some(only.clone())),
            [first, .., last] => (Some(first.clone()), Some(last.clone())),
        },
    };

    if institution.is_none() {
        return None;
    }
    Some(Education {
        institution,
        degree,
        field_of_study,
        start_date,
        end_date,
        grade,
    })
}

pub fn parse_projects(lines: &[&str]) -> Vec<Project> {
    split_entries(lines)
        .iter()
        .filter_map(|entry| project_entry(entry))
        .collect()
}

fn project_entry(lines: &[&str]) -> Option<Project> {
    let mut technologies: Vec<String> = Vec::new();
    let mut rest: Vec<&str> = Vec::new();
    for &line in lines {
        let body = strip_bullet(line).unwrap_or(line);
        match TECH_LABEL_RE.captures(body.trim()) {
            Some(caps) => technologies.extend(split_skill_list(&caps[1])),
            None => rest.push(line),
        }
    }

    let url = first_url(&lines.join("\n"));
    let parts = entry_parts(&rest);
    let mut pieces: Vec<String> = parts
        .header
        .into_iter()
        .collect();
    if pieces.is_empty() {
        return None;
    }

    let mut name = pieces.remove(0);
    if let Some((bare, tech)) = name.split_once('(') {
        technologies.extend(split_skill_list(tech.trim_end_matches(')')));
        name = tidy_piece(bare);
    }
    for piece in pieces.iter().filter(|p| p.contains(',')) {
        technologies.extend(split_skill_list(piece));
    }

    let description = (!parts.details.is_empty()).then(|| parts.details.join(" "));
    Some(Project {
        name: Some(name).filter(|n| !n.is_empty()),
        description,
        technologies,
        url,
    })
}

pub fn parse_skills(lines: &[&str]) -> Vec<String> {
    lines
        .iter()
        .map(|&line| strip_bullet(line).unwrap_or(line))
        .flat_map(split_skill_list)
        .collect()
}

pub fn parse_summary(lines: &[&str]) -> Option<String> {
    let text = lines
        .iter()
        .map(|&line| strip_bullet(line).unwrap_or(line).trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!text.is_empty()).then_some(text)
}
