use std::collections::HashSet;

/// Trims, lowercases, collapses inner whitespace and removes duplicates (first wins).
pub fn normalize_skills<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    raw.into_iter()
        .map(|s| {
            s.as_ref()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase()
        })
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

/// Splits a free-text skills line on the separators resumes commonly use.
pub fn split_skill_list(text: &str) -> Vec<String> {
    let pieces = text
        .split(|c: char| matches!(c, ',' | ';' | '|' | '•' | '·' | '\n' | '\t'))
        .map(|piece| {
            let piece = piece.trim().trim_start_matches(&['-', '*'][..]).trim();
            // "Languages: Rust, Go" -> drop the category label
            match piece.split_once(':') {
                Some((_, rest)) if !rest.trim().is_empty() => rest.trim(),
                _ => piece,
            }
        })
        .filter(|piece| !piece.is_empty() && piece.chars().count() <= 40);
    normalize_skills(pieces)
}

/// Union of two skill lists, keeping the order of `existing` first.
pub fn merge_skills(existing: &[String], incoming: &[String]) -> Vec<String> {
    normalize_skills(existing.iter().chain(incoming.iter()))
}
