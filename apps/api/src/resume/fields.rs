//! Contact-field extraction from free resume text.

use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap());
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\+?\(?\d[\d\s().-]{7,}\d").unwrap());
static YEAR_SPAN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:19|20)\d{2}\s*[-–—/]\s*(?:19|20)\d{2}$").unwrap());
static LINKEDIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:https?://)?(?:[a-z]{2,3}\.)?linkedin\.com/in/([A-Za-z0-9_-]+)").unwrap()
});
static GITHUB_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:https?://)?(?:www\.)?github\.com/([A-Za-z0-9-]{1,39})").unwrap()
});
static WEB_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\b(?:https?://|www\.)[^\s|,<>()'"]+"#).unwrap());
static LOCATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z][A-Za-z.' -]{1,30},\s*[A-Z][A-Za-z.' -]{1,30}$").unwrap()
});

pub fn extract_email(text: &str) -> Option<String> {
    EMAIL_RE.find(text).map(|m| m.as_str().to_lowercase())
}

/// First run of 10 to 15 digits that is not a year span like "2018 - 2020".
pub fn extract_phone(text: &str) -> Option<String> {
    PHONE_RE
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .filter(|candidate| !YEAR_SPAN_RE.is_match(candidate))
        .find(|candidate| {
            let digits = candidate.chars().filter(char::is_ascii_digit).count();
            (10..=15).contains(&digits)
        })
        .map(|candidate| candidate.split_whitespace().collect::<Vec<_>>().join(" "))
}

pub fn extract_linkedin(text: &str) -> Option<String> {
    LINKEDIN_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|user| format!("https://www.linkedin.com/in/{}", user.as_str()))
}

pub fn extract_github(text: &str) -> Option<String> {
    GITHUB_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|user| format!("https://github.com/{}", user.as_str()))
}

/// A personal site: any explicit URL that is not LinkedIn or GitHub.
pub fn extract_website(text: &str) -> Option<String> {
    WEB_URL_RE
        .find_iter(text)
        .map(|m| m.as_str().trim_end_matches(&['.', ';', ':'][..]))
        .find(|url| {
            let lower = url.to_ascii_lowercase();
            !lower.contains("linkedin.com") && !lower.contains("github.com")
        })
        .map(|url| {
            if url.to_ascii_lowercase().starts_with("http") {
                url.to_string()
            } else {
                format!("https://{url}")
            }
        })
}

/// Any link at all, used for project entries.
pub fn first_url(text: &str) -> Option<String> {
    WEB_URL_RE
        .find(text)
        .map(|m| m.as_str().trim_end_matches(&['.', ';', ':'][..]).to_string())
        .or_else(|| extract_github(text))
}

/// "Austin, TX" or "Location: Bengaluru, India".
pub fn looks_like_location(piece: &str) -> Option<String> {
    let piece = piece.trim();
    let piece = piece
        .strip_prefix("Location:")
        .or_else(|| piece.strip_prefix("Address:"))
        .unwrap_or(piece)
        .trim();
    if piece.eq_ignore_ascii_case("remote") {
        return Some("Remote".to_string());
    }
    LOCATION_RE.is_match(piece).then(|| piece.to_string())
}

/// Splits a contact line such as "a@b.com | +1 555 | Austin, TX" into pieces.
pub fn contact_pieces(line: &str) -> impl Iterator<Item = &str> {
    line.split(|c: char| matches!(c, '|' | '•' | '·' | '\t'))
        .map(str::trim)
        .filter(|p| !p.is_empty())
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// The resume owner's name is usually the first short line made only of capitalised words.
pub fn guess_name<'a>(lines: impl IntoIterator<Item = &'a str>) -> Option<String> {
    lines.into_iter().take(5).find_map(|line| {
        let line = line.trim();
        let words: Vec<&str> = line.split_whitespace().collect();
        if !(2..=4).contains(&words.len()) || line.chars().count() > 40 {
            return None;
        }
        let plausible = words.iter().all(|w| {
            w.chars().next().is_some_and(char::is_uppercase)
                && w.chars().all(|c| c.is_alphabetic() || matches!(c, '.' | '\'' | '-'))
        });
        if !plausible {
            return None;
        }
        let all_caps = line.chars().filter(|c| c.is_alphabetic()).all(char::is_uppercase);
        Some(if all_caps {
            words.iter().map(|w| title_case(w)).collect::<Vec<_>>().join(" ")
        } else {
            words.join(" ")
        })
    })
}

/// Contact noise: anything with an address, number or link in it.
pub fn is_contact_line(line: &str) -> bool {
    extract_email(line).is_some()
        || extract_phone(line).is_some()
        || WEB_URL_RE.is_match(line)
        || LINKEDIN_RE.is_match(line)
        || GITHUB_RE.is_match(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_is_lowercased() {
        assert_eq!(
            extract_email("Contact: Asha.Rao@Example.COM | Austin").as_deref(),
            Some("asha.rao@example.com")
        );
        assert!(extract_email("no address here").is_none());
    }

    #[test]
    fn test_phone_formats() {
        assert_eq!(
            extract_phone("Phone: +1 (415) 555-0100").as_deref(),
            Some("+1 (415) 555-0100")
        );
        assert_eq!(extract_phone("+91 98765 43210").as_deref(), Some("+91 98765 43210"));
        assert!(extract_phone("2018 - 2020").is_none());
        assert!(extract_phone("Call 555-0100").is_none());
    }

    #[test]
    fn test_profile_links() {
        let text = "linkedin.com/in/asha-rao | https://github.com/asharao | www.asharao.dev";
        assert_eq!(
            extract_linkedin(text).as_deref(),
            Some("https://www.linkedin.com/in/asha-rao")
        );
        assert_eq!(extract_github(text).as_deref(), Some("https://github.com/asharao"));
        assert_eq!(extract_website(text).as_deref(), Some("https://www.asharao.dev"));
    }

    #[test]
    fn test_location_pieces() {
        assert_eq!(looks_like_location("Austin, TX").as_deref(), Some("Austin, TX"));
        assert_eq!(
            looks_like_location("Location: Bengaluru, India").as_deref(),
            Some("Bengaluru, India")
        );
        assert_eq!(looks_like_location("remote").as_deref(), Some("Remote"));
        assert!(looks_like_location("Rust, Go, Python, SQL").is_none());
    }

    #[test]
    fn test_guess_name() {
        assert_eq!(guess_name(["ASHA RAO", "Engineer"]).as_deref(), Some("Asha Rao"));
        assert_eq!(
            guess_name(["asha@example.com", "Mary-Jane O'Neil"]).as_deref(),
            Some("Mary-Jane O'Neil")
        );
        assert!(guess_name(["Curriculum vitae 2024"]).is_none());
    }
}
