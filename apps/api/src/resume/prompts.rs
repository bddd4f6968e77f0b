// LLM prompt constants for resume structuring.

/// System prompt for resume parsing. Enforces JSON-only output.
pub const RESUME_PARSE_SYSTEM: &str =
    "You are an expert recruiter who reads resumes and extracts structured candidate data. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT invent information that is not present in the resume.";

/// Resume parsing prompt template. Replace `{resume_text}` before sending.
pub const RESUME_PARSE_PROMPT_TEMPLATE: &str = r#"Extract the candidate's details from the resume text below.

Return a JSON object with this EXACT schema (no extra fields):
{
  "headline": "Senior Backend Engineer",
  "personal_info": {
    "full_name": "Asha Rao",
    "email": "asha@example.com",
    "phone": "+1 415 555 0100",
    "location": "Austin, TX",
    "linkedin": "https://www.linkedin.com/in/asharao",
    "github": "https://github.com/asharao",
    "website": null,
    "summary": "Backend engineer with 8 years building payment systems."
  },
  "experience": [
    {
      "company": "Acme Corp",
      "title": "Senior Backend Engineer",
      "location": "Austin, TX",
      "start_date": "Jan 2020",
      "end_date": null,
      "current": true,
      "highlights": ["Built the billing platform in Rust"]
    }
  ],
  "education": [
    {
      "institution": "University of Texas at Austin",
      "degree": "BSc",
      "field_of_study": "Computer Science",
      "start_date": "2014",
      "end_date": "2018",
      "grade": "3.8/4.0"
    }
  ],
  "skills": ["rust", "postgresql"],
  "projects": [
    {
      "name": "hirehub",
      "description": "Job board with resume parsing",
      "technologies": ["rust", "axum"],
      "url": "https://github.com/asharao/hirehub"
    }
  ]
}

Rules:
- Use null for anything the resume does not state. Use [] for empty lists.
- Keep dates exactly as written in the resume ("Jan 2020", "2018", "03/2019").
- Set "current" to true only when the role is ongoing ("Present", "Current", "Now").
- "highlights" are the bullet points of a role, one string per bullet.
- "skills" is a flat list of individual skills, lowercase, no categories.
- The resume may be an OCR scan or a speech transcript, so tolerate noise.

RESUME TEXT:
{resume_text}"#;
