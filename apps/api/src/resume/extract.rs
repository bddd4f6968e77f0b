use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::errors::AppError;
use crate::resume::intake::{FileKind, UploadedFile};
use crate::resume::ocr::TesseractOcr;
use crate::resume::transcribe::{Transcriber, TranscriptionError};

/// Below this many non-whitespace characters a PDF is treated as scanned.
pub const MIN_PDF_TEXT_CHARS: usize = 50;

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"https?://[^\s<>'"()\\]+"#).unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    PdfText,
    Ocr,
    Transcription,
    PlainText,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::PdfText => "pdf_text",
            ExtractionMethod::Ocr => "ocr",
            ExtractionMethod::Transcription => "transcription",
            ExtractionMethod::PlainText => "plain_text",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub text: String,
    pub method: ExtractionMethod,
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("video and audio resumes need a transcription service, which is not configured")]
    TranscriptionUnavailable,

    #[error(transparent)]
    Transcription(#[from] TranscriptionError),

    #[error("no readable text could be extracted from the file")]
    Empty,
}

impl From<ExtractionError> for AppError {
    fn from(e: ExtractionError) -> Self {
        match e {
            ExtractionError::TranscriptionUnavailable | ExtractionError::Empty => {
                AppError::UnprocessableEntity(e.to_string())
            }
            ExtractionError::Transcription(inner) => AppError::Upstream(inner.to_string()),
            ExtractionError::Ocr(msg) => AppError::Internal(anyhow::anyhow!("OCR failed: {msg}")),
        }
    }
}

fn meaningful_chars(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

/// URLs that only live in link annotations never show up in the extracted text.
fn pdf_hyperlinks(data: &[u8]) -> Vec<String> {
    let raw = String::from_utf8_lossy(data);
    let mut links: Vec<String> = Vec::new();
    for m in URL_RE.find_iter(&raw) {
        let value = m.as_str().to_string();
        if !links.iter().any(|l| l.eq_ignore_ascii_case(&value)) {
            links.push(value);
        }
    }
    links
}

/// Turns an upload into plain text, choosing the method by file kind.
#[derive(Clone)]
pub struct TextExtractor {
    ocr: TesseractOcr,
    transcriber: Option<Transcriber>,
}

impl TextExtractor {
    pub fn new(ocr: TesseractOcr, transcriber: Option<Transcriber>) -> Self {
        Self { ocr, transcriber }
    }

    pub fn from_config(config: &Config) -> Result<Self, TranscriptionError> {
        let ocr = TesseractOcr::new(
            config.tesseract_path.clone(),
            Duration::from_secs(config.ocr_timeout_secs),
        );
        let transcriber = config
            .assemblyai_api_key
            .clone()
            .map(Transcriber::new)
            .transpose()?;
        Ok(Self::new(ocr, transcriber))
    }

    pub async fn extract(&self, file: &UploadedFile) -> Result<ExtractedText, ExtractionError> {
        let extracted = match file.kind {
            FileKind::Pdf => self.extract_pdf(file).await?,
            FileKind::Image => ExtractedText {
                text: self.run_ocr(file).await?,
                method: ExtractionMethod::Ocr,
            },
            FileKind::Audio | FileKind::Video => {
                let transcriber = self
                    .transcriber
                    .as_ref()
                    .ok_or(ExtractionError::TranscriptionUnavailable)?;
                ExtractedText {
                    text: transcriber.transcribe(file.bytes.clone()).await?,
                    method: ExtractionMethod::Transcription,
                }
            }
            FileKind::PlainText => ExtractedText {
                text: decode_plain_text(&file.bytes),
                method: ExtractionMethod::PlainText,
            },
        };

        let text = extracted.text.trim().to_string();
        if text.is_empty() {
            return Err(ExtractionError::Empty);
        }

        info!(
            "Extracted {} chars from '{}' via {}",
            text.len(),
            file.file_name,
            extracted.method.as_str()
        );
        Ok(ExtractedText { text, ..extracted })
    }

    async fn extract_pdf(&self, file: &UploadedFile) -> Result<ExtractedText, ExtractionError> {
        let bytes = file.bytes.clone();
        // pdf-extract is CPU-bound and may panic on malformed input.
        let parsed = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes)).await;

        match parsed {
            Ok(Ok(mut text)) if meaningful_chars(&text) >= MIN_PDF_TEXT_CHARS => {
                let links = pdf_hyperlinks(&file.bytes);
                if !links.is_empty() {
                    text.push('\n');
                    text.push_str(&links.join("\n"));
                }
                Ok(ExtractedText {
                    text,
                    method: ExtractionMethod::PdfText,
                })
            }
            Ok(Ok(_)) => {
                info!("'{}' has no text layer, falling back to OCR", file.file_name);
                self.ocr_fallback(file).await
            }
            Ok(Err(e)) => {
                warn!("PDF text extraction failed for '{}': {e}", file.file_name);
                self.ocr_fallback(file).await
            }
            Err(e) => {
                warn!("PDF text extraction panicked for '{}': {e}", file.file_name);
                self.ocr_fallback(file).await
            }
        }
    }

    async fn ocr_fallback(&self, file: &UploadedFile) -> Result<ExtractedText, ExtractionError> {
        Ok(ExtractedText {
            text: self.run_ocr(file).await?,
            method: ExtractionMethod::Ocr,
        })
    }

    async fn run_ocr(&self, file: &UploadedFile) -> Result<String, ExtractionError> {
        self.ocr
            .recognize(&file.bytes, &file.extension())
            .await
            .map_err(|e| ExtractionError::Ocr(format!("{e:#}")))
    }
}

fn decode_plain_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_start_matches('\u{feff}')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn extractor(transcriber: Option<Transcriber>) -> TextExtractor {
        TextExtractor::new(
            TesseractOcr::new("/nonexistent/tesseract-binary", Duration::from_secs(1)),
            transcriber,
        )
    }

    fn upload(kind: FileKind, name: &str, bytes: &'static [u8]) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            content_type: None,
            kind,
            bytes: Bytes::from_static(bytes),
        }
    }

    #[tokio::test]
    async fn test_plain_text_is_trimmed() {
        let file = upload(FileKind::PlainText, "cv.txt", b"\xef\xbb\xbf  Asha Rao\nEngineer \n");
        let extracted = extractor(None).extract(&file).await.unwrap();
        assert_eq!(extracted.text, "Asha Rao\nEngineer");
        assert_eq!(extracted.method, ExtractionMethod::PlainText);
    }

    #[tokio::test]
    async fn test_blank_text_is_empty() {
        let file = upload(FileKind::PlainText, "cv.txt", b" \n\t ");
        let err = extractor(None).extract(&file).await.unwrap_err();
        assert!(matches!(err, ExtractionError::Empty));
        assert!(matches!(AppError::from(err), AppError::UnprocessableEntity(_)));
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_replaced() {
        let file = upload(FileKind::PlainText, "cv.txt", b"Jos\xe9 Ruiz");
        let extracted = extractor(None).extract(&file).await.unwrap();
        assert_eq!(extracted.text, "Jos\u{fffd} Ruiz");
    }

    #[tokio::test]
    async fn test_media_without_transcriber_is_unprocessable() {
        let file = upload(FileKind::Video, "pitch.mp4", b"\0\0\0\x20ftypisom");
        let err = extractor(None).extract(&file).await.unwrap_err();
        assert!(matches!(err, ExtractionError::TranscriptionUnavailable));
    }

    #[tokio::test]
    async fn test_unreadable_pdf_falls_back_to_ocr() {
        // Not a real PDF, so extraction fails and the missing OCR binary surfaces.
        let file = upload(FileKind::Pdf, "scan.pdf", b"%PDF-1.4 garbage");
        let err = extractor(None).extract(&file).await.unwrap_err();
        assert!(matches!(err, ExtractionError::Ocr(_)));
    }

    #[test]
    fn test_pdf_hyperlinks_are_deduplicated() {
        let raw = b"/URI (https://linkedin.com/in/asha) /URI (https://LinkedIn.com/in/asha) /URI (https://github.com/asha)";
        let links = pdf_hyperlinks(raw);
        assert_eq!(
            links,
            vec!["https://linkedin.com/in/asha", "https://github.com/asha"]
        );
    }
}
