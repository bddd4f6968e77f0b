use axum::extract::Multipart;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::AppError;

/// Multipart field names accepted for the resume file.
const FIELD_NAMES: &[&str] = &["resume", "file"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Pdf,
    Image,
    Audio,
    Video,
    PlainText,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Image => "image",
            FileKind::Audio => "audio",
            FileKind::Video => "video",
            FileKind::PlainText => "plain_text",
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub kind: FileKind,
    pub bytes: Bytes,
}

impl UploadedFile {
    /// Extension used for the stored object, taken from the upload name when it has one.
    pub fn extension(&self) -> String {
        extension_of(&self.file_name)
            .filter(|ext| ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or_else(|| {
                match self.kind {
                    FileKind::Pdf => "pdf",
                    FileKind::Image => "img",
                    FileKind::Audio => "audio",
                    FileKind::Video => "video",
                    FileKind::PlainText => "txt",
                }
                .to_string()
            })
    }
}

fn extension_of(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

/// What the declared content type says about the upload.
enum Declared {
    Kind(FileKind),
    /// A media type outside the supported formats; rejected without sniffing.
    Unsupported,
    /// Generic or missing type; fall back to the name and the bytes.
    Unknown,
}

fn declared_kind(content_type: &str) -> Declared {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match mime.as_str() {
        "application/pdf" => Declared::Kind(FileKind::Pdf),
        "text/plain" => Declared::Kind(FileKind::PlainText),
        "image/png" | "image/jpeg" | "image/tiff" | "image/bmp" | "image/webp" => {
            Declared::Kind(FileKind::Image)
        }
        "audio/mpeg" | "audio/wav" | "audio/x-wav" | "audio/mp4" | "audio/x-m4a" | "audio/ogg"
        | "audio/webm" => Declared::Kind(FileKind::Audio),
        "video/mp4" | "video/webm" | "video/ogg" => Declared::Kind(FileKind::Video),
        m if m.starts_with("image/") || m.starts_with("audio/") || m.starts_with("video/") => {
            Declared::Unsupported
        }
        _ => Declared::Unknown,
    }
}

fn kind_from_extension(file_name: &str) -> Option<FileKind> {
    match extension_of(file_name)?.as_str() {
        "pdf" => Some(FileKind::Pdf),
        "png" | "jpg" | "jpeg" | "tif" | "tiff" | "bmp" | "webp" => Some(FileKind::Image),
        "mp3" | "wav" | "m4a" | "ogg" => Some(FileKind::Audio),
        "mp4" | "webm" => Some(FileKind::Video),
        "txt" => Some(FileKind::PlainText),
        _ => None,
    }
}

/// Valid UTF-8 without control bytes in the first 4 KiB; a character cut at the
/// window edge is fine.
fn looks_like_text(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(4096)];
    let valid = match std::str::from_utf8(window) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    };
    valid
        && !window
            .iter()
            .any(|&b| b.is_ascii_control() && !matches!(b, b'\t' | b'\n' | b'\r' | 0x0C))
}

fn kind_from_magic(bytes: &[u8]) -> Option<FileKind> {
    let starts = |prefix: &[u8]| bytes.starts_with(prefix);
    if starts(b"%PDF") {
        Some(FileKind::Pdf)
    } else if starts(b"\x89PNG")
        || starts(&[0xFF, 0xD8, 0xFF])
        || starts(b"II*\0")
        || starts(b"MM\0*")
        || starts(b"BM")
    {
        Some(FileKind::Image)
    } else if starts(b"RIFF") && bytes.len() >= 12 {
        match &bytes[8..12] {
            b"WEBP" => Some(FileKind::Image),
            b"WAVE" => Some(FileKind::Audio),
            _ => None,
        }
    } else if starts(b"ID3") || starts(&[0xFF, 0xFB]) || starts(b"OggS") {
        Some(FileKind::Audio)
    } else if bytes.len() >= 12 && &bytes[4..8] == b"ftyp" {
        // QuickTime shares the ISO container; only mp4 and m4a brands are taken.
        match &bytes[8..12] {
            b"qt  " => None,
            brand if brand.starts_with(b"M4A") => Some(FileKind::Audio),
            _ => Some(FileKind::Video),
        }
    } else if starts(&[0x1A, 0x45, 0xDF, 0xA3]) && bytes.windows(4).take(64).any(|w| w == b"webm") {
        Some(FileKind::Video)
    } else if looks_like_text(bytes) {
        Some(FileKind::PlainText)
    } else {
        None
    }
}

/// Content type first, then file extension, then the leading bytes.
pub fn detect_kind(content_type: Option<&str>, file_name: &str, bytes: &[u8]) -> Option<FileKind> {
    match content_type.map(declared_kind) {
        Some(Declared::Kind(kind)) => Some(kind),
        Some(Declared::Unsupported) => None,
        Some(Declared::Unknown) | None => {
            kind_from_extension(file_name).or_else(|| kind_from_magic(bytes))
        }
    }
}

/// Pulls the resume file out of a multipart body, skipping unrelated fields.
pub async fn read_resume_field(mut multipart: Multipart) -> Result<UploadedFile, AppError> {
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if !FIELD_NAMES.contains(&name.as_str()) {
            debug!("Skipping multipart field '{name}'");
            continue;
        }

        let file_name = field.file_name().unwrap_or("resume").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;

        if bytes.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".to_string()));
        }

        let kind = detect_kind(content_type.as_deref(), &file_name, &bytes).ok_or_else(|| {
            AppError::Validation(format!(
                "Unsupported file type for '{file_name}'; upload a PDF, image, audio/video recording or text file"
            ))
        })?;

        return Ok(UploadedFile {
            file_name,
            content_type,
            kind,
            bytes,
        });
    }

    Err(AppError::Validation(
        "Multipart body must contain a 'resume' file field".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_wins() {
        assert_eq!(
            detect_kind(Some("application/pdf"), "cv.txt", b"hello"),
            Some(FileKind::Pdf)
        );
        assert_eq!(
            detect_kind(Some("audio/mpeg; charset=binary"), "intro", b""),
            Some(FileKind::Audio)
        );
    }

    #[test]
    fn test_octet_stream_falls_back_to_extension() {
        assert_eq!(
            detect_kind(Some("application/octet-stream"), "Scan.JPEG", b""),
            Some(FileKind::Image)
        );
        assert_eq!(
            detect_kind(None, "pitch.webm", b""),
            Some(FileKind::Video)
        );
    }

    #[test]
    fn test_magic_bytes() {
        assert_eq!(detect_kind(None, "upload", b"%PDF-1.7\n..."), Some(FileKind::Pdf));
        assert_eq!(detect_kind(None, "upload", b"\x89PNG\r\n\x1a\n"), Some(FileKind::Image));
        assert_eq!(detect_kind(None, "upload", b"RIFF\0\0\0\0WAVEfmt "), Some(FileKind::Audio));
        assert_eq!(detect_kind(None, "upload", b"\0\0\0\x20ftypisom\0\0"), Some(FileKind::Video));
        assert_eq!(detect_kind(None, "upload", b"\0\0\0\x20ftypM4A \0\0"), Some(FileKind::Audio));
        assert_eq!(detect_kind(None, "upload", b"Asha Rao\nEngineer"), Some(FileKind::PlainText));
        assert_eq!(detect_kind(None, "upload", &[0xC3, 0x28, 0xA0, 0xA1]), None);
    }

    #[test]
    fn test_unsupported_media_types_rejected() {
        assert_eq!(detect_kind(Some("image/svg+xml"), "logo.svg", b"<svg xmlns=\"\"/>"), None);
        assert_eq!(detect_kind(Some("image/gif"), "me.gif", b"GIF89a"), None);
        assert_eq!(detect_kind(Some("video/quicktime"), "intro.mov", b""), None);
        assert_eq!(detect_kind(None, "intro.flac", b"fLaC\0\0\0\x22"), None);
        assert_eq!(detect_kind(None, "intro.mov", b"\0\0\0\x14ftypqt  \0\0"), None);
        assert_eq!(
            detect_kind(None, "intro.mkv", b"\x1a\x45\xdf\xa3\x42\x82\x88matroska"),
            None
        );
    }

    #[test]
    fn test_supported_media_types_accepted() {
        assert_eq!(detect_kind(Some("image/webp"), "me", b""), Some(FileKind::Image));
        assert_eq!(detect_kind(Some("audio/x-wav"), "me", b""), Some(FileKind::Audio));
        assert_eq!(detect_kind(Some("video/ogg"), "me", b""), Some(FileKind::Video));
        assert_eq!(
            detect_kind(None, "upload", b"\x1a\x45\xdf\xa3\x42\x82\x84webm"),
            Some(FileKind::Video)
        );
    }

    #[test]
    fn test_extension_for_storage() {
        let file = UploadedFile {
            file_name: "Asha Rao Resume.PDF".to_string(),
            content_type: None,
            kind: FileKind::Pdf,
            bytes: Bytes::from_static(b"%PDF"),
        };
        assert_eq!(file.extension(), "pdf");

        let odd = UploadedFile {
            file_name: "resume".to_string(),
            kind: FileKind::Image,
            ..file
        };
        assert_eq!(odd.extension(), "img");
    }
}
