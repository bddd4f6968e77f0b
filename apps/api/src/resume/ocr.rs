use std::process::Stdio;
use std::time::Duration;

use anyhow::Context;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Runs the Tesseract CLI over an uploaded file and returns what it printed to stdout.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    executable: String,
    timeout: Duration,
}

impl TesseractOcr {
    pub fn new(executable: impl Into<String>, timeout: Duration) -> Self {
        Self {
            executable: executable.into(),
            timeout,
        }
    }

    /// `extension` only names the temp file; Tesseract sniffs the format itself.
    pub async fn recognize(&self, bytes: &[u8], extension: &str) -> anyhow::Result<String> {
        let temp_dir = tempfile::Builder::new()
            .prefix("hirehub-ocr-")
            .tempdir()
            .context("failed to create OCR temp dir")?;

        let ext = temp_extension(extension);
        let input_path = temp_dir.path().join(format!("upload.{ext}"));
        tokio::fs::write(&input_path, bytes)
            .await
            .context("failed to write OCR input")?;

        let mut command = Command::new(&self.executable);
        command
            .arg(&input_path)
            .arg("stdout")
            .arg("-l")
            .arg("eng")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = timeout(self.timeout, command.output())
            .await
            .with_context(|| format!("OCR timed out after {}s", self.timeout.as_secs()))?
            .with_context(|| format!("failed to run '{}'", self.executable))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("tesseract exited with {}: {}", output.status, stderr.trim());
            anyhow::bail!("tesseract exited with {}", output.status);
        }

        let text = String::from_utf8_lossy(&output.stdout).to_string();
        debug!("OCR produced {} chars", text.len());
        Ok(text)
    }
}

/// Lowercase alphanumerics only, so the temp path stays inside the temp dir.
fn temp_extension(extension: &str) -> String {
    let ext = extension.trim_start_matches('.').to_ascii_lowercase();
    if !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        ext
    } else {
        "img".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_is_an_error() {
        let ocr = TesseractOcr::new("/nonexistent/tesseract-binary", Duration::from_secs(2));
        let err = ocr.recognize(b"\x89PNG", "png").await.unwrap_err();
        assert!(err.to_string().contains("failed to run"));
    }

    #[test]
    fn test_temp_extension_is_sanitized() {
        assert_eq!(temp_extension("PNG"), "png");
        assert_eq!(temp_extension(".tiff"), "tiff");
        assert_eq!(temp_extension("png/../../etc"), "img");
        assert_eq!(temp_extension("my scan"), "img");
        assert_eq!(temp_extension(""), "img");
    }
}
