//! Resume ingestion: intake, text extraction, structuring, storage.
//!
//! PDFs go through `pdf-extract` with a Tesseract fallback for scans, images
//! through Tesseract, recordings through AssemblyAI. The resulting text is
//! structured by the configured [`parser::ResumeParser`].

pub mod extract;
pub mod fields;
pub mod handlers;
pub mod intake;
pub mod merge;
pub mod ocr;
pub mod parser;
pub mod prompts;
pub mod sections;
pub mod storage;
pub mod transcribe;
