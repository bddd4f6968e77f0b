use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use crate::auth::otp::OtpStore;
use crate::config::Config;
use crate::mail::Mailer;
use crate::resume::extract::TextExtractor;
use crate::resume::parser::ResumeParser;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Outstanding one-time codes. Redis in production.
    pub otp: Arc<dyn OtpStore>,
    pub s3: S3Client,
    pub config: Config,
    /// SMTP relay when configured, log-only otherwise.
    pub mailer: Arc<dyn Mailer>,
    /// Pluggable structured-field extractor. Default: HeuristicResumeParser.
    pub resume_parser: Arc<dyn ResumeParser>,
    pub text_extractor: TextExtractor,
}
