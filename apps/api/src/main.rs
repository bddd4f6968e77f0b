mod applications;
mod auth;
mod candidates;
mod config;
mod db;
mod employers;
mod errors;
mod jobs;
mod llm_client;
mod mail;
mod models;
mod pagination;
mod resume;
mod routes;
mod skills;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::otp::{OtpStore, RedisOtpStore};
use crate::config::Config;
use crate::db::create_pool;
use crate::mail::{LogMailer, Mailer, SmtpMailer};
use crate::resume::extract::TextExtractor;
use crate::resume::parser::build_resume_parser;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting HireHub API v{}", env!("CARGO_PKG_VERSION"));

    // PostgreSQL (migrations run on connect)
    let db = create_pool(&config.database_url).await?;

    // Redis holds one-time codes
    let otp: Arc<dyn OtpStore> = Arc::new(RedisOtpStore::new(redis::Client::open(
        config.redis_url.clone(),
    )?));
    info!("Redis client initialized");

    // S3 / MinIO for original resume files
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized (bucket: {})", config.s3_bucket);

    let mailer: Arc<dyn Mailer> = match config.smtp() {
        Some(settings) => {
            info!("Mail goes through SMTP relay {}", settings.host);
            Arc::new(SmtpMailer::new(&settings)?)
        }
        None => {
            warn!("SMTP is not configured; outgoing mail will only be logged");
            Arc::new(LogMailer)
        }
    };

    let resume_parser = build_resume_parser(&config)?;
    let text_extractor = TextExtractor::from_config(&config)?;
    if config.assemblyai_api_key.is_none() {
        info!("ASSEMBLYAI_API_KEY not set; video and audio resumes are disabled");
    }

    let state = AppState {
        db,
        otp,
        s3,
        config: config.clone(),
        mailer,
        resume_parser,
        text_extractor,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// S3 client for MinIO locally or AWS in production.
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "hirehub-static",
    );

    let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    // MinIO serves buckets by path, not virtual host.
    let s3_config = aws_sdk_s3::config::Builder::from(&shared)
        .force_path_style(true)
        .build();
    aws_sdk_s3::Client::from_conf(s3_config)
}
