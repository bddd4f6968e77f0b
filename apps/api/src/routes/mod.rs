pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post, put},
    Router,
};

use crate::state::AppState;
use crate::{applications, auth, candidates, employers, jobs, resume};

pub fn build_router(state: AppState) -> Router {
    // Multipart overhead on top of the file itself.
    let body_limit = state.config.max_upload_bytes + 64 * 1024;

    Router::new()
        .route("/health", get(health::health_handler))
        // Accounts
        .route(
            "/api/auth/employer-signup",
            post(auth::handlers::handle_employer_signup),
        )
        .route(
            "/api/auth/employer-login",
            post(auth::handlers::handle_employer_login),
        )
        .route(
            "/api/auth/candidate-signup",
            post(auth::handlers::handle_candidate_signup),
        )
        .route(
            "/api/auth/candidate-login",
            post(auth::handlers::handle_candidate_login),
        )
        .route("/api/auth/me", get(auth::handlers::handle_me))
        .route("/api/auth/send-otp", post(auth::handlers::handle_send_otp))
        .route("/api/auth/verify-otp", post(auth::handlers::handle_verify_otp))
        .route(
            "/api/auth/reset-password",
            post(auth::handlers::handle_reset_password),
        )
        // Employers
        .route(
            "/api/employers/me",
            put(employers::handlers::handle_update_employer),
        )
        .route("/api/employers/me/jobs", get(employers::handlers::handle_my_jobs))
        .route("/api/employers/:id", get(employers::handlers::handle_get_company))
        // Jobs
        .route(
            "/api/jobs",
            get(jobs::handlers::handle_list_jobs).post(jobs::handlers::handle_create_job),
        )
        .route(
            "/api/jobs/:id",
            get(jobs::handlers::handle_get_job)
                .put(jobs::handlers::handle_update_job)
                .delete(jobs::handlers::handle_delete_job),
        )
        // Applications
        .route("/api/jobs/:id/apply", post(applications::handlers::handle_apply))
        .route(
            "/api/jobs/:id/applications",
            get(applications::handlers::handle_list_applicants),
        )
        .route(
            "/api/candidates/me/applications",
            get(applications::handlers::handle_my_applications),
        )
        .route(
            "/api/applications/:id/status",
            patch(applications::handlers::handle_update_status),
        )
        // Candidate profiles
        .route(
            "/api/candidate-profile",
            get(candidates::handlers::handle_get_own_profile)
                .put(candidates::handlers::handle_update_own_profile),
        )
        .route(
            "/api/candidates/profile/:id",
            get(candidates::handlers::handle_get_profile),
        )
        .route(
            "/api/candidates/all",
            get(candidates::handlers::handle_list_candidates),
        )
        // Resume ingestion
        .route(
            "/api/candidate-profile/resume",
            post(resume::handlers::handle_apply_resume),
        )
        .route("/api/resume/parse", post(resume::handlers::handle_parse_resume))
        .route("/api/resume/uploads", get(resume::handlers::handle_list_uploads))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::auth::otp::testing::MemoryOtpStore;
    use crate::auth::otp::{self, otp_key, OtpPurpose};
    use crate::auth::token::issue_token;
    use crate::auth::AccountRole;
    use crate::config::test_config;
    use crate::mail::LogMailer;
    use crate::resume::extract::TextExtractor;
    use crate::resume::ocr::TesseractOcr;
    use crate::resume::parser::HeuristicResumeParser;

    /// State whose backing services are never contacted by these requests.
    fn offline_state() -> AppState {
        offline_state_with(Arc::new(MemoryOtpStore::default()))
    }

    fn offline_state_with(otp: Arc<MemoryOtpStore>) -> AppState {
        let config = test_config();
        let db = sqlx::postgres::PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy(&config.database_url)
            .unwrap();
        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new("us-east-1"))
            .build();

        AppState {
            db,
            otp,
            s3: aws_sdk_s3::Client::from_conf(s3_config),
            config,
            mailer: Arc::new(LogMailer),
            resume_parser: Arc::new(HeuristicResumeParser),
            text_extractor: TextExtractor::new(
                TesseractOcr::new("tesseract", Duration::from_secs(1)),
                None,
            ),
        }
    }

    fn bearer(role: AccountRole) -> String {
        let config = test_config();
        let token = issue_token(
            &config.jwt_secret,
            config.jwt_ttl_hours,
            Uuid::new_v4(),
            role,
            "someone@example.com",
        )
        .unwrap();
        format!("Bearer {token}")
    }

    async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        send_to(offline_state(), request).await
    }

    async fn send_to(state: AppState, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = build_router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, json) = send(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["service"], "hirehub-api");
    }

    #[tokio::test]
    async fn test_profile_requires_token() {
        let (status, json) = send(
            Request::builder()
                .uri("/api/candidate-profile")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_garbage_token_is_rejected() {
        let (status, _) = send(
            Request::builder()
                .uri("/api/auth/me")
                .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_candidate_cannot_post_jobs() {
        let (status, json) = send(
            Request::builder()
                .method(Method::POST)
                .uri("/api/jobs")
                .header(header::AUTHORIZATION, bearer(AccountRole::Candidate))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"title": "Rust Engineer", "description": "Build things", "employment_type": "full_time"}"#))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["error"]["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_employer_cannot_upload_resume() {
        let (status, _) = send(
            Request::builder()
                .method(Method::POST)
                .uri("/api/resume/parse")
                .header(header::AUTHORIZATION, bearer(AccountRole::Employer))
                .header(header::CONTENT_TYPE, "multipart/form-data; boundary=X")
                .body(Body::from("--X--\r\n"))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_resume_upload_without_file_field() {
        let body = "--X\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--X--\r\n";
        let (status, json) = send(
            Request::builder()
                .method(Method::POST)
                .uri("/api/resume/parse")
                .header(header::AUTHORIZATION, bearer(AccountRole::Candidate))
                .header(header::CONTENT_TYPE, "multipart/form-data; boundary=X")
                .body(Body::from(body))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_candidate_directory_is_employer_only() {
        let (status, _) = send(
            Request::builder()
                .uri("/api/candidates/all")
                .header(header::AUTHORIZATION, bearer(AccountRole::Candidate))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_oversized_resume_is_413() {
        let mut body = b"--X\r\nContent-Disposition: form-data; name=\"resume\"; filename=\"cv.txt\"\r\nContent-Type: text/plain\r\n\r\n".to_vec();
        body.extend(std::iter::repeat(b'a').take(2 * 1024 * 1024));
        body.extend_from_slice(b"\r\n--X--\r\n");

        let (status, json) = send(
            Request::builder()
                .method(Method::POST)
                .uri("/api/resume/parse")
                .header(header::AUTHORIZATION, bearer(AccountRole::Candidate))
                .header(header::CONTENT_TYPE, "multipart/form-data; boundary=X")
                .body(Body::from(body))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(json["error"]["code"], "PAYLOAD_TOO_LARGE");
    }

    // ── One-time codes ──────────────────────────────────────────────────────

    const EMAIL: &str = "asha@example.com";

    fn json_post(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn store_with_code(purpose: OtpPurpose) -> (Arc<MemoryOtpStore>, String) {
        let store = Arc::new(MemoryOtpStore::default());
        let code = otp::issue(store.as_ref(), 600, AccountRole::Candidate, purpose, EMAIL)
            .await
            .unwrap();
        (store, code)
    }

    fn not(code: &str) -> String {
        let other = if code == "111111" { "222222" } else { "111111" };
        other.to_string()
    }

    #[tokio::test]
    async fn test_verify_otp_without_code_requested() {
        let (status, json) = send(json_post(
            "/api/auth/verify-otp",
            serde_json::json!({"email": EMAIL, "account_type": "candidate", "code": "123456"}),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_verify_otp_locks_out_after_max_attempts() {
        let (store, code) = store_with_code(OtpPurpose::VerifyEmail).await;
        let key = otp_key(AccountRole::Candidate, OtpPurpose::VerifyEmail, EMAIL);
        let guess = serde_json::json!({"email": EMAIL, "account_type": "candidate", "code": not(&code)});

        let max = test_config().otp_max_attempts;
        for attempt in 1..max {
            let (status, _) = send_to(
                offline_state_with(store.clone()),
                json_post("/api/auth/verify-otp", guess.clone()),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(store.record(&key).unwrap().attempts, attempt);
        }

        let (status, json) = send_to(
            offline_state_with(store.clone()),
            json_post("/api/auth/verify-otp", guess),
        )
        .await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(json["error"]["code"], "TOO_MANY_REQUESTS");
        assert!(store.record(&key).is_none());
    }

    #[tokio::test]
    async fn test_reset_password_policy_checked_before_code_is_spent() {
        let (store, code) = store_with_code(OtpPurpose::ResetPassword).await;
        let key = otp_key(AccountRole::Candidate, OtpPurpose::ResetPassword, EMAIL);

        let (status, _) = send_to(
            offline_state_with(store.clone()),
            json_post(
                "/api/auth/reset-password",
                serde_json::json!({
                    "email": EMAIL, "account_type": "candidate",
                    "code": code, "new_password": "short"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let record = store.record(&key).unwrap();
        assert_eq!(record.attempts, 0);
    }

    #[tokio::test]
    async fn test_reset_password_wrong_code_counts_attempt() {
        let (store, code) = store_with_code(OtpPurpose::ResetPassword).await;
        let key = otp_key(AccountRole::Candidate, OtpPurpose::ResetPassword, EMAIL);

        let (status, json) = send_to(
            offline_state_with(store.clone()),
            json_post(
                "/api/auth/reset-password",
                serde_json::json!({
                    "email": EMAIL, "account_type": "candidate",
                    "code": not(&code), "new_password": "longer-pass1"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["message"], "Incorrect code");
        assert_eq!(store.record(&key).unwrap().attempts, 1);
    }

    #[tokio::test]
    async fn test_verify_code_is_not_valid_for_reset() {
        let (store, code) = store_with_code(OtpPurpose::VerifyEmail).await;

        let (status, _) = send_to(
            offline_state_with(store.clone()),
            json_post(
                "/api/auth/reset-password",
                serde_json::json!({
                    "email": EMAIL, "account_type": "candidate",
                    "code": code, "new_password": "longer-pass1"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let key = otp_key(AccountRole::Candidate, OtpPurpose::VerifyEmail, EMAIL);
        assert!(store.record(&key).is_some());
    }
}
