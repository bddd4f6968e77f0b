use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use redis::Script;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::AccountRole;
use crate::errors::AppError;

pub const CODE_LENGTH: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    VerifyEmail,
    ResetPassword,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::VerifyEmail => "verify_email",
            OtpPurpose::ResetPassword => "reset_password",
        }
    }
}

/// One outstanding code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtpRecord {
    pub code: String,
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
}

/// Outcome of checking a submitted code against the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpCheck {
    /// No record: expired, never requested, or already used.
    Missing,
    Accepted,
    /// Wrong code; `attempts` is the count after this one.
    Rejected { attempts: u32 },
    Exhausted,
}

pub fn generate_code() -> String {
    let n: u32 = rand::rng().random_range(0..1_000_000);
    format!("{n:0width$}", width = CODE_LENGTH)
}

pub fn otp_key(role: AccountRole, purpose: OtpPurpose, email: &str) -> String {
    format!("otp:{}:{}:{}", role.as_str(), purpose.as_str(), email)
}

// ────────────────────────────────────────────────────────────────────────────
// Storage
// ────────────────────────────────────────────────────────────────────────────

/// Where outstanding codes live.
///
/// `check` must compare and update in a single step: concurrent submissions for the
/// same key may never both be accepted, and every wrong guess must be counted.
#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Stores `record` under `key`, replacing any outstanding one.
    async fn put(&self, key: &str, record: &OtpRecord, ttl_secs: u64) -> Result<(), AppError>;

    /// Checks `submitted`, deleting the record when it is accepted or exhausted and
    /// counting the attempt otherwise. The expiry is left untouched.
    async fn check(&self, key: &str, submitted: &str, max_attempts: u32) -> Result<OtpCheck, AppError>;
}

/// Reply codes: -1 missing, 0 accepted, -2 exhausted, n > 0 attempts so far.
const CHECK_SCRIPT: &str = r#"
local code = redis.call('HGET', KEYS[1], 'code')
if not code then
  return -1
end
if code == ARGV[1] then
  redis.call('DEL', KEYS[1])
  return 0
end
local attempts = redis.call('HINCRBY', KEYS[1], 'attempts', 1)
if attempts >= tonumber(ARGV[2]) then
  redis.call('DEL', KEYS[1])
  return -2
end
return attempts
"#;

/// Redis-backed store. Each record is a hash (`code`, `attempts`, `created_at`)
/// with a key expiry; checks run as one Lua script.
#[derive(Clone)]
pub struct RedisOtpStore {
    client: redis::Client,
    check_script: Script,
}

impl RedisOtpStore {
    pub fn new(client: redis::Client) -> Self {
        Self {
            client,
            check_script: Script::new(CHECK_SCRIPT),
        }
    }
}

fn check_from_reply(reply: i64) -> OtpCheck {
    match reply {
        -1 => OtpCheck::Missing,
        0 => OtpCheck::Accepted,
        n if n > 0 => OtpCheck::Rejected { attempts: n as u32 },
        _ => OtpCheck::Exhausted,
    }
}

#[async_trait]
impl OtpStore for RedisOtpStore {
    async fn put(&self, key: &str, record: &OtpRecord, ttl_secs: u64) -> Result<(), AppError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::pipe()
            .atomic()
            .cmd("DEL")
            .arg(key)
            .ignore()
            .cmd("HSET")
            .arg(key)
            .arg("code")
            .arg(&record.code)
            .arg("attempts")
            .arg(record.attempts)
            .arg("created_at")
            .arg(record.created_at.to_rfc3339())
            .ignore()
            .cmd("EXPIRE")
            .arg(key)
            .arg(ttl_secs)
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn check(&self, key: &str, submitted: &str, max_attempts: u32) -> Result<OtpCheck, AppError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let reply: i64 = self
            .check_script
            .key(key)
            .arg(submitted)
            .arg(max_attempts)
            .invoke_async(&mut conn)
            .await?;
        Ok(check_from_reply(reply))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Flows
// ────────────────────────────────────────────────────────────────────────────

/// Stores a fresh code, replacing any outstanding one for the same key.
pub async fn issue(
    store: &dyn OtpStore,
    ttl_secs: u64,
    role: AccountRole,
    purpose: OtpPurpose,
    email: &str,
) -> Result<String, AppError> {
    let code = generate_code();
    let record = OtpRecord {
        code: code.clone(),
        attempts: 0,
        created_at: Utc::now(),
    };
    store
        .put(&otp_key(role, purpose, email), &record, ttl_secs)
        .await?;

    info!("Issued {} code for {} account {email}", purpose.as_str(), role.as_str());
    Ok(code)
}

/// Verifies and consumes a code. Each code is single use.
pub async fn verify(
    store: &dyn OtpStore,
    max_attempts: u32,
    role: AccountRole,
    purpose: OtpPurpose,
    email: &str,
    submitted: &str,
) -> Result<(), AppError> {
    let key = otp_key(role, purpose, email);
    match store.check(&key, submitted.trim(), max_attempts).await? {
        OtpCheck::Accepted => Ok(()),
        OtpCheck::Missing => Err(AppError::Validation(
            "Code has expired or was never requested".to_string(),
        )),
        OtpCheck::Rejected { .. } => Err(AppError::Validation("Incorrect code".to_string())),
        OtpCheck::Exhausted => {
            warn!("Too many failed {} attempts for {email}", purpose.as_str());
            Err(AppError::TooManyRequests(
                "Too many incorrect attempts; request a new code".to_string(),
            ))
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use tokio::time::Instant;

    use super::*;

    /// In-process store with the same semantics as `RedisOtpStore`.
    #[derive(Default)]
    pub struct MemoryOtpStore {
        pub records: Mutex<HashMap<String, (OtpRecord, Instant)>>,
    }

    impl MemoryOtpStore {
        pub fn record(&self, key: &str) -> Option<OtpRecord> {
            self.records.lock().unwrap().get(key).map(|(r, _)| r.clone())
        }

        pub fn expires_at(&self, key: &str) -> Option<Instant> {
            self.records.lock().unwrap().get(key).map(|(_, at)| *at)
        }
    }

    #[async_trait]
    impl OtpStore for MemoryOtpStore {
        async fn put(&self, key: &str, record: &OtpRecord, ttl_secs: u64) -> Result<(), AppError> {
            let expires_at = Instant::now() + Duration::from_secs(ttl_secs);
            self.records
                .lock()
                .unwrap()
                .insert(key.to_string(), (record.clone(), expires_at));
            Ok(())
        }

        async fn check(&self, key: &str, submitted: &str, max_attempts: u32) -> Result<OtpCheck, AppError> {
            let mut records = self.records.lock().unwrap();
            let Some((record, expires_at)) = records.get_mut(key) else {
                return Ok(OtpCheck::Missing);
            };
            if *expires_at <= Instant::now() {
                records.remove(key);
                return Ok(OtpCheck::Missing);
            }
            if record.code == submitted {
                records.remove(key);
                return Ok(OtpCheck::Accepted);
            }
            record.attempts += 1;
            if record.attempts >= max_attempts {
                records.remove(key);
                return Ok(OtpCheck::Exhausted);
            }
            Ok(OtpCheck::Rejected {
                attempts: record.attempts,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::testing::MemoryOtpStore;
    use super::*;

    const EMAIL: &str = "asha@example.com";

    fn key() -> String {
        otp_key(AccountRole::Candidate, OtpPurpose::VerifyEmail, EMAIL)
    }

    async fn issued(store: &MemoryOtpStore) -> String {
        issue(store, 600, AccountRole::Candidate, OtpPurpose::VerifyEmail, EMAIL)
            .await
            .unwrap()
    }

    async fn submit(store: &MemoryOtpStore, code: &str, max_attempts: u32) -> Result<(), AppError> {
        verify(
            store,
            max_attempts,
            AccountRole::Candidate,
            OtpPurpose::VerifyEmail,
            EMAIL,
            code,
        )
        .await
    }

    fn wrong(code: &str) -> String {
        let other = if code == "000000" { "000001" } else { "000000" };
        other.to_string()
    }

    #[test]
    fn test_generated_codes_are_six_digits() {
        for _ in 0..200 {
            let code = generate_code();
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_key_layout() {
        assert_eq!(
            otp_key(AccountRole::Employer, OtpPurpose::ResetPassword, "hr@acme.io"),
            "otp:employer:reset_password:hr@acme.io"
        );
    }

    #[test]
    fn test_script_replies_map_to_checks() {
        assert_eq!(check_from_reply(-1), OtpCheck::Missing);
        assert_eq!(check_from_reply(0), OtpCheck::Accepted);
        assert_eq!(check_from_reply(3), OtpCheck::Rejected { attempts: 3 });
        assert_eq!(check_from_reply(-2), OtpCheck::Exhausted);
    }

    #[tokio::test]
    async fn test_never_requested_code_is_rejected() {
        let store = MemoryOtpStore::default();
        let err = submit(&store, "123456", 5).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m.contains("expired")));
    }

    #[tokio::test]
    async fn test_code_is_single_use() {
        let store = MemoryOtpStore::default();
        let code = issued(&store).await;

        submit(&store, &format!(" {code} "), 5).await.unwrap();
        assert!(store.record(&key()).is_none());

        let err = submit(&store, &code, 5).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_wrong_code_counts_attempt_and_keeps_expiry() {
        let store = MemoryOtpStore::default();
        let code = issued(&store).await;
        let expires_at = store.expires_at(&key());

        let err = submit(&store, &wrong(&code), 5).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m == "Incorrect code"));
        assert_eq!(store.record(&key()).unwrap().attempts, 1);
        assert_eq!(store.expires_at(&key()), expires_at);

        submit(&store, &code, 5).await.unwrap();
    }

    #[tokio::test]
    async fn test_exhaustion_deletes_the_code() {
        let store = MemoryOtpStore::default();
        let code = issued(&store).await;

        for _ in 0..2 {
            assert!(matches!(
                submit(&store, &wrong(&code), 3).await,
                Err(AppError::Validation(_))
            ));
        }
        let err = submit(&store, &wrong(&code), 3).await.unwrap_err();
        assert!(matches!(err, AppError::TooManyRequests(_)));
        assert!(store.record(&key()).is_none());

        // The right code no longer helps once the record is gone.
        let err = submit(&store, &code, 3).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_reissue_replaces_outstanding_code() {
        let store = MemoryOtpStore::default();
        let first = issued(&store).await;
        let _ = submit(&store, &wrong(&first), 5).await;

        let second = issued(&store).await;
        assert_eq!(store.record(&key()).unwrap().attempts, 0);
        if first != second {
            assert!(submit(&store, &first, 5).await.is_err());
        }
        submit(&store, &second, 5).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_code_is_rejected() {
        let store = MemoryOtpStore::default();
        let code = issued(&store).await;

        tokio::time::advance(Duration::from_secs(601)).await;
        let err = submit(&store, &code, 5).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m.contains("expired")));
    }

    /// Needs a Redis server at `REDIS_URL` (default `redis://127.0.0.1:6379`).
    #[tokio::test]
    #[ignore]
    async fn test_redis_store_counts_parallel_guesses() {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());
        let store = RedisOtpStore::new(redis::Client::open(url).unwrap());
        let key = format!("otp:test:{}", generate_code());
        let record = OtpRecord {
            code: "424242".to_string(),
            attempts: 0,
            created_at: Utc::now(),
        };
        store.put(&key, &record, 60).await.unwrap();

        let guesses: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                let key = key.clone();
                tokio::spawn(async move { store.check(&key, "000000", 10).await.unwrap() })
            })
            .collect();
        let mut counts = Vec::new();
        for guess in guesses {
            match guess.await.unwrap() {
                OtpCheck::Rejected { attempts } => counts.push(attempts),
                other => panic!("expected rejection, got {other:?}"),
            }
        }
        counts.sort_unstable();
        assert_eq!(counts, vec![1, 2, 3, 4]);

        let accepted = [
            store.check(&key, "424242", 10).await.unwrap(),
            store.check(&key, "424242", 10).await.unwrap(),
        ];
        assert_eq!(accepted, [OtpCheck::Accepted, OtpCheck::Missing]);
    }
}
