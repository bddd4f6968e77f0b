use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeUploadRow {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub file_name: String,
    pub file_kind: String,
    pub extraction_method: String,
    pub s3_key: String,
    pub char_count: i32,
    pub created_at: DateTime<Utc>,
}
