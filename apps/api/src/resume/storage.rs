use aws_sdk_s3::primitives::ByteStream;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::upload::ResumeUploadRow;
use crate::resume::extract::ExtractedText;
use crate::resume::intake::UploadedFile;

pub fn resume_key(candidate_id: Uuid, upload_id: Uuid, extension: &str) -> String {
    format!("resumes/{candidate_id}/{upload_id}.{extension}")
}

/// Uploads the original file and records it. Returns the stored row.
pub async fn store_upload(
    pool: &PgPool,
    s3: &aws_sdk_s3::Client,
    s3_bucket: &str,
    candidate_id: Uuid,
    file: &UploadedFile,
    extracted: &ExtractedText,
) -> Result<ResumeUploadRow, AppError> {
    let upload_id = Uuid::new_v4();
    let s3_key = resume_key(candidate_id, upload_id, &file.extension());

    s3.put_object()
        .bucket(s3_bucket)
        .key(&s3_key)
        .body(ByteStream::from(file.bytes.clone()))
        .content_type(
            file.content_type
                .as_deref()
                .unwrap_or("application/octet-stream"),
        )
        .send()
        .await
        .map_err(|e| AppError::S3(format!("upload of {s3_key} failed: {e}")))?;

    info!("Uploaded resume to s3://{}/{}", s3_bucket, s3_key);

    let char_count = i32::try_from(extracted.text.chars().count()).unwrap_or(i32::MAX);
    let row = sqlx::query_as::<_, ResumeUploadRow>(
        r#"
        INSERT INTO resume_uploads
            (id, candidate_id, file_name, file_kind, extraction_method, s3_key, char_count)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(upload_id)
    .bind(candidate_id)
    .bind(&file.file_name)
    .bind(file.kind.as_str())
    .bind(extracted.method.as_str())
    .bind(&s3_key)
    .bind(char_count)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

pub async fn uploads_for_candidate(
    pool: &PgPool,
    candidate_id: Uuid,
) -> Result<Vec<ResumeUploadRow>, AppError> {
    Ok(sqlx::query_as::<_, ResumeUploadRow>(
        "SELECT * FROM resume_uploads WHERE candidate_id = $1 ORDER BY created_at DESC",
    )
    .bind(candidate_id)
    .fetch_all(pool)
    .await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_key_layout() {
        let candidate = Uuid::nil();
        let upload = Uuid::from_u128(1);
        assert_eq!(
            resume_key(candidate, upload, "pdf"),
            "resumes/00000000-0000-0000-0000-000000000000/00000000-0000-0000-0000-000000000001.pdf"
        );
    }
}
