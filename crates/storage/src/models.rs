use crate::StoreError;
use chrono::NaiveDateTime;
use domain::{Metadata, ReviewImage, ReviewRecord, ReviewStatus};
use sqlx::FromRow;

#[derive(FromRow)]
pub struct SqlReview {
    pub id: i64,
    pub external_id: Option<i64>,
    pub page_id: i64,
    pub page_title: String,
    pub author_name: String,
    pub author_email: String,
    pub author_ip: String,
    pub body: String,
    pub rating: Option<i32>,
    pub admin_response: String,
    pub status: String,
    pub status_changed_at: NaiveDateTime,
    // JSON 文本列
    pub metadata: Option<String>,
    pub images: Option<String>,
    pub flagged: bool,
    pub submitted_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<SqlReview> for ReviewRecord {
    type Error = StoreError;

    fn try_from(sql: SqlReview) -> Result<Self, StoreError> {
        let status = ReviewStatus::parse(&sql.status)
            .map_err(|e| StoreError::Corrupt(format!("review {}: {}", sql.id, e)))?;
        let images: Vec<ReviewImage> = match sql.images.as_deref() {
            Some(raw) if !raw.is_empty() => serde_json::from_str(raw)
                .map_err(|e| StoreError::Corrupt(format!("review {} images: {}", sql.id, e)))?,
            _ => Vec::new(),
        };
        let metadata: Metadata = match sql.metadata.as_deref() {
            Some(raw) if !raw.is_empty() => serde_json::from_str(raw)
                .map_err(|e| StoreError::Corrupt(format!("review {} metadata: {}", sql.id, e)))?,
            _ => Metadata::new(),
        };

        Ok(ReviewRecord {
            id: sql.id,
            external_id: sql.external_id,
            page_id: sql.page_id,
            page_title: sql.page_title,
            author_name: sql.author_name,
            author_email: sql.author_email,
            author_ip: sql.author_ip,
            body: sql.body,
            rating: sql.rating,
            images,
            status,
            status_changed_at: sql.status_changed_at,
            admin_response: sql.admin_response,
            flagged: sql.flagged,
            metadata,
            submitted_at: sql.submitted_at,
            created_at: sql.created_at,
            updated_at: sql.updated_at,
        })
    }
}
