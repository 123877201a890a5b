use crate::status::ReviewStatus;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 自由形式的溯源信息包：只存不查
pub type Metadata = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageOrigin {
    /// `<img>` tag found inside the review body
    Embedded,
    /// Attached to the source comment as media
    Attachment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewImage {
    pub url: String,
    pub origin: ImageOrigin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub id: i64,
    /// Source-system comment id; None once the source copy is deleted,
    /// or for records that never had one.
    pub external_id: Option<i64>,
    pub page_id: i64,
    /// Denormalized snapshot of the source page title
    pub page_title: String,
    pub author_name: String,
    pub author_email: String,
    pub author_ip: String,
    /// Normalized body text, see `normalize::normalize_body`
    pub body: String,
    pub rating: Option<i32>,
    pub images: Vec<ReviewImage>,
    pub status: ReviewStatus,
    pub status_changed_at: NaiveDateTime,
    pub admin_response: String,
    pub flagged: bool,
    pub metadata: Metadata,
    /// When the underlying review was authored (not when we stored it)
    pub submitted_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ReviewRecord {
    pub fn has_response(&self) -> bool {
        !self.admin_response.trim().is_empty()
    }
}

/// Insert payload for the store. Body arrives raw and is normalized on
/// insert; an empty `images` list triggers embedded-image detection.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub external_id: Option<i64>,
    pub page_id: i64,
    pub page_title: String,
    pub author_name: String,
    pub author_email: String,
    pub author_ip: String,
    pub body: String,
    pub rating: Option<i32>,
    pub images: Vec<ReviewImage>,
    pub metadata: Metadata,
    pub submitted_at: NaiveDateTime,
}

/// One record as delivered by the external review source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRecord {
    pub external_id: i64,
    pub page_id: i64,
    pub author_name: String,
    pub author_email: String,
    pub author_ip: String,
    pub body: String,
    pub submitted_at: NaiveDateTime,
    pub rating: Option<i32>,
    pub images: Vec<ReviewImage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePage {
    pub page_id: i64,
    pub title: String,
}

/// Partial update applied through `Db::update_review`. None = leave untouched.
#[derive(Debug, Clone, Default)]
pub struct ReviewPatch {
    pub body: Option<String>,
    pub admin_response: Option<String>,
    pub status: Option<ReviewStatus>,
    pub flagged: Option<bool>,
    pub images: Option<Vec<ReviewImage>>,
    pub metadata: Option<Metadata>,
}

impl ReviewPatch {
    pub fn is_empty(&self) -> bool {
        self.body.is_none()
            && self.admin_response.is_none()
            && self.status.is_none()
            && self.flagged.is_none()
            && self.images.is_none()
            && self.metadata.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    SubmittedAt,
    AuthorName,
    PageTitle,
    Rating,
    StatusChangedAt,
}

impl SortField {
    /// 列名白名单：排序字段绝不能直接拼接用户输入
    pub fn column(self) -> &'static str {
        match self {
            SortField::SubmittedAt => "submitted_at",
            SortField::AuthorName => "author_name",
            SortField::PageTitle => "page_title",
            SortField::Rating => "rating",
            SortField::StatusChangedAt => "status_changed_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    pub fn keyword(self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}
