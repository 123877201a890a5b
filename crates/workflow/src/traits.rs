use crate::error::{GeneratorError, SourceError};
use async_trait::async_trait;
use domain::{SourcePage, SourceRecord};

/// The system the reviews originally live in. Only approved reviews are
/// visible through this seam.
#[async_trait]
pub trait ReviewSource: Send + Sync {
    /// Authoritative count of importable records.
    async fn count_approved(&self) -> Result<u64, SourceError>;

    /// One page, ordered by external id ascending. A short page means the
    /// end has been reached.
    async fn fetch_page(&self, offset: u64, limit: u64)
        -> Result<Vec<SourceRecord>, SourceError>;

    /// Resolves the page a review was left on; None when it no longer exists.
    async fn get_page(&self, page_id: i64) -> Result<Option<SourcePage>, SourceError>;

    /// Permanently removes the source copy of a review. Irreversible.
    async fn delete_record(&self, external_id: i64) -> Result<(), SourceError>;
}

/// Drafts a replacement admin response. The core persists whatever text comes
/// back and has no opinion on how it was produced.
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    async fn generate(
        &self,
        review_body: &str,
        current_response: &str,
    ) -> Result<String, GeneratorError>;
}
