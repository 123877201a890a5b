use chrono::Utc;
use domain::{Metadata, NewReview, SourcePage, SourceRecord};
use storage::{Db, StoreError};
use tracing::debug;

/// Request context captured alongside a live-tracked review.
#[derive(Debug, Clone, Default)]
pub struct TrackContext {
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}

/// Live intake: stores a single review the moment it is submitted at the
/// source, instead of waiting for the next batch import.
#[derive(Clone)]
pub struct ReviewTracker {
    db: Db,
}

impl ReviewTracker {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Returns the new internal id, or None when the record was already
    /// tracked (the hook fires more than once at the source).
    pub async fn track(
        &self,
        record: SourceRecord,
        page: SourcePage,
        ctx: TrackContext,
    ) -> Result<Option<i64>, StoreError> {
        if self.db.exists_by_external_id(record.external_id).await? {
            debug!(external_id = record.external_id, "Already tracked, ignoring");
            return Ok(None);
        }

        let mut metadata = Metadata::new();
        metadata.insert(
            "tracked_at".into(),
            Utc::now().naive_utc().format("%Y-%m-%d %H:%M:%S").to_string().into(),
        );
        if let Some(ua) = ctx.user_agent {
            metadata.insert("user_agent".into(), ua.into());
        }
        if let Some(referrer) = ctx.referrer {
            metadata.insert("referrer".into(), referrer.into());
        }

        let id = self
            .db
            .insert_review(NewReview {
                external_id: Some(record.external_id),
                page_id: record.page_id,
                page_title: page.title,
                author_name: record.author_name,
                author_email: record.author_email,
                author_ip: record.author_ip,
                body: record.body,
                rating: record.rating,
                images: record.images,
                metadata,
                submitted_at: record.submitted_at,
            })
            .await?;
        Ok(Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::ReviewStatus;

    fn incoming(external_id: i64) -> (SourceRecord, SourcePage) {
        (
            SourceRecord {
                external_id,
                page_id: 7,
                author_name: "Piet".into(),
                author_email: "piet@example.org".into(),
                author_ip: "10.1.1.1".into(),
                body: "Net geplaatst".into(),
                submitted_at: Utc::now().naive_utc(),
                rating: None,
                images: Vec::new(),
            },
            SourcePage {
                page_id: 7,
                title: "Onderhoudspagina".into(),
            },
        )
    }

    #[tokio::test]
    async fn tracks_once_and_dedupes() {
        let db = Db::new_in_memory().await.unwrap();
        let tracker = ReviewTracker::new(db.clone());
        let (record, page) = incoming(501);

        let ctx = TrackContext {
            user_agent: Some("Mozilla/5.0".into()),
            referrer: None,
        };
        let id = tracker
            .track(record.clone(), page.clone(), ctx)
            .await
            .unwrap()
            .unwrap();

        let stored = db.get_review(id).await.unwrap().unwrap();
        assert_eq!(stored.status, ReviewStatus::Intake);
        assert_eq!(stored.external_id, Some(501));
        assert_eq!(
            stored.metadata.get("user_agent").and_then(|v| v.as_str()),
            Some("Mozilla/5.0")
        );

        // hook fired twice → second call is a no-op
        let again = tracker
            .track(record, page, TrackContext::default())
            .await
            .unwrap();
        assert!(again.is_none());
        assert_eq!(db.count_reviews().await.unwrap(), 1);
    }
}
