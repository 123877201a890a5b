use crate::error::ImportError;
use crate::traits::ReviewSource;
use chrono::Utc;
use domain::{Metadata, NewReview};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storage::{Db, StoreError};
use tracing::{info, warn};

pub const PAGE_SIZE: u64 = 50;

/// Resumable cursor, round-tripped through the caller between pages. The
/// caller drives the loop; nothing here schedules anything.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportCursor {
    pub offset: u64,
    pub total_processed: u64,
    pub total_known: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub imported: u64,
    pub skipped: u64,
    pub total_processed: u64,
    pub total_known: u64,
    pub next_offset: u64,
    pub has_more: bool,
    pub progress_percent: u8,
    pub message: String,
}

impl ImportReport {
    /// Cursor to feed back in for the next page.
    pub fn next_cursor(&self) -> ImportCursor {
        ImportCursor {
            offset: self.next_offset,
            total_processed: self.total_processed,
            total_known: self.total_known,
        }
    }
}

/// Pulls approved source records into the store, one bounded page per call.
/// Idempotent under replay: known external ids are skipped, not re-inserted.
#[derive(Clone)]
pub struct BatchImporter {
    db: Db,
    source: Arc<dyn ReviewSource>,
}

impl BatchImporter {
    pub fn new(db: Db, source: Arc<dyn ReviewSource>) -> Self {
        Self { db, source }
    }

    pub async fn run_page(&self, cursor: ImportCursor) -> Result<ImportReport, ImportError> {
        // 第一页才查权威总数，之后沿用游标里带回来的值
        let total_known = if cursor.offset == 0 {
            self.source.count_approved().await?
        } else {
            cursor.total_known
        };

        let page = self.source.fetch_page(cursor.offset, PAGE_SIZE).await?;
        let page_len = page.len() as u64;

        let mut imported = 0u64;
        let mut skipped = 0u64;

        for record in page {
            if self.db.exists_by_external_id(record.external_id).await? {
                skipped += 1;
                continue;
            }
            let Some(page_meta) = self.source.get_page(record.page_id).await? else {
                skipped += 1;
                continue;
            };

            let mut metadata = Metadata::new();
            metadata.insert(
                "imported_at".into(),
                Utc::now().naive_utc().format("%Y-%m-%d %H:%M:%S").to_string().into(),
            );
            metadata.insert("batch_import".into(), true.into());

            let new = NewReview {
                external_id: Some(record.external_id),
                page_id: record.page_id,
                page_title: page_meta.title,
                author_name: record.author_name,
                author_email: record.author_email,
                author_ip: record.author_ip,
                body: record.body,
                rating: record.rating,
                images: record.images,
                metadata,
                submitted_at: record.submitted_at,
            };

            match self.db.insert_review(new).await {
                Ok(_) => imported += 1,
                // 单条失败降级为 skipped，绝不中断整页
                Err(StoreError::Duplicate(ext)) => {
                    warn!(external_id = ext, "Import race: already present");
                    skipped += 1;
                }
                Err(e) => {
                    warn!(external_id = record.external_id, error = %e, "Import: record skipped");
                    skipped += 1;
                }
            }
        }

        // Completion is detected by a short page, not by comparing totals.
        let has_more = page_len == PAGE_SIZE;
        let total_processed = cursor.total_processed + imported + skipped;
        let next_offset = cursor.offset + PAGE_SIZE;
        let progress_percent = if total_known > 0 {
            (next_offset.min(total_known) * 100 / total_known) as u8
        } else {
            100
        };

        let message = if has_more {
            format!(
                "Importing... {} of {} records processed",
                next_offset.min(total_known),
                total_known
            )
        } else {
            self.db.mark_import_completed(Utc::now().naive_utc()).await?;
            info!(total_processed, imported, skipped, "Import run completed");
            format!(
                "Import completed: {} records processed, {} imported on the final page",
                total_processed, imported
            )
        };

        Ok(ImportReport {
            imported,
            skipped,
            total_processed,
            total_known,
            next_offset,
            has_more,
            progress_percent,
            message,
        })
    }
}
