use crate::{models::SqlReview, Db, StoreError};
use chrono::{NaiveDateTime, Utc};
use domain::{
    normalize, NewReview, ReviewPatch, ReviewRecord, ReviewStatus, SortDir, SortField, SourcePage,
};
use sqlx::{QueryBuilder, Row, Sqlite};

#[derive(Debug, Clone)]
pub struct ListQuery {
    pub status: ReviewStatus,
    pub page_id: Option<i64>,
    pub sort: SortField,
    pub dir: SortDir,
}

impl ListQuery {
    /// 默认按提交时间倒序
    pub fn new(status: ReviewStatus) -> Self {
        Self {
            status,
            page_id: None,
            sort: SortField::SubmittedAt,
            dir: SortDir::Desc,
        }
    }

    pub fn page(mut self, page_id: i64) -> Self {
        self.page_id = Some(page_id);
        self
    }

    pub fn sort(mut self, field: SortField, dir: SortDir) -> Self {
        self.sort = field;
        self.dir = dir;
        self
    }
}

impl Db {
    pub async fn insert_review(&self, new: NewReview) -> Result<i64, StoreError> {
        if new.page_id <= 0 {
            return Err(StoreError::Validation("page_id is required".into()));
        }
        if let Some(r) = new.rating {
            if !(1..=5).contains(&r) {
                return Err(StoreError::Validation(format!(
                    "rating {} out of range 1-5",
                    r
                )));
            }
        }
        if let Some(ext) = new.external_id {
            if self.exists_by_external_id(ext).await? {
                return Err(StoreError::Duplicate(ext));
            }
        }

        // 先从原始 body 检测内嵌图片，再做剥离
        let images = if new.images.is_empty() {
            normalize::detect_embedded_images(&new.body)
        } else {
            new.images
        };
        let body = normalize::normalize_body(&new.body);

        let images_json = if images.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&images).map_err(|e| {
                StoreError::Validation(format!("images not serializable: {}", e))
            })?)
        };
        let metadata_json = if new.metadata.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&new.metadata).map_err(|e| {
                StoreError::Validation(format!("metadata not serializable: {}", e))
            })?)
        };

        let now = Utc::now().naive_utc();
        let result = sqlx::query(
            r#"
            INSERT INTO reviews (
                external_id, page_id, page_title,
                author_name, author_email, author_ip,
                body, rating, admin_response,
                status, status_changed_at,
                metadata, images, flagged,
                submitted_at, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, '', ?, ?, ?, ?, 0, ?, ?, ?)
            "#,
        )
        .bind(new.external_id)
        .bind(new.page_id)
        .bind(&new.page_title)
        .bind(&new.author_name)
        .bind(&new.author_email)
        .bind(&new.author_ip)
        .bind(&body)
        .bind(new.rating)
        .bind(ReviewStatus::Intake.as_str())
        .bind(now)
        .bind(metadata_json)
        .bind(images_json)
        .bind(new.submitted_at)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            // 并发插入同一 external_id 时兜底在唯一索引上
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Duplicate(new.external_id.unwrap_or_default())
            }
            _ => StoreError::Database(e),
        })?;

        Ok(result.last_insert_rowid())
    }

    pub async fn get_review(&self, id: i64) -> Result<Option<ReviewRecord>, StoreError> {
        let row = sqlx::query_as::<_, SqlReview>("SELECT * FROM reviews WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(TryInto::try_into).transpose()
    }

    /// Partial update. A `status` field in the patch atomically moves
    /// `status_changed_at` along with it; nothing else touches that column.
    pub async fn update_review(&self, id: i64, patch: ReviewPatch) -> Result<u64, StoreError> {
        if patch.is_empty() {
            return Err(StoreError::Validation("empty update".into()));
        }

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("UPDATE reviews SET updated_at = CURRENT_TIMESTAMP");
        if let Some(body) = &patch.body {
            qb.push(", body = ")
                .push_bind(normalize::normalize_body(body));
        }
        if let Some(response) = &patch.admin_response {
            qb.push(", admin_response = ").push_bind(response.clone());
        }
        if let Some(status) = patch.status {
            qb.push(", status = ").push_bind(status.as_str());
            qb.push(", status_changed_at = ")
                .push_bind(Utc::now().naive_utc());
        }
        if let Some(flagged) = patch.flagged {
            qb.push(", flagged = ").push_bind(flagged);
        }
        if let Some(images) = &patch.images {
            let json = serde_json::to_string(images)
                .map_err(|e| StoreError::Validation(format!("images not serializable: {}", e)))?;
            qb.push(", images = ").push_bind(json);
        }
        if let Some(metadata) = &patch.metadata {
            let json = serde_json::to_string(metadata)
                .map_err(|e| StoreError::Validation(format!("metadata not serializable: {}", e)))?;
            qb.push(", metadata = ").push_bind(json);
        }
        qb.push(" WHERE id = ").push_bind(id);

        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_review(&self, id: i64) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_reviews(&self, query: &ListQuery) -> Result<Vec<ReviewRecord>, StoreError> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM reviews WHERE status = ");
        qb.push_bind(query.status.as_str());
        if let Some(page_id) = query.page_id {
            qb.push(" AND page_id = ").push_bind(page_id);
        }
        // 排序列来自白名单，不是用户输入
        qb.push(format!(
            " ORDER BY {} {}",
            query.sort.column(),
            query.dir.keyword()
        ));

        let rows: Vec<SqlReview> = qb.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Feed for the export renderer: everything ready for export, grouped by
    /// page title, oldest review first within a page.
    pub async fn list_export_feed(&self) -> Result<Vec<ReviewRecord>, StoreError> {
        let rows: Vec<SqlReview> = sqlx::query_as(
            "SELECT * FROM reviews WHERE status = ? ORDER BY page_title ASC, submitted_at ASC",
        )
        .bind(ReviewStatus::ReadyForExport.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    pub async fn exists_by_external_id(&self, external_id: i64) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT 1 FROM reviews WHERE external_id = ?")
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    pub async fn distinct_source_pages(
        &self,
        status: Option<ReviewStatus>,
    ) -> Result<Vec<SourcePage>, StoreError> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT DISTINCT page_id, page_title FROM reviews");
        if let Some(status) = status {
            qb.push(" WHERE status = ").push_bind(status.as_str());
        }
        qb.push(" ORDER BY page_title ASC");

        let rows = qb.build().fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|r| SourcePage {
                page_id: r.get(0),
                title: r.get(1),
            })
            .collect())
    }

    /// Single-statement bulk move; per-id eligibility is the caller's job.
    pub async fn bulk_set_status(
        &self,
        ids: &[i64],
        status: ReviewStatus,
    ) -> Result<u64, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE reviews SET status = ");
        qb.push_bind(status.as_str());
        qb.push(", status_changed_at = ")
            .push_bind(Utc::now().naive_utc());
        qb.push(", updated_at = CURRENT_TIMESTAMP WHERE id IN (");
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        qb.push(")");

        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// One-way: records that the source-system copy of this review is gone.
    pub async fn clear_external_id(&self, id: i64) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE reviews SET external_id = NULL, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn count_by_status(&self, status: ReviewStatus) -> Result<i64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) FROM reviews WHERE status = ?")
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get(0))
    }

    pub async fn count_reviews(&self) -> Result<i64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) FROM reviews")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get(0))
    }

    /// Maintenance: drop completed records whose status change predates the cutoff.
    pub async fn purge_completed_before(
        &self,
        cutoff: NaiveDateTime,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "DELETE FROM reviews WHERE status = ? AND status_changed_at < ?",
        )
        .bind(ReviewStatus::Completed.as_str())
        .bind(cutoff)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::Metadata;

    fn sample(external_id: Option<i64>, page_id: i64, title: &str) -> NewReview {
        NewReview {
            external_id,
            page_id,
            page_title: title.to_string(),
            author_name: "Jan".into(),
            author_email: "jan@example.org".into(),
            author_ip: "127.0.0.1".into(),
            body: "<p>Prima service!</p>".into(),
            rating: Some(4),
            images: Vec::new(),
            metadata: Metadata::new(),
            submitted_at: Utc::now().naive_utc(),
        }
    }

    #[tokio::test]
    async fn insert_normalizes_and_round_trips() {
        let db = Db::new_in_memory().await.unwrap();
        let id = db
            .insert_review(sample(Some(101), 1, "Onderhoud A"))
            .await
            .unwrap();

        let rec = db.get_review(id).await.unwrap().unwrap();
        assert_eq!(rec.external_id, Some(101));
        assert_eq!(rec.body, "Prima service!");
        assert_eq!(rec.status, ReviewStatus::Intake);
        assert_eq!(rec.rating, Some(4));
        assert!(rec.admin_response.is_empty());
        assert!(!rec.flagged);
    }

    #[tokio::test]
    async fn insert_detects_embedded_images() {
        let db = Db::new_in_memory().await.unwrap();
        let mut new = sample(None, 1, "Pagina");
        new.body = r#"Mooi <img src="https://example.org/foto.jpg"> resultaat"#.into();
        let id = db.insert_review(new).await.unwrap();

        let rec = db.get_review(id).await.unwrap().unwrap();
        assert_eq!(rec.images.len(), 1);
        assert_eq!(rec.images[0].url, "https://example.org/foto.jpg");
        // the tag itself is stripped from the stored body
        assert_eq!(rec.body, "Mooi resultaat");
    }

    #[tokio::test]
    async fn duplicate_external_id_rejected() {
        let db = Db::new_in_memory().await.unwrap();
        db.insert_review(sample(Some(200), 1, "A")).await.unwrap();

        let err = db.insert_review(sample(Some(200), 2, "B")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(200)));
        assert_eq!(db.count_reviews().await.unwrap(), 1);
        assert!(db.exists_by_external_id(200).await.unwrap());
    }

    #[tokio::test]
    async fn rating_out_of_range_rejected() {
        let db = Db::new_in_memory().await.unwrap();
        let mut new = sample(None, 1, "A");
        new.rating = Some(6);
        assert!(matches!(
            db.insert_review(new).await.unwrap_err(),
            StoreError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn status_update_moves_timestamp_others_do_not() {
        let db = Db::new_in_memory().await.unwrap();
        let id = db.insert_review(sample(None, 1, "A")).await.unwrap();
        let before = db.get_review(id).await.unwrap().unwrap();

        // non-status patch leaves status_changed_at alone
        db.update_review(
            id,
            ReviewPatch {
                admin_response: Some("Bedankt voor de melding".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let after = db.get_review(id).await.unwrap().unwrap();
        assert_eq!(after.status_changed_at, before.status_changed_at);
        assert_eq!(after.admin_response, "Bedankt voor de melding");

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        db.update_review(
            id,
            ReviewPatch {
                status: Some(ReviewStatus::ReadyForExport),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let moved = db.get_review(id).await.unwrap().unwrap();
        assert_eq!(moved.status, ReviewStatus::ReadyForExport);
        assert!(moved.status_changed_at > before.status_changed_at);
    }

    #[tokio::test]
    async fn list_filters_and_sorts() {
        let db = Db::new_in_memory().await.unwrap();
        for (ext, page, title) in [(1, 10, "B-pagina"), (2, 10, "B-pagina"), (3, 20, "A-pagina")] {
            db.insert_review(sample(Some(ext), page, title)).await.unwrap();
        }

        let all = db
            .list_reviews(&ListQuery::new(ReviewStatus::Intake))
            .await
            .unwrap();
        assert_eq!(all.len(), 3);

        let page10 = db
            .list_reviews(&ListQuery::new(ReviewStatus::Intake).page(10))
            .await
            .unwrap();
        assert_eq!(page10.len(), 2);

        let by_title = db
            .list_reviews(
                &ListQuery::new(ReviewStatus::Intake).sort(SortField::PageTitle, SortDir::Asc),
            )
            .await
            .unwrap();
        assert_eq!(by_title[0].page_title, "A-pagina");

        let pages = db.distinct_source_pages(None).await.unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].title, "A-pagina");
    }

    #[tokio::test]
    async fn export_feed_orders_by_title_then_submitted() {
        let db = Db::new_in_memory().await.unwrap();
        let base = Utc::now().naive_utc();
        // 乱序插入两个页面的评论，submitted_at 各不相同
        let inserted = [
            (1, 20, "Zonnepanelen", 30),
            (2, 10, "Airco", 10),
            (3, 20, "Zonnepanelen", 5),
            (4, 10, "Airco", 60),
        ];
        for (ext, page, title, mins) in inserted {
            let mut new = sample(Some(ext), page, title);
            new.submitted_at = base + chrono::Duration::minutes(mins);
            let id = db.insert_review(new).await.unwrap();
            db.update_review(
                id,
                ReviewPatch {
                    status: Some(ReviewStatus::ReadyForExport),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        }
        // 留一条 intake，不应出现在导出里
        db.insert_review(sample(Some(5), 10, "Airco")).await.unwrap();

        let feed = db.list_export_feed().await.unwrap();
        let order: Vec<_> = feed.iter().map(|r| r.external_id.unwrap()).collect();
        // 页面标题升序，页内按提交时间升序
        assert_eq!(order, vec![2, 4, 3, 1]);
    }

    #[tokio::test]
    async fn bulk_set_status_single_statement() {
        let db = Db::new_in_memory().await.unwrap();
        let a = db.insert_review(sample(Some(1), 1, "A")).await.unwrap();
        let b = db.insert_review(sample(Some(2), 1, "A")).await.unwrap();
        let c = db.insert_review(sample(Some(3), 1, "A")).await.unwrap();

        let moved = db
            .bulk_set_status(&[a, b], ReviewStatus::ReadyForExport)
            .await
            .unwrap();
        assert_eq!(moved, 2);
        assert_eq!(
            db.count_by_status(ReviewStatus::ReadyForExport).await.unwrap(),
            2
        );
        let untouched = db.get_review(c).await.unwrap().unwrap();
        assert_eq!(untouched.status, ReviewStatus::Intake);

        assert_eq!(db.bulk_set_status(&[], ReviewStatus::Completed).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn clear_external_id_is_one_way() {
        let db = Db::new_in_memory().await.unwrap();
        let id = db.insert_review(sample(Some(55), 1, "A")).await.unwrap();
        assert_eq!(db.clear_external_id(id).await.unwrap(), 1);

        let rec = db.get_review(id).await.unwrap().unwrap();
        assert_eq!(rec.external_id, None);
        assert!(!db.exists_by_external_id(55).await.unwrap());
    }

    #[tokio::test]
    async fn purge_only_hits_old_completed() {
        let db = Db::new_in_memory().await.unwrap();
        let old = db.insert_review(sample(Some(1), 1, "A")).await.unwrap();
        let fresh = db.insert_review(sample(Some(2), 1, "A")).await.unwrap();
        db.bulk_set_status(&[old, fresh], ReviewStatus::Completed)
            .await
            .unwrap();

        // nothing is older than a year → nothing purged
        let cutoff = Utc::now().naive_utc() - chrono::Duration::days(365);
        assert_eq!(db.purge_completed_before(cutoff).await.unwrap(), 0);

        // everything is older than a future cutoff, but intake stays
        let intake = db.insert_review(sample(Some(3), 1, "A")).await.unwrap();
        let future = Utc::now().naive_utc() + chrono::Duration::days(1);
        assert_eq!(db.purge_completed_before(future).await.unwrap(), 2);
        assert!(db.get_review(intake).await.unwrap().is_some());
    }
}
