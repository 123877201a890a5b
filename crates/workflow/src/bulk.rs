use crate::error::WorkflowError;
use crate::traits::ReviewSource;
use domain::{ReviewStatus, WorkflowAction};
use serde::Serialize;
use std::sync::Arc;
use storage::Db;
use tracing::{info, warn};

/// Outcome of `bulk_delete_source`: partial success with itemized failures.
#[derive(Debug, Clone, Serialize)]
pub struct SourceDeleteReport {
    pub succeeded: u64,
    pub errors: Vec<(i64, String)>,
}

/// Applies one action uniformly to a set of record ids.
///
/// Failure semantics differ per operation on purpose (inherited behavior):
/// `bulk_transition` is all-or-nothing, `bulk_delete_source` reports per id.
#[derive(Clone)]
pub struct BulkOperator {
    db: Db,
    source: Arc<dyn ReviewSource>,
}

impl BulkOperator {
    pub fn new(db: Db, source: Arc<dyn ReviewSource>) -> Self {
        Self { db, source }
    }

    /// Best-effort delete; only the aggregate count comes back.
    pub async fn bulk_delete(&self, ids: &[i64]) -> Result<u64, WorkflowError> {
        let mut deleted = 0u64;
        for &id in ids {
            match self.db.delete_review(id).await {
                Ok(n) => deleted += n,
                Err(e) => warn!(id, error = %e, "Bulk delete: record skipped"),
            }
        }
        info!(requested = ids.len(), deleted, "Bulk delete finished");
        Ok(deleted)
    }

    /// Moves every id through `action` in one statement.
    ///
    /// For the guarded action every record is pre-validated first; one record
    /// without a response rejects the whole batch with nothing mutated. This
    /// is stricter than the single-record transition, which only ever checks
    /// the record being moved.
    pub async fn bulk_transition(
        &self,
        ids: &[i64],
        action: WorkflowAction,
        current_status: ReviewStatus,
    ) -> Result<u64, WorkflowError> {
        if ids.is_empty() {
            return Err(WorkflowError::PreconditionFailed(
                "No records selected".into(),
            ));
        }
        let target = action.check(current_status)?;

        if action.requires_response() {
            for &id in ids {
                let record = self
                    .db
                    .get_review(id)
                    .await?
                    .ok_or(WorkflowError::RecordNotFound(id))?;
                if !record.has_response() {
                    return Err(WorkflowError::PreconditionFailed(format!(
                        "Review {} has no admin response yet; add one first",
                        id
                    )));
                }
            }
        }

        let moved = self.db.bulk_set_status(ids, target).await?;
        info!(moved, target = %target, "Bulk transition applied");
        Ok(moved)
    }

    /// Per-id source-copy deletion: ineligible ids collect an error entry,
    /// eligible ones proceed independently.
    pub async fn bulk_delete_source(
        &self,
        ids: &[i64],
    ) -> Result<SourceDeleteReport, WorkflowError> {
        let mut report = SourceDeleteReport {
            succeeded: 0,
            errors: Vec::new(),
        };

        for &id in ids {
            let record = match self.db.get_review(id).await? {
                Some(r) => r,
                None => {
                    report.errors.push((id, format!("Review {} not found", id)));
                    continue;
                }
            };
            if record.status != ReviewStatus::Completed {
                report.errors.push((
                    id,
                    format!(
                        "Review {} is '{}' — only completed reviews are eligible",
                        id,
                        record.status.as_str()
                    ),
                ));
                continue;
            }
            let Some(external_id) = record.external_id else {
                report
                    .errors
                    .push((id, format!("Review {} has no source copy", id)));
                continue;
            };

            match self.source.delete_record(external_id).await {
                Ok(()) => {
                    self.db.clear_external_id(id).await?;
                    report.succeeded += 1;
                }
                Err(e) => {
                    warn!(id, external_id, error = %e, "Source delete failed");
                    report.errors.push((id, e.to_string()));
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{seed_review, FakeSource};
    use domain::ReviewPatch;

    async fn setup() -> (Db, BulkOperator, Arc<FakeSource>) {
        let db = Db::new_in_memory().await.unwrap();
        let source = Arc::new(FakeSource::default());
        let bulk = BulkOperator::new(db.clone(), source.clone());
        (db, bulk, source)
    }

    async fn set_response(db: &Db, id: i64, text: &str) {
        db.update_review(
            id,
            ReviewPatch {
                admin_response: Some(text.into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn bulk_delete_counts_only_existing() {
        let (db, bulk, _) = setup().await;
        let a = seed_review(&db, Some(1), 1).await;
        let b = seed_review(&db, Some(2), 1).await;

        let deleted = bulk.bulk_delete(&[a, b, 9999]).await.unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(db.count_reviews().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn guarded_bulk_transition_is_all_or_nothing() {
        let (db, bulk, _) = setup().await;
        let a = seed_review(&db, Some(1), 1).await;
        let b = seed_review(&db, Some(2), 1).await;
        let c = seed_review(&db, Some(3), 1).await;
        set_response(&db, a, "ok").await;
        set_response(&db, b, "ok").await;
        // c has no response

        let err = bulk
            .bulk_transition(&[a, b, c], WorkflowAction::AdvanceToExport, ReviewStatus::Intake)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::PreconditionFailed(_)));

        // the whole set must be unmodified, including the valid ones
        for id in [a, b, c] {
            let rec = db.get_review(id).await.unwrap().unwrap();
            assert_eq!(rec.status, ReviewStatus::Intake);
        }

        set_response(&db, c, "ook ok").await;
        let moved = bulk
            .bulk_transition(&[a, b, c], WorkflowAction::AdvanceToExport, ReviewStatus::Intake)
            .await
            .unwrap();
        assert_eq!(moved, 3);
    }

    #[tokio::test]
    async fn unguarded_bulk_transition_validates_action_only() {
        let (db, bulk, _) = setup().await;
        let a = seed_review(&db, Some(1), 1).await;
        db.bulk_set_status(&[a], ReviewStatus::ReadyForExport)
            .await
            .unwrap();

        let moved = bulk
            .bulk_transition(
                &[a],
                WorkflowAction::AdvanceToCompleted,
                ReviewStatus::ReadyForExport,
            )
            .await
            .unwrap();
        assert_eq!(moved, 1);

        let err = bulk
            .bulk_transition(&[a], WorkflowAction::AdvanceToCompleted, ReviewStatus::Intake)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn delete_source_mixed_set_partial_success() {
        let (db, bulk, source) = setup().await;
        // eligible: completed with external id
        let ok1 = seed_review(&db, Some(10), 1).await;
        let ok2 = seed_review(&db, Some(11), 1).await;
        db.bulk_set_status(&[ok1, ok2], ReviewStatus::Completed)
            .await
            .unwrap();
        // wrong status
        let wrong_status = seed_review(&db, Some(12), 1).await;
        // completed but no external id left
        let no_ext = seed_review(&db, Some(13), 1).await;
        db.bulk_set_status(&[no_ext], ReviewStatus::Completed)
            .await
            .unwrap();
        db.clear_external_id(no_ext).await.unwrap();

        let report = bulk
            .bulk_delete_source(&[ok1, ok2, wrong_status, no_ext, 9999])
            .await
            .unwrap();

        assert_eq!(report.succeeded, 2);
        assert_eq!(report.errors.len(), 3);
        let failed_ids: Vec<i64> = report.errors.iter().map(|(id, _)| *id).collect();
        assert_eq!(failed_ids, vec![wrong_status, no_ext, 9999]);
        assert_eq!(source.deleted(), vec![10, 11]);
    }
}
