use crate::error::WorkflowError;
use crate::traits::ReviewSource;
use domain::{ReviewPatch, ReviewStatus, WorkflowAction};
use std::sync::Arc;
use storage::Db;
use tracing::info;

/// Single-record state transitions. Validation happens here; the store only
/// ever sees statuses this component has approved.
#[derive(Clone)]
pub struct StatusWorkflow {
    db: Db,
    source: Arc<dyn ReviewSource>,
}

impl StatusWorkflow {
    pub fn new(db: Db, source: Arc<dyn ReviewSource>) -> Self {
        Self { db, source }
    }

    pub async fn apply(
        &self,
        id: i64,
        action: WorkflowAction,
    ) -> Result<ReviewStatus, WorkflowError> {
        let record = self
            .db
            .get_review(id)
            .await?
            .ok_or(WorkflowError::RecordNotFound(id))?;

        let target = action.check(record.status)?;

        if action.requires_response() && !record.has_response() {
            return Err(WorkflowError::PreconditionFailed(format!(
                "Review {} needs an admin response before it can move to '{}'",
                id,
                target.as_str()
            )));
        }

        self.db
            .update_review(
                id,
                ReviewPatch {
                    status: Some(target),
                    ..Default::default()
                },
            )
            .await?;

        info!(id, action = %action, from = %record.status, to = %target, "Status changed");
        Ok(target)
    }

    /// Deletes the *source-system* copy of a completed review, then clears its
    /// external id. One-way, and independent of the transition table above.
    pub async fn delete_source_copy(&self, id: i64) -> Result<(), WorkflowError> {
        let record = self
            .db
            .get_review(id)
            .await?
            .ok_or(WorkflowError::RecordNotFound(id))?;

        if record.status != ReviewStatus::Completed {
            return Err(WorkflowError::PreconditionFailed(format!(
                "Review {} is '{}' — only completed reviews may lose their source copy",
                id,
                record.status.as_str()
            )));
        }
        let Some(external_id) = record.external_id else {
            return Err(WorkflowError::PreconditionFailed(format!(
                "Review {} has no source copy left to delete",
                id
            )));
        };

        self.source.delete_record(external_id).await?;
        self.db.clear_external_id(id).await?;
        info!(id, external_id, "Source copy deleted");
        Ok(())
    }
}
