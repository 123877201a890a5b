use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Intake,
    ReadyForExport,
    Completed,
}

impl ReviewStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewStatus::Intake => "intake",
            ReviewStatus::ReadyForExport => "ready_for_export",
            ReviewStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "intake" => Ok(ReviewStatus::Intake),
            "ready_for_export" => Ok(ReviewStatus::ReadyForExport),
            "completed" => Ok(ReviewStatus::Completed),
            other => Err(format!("Unknown review status: '{}'", other)),
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowAction {
    AdvanceToExport,
    AdvanceToCompleted,
    RevertToIntake,
    RevertToExport,
}

impl WorkflowAction {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowAction::AdvanceToExport => "advance_to_export",
            WorkflowAction::AdvanceToCompleted => "advance_to_completed",
            WorkflowAction::RevertToIntake => "revert_to_intake",
            WorkflowAction::RevertToExport => "revert_to_export",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "advance_to_export" => Ok(WorkflowAction::AdvanceToExport),
            "advance_to_completed" => Ok(WorkflowAction::AdvanceToCompleted),
            "revert_to_intake" => Ok(WorkflowAction::RevertToIntake),
            "revert_to_export" => Ok(WorkflowAction::RevertToExport),
            other => Err(format!("Unknown workflow action: '{}'", other)),
        }
    }

    pub fn target(self) -> ReviewStatus {
        match self {
            WorkflowAction::AdvanceToExport => ReviewStatus::ReadyForExport,
            WorkflowAction::AdvanceToCompleted => ReviewStatus::Completed,
            WorkflowAction::RevertToIntake => ReviewStatus::Intake,
            WorkflowAction::RevertToExport => ReviewStatus::ReadyForExport,
        }
    }

    /// 状态机不是严格线性的：ready_for_export 可以从两侧到达，
    /// 被打回的记录可以一路退回 intake 再重新前进。
    pub fn allowed_from(self, from: ReviewStatus) -> bool {
        matches!(
            (self, from),
            (WorkflowAction::AdvanceToExport, ReviewStatus::Intake)
                | (WorkflowAction::AdvanceToExport, ReviewStatus::Completed)
                | (WorkflowAction::AdvanceToCompleted, ReviewStatus::ReadyForExport)
                | (WorkflowAction::RevertToIntake, ReviewStatus::ReadyForExport)
                | (WorkflowAction::RevertToExport, ReviewStatus::Completed)
        )
    }

    /// advance_to_export is the single gate where the non-empty-response
    /// precondition is enforced, whichever state we advance from.
    pub fn requires_response(self) -> bool {
        matches!(self, WorkflowAction::AdvanceToExport)
    }

    pub fn check(self, from: ReviewStatus) -> Result<ReviewStatus, TransitionError> {
        if !self.allowed_from(from) {
            return Err(TransitionError { action: self, from });
        }
        Ok(self.target())
    }
}

impl fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Action '{action}' is not valid from status '{from}'")]
pub struct TransitionError {
    pub action: WorkflowAction,
    pub from: ReviewStatus,
}
