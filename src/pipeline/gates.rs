use super::error::GateError;
use super::state::{ProjectState, WorkStatus};
use super::types::{Branch, StageKind};

/// Pure decision over the state selecting the edge taken after a stage.
///
/// Gates must not perform I/O: the same state always yields the same branch.
pub trait Gate: Send + Sync {
    /// Every branch `evaluate` can return; the graph requires an edge for each.
    fn branches(&self) -> &'static [Branch];

    fn evaluate(&self, state: &ProjectState) -> Result<Branch, GateError>;
}

/// `Clear` exactly when well-formed requirements are present.
pub struct RequirementsGate;

impl Gate for RequirementsGate {
    fn branches(&self) -> &'static [Branch] {
        &[Branch::Clear, Branch::Unclear]
    }

    fn evaluate(&self, state: &ProjectState) -> Result<Branch, GateError> {
        if state.requirements_ready() {
            Ok(Branch::Clear)
        } else {
            Ok(Branch::Unclear)
        }
    }
}

/// `AllComplete` only when every work-item is complete. An empty task list
/// is `Pending`, failures take precedence over pending items.
pub struct WorkCompletionGate;

impl Gate for WorkCompletionGate {
    fn branches(&self) -> &'static [Branch] {
        &[Branch::AllComplete, Branch::Pending, Branch::Failed]
    }

    fn evaluate(&self, state: &ProjectState) -> Result<Branch, GateError> {
        if state.tasks.is_empty() {
            return Ok(Branch::Pending);
        }

        let any_failed = state
            .tasks
            .iter()
            .any(|item| matches!(item.status, WorkStatus::Failed { .. }));
        if any_failed {
            return Ok(Branch::Failed);
        }

        if state.tasks.iter().all(|item| item.is_complete()) {
            Ok(Branch::AllComplete)
        } else {
            Ok(Branch::Pending)
        }
    }
}

pub struct ReviewGate;

impl Gate for ReviewGate {
    fn branches(&self) -> &'static [Branch] {
        &[Branch::Passed, Branch::Rejected]
    }

    fn evaluate(&self, state: &ProjectState) -> Result<Branch, GateError> {
        let review = state.review.as_ref().ok_or(GateError::MissingField {
            stage: StageKind::Review,
            field: "review",
        })?;

        if review.passed {
            Ok(Branch::Passed)
        } else {
            Ok(Branch::Rejected)
        }
    }
}
