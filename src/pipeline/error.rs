use thiserror::Error;

use super::state::ProjectState;
use super::types::{Branch, StageKind};

/// Failure reported by a single stage execution.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("required field `{field}` is missing (produced by {producer})")]
    MissingField {
        field: &'static str,
        producer: StageKind,
    },

    #[error("{call} failed after {attempts} attempt(s): {source:#}")]
    Collaborator {
        call: &'static str,
        attempts: u32,
        #[source]
        source: anyhow::Error,
    },

    #[error("stage cancelled")]
    Cancelled,
}

#[derive(Debug, Error)]
pub enum GateError {
    #[error("gate after {stage} needs `{field}` but it is missing")]
    MissingField {
        stage: StageKind,
        field: &'static str,
    },
}

/// Construction-time problems with the transition table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("no entry stage registered")]
    MissingEntry,

    #[error("{stage} is referenced from {referenced_from} but is not registered")]
    UnknownStage {
        stage: StageKind,
        referenced_from: StageKind,
    },

    #[error("{0} can never be reached from the entry stage")]
    UnreachableState(StageKind),

    #[error("{stage} has no edge for branch `{branch}`")]
    MissingEdge { stage: StageKind, branch: Branch },

    #[error("{stage} declares an edge for `{branch}` which its gate never produces")]
    UndeclaredBranch { stage: StageKind, branch: Branch },

    #[error("no edge leads to the terminal state")]
    NoTerminal,

    #[error("no {0} adapter configured")]
    MissingAdapter(&'static str),
}

/// Terminal error of a pipeline run. Every variant raised after the run
/// started carries the last valid state snapshot.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("initial input is empty")]
    EmptyInput,

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("stage {stage} failed: {source}")]
    Stage {
        stage: StageKind,
        #[source]
        source: StageError,
        snapshot: Box<ProjectState>,
    },

    #[error("{source}")]
    Gate {
        stage: StageKind,
        #[source]
        source: GateError,
        snapshot: Box<ProjectState>,
    },

    #[error("pipeline stalled: {stage} exceeded {limit} entries")]
    Stalled {
        stage: StageKind,
        limit: u32,
        snapshot: Box<ProjectState>,
    },

    #[error("pipeline cancelled at {stage}")]
    Cancelled {
        stage: StageKind,
        snapshot: Box<ProjectState>,
    },

    #[error("no transition from {stage} on `{branch}`")]
    NoTransition {
        stage: StageKind,
        branch: Branch,
        snapshot: Box<ProjectState>,
    },

    #[error("pipeline finished without producing output")]
    MissingOutput { snapshot: Box<ProjectState> },

    #[error("failed to write checkpoint after {stage}: {source:#}")]
    Checkpoint {
        stage: StageKind,
        #[source]
        source: anyhow::Error,
        snapshot: Box<ProjectState>,
    },
}

impl PipelineError {
    pub fn snapshot(&self) -> Option<&ProjectState> {
        match self {
            PipelineError::EmptyInput | PipelineError::Graph(_) => None,
            PipelineError::Stage { snapshot, .. }
            | PipelineError::Gate { snapshot, .. }
            | PipelineError::Stalled { snapshot, .. }
            | PipelineError::Cancelled { snapshot, .. }
            | PipelineError::NoTransition { snapshot, .. }
            | PipelineError::MissingOutput { snapshot }
            | PipelineError::Checkpoint { snapshot, .. } => Some(snapshot),
        }
    }

    pub fn stage(&self) -> Option<StageKind> {
        match self {
            PipelineError::Stage { stage, .. }
            | PipelineError::Gate { stage, .. }
            | PipelineError::Stalled { stage, .. }
            | PipelineError::Cancelled { stage, .. }
            | PipelineError::NoTransition { stage, .. }
            | PipelineError::Checkpoint { stage, .. } => Some(*stage),
            PipelineError::EmptyInput
            | PipelineError::Graph(_)
            | PipelineError::MissingOutput { .. } => None,
        }
    }
}
