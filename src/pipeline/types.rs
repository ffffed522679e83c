use std::fmt;

use serde::{Deserialize, Serialize};

/// Named stages of the crew pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    UnderstandRequirements,
    DesignAndAllocate,
    ParallelWork,
    Review,
    Commit,
}

impl StageKind {
    pub const ALL: [StageKind; 5] = [
        StageKind::UnderstandRequirements,
        StageKind::DesignAndAllocate,
        StageKind::ParallelWork,
        StageKind::Review,
        StageKind::Commit,
    ];
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StageKind::UnderstandRequirements => "understand_requirements",
            StageKind::DesignAndAllocate => "design_and_allocate",
            StageKind::ParallelWork => "parallel_work",
            StageKind::Review => "review",
            StageKind::Commit => "commit",
        };
        write!(f, "{label}")
    }
}

/// Label produced by a gate (or `Next` for unconditional edges).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Branch {
    Next,
    Clear,
    Unclear,
    AllComplete,
    Pending,
    Failed,
    Passed,
    Rejected,
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Branch::Next => "next",
            Branch::Clear => "clear",
            Branch::Unclear => "unclear",
            Branch::AllComplete => "all_complete",
            Branch::Pending => "pending",
            Branch::Failed => "failed",
            Branch::Passed => "passed",
            Branch::Rejected => "rejected",
        };
        write!(f, "{label}")
    }
}

/// Target of an edge in the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Stage(StageKind),
    End,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::Stage(stage) => write!(f, "{stage}"),
            Transition::End => write!(f, "end"),
        }
    }
}
