use serde::{Deserialize, Serialize};

pub type WorkItemId = String;

/// The record threaded through every stage. Stages never mutate it in place:
/// each one receives a read view and returns a replacement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectState {
    pub input: String,
    #[serde(default)]
    pub task: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub requirements: Option<RequirementsRecord>,
    #[serde(default)]
    pub requirement_issues: Vec<String>,
    #[serde(default)]
    pub clarifications: Vec<Clarification>,
    #[serde(default)]
    pub tasks: Vec<WorkItem>,
    #[serde(default)]
    pub review: Option<ReviewResult>,
}

impl ProjectState {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            ..Self::default()
        }
    }

    /// Requirements are present and well-formed. Leftover issues from an
    /// earlier round do not hold them back.
    pub fn requirements_ready(&self) -> bool {
        self.requirements
            .as_ref()
            .is_some_and(RequirementsRecord::is_well_formed)
    }

    /// Round of the latest review, zero before any review ran.
    pub fn review_round(&self) -> u32 {
        self.review.as_ref().map_or(0, |review| review.round)
    }

    pub fn work_summary(&self) -> WorkSummary {
        let mut summary = WorkSummary::default();
        for item in &self.tasks {
            match item.status {
                WorkStatus::Pending => summary.pending += 1,
                WorkStatus::Complete => summary.complete += 1,
                WorkStatus::Failed { .. } => summary.failed += 1,
            }
        }
        summary
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkSummary {
    pub complete: usize,
    pub pending: usize,
    pub failed: usize,
}

/// Structured requirements gathered by the collaborator. Absent keys
/// deserialize blank so validation can report them; aliases accept the
/// legacy key names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequirementsRecord {
    #[serde(alias = "program_lang")]
    pub language: String,
    pub project_path: String,
    pub repository_url: Option<String>,
    #[serde(alias = "librarys")]
    pub libraries: Vec<String>,
    #[serde(alias = "implementations")]
    pub implementation_scope: Option<String>,
    #[serde(alias = "expect")]
    pub expected_outcome: String,
}

impl RequirementsRecord {
    /// Names of required fields that are blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.language.trim().is_empty() {
            missing.push("language");
        }
        if self.project_path.trim().is_empty() {
            missing.push("project_path");
        }
        if self.expected_outcome.trim().is_empty() {
            missing.push("expected_outcome");
        }
        missing
    }

    pub fn is_well_formed(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clarification {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WorkStatus {
    Pending,
    Complete,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: WorkItemId,
    pub title: String,
    pub description: String,
    pub status: WorkStatus,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub output: Option<String>,
    /// Review round this item was last (re)opened for.
    #[serde(default)]
    pub revision: u32,
    #[serde(default)]
    pub feedback: Option<String>,
}

impl WorkItem {
    pub fn new(
        id: impl Into<WorkItemId>,
        title: impl Into<String>,
        description: impl Into<String>,
        revision: u32,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            status: WorkStatus::Pending,
            attempts: 0,
            output: None,
            revision,
            feedback: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == WorkStatus::Complete
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewResult {
    pub passed: bool,
    #[serde(default)]
    pub feedback: Option<String>,
    /// Items the reviewer wants redone; empty on a rejection means all of them.
    #[serde(default)]
    pub rework: Vec<WorkItemId>,
    pub round: u32,
}
