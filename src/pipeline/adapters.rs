use std::fmt::Write as _;

use anyhow::Result;
use async_trait::async_trait;

use super::state::{
    Clarification, ProjectState, RequirementsRecord, WorkItem, WorkItemId, WorkStatus,
};

/// What the collector sees on each attempt at gathering requirements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementsBrief {
    pub input: String,
    pub issues: Vec<String>,
    pub clarifications: Vec<Clarification>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssues {
    pub issues: Vec<String>,
    /// Question for the human in the loop, if the validator has one.
    pub question: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequirementsVerdict {
    Valid(RequirementsRecord),
    Issues(ValidationIssues),
}

/// Agent-conversation subsystem: gathers, validates and condenses requirements.
#[async_trait]
pub trait Collaborator: Send + Sync {
    async fn collect_requirements(&self, brief: &RequirementsBrief) -> Result<RequirementsRecord>;

    async fn validate_requirements(
        &self,
        record: &RequirementsRecord,
    ) -> Result<RequirementsVerdict>;

    async fn optimize_prompt(&self, record: &RequirementsRecord) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItemDraft {
    pub title: String,
    pub description: String,
}

#[async_trait]
pub trait TaskDesigner: Send + Sync {
    async fn design(
        &self,
        requirements: &RequirementsRecord,
        prompt: &str,
        feedback: Option<&str>,
    ) -> Result<Vec<WorkItemDraft>>;
}

/// Shared, read-only context for every work-item of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkBrief {
    pub requirements: RequirementsRecord,
    pub prompt: String,
}

#[async_trait]
pub trait WorkExecutor: Send + Sync {
    async fn execute(&self, item: &WorkItem, brief: &WorkBrief) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewVerdict {
    pub passed: bool,
    pub feedback: Option<String>,
    pub rework: Vec<WorkItemId>,
}

#[async_trait]
pub trait Reviewer: Send + Sync {
    async fn review(&self, state: &ProjectState) -> Result<ReviewVerdict>;
}

#[async_trait]
pub trait Committer: Send + Sync {
    async fn commit(&self, state: &ProjectState) -> Result<String>;
}

/// Human in the loop: answers a clarifying question, or declines with `None`.
#[async_trait]
pub trait ClarificationResolver: Send + Sync {
    async fn resolve(&self, question: &str, issues: &[String]) -> Result<Option<String>>;
}

/// Resolver for non-interactive runs.
pub struct NoClarifier;

#[async_trait]
impl ClarificationResolver for NoClarifier {
    async fn resolve(&self, _question: &str, _issues: &[String]) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Committer that renders the final markdown report.
pub struct ReportCommitter;

#[async_trait]
impl Committer for ReportCommitter {
    async fn commit(&self, state: &ProjectState) -> Result<String> {
        Ok(render_report(state))
    }
}

pub fn render_report(state: &ProjectState) -> String {
    let mut report = String::new();
    let _ = writeln!(report, "# {}", state.input.trim());

    if let Some(requirements) = &state.requirements {
        let _ = writeln!(report, "\n## Requirements\n");
        let _ = writeln!(report, "- Language: {}", requirements.language);
        let _ = writeln!(report, "- Project path: {}", requirements.project_path);
        if let Some(url) = &requirements.repository_url {
            let _ = writeln!(report, "- Repository: {url}");
        }
        if !requirements.libraries.is_empty() {
            let _ = writeln!(report, "- Libraries: {}", requirements.libraries.join(", "));
        }
        if let Some(scope) = &requirements.implementation_scope {
            let _ = writeln!(report, "- Scope: {scope}");
        }
        let _ = writeln!(report, "- Expected outcome: {}", requirements.expected_outcome);
    }

    if let Some(prompt) = &state.task {
        let _ = writeln!(report, "\n## Prompt\n\n{}", prompt.trim());
    }

    if !state.tasks.is_empty() {
        let _ = writeln!(report, "\n## Work items");
        for (index, item) in state.tasks.iter().enumerate() {
            let _ = writeln!(report, "\n### {}. {} (`{}`)\n", index + 1, item.title, item.id);
            match (&item.status, &item.output) {
                (WorkStatus::Complete, Some(output)) => {
                    let _ = writeln!(report, "{}", output.trim());
                }
                (WorkStatus::Failed { reason }, _) => {
                    let _ = writeln!(report, "_failed: {reason}_");
                }
                _ => {
                    let _ = writeln!(report, "_no output_");
                }
            }
        }
    }

    if let Some(review) = &state.review {
        let _ = writeln!(report, "\n## Review (round {})\n", review.round);
        let verdict = if review.passed { "passed" } else { "rejected" };
        let _ = writeln!(report, "Verdict: {verdict}");
        if let Some(feedback) = &review.feedback {
            let _ = writeln!(report, "\n{}", feedback.trim());
        }
    }

    report
}
