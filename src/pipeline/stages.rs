use std::sync::Arc;

use anyhow::bail;
use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::adapters::{
    ClarificationResolver, Collaborator, Committer, RequirementsBrief, RequirementsVerdict,
    Reviewer, TaskDesigner, WorkBrief, WorkExecutor,
};
use super::context::StageContext;
use super::error::StageError;
use super::state::{Clarification, ProjectState, RequirementsRecord, ReviewResult, WorkItem};
use super::types::StageKind;
use super::worker::{WorkerPool, merge_outcomes, reopen_for_review};

/// A named step of the pipeline. Receives a read view of the state and
/// returns its replacement; only the fields the stage owns may differ.
#[async_trait]
pub trait Stage: Send + Sync {
    fn kind(&self) -> StageKind;

    async fn execute(
        &self,
        state: &ProjectState,
        ctx: &StageContext,
    ) -> Result<ProjectState, StageError>;
}

fn require_requirements(state: &ProjectState) -> Result<&RequirementsRecord, StageError> {
    state
        .requirements
        .as_ref()
        .filter(|requirements| requirements.is_well_formed())
        .ok_or(StageError::MissingField {
            field: "requirements",
            producer: StageKind::UnderstandRequirements,
        })
}

fn prompt_for(state: &ProjectState) -> String {
    state.task.clone().unwrap_or_else(|| state.input.clone())
}

/// Collects, validates and condenses requirements. Owns `requirements`,
/// `requirement_issues`, `clarifications` and `task`.
pub struct UnderstandRequirementsStage {
    collaborator: Arc<dyn Collaborator>,
    clarifier: Arc<dyn ClarificationResolver>,
}

impl UnderstandRequirementsStage {
    pub fn new(
        collaborator: Arc<dyn Collaborator>,
        clarifier: Arc<dyn ClarificationResolver>,
    ) -> Self {
        Self {
            collaborator,
            clarifier,
        }
    }

    async fn record_issues(
        &self,
        ctx: &StageContext,
        next: &mut ProjectState,
        issues: Vec<String>,
        question: Option<String>,
    ) -> Result<(), StageError> {
        warn!(issues = issues.len(), "requirements are not clear yet");
        next.requirements = None;

        let question = question.unwrap_or_else(|| {
            format!(
                "Please clarify the following before we continue: {}",
                issues.join("; ")
            )
        });

        let answer = ctx
            .clarify(self.clarifier.as_ref(), &question, &issues)
            .await?;

        if let Some(answer) = answer.filter(|answer| !answer.trim().is_empty()) {
            next.clarifications.push(Clarification {
                question,
                answer: answer.trim().to_string(),
            });
        }

        next.requirement_issues = issues;
        Ok(())
    }
}

#[async_trait]
impl Stage for UnderstandRequirementsStage {
    fn kind(&self) -> StageKind {
        StageKind::UnderstandRequirements
    }

    async fn execute(
        &self,
        state: &ProjectState,
        ctx: &StageContext,
    ) -> Result<ProjectState, StageError> {
        let mut next = state.clone();
        let brief = RequirementsBrief {
            input: state.input.clone(),
            issues: state.requirement_issues.clone(),
            clarifications: state.clarifications.clone(),
        };

        let draft = ctx
            .call("collect_requirements", || {
                self.collaborator.collect_requirements(&brief)
            })
            .await?;

        let verdict = ctx
            .call("validate_requirements", || {
                self.collaborator.validate_requirements(&draft)
            })
            .await?;

        let record = match verdict {
            RequirementsVerdict::Valid(record) => record,
            RequirementsVerdict::Issues(issues) => {
                self.record_issues(ctx, &mut next, issues.issues, issues.question)
                    .await?;
                return Ok(next);
            }
        };

        let missing = record.missing_fields();
        if !missing.is_empty() {
            let issues = missing
                .iter()
                .map(|field| format!("`{field}` is required"))
                .collect();
            self.record_issues(ctx, &mut next, issues, None).await?;
            return Ok(next);
        }

        let prompt = ctx
            .call("optimize_prompt", || self.collaborator.optimize_prompt(&record))
            .await?;

        info!(language = %record.language, "requirements are clear");
        next.requirements = Some(record);
        next.requirement_issues.clear();
        next.task = Some(prompt);
        Ok(next)
    }
}

/// Breaks the requirements into work-items. Owns `tasks`.
pub struct DesignAndAllocateStage {
    designer: Arc<dyn TaskDesigner>,
}

impl DesignAndAllocateStage {
    pub fn new(designer: Arc<dyn TaskDesigner>) -> Self {
        Self { designer }
    }
}

#[async_trait]
impl Stage for DesignAndAllocateStage {
    fn kind(&self) -> StageKind {
        StageKind::DesignAndAllocate
    }

    async fn execute(
        &self,
        state: &ProjectState,
        ctx: &StageContext,
    ) -> Result<ProjectState, StageError> {
        let requirements = require_requirements(state)?;
        let prompt = prompt_for(state);
        let feedback = state
            .review
            .as_ref()
            .filter(|review| !review.passed)
            .and_then(|review| review.feedback.as_deref());

        let designer = self.designer.as_ref();
        let prompt = prompt.as_str();
        let drafts = ctx
            .call("design_tasks", move || async move {
                let drafts = designer.design(requirements, prompt, feedback).await?;
                if drafts.is_empty() {
                    bail!("designer returned no work-items");
                }
                Ok(drafts)
            })
            .await?;

        let revision = state.review_round();
        let mut next = state.clone();
        next.tasks = drafts
            .into_iter()
            .enumerate()
            .map(|(index, draft)| {
                WorkItem::new(
                    format!("task-{}", index + 1),
                    draft.title,
                    draft.description,
                    revision,
                )
            })
            .collect();

        info!(tasks = next.tasks.len(), "work allocated");
        Ok(next)
    }
}

/// Executes every open work-item on a bounded worker pool. Owns the status,
/// output and attempt count of each item in `tasks`.
pub struct ParallelWorkStage {
    executor: Arc<dyn WorkExecutor>,
}

impl ParallelWorkStage {
    pub fn new(executor: Arc<dyn WorkExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl Stage for ParallelWorkStage {
    fn kind(&self) -> StageKind {
        StageKind::ParallelWork
    }

    async fn execute(
        &self,
        state: &ProjectState,
        ctx: &StageContext,
    ) -> Result<ProjectState, StageError> {
        if state.tasks.is_empty() {
            return Err(StageError::MissingField {
                field: "tasks",
                producer: StageKind::DesignAndAllocate,
            });
        }
        let requirements = require_requirements(state)?;

        let mut tasks = state.tasks.clone();
        let reopened = reopen_for_review(&mut tasks, state.review.as_ref());
        if reopened > 0 {
            info!(reopened, "reopened work-items after review");
        }

        let open: Vec<WorkItem> = tasks
            .iter()
            .filter(|item| !item.is_complete())
            .cloned()
            .collect();
        debug!(open = open.len(), total = tasks.len(), "dispatching work");

        let brief = Arc::new(WorkBrief {
            requirements: requirements.clone(),
            prompt: prompt_for(state),
        });
        let pool = WorkerPool::new(ctx.settings.worker_pool_size, ctx.timeout(), ctx.retry);
        let outcomes = pool
            .dispatch(open, self.executor.clone(), brief, &ctx.cancel)
            .await;

        merge_outcomes(&mut tasks, outcomes);

        let mut next = state.clone();
        next.tasks = tasks;
        let summary = next.work_summary();
        info!(
            complete = summary.complete,
            pending = summary.pending,
            failed = summary.failed,
            "work pass finished"
        );
        Ok(next)
    }
}

/// Reviews the completed work. Owns `review`.
pub struct ReviewStage {
    reviewer: Arc<dyn Reviewer>,
}

impl ReviewStage {
    pub fn new(reviewer: Arc<dyn Reviewer>) -> Self {
        Self { reviewer }
    }
}

#[async_trait]
impl Stage for ReviewStage {
    fn kind(&self) -> StageKind {
        StageKind::Review
    }

    async fn execute(
        &self,
        state: &ProjectState,
        ctx: &StageContext,
    ) -> Result<ProjectState, StageError> {
        if state.tasks.is_empty() {
            return Err(StageError::MissingField {
                field: "tasks",
                producer: StageKind::DesignAndAllocate,
            });
        }

        let verdict = ctx
            .call("review_work", || self.reviewer.review(state))
            .await?;

        let round = state.review_round() + 1;
        info!(round, passed = verdict.passed, "review finished");

        let mut next = state.clone();
        next.review = Some(ReviewResult {
            passed: verdict.passed,
            feedback: verdict.feedback,
            rework: verdict.rework,
            round,
        });
        Ok(next)
    }
}

/// Produces the final artifact. Owns `output`.
pub struct CommitStage {
    committer: Arc<dyn Committer>,
}

impl CommitStage {
    pub fn new(committer: Arc<dyn Committer>) -> Self {
        Self { committer }
    }
}

#[async_trait]
impl Stage for CommitStage {
    fn kind(&self) -> StageKind {
        StageKind::Commit
    }

    async fn execute(
        &self,
        state: &ProjectState,
        ctx: &StageContext,
    ) -> Result<ProjectState, StageError> {
        let output = ctx
            .call("commit", || self.committer.commit(state))
            .await?;

        let mut next = state.clone();
        next.output = Some(output);
        Ok(next)
    }
}
