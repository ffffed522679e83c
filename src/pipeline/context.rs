use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::config::PipelineSettings;

use super::adapters::ClarificationResolver;
use super::cancel::CancelSignal;
use super::error::StageError;
use super::retry::{RetryPolicy, call_with_retry};
use super::state::{ProjectState, WorkItemId, WorkStatus};
use super::types::{Branch, StageKind};

/// Per-run services handed to every stage.
#[derive(Debug, Clone)]
pub struct StageContext {
    pub settings: PipelineSettings,
    pub retry: RetryPolicy,
    pub cancel: CancelSignal,
}

impl StageContext {
    pub fn new(settings: PipelineSettings, cancel: CancelSignal) -> Self {
        let retry = RetryPolicy::from(settings.retry);
        Self {
            settings,
            retry,
            cancel,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.settings.stage_timeout()
    }

    /// Calls an external collaborator with this run's timeout, retry policy
    /// and cancellation signal.
    pub async fn call<T, F, Fut>(&self, call: &'static str, operation: F) -> Result<T, StageError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        call_with_retry(call, self.retry, self.timeout(), &self.cancel, operation).await
    }

    /// Asks the human in the loop. Never retried; running out of time
    /// counts as declining the question.
    pub async fn clarify(
        &self,
        resolver: &dyn ClarificationResolver,
        question: &str,
        issues: &[String],
    ) -> Result<Option<String>, StageError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(StageError::Cancelled),
            answer = tokio::time::timeout(self.timeout(), resolver.resolve(question, issues)) => {
                match answer {
                    Ok(answer) => answer.map_err(|source| StageError::Collaborator {
                        call: "clarify_requirements",
                        attempts: 1,
                        source,
                    }),
                    Err(_) => {
                        warn!(
                            timeout_secs = self.settings.stage_timeout_secs,
                            "no clarification before the timeout, continuing without one"
                        );
                        Ok(None)
                    }
                }
            }
        }
    }
}

/// Structured audit events emitted while progressing through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    StageStarted { stage: StageKind, entry: u32 },
    StageCompleted(StageKind),
    GateEvaluated { stage: StageKind, branch: Branch },
    RecoveryRouted {
        from: StageKind,
        to: StageKind,
        field: &'static str,
    },
    WorkItemSettled { id: WorkItemId, status: WorkStatus },
    CheckpointSaved { next: Option<StageKind> },
}

/// Successful result of a pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRun {
    pub state: ProjectState,
    pub events: Vec<PipelineEvent>,
    entries: BTreeMap<StageKind, u32>,
}

impl PipelineRun {
    /// How many times `stage` was entered during the run.
    pub fn entries(&self, stage: StageKind) -> u32 {
        self.entries.get(&stage).copied().unwrap_or(0)
    }

    pub fn output(&self) -> Option<&str> {
        self.state.output.as_deref()
    }
}

/// Mutable bookkeeping owned by the orchestrator during a run.
#[derive(Debug, Default)]
pub(crate) struct RunLog {
    events: Vec<PipelineEvent>,
    entries: BTreeMap<StageKind, u32>,
}

impl RunLog {
    pub fn record(&mut self, event: PipelineEvent) {
        self.events.push(event);
    }

    pub fn entries(&self, stage: StageKind) -> u32 {
        self.entries.get(&stage).copied().unwrap_or(0)
    }

    /// Counts an entry into `stage` and returns the new total.
    pub fn enter(&mut self, stage: StageKind) -> u32 {
        let entry = self.entries.entry(stage).or_insert(0);
        *entry += 1;
        let count = *entry;
        self.record(PipelineEvent::StageStarted {
            stage,
            entry: count,
        });
        count
    }

    /// Records one event per work-item that ran between `before` and `after`.
    pub fn settled(&mut self, before: &ProjectState, after: &ProjectState) {
        for item in &after.tasks {
            let prior = before
                .tasks
                .iter()
                .find(|prior| prior.id == item.id)
                .map_or(0, |prior| prior.attempts);
            if item.attempts > prior {
                self.record(PipelineEvent::WorkItemSettled {
                    id: item.id.clone(),
                    status: item.status.clone(),
                });
            }
        }
    }

    pub fn into_run(self, state: ProjectState) -> PipelineRun {
        PipelineRun {
            state,
            events: self.events,
            entries: self.entries,
        }
    }
}
