use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::adapters::{WorkBrief, WorkExecutor};
use super::cancel::CancelSignal;
use super::error::StageError;
use super::retry::{RetryPolicy, call_with_retry};
use super::state::{ReviewResult, WorkItem, WorkItemId, WorkStatus};

/// Settled result of one work-item execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkOutcome {
    pub id: WorkItemId,
    pub status: WorkStatus,
    pub output: Option<String>,
}

/// Bounded concurrent dispatcher for the work-items of one `ParallelWork` pass.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    size: usize,
    timeout: Duration,
    retry: RetryPolicy,
}

impl WorkerPool {
    pub fn new(size: usize, timeout: Duration, retry: RetryPolicy) -> Self {
        Self {
            size: size.max(1),
            timeout,
            retry,
        }
    }

    /// Runs every item, at most `size` at a time, and waits for all dispatched
    /// items to settle. Once `cancel` fires no further items are started and
    /// in-flight ones are abandoned; neither produces an outcome.
    pub async fn dispatch(
        &self,
        items: Vec<WorkItem>,
        executor: Arc<dyn WorkExecutor>,
        brief: Arc<WorkBrief>,
        cancel: &CancelSignal,
    ) -> Vec<WorkOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.size));
        let mut handles: Vec<(WorkItemId, JoinHandle<Option<WorkOutcome>>)> = Vec::new();

        for item in items {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let id = item.id.clone();
            let executor = executor.clone();
            let brief = brief.clone();
            let cancel = cancel.clone();
            let timeout = self.timeout;
            let retry = self.retry;

            debug!(item = %id, "dispatching work-item");
            let handle = tokio::spawn(async move {
                let _permit = permit;
                run_item(item, executor, brief, timeout, retry, cancel).await
            });
            handles.push((id, handle));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (id, handle) in handles {
            match handle.await {
                Ok(Some(outcome)) => outcomes.push(outcome),
                Ok(None) => debug!(item = %id, "work-item abandoned on cancellation"),
                Err(err) => {
                    warn!(item = %id, error = %err, "work-item task panicked");
                    outcomes.push(WorkOutcome {
                        id,
                        status: WorkStatus::Failed {
                            reason: format!("worker panicked: {err}"),
                        },
                        output: None,
                    });
                }
            }
        }

        outcomes
    }
}

async fn run_item(
    item: WorkItem,
    executor: Arc<dyn WorkExecutor>,
    brief: Arc<WorkBrief>,
    timeout: Duration,
    retry: RetryPolicy,
    cancel: CancelSignal,
) -> Option<WorkOutcome> {
    let result = call_with_retry("execute_work_item", retry, timeout, &cancel, || {
        executor.execute(&item, &brief)
    })
    .await;

    match result {
        Ok(output) => Some(WorkOutcome {
            id: item.id,
            status: WorkStatus::Complete,
            output: Some(output),
        }),
        Err(StageError::Cancelled) => None,
        Err(err) => {
            warn!(item = %item.id, error = %err, "work-item failed");
            Some(WorkOutcome {
                id: item.id,
                status: WorkStatus::Failed {
                    reason: err.to_string(),
                },
                output: None,
            })
        }
    }
}

/// Reopens items a rejected review asked to redo. An item is reopened at most
/// once per review round.
pub fn reopen_for_review(tasks: &mut [WorkItem], review: Option<&ReviewResult>) -> usize {
    let Some(review) = review.filter(|review| !review.passed) else {
        return 0;
    };

    let mut reopened = 0;
    for item in tasks.iter_mut() {
        let flagged = review.rework.is_empty() || review.rework.contains(&item.id);
        if flagged && item.revision < review.round {
            item.status = WorkStatus::Pending;
            item.revision = review.round;
            item.feedback = review.feedback.clone();
            reopened += 1;
        }
    }
    reopened
}

/// Folds settled outcomes back into the task list, keyed by item id so the
/// result does not depend on completion order.
pub fn merge_outcomes(tasks: &mut [WorkItem], outcomes: Vec<WorkOutcome>) {
    let mut by_id: BTreeMap<WorkItemId, WorkOutcome> = outcomes
        .into_iter()
        .map(|outcome| (outcome.id.clone(), outcome))
        .collect();

    for item in tasks.iter_mut() {
        if let Some(outcome) = by_id.remove(&item.id) {
            item.attempts += 1;
            item.status = outcome.status;
            if outcome.output.is_some() {
                item.output = outcome.output;
            }
        }
    }

    for id in by_id.keys() {
        warn!(item = %id, "discarding outcome for unknown work-item");
    }
}
