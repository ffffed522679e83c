use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{PipelineSettings, ReviewFailureRoute};

use super::adapters::{
    ClarificationResolver, Collaborator, Committer, NoClarifier, ReportCommitter, Reviewer,
    TaskDesigner, WorkExecutor,
};
use super::cancel::CancelSignal;
use super::checkpoint::{Checkpoint, CheckpointStore};
use super::context::{PipelineEvent, PipelineRun, RunLog, StageContext};
use super::error::{GraphError, PipelineError, StageError};
use super::gates::{RequirementsGate, ReviewGate, WorkCompletionGate};
use super::graph::{GraphBuilder, PipelineGraph};
use super::stages::{
    CommitStage, DesignAndAllocateStage, ParallelWorkStage, ReviewStage,
    UnderstandRequirementsStage,
};
use super::state::ProjectState;
use super::types::{Branch, StageKind, Transition};

/// Drives a `ProjectState` through the transition table until the terminal
/// edge, a fatal error, a stall or cancellation.
pub struct PipelineOrchestrator {
    graph: PipelineGraph,
    settings: PipelineSettings,
    checkpoints: Option<Arc<dyn CheckpointStore>>,
}

impl PipelineOrchestrator {
    pub fn new(graph: PipelineGraph, settings: PipelineSettings) -> Self {
        Self {
            graph,
            settings,
            checkpoints: None,
        }
    }

    pub fn builder(settings: PipelineSettings) -> PipelineBuilder {
        PipelineBuilder::new(settings)
    }

    pub fn with_checkpoints<S>(mut self, store: S) -> Self
    where
        S: CheckpointStore + 'static,
    {
        self.checkpoints = Some(Arc::new(store));
        self
    }

    pub fn graph(&self) -> &PipelineGraph {
        &self.graph
    }

    pub async fn run(&self, input: &str) -> Result<PipelineRun, PipelineError> {
        self.run_with_cancel(input, CancelSignal::new()).await
    }

    pub async fn run_with_cancel(
        &self,
        input: &str,
        cancel: CancelSignal,
    ) -> Result<PipelineRun, PipelineError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(PipelineError::EmptyInput);
        }

        let state = ProjectState::new(input);
        self.drive(state, self.graph.entry(), cancel).await
    }

    /// Continues a run from a stored checkpoint.
    pub async fn resume(
        &self,
        checkpoint: Checkpoint,
        cancel: CancelSignal,
    ) -> Result<PipelineRun, PipelineError> {
        match checkpoint.next_stage {
            Some(stage) => self.drive(checkpoint.state, stage, cancel).await,
            None => finish(RunLog::default(), checkpoint.state),
        }
    }

    async fn drive(
        &self,
        mut state: ProjectState,
        start: StageKind,
        cancel: CancelSignal,
    ) -> Result<PipelineRun, PipelineError> {
        let ctx = StageContext::new(self.settings.clone(), cancel.clone());
        let limit = self.settings.max_iterations_per_gate;
        let mut log = RunLog::default();
        let mut current = start;

        loop {
            if cancel.is_cancelled() {
                return Err(PipelineError::Cancelled {
                    stage: current,
                    snapshot: Box::new(state),
                });
            }

            if log.entries(current) >= limit {
                warn!(stage = %current, limit, "stage re-entry limit reached");
                return Err(PipelineError::Stalled {
                    stage: current,
                    limit,
                    snapshot: Box::new(state),
                });
            }

            let stage = self.graph.stage(current).ok_or(GraphError::UnknownStage {
                stage: current,
                referenced_from: current,
            })?;

            let entry = log.enter(current);
            info!(stage = %current, entry, "entering stage");

            match stage.execute(&state, &ctx).await {
                Ok(next) => {
                    log.settled(&state, &next);
                    state = next;
                }
                Err(StageError::MissingField { field, producer })
                    if self.graph.recovers(current, producer) =>
                {
                    warn!(stage = %current, field, to = %producer, "routing back to producer");
                    log.record(PipelineEvent::RecoveryRouted {
                        from: current,
                        to: producer,
                        field,
                    });
                    self.checkpoint(&mut log, current, Some(producer), &state)?;
                    current = producer;
                    continue;
                }
                Err(StageError::Cancelled) => {
                    return Err(PipelineError::Cancelled {
                        stage: current,
                        snapshot: Box::new(state),
                    });
                }
                Err(source) => {
                    return Err(PipelineError::Stage {
                        stage: current,
                        source,
                        snapshot: Box::new(state),
                    });
                }
            }
            log.record(PipelineEvent::StageCompleted(current));

            if cancel.is_cancelled() {
                return Err(PipelineError::Cancelled {
                    stage: current,
                    snapshot: Box::new(state),
                });
            }

            let branch = match self.graph.gate(current) {
                Some(gate) => match gate.evaluate(&state) {
                    Ok(branch) => branch,
                    Err(source) => {
                        return Err(PipelineError::Gate {
                            stage: current,
                            source,
                            snapshot: Box::new(state),
                        });
                    }
                },
                None => Branch::Next,
            };
            debug!(stage = %current, %branch, "gate evaluated");
            log.record(PipelineEvent::GateEvaluated {
                stage: current,
                branch,
            });

            match self.graph.next(current, branch) {
                Some(Transition::Stage(next)) => {
                    self.checkpoint(&mut log, current, Some(next), &state)?;
                    current = next;
                }
                Some(Transition::End) => {
                    self.checkpoint(&mut log, current, None, &state)?;
                    return finish(log, state);
                }
                None => {
                    return Err(PipelineError::NoTransition {
                        stage: current,
                        branch,
                        snapshot: Box::new(state),
                    });
                }
            }
        }
    }

    fn checkpoint(
        &self,
        log: &mut RunLog,
        stage: StageKind,
        next: Option<StageKind>,
        state: &ProjectState,
    ) -> Result<(), PipelineError> {
        let Some(store) = &self.checkpoints else {
            return Ok(());
        };

        let checkpoint = Checkpoint {
            next_stage: next,
            state: state.clone(),
        };
        store
            .save(&checkpoint)
            .map_err(|source| PipelineError::Checkpoint {
                stage,
                source,
                snapshot: Box::new(state.clone()),
            })?;
        log.record(PipelineEvent::CheckpointSaved { next });
        Ok(())
    }
}

fn finish(log: RunLog, state: ProjectState) -> Result<PipelineRun, PipelineError> {
    let has_output = state
        .output
        .as_deref()
        .is_some_and(|output| !output.trim().is_empty());
    if !has_output {
        return Err(PipelineError::MissingOutput {
            snapshot: Box::new(state),
        });
    }

    info!("pipeline finished");
    Ok(log.into_run(state))
}

/// Assembles the standard five-stage crew pipeline from its adapters.
pub struct PipelineBuilder {
    settings: PipelineSettings,
    collaborator: Option<Arc<dyn Collaborator>>,
    designer: Option<Arc<dyn TaskDesigner>>,
    executor: Option<Arc<dyn WorkExecutor>>,
    reviewer: Option<Arc<dyn Reviewer>>,
    committer: Arc<dyn Committer>,
    clarifier: Arc<dyn ClarificationResolver>,
}

impl PipelineBuilder {
    pub fn new(settings: PipelineSettings) -> Self {
        Self {
            settings,
            collaborator: None,
            designer: None,
            executor: None,
            reviewer: None,
            committer: Arc::new(ReportCommitter),
            clarifier: Arc::new(NoClarifier),
        }
    }

    pub fn with_collaborator(mut self, collaborator: Arc<dyn Collaborator>) -> Self {
        self.collaborator = Some(collaborator);
        self
    }

    pub fn with_designer(mut self, designer: Arc<dyn TaskDesigner>) -> Self {
        self.designer = Some(designer);
        self
    }

    pub fn with_executor(mut self, executor: Arc<dyn WorkExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn with_reviewer(mut self, reviewer: Arc<dyn Reviewer>) -> Self {
        self.reviewer = Some(reviewer);
        self
    }

    pub fn with_committer(mut self, committer: Arc<dyn Committer>) -> Self {
        self.committer = committer;
        self
    }

    pub fn with_clarifier(mut self, clarifier: Arc<dyn ClarificationResolver>) -> Self {
        self.clarifier = clarifier;
        self
    }

    /// Uses one crew for every role it can play.
    pub fn with_crew<C>(self, crew: Arc<C>) -> Self
    where
        C: Collaborator + TaskDesigner + WorkExecutor + Reviewer + 'static,
    {
        self.with_collaborator(crew.clone())
            .with_designer(crew.clone())
            .with_executor(crew.clone())
            .with_reviewer(crew)
    }

    pub fn build(self) -> Result<PipelineOrchestrator, GraphError> {
        let collaborator = self
            .collaborator
            .ok_or(GraphError::MissingAdapter("collaborator"))?;
        let designer = self.designer.ok_or(GraphError::MissingAdapter("designer"))?;
        let executor = self.executor.ok_or(GraphError::MissingAdapter("executor"))?;
        let reviewer = self.reviewer.ok_or(GraphError::MissingAdapter("reviewer"))?;

        let graph = standard_graph(self.settings.review_failure_route)
            .stage(UnderstandRequirementsStage::new(collaborator, self.clarifier))
            .stage(DesignAndAllocateStage::new(designer))
            .stage(ParallelWorkStage::new(executor))
            .stage(ReviewStage::new(reviewer))
            .stage(CommitStage::new(self.committer))
            .build()?;

        Ok(PipelineOrchestrator::new(graph, self.settings))
    }
}

/// The crew transition table and gates, without stage implementations.
pub fn standard_graph(review_failure: ReviewFailureRoute) -> GraphBuilder {
    let rejected_to = match review_failure {
        ReviewFailureRoute::ParallelWork => StageKind::ParallelWork,
        ReviewFailureRoute::Design => StageKind::DesignAndAllocate,
    };

    GraphBuilder::new()
        .entry(StageKind::UnderstandRequirements)
        .gate(StageKind::UnderstandRequirements, RequirementsGate)
        .edge(
            StageKind::UnderstandRequirements,
            Branch::Clear,
            StageKind::DesignAndAllocate,
        )
        .edge(
            StageKind::UnderstandRequirements,
            Branch::Unclear,
            StageKind::UnderstandRequirements,
        )
        .edge(
            StageKind::DesignAndAllocate,
            Branch::Next,
            StageKind::ParallelWork,
        )
        .gate(StageKind::ParallelWork, WorkCompletionGate)
        .edge(StageKind::ParallelWork, Branch::AllComplete, StageKind::Review)
        .edge(StageKind::ParallelWork, Branch::Pending, StageKind::ParallelWork)
        .edge(StageKind::ParallelWork, Branch::Failed, StageKind::ParallelWork)
        .gate(StageKind::Review, ReviewGate)
        .edge(StageKind::Review, Branch::Passed, StageKind::Commit)
        .edge(StageKind::Review, Branch::Rejected, rejected_to)
        .end(StageKind::Commit, Branch::Next)
        .recovery(
            StageKind::DesignAndAllocate,
            StageKind::UnderstandRequirements,
        )
        .recovery(StageKind::ParallelWork, StageKind::DesignAndAllocate)
        .recovery(StageKind::Review, StageKind::DesignAndAllocate)
}
