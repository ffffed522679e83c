pub mod adapters;
pub mod cancel;
pub mod checkpoint;
pub mod context;
pub mod error;
pub mod gates;
pub mod graph;
pub mod orchestrator;
pub mod retry;
pub mod stages;
pub mod state;
pub mod types;
pub mod worker;

#[allow(unused_imports)]
pub use adapters::{
    ClarificationResolver, Collaborator, Committer, NoClarifier, ReportCommitter,
    RequirementsBrief, RequirementsVerdict, ReviewVerdict, Reviewer, TaskDesigner,
    ValidationIssues, WorkBrief, WorkExecutor, WorkItemDraft, render_report,
};
#[allow(unused_imports)]
pub use cancel::CancelSignal;
#[allow(unused_imports)]
pub use checkpoint::{Checkpoint, CheckpointStore, JsonCheckpointStore};
#[allow(unused_imports)]
pub use context::{PipelineEvent, PipelineRun, StageContext};
#[allow(unused_imports)]
pub use error::{GateError, GraphError, PipelineError, StageError};
#[allow(unused_imports)]
pub use gates::{Gate, RequirementsGate, ReviewGate, WorkCompletionGate};
#[allow(unused_imports)]
pub use graph::{GraphBuilder, PipelineGraph};
#[allow(unused_imports)]
pub use orchestrator::{PipelineBuilder, PipelineOrchestrator, standard_graph};
#[allow(unused_imports)]
pub use retry::RetryPolicy;
#[allow(unused_imports)]
pub use stages::{
    CommitStage, DesignAndAllocateStage, ParallelWorkStage, ReviewStage, Stage,
    UnderstandRequirementsStage,
};
#[allow(unused_imports)]
pub use state::{
    Clarification, ProjectState, RequirementsRecord, ReviewResult, WorkItem, WorkItemId,
    WorkStatus, WorkSummary,
};
#[allow(unused_imports)]
pub use types::{Branch, StageKind, Transition};
#[allow(unused_imports)]
pub use worker::{WorkOutcome, WorkerPool};
