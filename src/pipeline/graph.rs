use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;

use super::error::GraphError;
use super::gates::Gate;
use super::stages::Stage;
use super::types::{Branch, StageKind, Transition};

/// Validated transition table plus the stage and gate implementations.
pub struct PipelineGraph {
    entry: StageKind,
    stages: BTreeMap<StageKind, Arc<dyn Stage>>,
    gates: BTreeMap<StageKind, Arc<dyn Gate>>,
    edges: BTreeMap<(StageKind, Branch), Transition>,
    recoveries: BTreeSet<(StageKind, StageKind)>,
}

impl PipelineGraph {
    pub fn entry(&self) -> StageKind {
        self.entry
    }

    pub fn stage(&self, kind: StageKind) -> Option<&Arc<dyn Stage>> {
        self.stages.get(&kind)
    }

    pub fn gate(&self, kind: StageKind) -> Option<&Arc<dyn Gate>> {
        self.gates.get(&kind)
    }

    pub fn next(&self, from: StageKind, branch: Branch) -> Option<Transition> {
        self.edges.get(&(from, branch)).copied()
    }

    /// Whether a stage missing a field may be routed back to its producer.
    pub fn recovers(&self, from: StageKind, to: StageKind) -> bool {
        self.recoveries.contains(&(from, to))
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Edges in table order, for display.
    pub fn edges(&self) -> impl Iterator<Item = (StageKind, Branch, Transition)> + '_ {
        self.edges
            .iter()
            .map(|(&(from, branch), &to)| (from, branch, to))
    }

    pub fn recovery_edges(&self) -> impl Iterator<Item = (StageKind, StageKind)> + '_ {
        self.recoveries.iter().copied()
    }
}

/// Construction-time registration of stages, gates and edges.
#[derive(Default)]
pub struct GraphBuilder {
    entry: Option<StageKind>,
    stages: BTreeMap<StageKind, Arc<dyn Stage>>,
    gates: BTreeMap<StageKind, Arc<dyn Gate>>,
    edges: BTreeMap<(StageKind, Branch), Transition>,
    recoveries: BTreeSet<(StageKind, StageKind)>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(mut self, stage: StageKind) -> Self {
        self.entry = Some(stage);
        self
    }

    pub fn stage<S>(self, stage: S) -> Self
    where
        S: Stage + 'static,
    {
        self.stage_arc(Arc::new(stage))
    }

    pub fn stage_arc(mut self, stage: Arc<dyn Stage>) -> Self {
        self.stages.insert(stage.kind(), stage);
        self
    }

    pub fn gate<G>(mut self, after: StageKind, gate: G) -> Self
    where
        G: Gate + 'static,
    {
        self.gates.insert(after, Arc::new(gate));
        self
    }

    pub fn edge(mut self, from: StageKind, branch: Branch, to: StageKind) -> Self {
        self.edges.insert((from, branch), Transition::Stage(to));
        self
    }

    pub fn end(mut self, from: StageKind, branch: Branch) -> Self {
        self.edges.insert((from, branch), Transition::End);
        self
    }

    /// Lets `from` hand control back to `to` when it finds a field `to` produces missing.
    pub fn recovery(mut self, from: StageKind, to: StageKind) -> Self {
        self.recoveries.insert((from, to));
        self
    }

    pub fn build(self) -> Result<PipelineGraph, GraphError> {
        let entry = self.entry.ok_or(GraphError::MissingEntry)?;
        if !self.stages.contains_key(&entry) {
            return Err(GraphError::UnknownStage {
                stage: entry,
                referenced_from: entry,
            });
        }

        let registered = |stage: StageKind, referenced_from: StageKind| {
            if self.stages.contains_key(&stage) {
                Ok(())
            } else {
                Err(GraphError::UnknownStage {
                    stage,
                    referenced_from,
                })
            }
        };

        for (&(from, _), &to) in &self.edges {
            registered(from, from)?;
            if let Transition::Stage(to) = to {
                registered(to, from)?;
            }
        }

        for &(from, to) in &self.recoveries {
            registered(from, from)?;
            registered(to, from)?;
        }

        for &after in self.gates.keys() {
            registered(after, after)?;
        }

        for &stage in self.stages.keys() {
            let expected: &[Branch] = match self.gates.get(&stage) {
                Some(gate) => gate.branches(),
                None => &[Branch::Next],
            };

            for &branch in expected {
                if !self.edges.contains_key(&(stage, branch)) {
                    return Err(GraphError::MissingEdge { stage, branch });
                }
            }

            if let Some(&(_, branch)) = self
                .edges
                .keys()
                .find(|(from, branch)| *from == stage && !expected.contains(branch))
            {
                return Err(GraphError::UndeclaredBranch { stage, branch });
            }
        }

        if !self.edges.values().any(|to| *to == Transition::End) {
            return Err(GraphError::NoTerminal);
        }

        let reachable = self.reachable_from(entry);
        if let Some(&stage) = self.stages.keys().find(|stage| !reachable.contains(stage)) {
            return Err(GraphError::UnreachableState(stage));
        }

        Ok(PipelineGraph {
            entry,
            stages: self.stages,
            gates: self.gates,
            edges: self.edges,
            recoveries: self.recoveries,
        })
    }

    fn reachable_from(&self, entry: StageKind) -> BTreeSet<StageKind> {
        let mut seen = BTreeSet::from([entry]);
        let mut queue = VecDeque::from([entry]);

        while let Some(current) = queue.pop_front() {
            let edge_targets = self
                .edges
                .iter()
                .filter(|((from, _), _)| *from == current)
                .filter_map(|(_, to)| match to {
                    Transition::Stage(stage) => Some(*stage),
                    Transition::End => None,
                });
            let recovery_targets = self
                .recoveries
                .iter()
                .filter(|(from, _)| *from == current)
                .map(|(_, to)| *to);

            for next in edge_targets.chain(recovery_targets) {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        seen
    }
}
