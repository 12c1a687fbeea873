//! Graph-engine execution strategy.
//!
//! Executes the workflow as a walk over a named node graph. Graphs are
//! validated at construction (entry point and edge targets must exist);
//! runtime walks carry a step budget so a malformed graph fails with an
//! orchestration error instead of looping.

use super::steps::{
    self, CohortState, CohortWorkflowRequest, StepContext, VinState, VinWorkflowRequest,
};
use super::ExecutionStrategy;
use fleet_common::FleetError;
use std::collections::HashMap;
use tracing::debug;

/// VIN workflow node names, in edge order.
pub const VIN_NODES: &[&str] = &[
    "build_evidence",
    "summarize",
    "recommend",
    "consolidate",
    "assemble",
];

/// Cohort workflow node names, in edge order.
pub const COHORT_NODES: &[&str] = &["build_models", "summarize", "assemble"];

/// A linear workflow graph: entry node plus node -> successor edges.
#[derive(Debug, Clone)]
pub struct StepGraph {
    entry: String,
    nodes: Vec<String>,
    edges: HashMap<String, String>,
}

impl StepGraph {
    /// Chain the given nodes in order; the first node is the entry point.
    pub fn linear(nodes: &[&str]) -> Self {
        let edges = nodes
            .windows(2)
            .map(|pair| (pair[0].to_string(), pair[1].to_string()))
            .collect();
        Self {
            entry: nodes.first().map(|n| n.to_string()).unwrap_or_default(),
            nodes: nodes.iter().map(|n| n.to_string()).collect(),
            edges,
        }
    }

    /// Arbitrary graph, for tests that need malformed topologies.
    pub fn with_edges(entry: &str, nodes: &[&str], edges: &[(&str, &str)]) -> Self {
        Self {
            entry: entry.to_string(),
            nodes: nodes.iter().map(|n| n.to_string()).collect(),
            edges: edges
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
        }
    }

    /// Structural validation: non-empty, known entry, edges between known
    /// nodes. Cycles are caught at walk time by the step budget.
    pub fn validate(&self) -> Result<(), FleetError> {
        if self.nodes.is_empty() {
            return Err(FleetError::Orchestration(
                "workflow graph has no nodes".to_string(),
            ));
        }
        if !self.nodes.contains(&self.entry) {
            return Err(FleetError::Orchestration(format!(
                "workflow graph entry point '{}' is not a node",
                self.entry
            )));
        }
        for (from, to) in &self.edges {
            if !self.nodes.contains(from) || !self.nodes.contains(to) {
                return Err(FleetError::Orchestration(format!(
                    "workflow graph edge {} -> {} references unknown node",
                    from, to
                )));
            }
        }
        Ok(())
    }

    /// Walk from the entry node, invoking `visit` per node, until a node
    /// with no outgoing edge. Errors if the walk exceeds the node count.
    fn walk(
        &self,
        mut visit: impl FnMut(&str) -> Result<(), FleetError>,
    ) -> Result<(), FleetError> {
        let mut current = self.entry.as_str();
        let mut visited = 0usize;

        loop {
            if visited >= self.nodes.len() {
                return Err(FleetError::Orchestration(
                    "workflow graph walk exceeded node budget (cycle?)".to_string(),
                ));
            }
            debug!("Executing workflow node '{}'", current);
            visit(current)?;
            visited += 1;

            match self.edges.get(current) {
                Some(next) => current = next.as_str(),
                None => return Ok(()),
            }
        }
    }
}

/// DAG-engine strategy: dispatches each step as a named graph node.
pub struct GraphEngine {
    vin_graph: StepGraph,
    cohort_graph: StepGraph,
}

impl GraphEngine {
    /// Build the default VIN and cohort graphs. Fails when either graph
    /// does not validate.
    pub fn initialize() -> Result<Self, FleetError> {
        Self::with_graphs(StepGraph::linear(VIN_NODES), StepGraph::linear(COHORT_NODES))
    }

    /// Engine over explicit graphs. Used by tests to inject malformed
    /// topologies.
    pub fn with_graphs(vin_graph: StepGraph, cohort_graph: StepGraph) -> Result<Self, FleetError> {
        vin_graph.validate()?;
        cohort_graph.validate()?;
        Ok(Self {
            vin_graph,
            cohort_graph,
        })
    }
}

impl ExecutionStrategy for GraphEngine {
    fn run_vin(
        &self,
        ctx: &StepContext<'_>,
        request: &VinWorkflowRequest,
        state: &mut VinState,
    ) -> Result<(), FleetError> {
        self.vin_graph.walk(|node| {
            match node {
                "build_evidence" => steps::vin_build_evidence(request, state),
                "summarize" => steps::vin_summarize(ctx, state),
                "recommend" => steps::vin_recommend(state),
                "consolidate" => steps::vin_consolidate(state),
                "assemble" => steps::vin_assemble(ctx, state),
                other => {
                    return Err(FleetError::Orchestration(format!(
                        "unknown VIN workflow node '{}'",
                        other
                    )))
                }
            }
            Ok(())
        })
    }

    fn run_cohort(
        &self,
        ctx: &StepContext<'_>,
        request: &CohortWorkflowRequest,
        state: &mut CohortState,
    ) -> Result<(), FleetError> {
        self.cohort_graph.walk(|node| {
            match node {
                "build_models" => steps::cohort_build_models(request, state),
                "summarize" => steps::cohort_summarize(ctx, state),
                "assemble" => steps::cohort_assemble(ctx, state),
                other => {
                    return Err(FleetError::Orchestration(format!(
                        "unknown cohort workflow node '{}'",
                        other
                    )))
                }
            }
            Ok(())
        })
    }
}
