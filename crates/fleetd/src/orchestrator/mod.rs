//! Workflow orchestration.
//!
//! Composition root for the interpretation pipelines. Two equivalent
//! execution strategies run the same step functions: the graph engine and
//! the deterministic sequential runner. The strategy is chosen at
//! construction from configuration; a graph execution failure is retried
//! sequentially only when deterministic fallback is permitted. Callers see
//! either a fully assembled interpretation or a single orchestration error,
//! never a partial result.

mod graph;
mod sequential;
mod steps;

pub use graph::{GraphEngine, StepGraph, COHORT_NODES, VIN_NODES};
pub use sequential::SequentialRunner;
pub use steps::{
    CohortState, CohortWorkflowRequest, StepContext, VinState, VinWorkflowRequest,
};

use crate::cohort;
use crate::config::FeatureConfig;
use crate::narrative::NarrativeComposer;
use fleet_common::{CohortInterpretation, FleetError, VinInterpretation};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// One execution strategy over the shared workflow steps.
pub trait ExecutionStrategy: Send + Sync {
    fn run_vin(
        &self,
        ctx: &StepContext<'_>,
        request: &VinWorkflowRequest,
        state: &mut VinState,
    ) -> Result<(), FleetError>;

    fn run_cohort(
        &self,
        ctx: &StepContext<'_>,
        request: &CohortWorkflowRequest,
        state: &mut CohortState,
    ) -> Result<(), FleetError>;
}

pub struct WorkflowOrchestrator {
    engine: Option<GraphEngine>,
    sequential: SequentialRunner,
    allow_fallback: bool,
    composer: NarrativeComposer,
    model_version: String,
}

impl WorkflowOrchestrator {
    /// Select the execution strategy from configuration.
    ///
    /// Policy matrix: engine unavailable (disabled or failing to
    /// initialize) is fatal unless deterministic fallback is permitted.
    pub fn new(
        features: &FeatureConfig,
        composer: NarrativeComposer,
        model_version: &str,
    ) -> Result<Self, FleetError> {
        let engine = if features.enable_graph_engine {
            match GraphEngine::initialize() {
                Ok(engine) => {
                    info!("Graph engine initialized for workflow orchestration");
                    Some(engine)
                }
                Err(e) if features.allow_deterministic_fallback => {
                    warn!("Graph engine unavailable, using sequential execution: {}", e);
                    None
                }
                Err(e) => return Err(e),
            }
        } else if features.allow_deterministic_fallback {
            info!("Graph engine disabled, using sequential execution");
            None
        } else {
            return Err(FleetError::Orchestration(
                "graph engine is disabled and deterministic fallback is not permitted".to_string(),
            ));
        };

        Ok(Self {
            engine,
            sequential: SequentialRunner,
            allow_fallback: features.allow_deterministic_fallback,
            composer,
            model_version: model_version.to_string(),
        })
    }

    /// Orchestrator over an explicit engine. Lets tests inject malformed
    /// graphs to exercise the runtime fallback branch.
    pub fn with_engine(
        engine: Option<GraphEngine>,
        allow_fallback: bool,
        composer: NarrativeComposer,
        model_version: &str,
    ) -> Self {
        Self {
            engine,
            sequential: SequentialRunner,
            allow_fallback,
            composer,
            model_version: model_version.to_string(),
        }
    }

    pub fn graph_engine_enabled(&self) -> bool {
        self.engine.is_some()
    }

    pub fn textgen_enabled(&self) -> bool {
        self.composer.textgen_enabled()
    }

    /// Run the per-VIN pipeline.
    pub fn interpret_vin(
        &self,
        request: &VinWorkflowRequest,
    ) -> Result<VinInterpretation, FleetError> {
        let ctx = self.step_context();
        let mut state = VinState::default();

        let run = match &self.engine {
            Some(engine) => engine.run_vin(&ctx, request, &mut state),
            None => self.sequential.run_vin(&ctx, request, &mut state),
        };

        if let Err(e) = run {
            if self.engine.is_some() && self.allow_fallback {
                warn!("Graph VIN workflow failed, retrying sequentially: {}", e);
                state = VinState::default();
                self.sequential.run_vin(&ctx, request, &mut state)?;
            } else {
                return Err(e);
            }
        }

        state.interpretation.ok_or_else(|| {
            FleetError::Orchestration("VIN workflow produced no interpretation".to_string())
        })
    }

    /// Run the per-cohort pipeline.
    pub fn interpret_cohort(
        &self,
        request: &CohortWorkflowRequest,
    ) -> Result<CohortInterpretation, FleetError> {
        let ctx = self.step_context();
        let mut state = CohortState::default();

        let run = match &self.engine {
            Some(engine) => engine.run_cohort(&ctx, request, &mut state),
            None => self.sequential.run_cohort(&ctx, request, &mut state),
        };

        if let Err(e) = run {
            if self.engine.is_some() && self.allow_fallback {
                warn!("Graph cohort workflow failed, retrying sequentially: {}", e);
                state = CohortState::default();
                self.sequential.run_cohort(&ctx, request, &mut state)?;
            } else {
                return Err(e);
            }
        }

        state.interpretation.ok_or_else(|| {
            FleetError::Orchestration("cohort workflow produced no interpretation".to_string())
        })
    }

    /// Compose a bounded chat reply, selecting between the deterministic
    /// candidate and the external one via the scoring heuristic.
    pub fn chat_reply(
        &self,
        user_message: &str,
        context: Option<&serde_json::Map<String, Value>>,
    ) -> String {
        let empty = serde_json::Map::new();
        let context = context.unwrap_or(&empty);

        let deterministic = self.deterministic_chat_reply(user_message, context);
        self.composer
            .compose_hybrid_chat_reply(user_message, context, &deterministic)
    }

    /// Deterministic chat candidate: cohort answerer when the context
    /// carries cohort facts, generic context reply otherwise.
    fn deterministic_chat_reply(
        &self,
        user_message: &str,
        context: &serde_json::Map<String, Value>,
    ) -> String {
        let distribution = context
            .get("risk_distribution")
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| v.as_i64().map(|n| (k.clone(), n)))
                    .collect::<BTreeMap<String, i64>>()
            })
            .filter(|map| !map.is_empty());
        let anomaly_count = context
            .get("anomaly_count")
            .and_then(Value::as_u64)
            .map(|n| n as usize);

        if distribution.is_some() || anomaly_count.is_some() {
            cohort::answer_question(distribution.as_ref(), anomaly_count)
        } else {
            self.composer.compose_chat_reply(user_message, context)
        }
    }

    fn step_context(&self) -> StepContext<'_> {
        StepContext {
            composer: &self.composer,
            model_version: &self.model_version,
        }
    }
}
