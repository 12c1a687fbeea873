//! Deterministic sequential execution strategy.
//!
//! Calls the shared step functions directly, in the fixed order the graphs
//! encode. This is the fallback path; it cannot fail structurally.

use super::steps::{
    self, CohortState, CohortWorkflowRequest, StepContext, VinState, VinWorkflowRequest,
};
use super::ExecutionStrategy;
use fleet_common::FleetError;

pub struct SequentialRunner;

impl ExecutionStrategy for SequentialRunner {
    fn run_vin(
        &self,
        ctx: &StepContext<'_>,
        request: &VinWorkflowRequest,
        state: &mut VinState,
    ) -> Result<(), FleetError> {
        steps::vin_build_evidence(request, state);
        steps::vin_summarize(ctx, state);
        steps::vin_recommend(state);
        steps::vin_consolidate(state);
        steps::vin_assemble(ctx, state);
        Ok(())
    }

    fn run_cohort(
        &self,
        ctx: &StepContext<'_>,
        request: &CohortWorkflowRequest,
        state: &mut CohortState,
    ) -> Result<(), FleetError> {
        steps::cohort_build_models(request, state);
        steps::cohort_summarize(ctx, state);
        steps::cohort_assemble(ctx, state);
        Ok(())
    }
}
