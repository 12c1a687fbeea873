//! Daemon state and HTTP server assembly.

use crate::config::Config;
use crate::mart::MartLoader;
use crate::narrative::NarrativeComposer;
use crate::orchestrator::{CohortWorkflowRequest, VinWorkflowRequest, WorkflowOrchestrator};
use crate::reference::ReferenceLoader;
use crate::routes;
use crate::textgen::{HttpTextGenClient, TextGenClient};
use anyhow::{Context, Result};
use fleet_common::{CohortInterpretation, FleetError, ReferenceEntry, VinInterpretation};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared state for all request handlers. The pipeline itself is
/// side-effect free; this only holds immutable collaborators.
pub struct AppState {
    pub config: Config,
    pub orchestrator: WorkflowOrchestrator,
    pub mart: MartLoader,
    pub reference_map: HashMap<String, ReferenceEntry>,
}

impl AppState {
    /// Wire up all collaborators from configuration. Fails fast when the
    /// orchestration policy or reference data is unusable.
    pub fn from_config(config: Config) -> Result<Self> {
        let client: Option<Arc<dyn TextGenClient>> = if config.textgen.enabled {
            let http = HttpTextGenClient::new(config.textgen.clone())
                .context("failed to build text-generation client")?;
            Some(Arc::new(http))
        } else {
            None
        };

        let composer = NarrativeComposer::new(client);
        let orchestrator = WorkflowOrchestrator::new(
            &config.features,
            composer,
            &config.daemon.model_version,
        )
        .context("failed to construct workflow orchestrator")?;

        let reference_map = ReferenceLoader::new(&config.data.reference_dir)
            .load_reference_map()
            .context("failed to load reference dictionaries")?;
        let mart = MartLoader::new(&config.data.sample_file);

        Ok(Self {
            config,
            orchestrator,
            mart,
            reference_map,
        })
    }

    /// Full per-VIN pipeline: load rows, orchestrate, assemble.
    pub fn interpret_vin(&self, vin: &str) -> Result<VinInterpretation, FleetError> {
        let rows = self.mart.load_vin_rows(vin)?;
        let request = VinWorkflowRequest {
            vin: vin.to_string(),
            mh_rows: rows.mh,
            mp_rows: rows.mp,
            fim_rows: rows.fim,
            reference_map: self.reference_map.clone(),
        };
        self.orchestrator.interpret_vin(&request)
    }

    /// Full per-cohort pipeline. A caller-supplied description takes
    /// precedence over the one stored in the mart.
    pub fn interpret_cohort(
        &self,
        cohort_id: &str,
        description_override: Option<String>,
    ) -> Result<CohortInterpretation, FleetError> {
        let rows = self.mart.load_cohort_rows(cohort_id)?;
        let request = CohortWorkflowRequest {
            cohort_id: cohort_id.to_string(),
            cohort_description: description_override.or(rows.description),
            metric_rows: rows.metrics,
            anomaly_rows: rows.anomalies,
        };
        self.orchestrator.interpret_cohort(&request)
    }

    /// Bounded chat reply over caller-supplied context.
    pub fn chat_reply(
        &self,
        user_message: &str,
        context: Option<&serde_json::Map<String, serde_json::Value>>,
    ) -> String {
        self.orchestrator.chat_reply(user_message, context)
    }
}

/// Serve the HTTP API until the process is stopped.
pub async fn serve(state: Arc<AppState>) -> Result<()> {
    let bind_addr = state.config.daemon.bind_addr.clone();
    let timeout = Duration::from_secs(state.config.daemon.request_timeout_secs);

    let app = routes::api_routes()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("fleetd listening on {}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
