//! Shared application state for the web server.

use std::sync::Arc;

use pharmyx_common::confidence::ConfidenceWeights;
use pharmyx_common::{PharmyxError, Result};
use pharmyx_engine::PgxTables;
use pharmyx_llm::{AdvisoryMapper, ExplanationGenerator, LlmBackend};
use tracing::info;

use crate::config::Config;

/// Read-only state injected into every handler. Nothing here is mutated
/// after startup, so concurrent analyses share it without locking.
pub struct AppState {
    pub tables: Arc<PgxTables>,
    pub weights: ConfidenceWeights,
    pub explainer: ExplanationGenerator,
    pub advisory: Option<AdvisoryMapper>,
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Deterministic core only: explanations fall back, no advisory.
    pub fn new(tables: Arc<PgxTables>, weights: ConfidenceWeights) -> Self {
        Self {
            tables,
            weights,
            explainer: ExplanationGenerator::disabled(),
            advisory: None,
            max_upload_bytes: crate::config::ServerConfig::default().max_upload_bytes,
        }
    }

    pub fn with_explainer(mut self, explainer: ExplanationGenerator) -> Self {
        self.explainer = explainer;
        self
    }

    pub fn with_advisory(mut self, advisory: AdvisoryMapper) -> Self {
        self.advisory = Some(advisory);
        self
    }

    pub fn from_config(config: Config) -> Result<Self> {
        if !config.scoring.validate() {
            return Err(PharmyxError::Config(
                "confidence weights must be non-negative and sum to 1.0".to_string(),
            ));
        }
        let tables = PgxTables::load(
            config.tables.phenotypes.as_deref(),
            config.tables.drug_rules.as_deref(),
        )?;

        let timeout = config.llm.timeout();
        let (temperature, top_p) = (config.llm.temperature, config.llm.top_p);
        let advisory_enabled = config.llm.advisory_enabled;

        let mut state = Self::new(Arc::new(tables), config.scoring);
        state.max_upload_bytes = config.server.max_upload_bytes;

        if let Some(backend) = config.llm.build_backend() {
            info!(model = backend.model_id(), local = backend.is_local(), "LLM explanations enabled");
            if advisory_enabled {
                info!("Advisory phenotype mapping enabled (non-authoritative)");
                state = state.with_advisory(AdvisoryMapper::new(backend.clone(), timeout));
            }
            state = state.with_explainer(
                ExplanationGenerator::new(backend, timeout).with_sampling(temperature, top_p),
            );
        }
        Ok(state)
    }
}

pub type SharedState = Arc<AppState>;
