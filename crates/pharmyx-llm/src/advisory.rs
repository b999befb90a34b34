//! Advisory gene → phenotype guesses from a language model.
//!
//! Output is reported next to the deterministic profile and is flagged
//! `non_authoritative`. Nothing in the resolver, rule engine or scorer reads
//! it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use pharmyx_common::Variant;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::audit::LlmAuditEntry;
use crate::backend::{complete_within, LlmBackend, LlmError, LlmRequest, Message};

const DEFAULT_CONFIDENCE: f64 = 0.3;

const SYSTEM_PROMPT: &str = "You are a clinical pharmacogenomics expert. From star-allele \
annotations detected in a VCF, suggest the most likely diplotype and phenotype per gene.\n\n\
Supported genes: CYP2D6, CYP2C19, CYP2C9, SLCO1B1, TPMT, DPYD.\n\
Metabolizer phenotypes: PM, IM, NM, RM, UM. SLCO1B1 uses Low/Intermediate/Normal Function; \
TPMT and DPYD use Low/Intermediate/Normal Activity.\n\n\
Reply with a single JSON object and nothing else.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryGeneResult {
    pub gene: String,
    pub diplotype: Option<String>,
    pub phenotype: String,
    pub confidence_score: f64,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryReport {
    /// Always true; marks the block as model output, not a clinical call.
    pub non_authoritative: bool,
    pub success: bool,
    pub results: Vec<AdvisoryGeneResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AdvisoryReport {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            non_authoritative: true,
            success: false,
            results: Vec::new(),
            error: Some(error.into()),
        }
    }

    /// Read `{"gene_results": [...]}`. Missing per-gene fields get neutral
    /// defaults; a missing array is an error.
    pub fn from_content(content: &str) -> Result<Self, LlmError> {
        let json: serde_json::Value = serde_json::from_str(content)?;
        let items = json["gene_results"].as_array().ok_or_else(|| {
            LlmError::Unavailable("advisory response has no gene_results array".to_string())
        })?;

        let results = items
            .iter()
            .filter_map(|item| {
                let gene = item["gene"].as_str()?.trim().to_string();
                Some(AdvisoryGeneResult {
                    gene,
                    diplotype: item["diplotype"].as_str().map(str::to_string),
                    phenotype: item["phenotype"].as_str().unwrap_or("Unknown").to_string(),
                    confidence_score: item["confidence_score"]
                        .as_f64()
                        .unwrap_or(DEFAULT_CONFIDENCE)
                        .clamp(0.0, 1.0),
                    reasoning: item["reasoning"].as_str().unwrap_or_default().to_string(),
                })
            })
            .collect();

        Ok(Self { non_authoritative: true, success: true, results, error: None })
    }
}

pub struct AdvisoryMapper {
    backend: Arc<dyn LlmBackend>,
    timeout: Duration,
}

impl AdvisoryMapper {
    pub fn new(backend: Arc<dyn LlmBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    pub async fn map(&self, variants: &[Variant]) -> AdvisoryReport {
        match self.call(variants).await {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, "Advisory phenotype mapping failed");
                AdvisoryReport::failed(e.to_string())
            }
        }
    }

    async fn call(&self, variants: &[Variant]) -> Result<AdvisoryReport, LlmError> {
        let request = LlmRequest {
            messages: vec![Message::system(SYSTEM_PROMPT), Message::user(prompt(variants))],
            model: None,
            max_tokens: Some(1024),
            temperature: Some(0.2),
            top_p: Some(0.9),
            json_mode: true,
        };

        let started = Instant::now();
        let response = complete_within(self.backend.as_ref(), request, self.timeout).await?;
        LlmAuditEntry::new("advisory", self.backend.name(), &response, started.elapsed().as_millis() as u64)
            .emit();

        if response.content.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        AdvisoryReport::from_content(&response.content)
    }
}

fn prompt(variants: &[Variant]) -> String {
    let lines: Vec<String> = variants
        .iter()
        .map(|v| format!("- Gene: {}, rsID: {}, star allele: {}", v.gene, v.rsid, v.star_allele))
        .collect();
    format!(
        "Detected variants:\n{}\n\n\
         Respond with:\n\
         {{\"gene_results\": [{{\"gene\": \"SYMBOL\", \"diplotype\": \"*X/*Y\", \
         \"phenotype\": \"label\", \"confidence_score\": 0.0, \"reasoning\": \"short\"}}]}}\n\n\
         Use \"Unknown\" with a low confidence when the variants are insufficient.",
        lines.join("\n")
    )
}
