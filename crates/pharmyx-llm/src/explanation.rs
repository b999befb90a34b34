//! Natural-language explanation of a finished analysis.
//!
//! The generator sees only what the deterministic pipeline already decided
//! (gene, phenotype, rsids, drug, guideline text) and returns prose. It can
//! not change the risk label, severity or confidence, and it never fails:
//! every error path yields the fixed fallback narrative with `success: false`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use pharmyx_engine::Analysis;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::audit::LlmAuditEntry;
use crate::backend::{complete_within, LlmBackend, LlmError, LlmRequest, Message};

const FALLBACK_SUMMARY: &str = "LLM unavailable. Pharmacogenomic interaction detected.";
const FALLBACK_MECHANISM: &str = "Metabolic pathway affected based on phenotype.";
const FALLBACK_IMPACT: &str = "Clinical dosing adjustments may be required.";

const UNSTRUCTURED_MECHANISM: &str = "Mechanism extraction unavailable.";
const UNSTRUCTURED_IMPACT: &str = "Clinical impact explanation generated but not structured.";

const SYSTEM_PROMPT: &str = "You are a clinical pharmacogenomics assistant that follows CPIC guidelines. \
Be medically accurate and do not invent findings. Reply with a single JSON object and nothing else: \
no markdown, no commentary.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
    pub summary: String,
    pub mechanism: String,
    pub clinical_impact: String,
    pub success: bool,
}

impl Explanation {
    pub fn fallback() -> Self {
        Self {
            summary: FALLBACK_SUMMARY.to_string(),
            mechanism: FALLBACK_MECHANISM.to_string(),
            clinical_impact: FALLBACK_IMPACT.to_string(),
            success: false,
        }
    }

    /// Interpret model output. A JSON object supplies the three fields; any
    /// other text becomes the summary verbatim.
    pub fn from_content(content: &str) -> Self {
        let parsed = serde_json::from_str::<serde_json::Value>(content)
            .ok()
            .filter(|v| v.is_object());

        let Some(json) = parsed else {
            return Self {
                summary: content.to_string(),
                mechanism: UNSTRUCTURED_MECHANISM.to_string(),
                clinical_impact: UNSTRUCTURED_IMPACT.to_string(),
                success: true,
            };
        };

        Self {
            summary: text_field(&json, "summary", content),
            mechanism: text_field(&json, "mechanism", UNSTRUCTURED_MECHANISM),
            clinical_impact: text_field(&json, "clinical_impact", UNSTRUCTURED_IMPACT),
            success: true,
        }
    }
}

fn text_field(json: &serde_json::Value, key: &str, missing: &str) -> String {
    json[key]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(missing)
        .to_string()
}

/// Context handed to the model; copied out of a finished [`Analysis`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplanationRequest {
    pub gene: String,
    pub phenotype: String,
    pub diplotype: String,
    pub rsids: Vec<String>,
    pub drug: String,
    pub guideline: Option<String>,
}

impl ExplanationRequest {
    pub fn from_analysis(analysis: &Analysis) -> Self {
        let guidance = &analysis.assessment.dose_guidance;
        let guideline = match &analysis.guideline {
            Some(title) => format!("{title}: {guidance}"),
            None => guidance.clone(),
        };
        Self {
            gene: analysis.assessment.governing_gene_label().to_string(),
            phenotype: analysis.primary_phenotype().to_string(),
            diplotype: analysis.primary_diplotype().to_string(),
            rsids: analysis.rsids(),
            drug: analysis.assessment.drug.clone(),
            guideline: Some(guideline),
        }
    }

    fn prompt(&self) -> String {
        let variants = if self.rsids.is_empty() {
            "none detected".to_string()
        } else {
            self.rsids.join(", ")
        };
        let guideline = self
            .guideline
            .as_deref()
            .unwrap_or("No additional guideline provided.");

        format!(
            "Patient pharmacogenomic data:\n\n\
             Gene: {gene}\n\
             Diplotype: {diplotype}\n\
             Phenotype: {phenotype}\n\
             Drug: {drug}\n\
             Variants: {variants}\n\n\
             CPIC guideline context:\n{guideline}\n\n\
             Respond with exactly this JSON shape:\n\
             {{\"summary\": \"...\", \"mechanism\": \"...\", \"clinical_impact\": \"...\"}}\n\n\
             Explain the gene-drug metabolic pathway, how the listed variants change it, \
             and what the phenotype means for this drug. State any uncertainty plainly.",
            gene = self.gene,
            diplotype = self.diplotype,
            phenotype = self.phenotype,
            drug = self.drug,
        )
    }
}

pub struct ExplanationGenerator {
    backend: Option<Arc<dyn LlmBackend>>,
    timeout: Duration,
    temperature: f32,
    top_p: f32,
}

impl ExplanationGenerator {
    pub fn new(backend: Arc<dyn LlmBackend>, timeout: Duration) -> Self {
        Self { backend: Some(backend), timeout, temperature: 0.2, top_p: 0.9 }
    }

    /// A generator that always answers with the fallback narrative.
    pub fn disabled() -> Self {
        Self { backend: None, timeout: Duration::ZERO, temperature: 0.2, top_p: 0.9 }
    }

    pub fn with_sampling(mut self, temperature: f32, top_p: f32) -> Self {
        self.temperature = temperature;
        self.top_p = top_p;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    pub async fn explain(&self, req: &ExplanationRequest) -> Explanation {
        let Some(backend) = &self.backend else {
            debug!("Explanation generator disabled; using fallback narrative");
            return Explanation::fallback();
        };

        match self.call(backend.as_ref(), req).await {
            Ok(explanation) => explanation,
            Err(e) => {
                warn!(error = %e, drug = %req.drug, "Explanation generation failed; using fallback");
                Explanation::fallback()
            }
        }
    }

    async fn call(&self, backend: &dyn LlmBackend, req: &ExplanationRequest) -> Result<Explanation, LlmError> {
        let request = LlmRequest {
            messages: vec![Message::system(SYSTEM_PROMPT), Message::user(req.prompt())],
            model: None,
            max_tokens: Some(1024),
            temperature: Some(self.temperature),
            top_p: Some(self.top_p),
            json_mode: true,
        };

        let started = Instant::now();
        let response = complete_within(backend, request, self.timeout).await?;
        LlmAuditEntry::new("explanation", backend.name(), &response, started.elapsed().as_millis() as u64)
            .emit();

        if response.content.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(Explanation::from_content(&response.content))
    }
}
