//! POST /api/analyze: multipart upload of one VCF and a drug name.

use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::State;
use axum::response::Json;
use chrono::Utc;
use pharmyx_common::InputError;
use pharmyx_engine::analyze;
use pharmyx_llm::ExplanationRequest;
use tracing::info;

use crate::error::ApiError;
use crate::response::AnalysisResponse;
use crate::state::SharedState;

pub const VCF_FIELD: &str = "vcf";
pub const DRUG_FIELD: &str = "drug";

/// First entry of a comma-separated drug list. Only that drug is analysed.
pub fn first_drug(input: &str) -> Option<&str> {
    input
        .split(',')
        .next()
        .map(str::trim)
        .filter(|d| !d.is_empty())
}

pub async fn analyze_vcf(
    State(state): State<SharedState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let mut multipart = multipart?;
    let mut vcf: Option<String> = None;
    let mut drug: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(VCF_FIELD) => {
                let bytes = field.bytes().await?;
                if !bytes.is_empty() {
                    vcf = Some(String::from_utf8_lossy(&bytes).into_owned());
                }
            }
            Some(DRUG_FIELD) => drug = Some(field.text().await?),
            _ => {}
        }
    }

    let vcf = vcf.ok_or(InputError::MissingVcf)?;
    let drug_input = drug.ok_or(InputError::MissingDrug)?;
    let drug = first_drug(&drug_input).ok_or(InputError::MissingDrug)?;

    let analysis = analyze(&vcf, drug, &state.tables, &state.weights)?;

    // Collaborators run only once the deterministic result is final.
    let request = ExplanationRequest::from_analysis(&analysis);
    let (explanation, advisory) = tokio::join!(
        state.explainer.explain(&request),
        async {
            match &state.advisory {
                Some(mapper) => Some(mapper.map(&analysis.variants).await),
                None => None,
            }
        }
    );

    let response = AnalysisResponse::build(&analysis, explanation, advisory, Utc::now());
    response.validate(&state.tables)?;

    info!(
        patient_id = %response.patient_id,
        drug = %response.drug,
        risk = %response.risk_assessment.risk_label,
        llm_success = response.quality_metrics.llm_success,
        "Analysis served"
    );
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_drug() {
        assert_eq!(first_drug("codeine"), Some("codeine"));
        assert_eq!(first_drug(" Warfarin , codeine"), Some("Warfarin"));
        assert_eq!(first_drug(""), None);
        assert_eq!(first_drug(" ,codeine"), None);
    }
}
