//! The `/api/analyze` response document and its pre-send validation.

use chrono::{DateTime, SecondsFormat, Utc};
use pharmyx_common::{Gene, Severity, Variant};
use pharmyx_engine::{Analysis, PgxTables};
use pharmyx_llm::{AdvisoryReport, Explanation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

pub const GUIDELINE_SOURCE: &str = "CPIC";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub patient_id: String,
    pub drug: String,
    pub timestamp: String,
    pub risk_assessment: RiskAssessment,
    pub pharmacogenomic_profile: ProfileSection,
    pub clinical_recommendation: ClinicalRecommendation,
    pub llm_generated_explanation: Explanation,
    pub quality_metrics: QualityMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advisory: Option<AdvisoryReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_label: String,
    pub confidence_score: f64,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSection {
    pub primary_gene: String,
    pub diplotype: String,
    pub phenotype: String,
    pub detected_variants: Vec<Variant>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalRecommendation {
    pub guideline_source: String,
    pub recommendation_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guideline: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub vcf_parsing_success: bool,
    pub genes_detected: usize,
    pub missing_annotations: Vec<Gene>,
    pub llm_success: bool,
}

/// `PATIENT_<sample>`, or a random short id when the VCF names no sample.
pub fn patient_id(sample: Option<&str>) -> String {
    match sample {
        Some(s) => format!("PATIENT_{s}"),
        None => {
            let id = Uuid::new_v4().simple().to_string();
            format!("PATIENT_{}", id[..8].to_uppercase())
        }
    }
}

impl AnalysisResponse {
    pub fn build(
        analysis: &Analysis,
        explanation: Explanation,
        advisory: Option<AdvisoryReport>,
        at: DateTime<Utc>,
    ) -> Self {
        let llm_success = explanation.success;
        Self {
            patient_id: patient_id(analysis.sample_id.as_deref()),
            drug: analysis.assessment.drug.clone(),
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            risk_assessment: RiskAssessment {
                risk_label: analysis.assessment.risk_label.clone(),
                confidence_score: analysis.confidence,
                severity: analysis.assessment.severity,
            },
            pharmacogenomic_profile: ProfileSection {
                primary_gene: analysis.assessment.governing_gene_label().to_string(),
                diplotype: analysis.primary_diplotype().to_string(),
                phenotype: analysis.primary_phenotype().to_string(),
                detected_variants: analysis.variants.clone(),
            },
            clinical_recommendation: ClinicalRecommendation {
                guideline_source: GUIDELINE_SOURCE.to_string(),
                recommendation_text: analysis.assessment.dose_guidance.clone(),
                guideline: analysis.guideline.clone(),
            },
            llm_generated_explanation: explanation,
            quality_metrics: QualityMetrics {
                vcf_parsing_success: true,
                genes_detected: analysis.genes_detected().len(),
                missing_annotations: analysis.missing_annotations.clone(),
                llm_success,
            },
            advisory,
        }
    }

    /// Contract check before sending. A failure means the core produced an
    /// inconsistent result, which is reported as a 500.
    pub fn validate(&self, tables: &PgxTables) -> Result<(), ApiError> {
        let breach = |msg: String| Err(ApiError::Contract(msg));

        let score = self.risk_assessment.confidence_score;
        if !(0.0..=1.0).contains(&score) {
            return breach(format!("confidence_score {score} outside [0, 1]"));
        }

        let required = [
            ("patient_id", &self.patient_id),
            ("drug", &self.drug),
            ("timestamp", &self.timestamp),
            ("risk_label", &self.risk_assessment.risk_label),
            ("diplotype", &self.pharmacogenomic_profile.diplotype),
            ("phenotype", &self.pharmacogenomic_profile.phenotype),
            ("recommendation_text", &self.clinical_recommendation.recommendation_text),
            ("summary", &self.llm_generated_explanation.summary),
        ];
        if let Some((name, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return breach(format!("{name} is empty"));
        }

        let expected_gene = tables
            .drugs
            .governing_gene(&self.drug)
            .map_or("none", |g| g.as_str());
        if self.pharmacogenomic_profile.primary_gene != expected_gene {
            return breach(format!(
                "primary_gene {} does not match drug table gene {expected_gene} for {}",
                self.pharmacogenomic_profile.primary_gene, self.drug
            ));
        }

        let metrics = &self.quality_metrics;
        if metrics.genes_detected + metrics.missing_annotations.len() != Gene::ALL.len() {
            return breach("genes_detected and missing_annotations do not cover the gene set".to_string());
        }
        if metrics.llm_success != self.llm_generated_explanation.success {
            return breach("llm_success disagrees with explanation status".to_string());
        }
        if self.advisory.as_ref().is_some_and(|a| !a.non_authoritative) {
            return breach("advisory block must be flagged non-authoritative".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharmyx_common::confidence::ConfidenceWeights;
    use pharmyx_engine::analyze;
    use pharmyx_test_utils::{cyp2c19_star2_vcf, VcfBuilder};

    fn tables() -> &'static PgxTables {
        PgxTables::builtin().unwrap()
    }

    fn sample_response() -> AnalysisResponse {
        let analysis =
            analyze(&cyp2c19_star2_vcf(), "clopidogrel", tables(), &ConfidenceWeights::default()).unwrap();
        AnalysisResponse::build(&analysis, Explanation::fallback(), None, Utc::now())
    }

    #[test]
    fn test_patient_id_forms() {
        assert_eq!(patient_id(Some("NA12878")), "PATIENT_NA12878");
        let generated = patient_id(None);
        assert_eq!(generated.len(), "PATIENT_".len() + 8);
        assert!(generated["PATIENT_".len()..]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_build_fields() {
        let r = sample_response();
        assert_eq!(r.patient_id, "PATIENT_NA12878");
        assert_eq!(r.pharmacogenomic_profile.primary_gene, "CYP2C19");
        assert_eq!(r.pharmacogenomic_profile.diplotype, "*1/*2");
        assert_eq!(r.pharmacogenomic_profile.phenotype, "IM");
        assert_eq!(r.clinical_recommendation.guideline_source, "CPIC");
        assert_eq!(r.quality_metrics.genes_detected, 1);
        assert!(!r.quality_metrics.llm_success);
        assert!(r.validate(tables()).is_ok());
        assert!(DateTime::parse_from_rfc3339(&r.timestamp).is_ok());
    }

    #[test]
    fn test_unsupported_drug_validates_with_none_gene() {
        let vcf = VcfBuilder::new().variant("rs3892097", "CYP2D6", "*4").build();
        let analysis = analyze(&vcf, "aspirin", tables(), &ConfidenceWeights::default()).unwrap();
        let r = AnalysisResponse::build(&analysis, Explanation::fallback(), None, Utc::now());
        assert_eq!(r.pharmacogenomic_profile.primary_gene, "none");
        assert_eq!(r.pharmacogenomic_profile.diplotype, "Unknown");
        assert!(r.validate(tables()).is_ok());
    }

    #[test]
    fn test_validation_catches_breaches() {
        let mut r = sample_response();
        r.risk_assessment.confidence_score = 1.5;
        assert!(matches!(r.validate(tables()), Err(ApiError::Contract(_))));

        let mut r = sample_response();
        r.pharmacogenomic_profile.primary_gene = "CYP2D6".into();
        assert!(matches!(r.validate(tables()), Err(ApiError::Contract(_))));

        let mut r = sample_response();
        r.risk_assessment.risk_label.clear();
        assert!(matches!(r.validate(tables()), Err(ApiError::Contract(_))));

        let mut r = sample_response();
        r.quality_metrics.llm_success = true;
        assert!(matches!(r.validate(tables()), Err(ApiError::Contract(_))));
    }

    #[test]
    fn test_advisory_omitted_when_absent() {
        let json = serde_json::to_value(sample_response()).unwrap();
        assert!(json.get("advisory").is_none());
        assert_eq!(json["pharmacogenomic_profile"]["detected_variants"][0]["star"], "*2");
        assert_eq!(json["risk_assessment"]["severity"], "moderate");
    }
}
