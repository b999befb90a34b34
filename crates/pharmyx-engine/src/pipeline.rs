//! End-to-end deterministic analysis of one VCF against one drug.

use pharmyx_common::confidence::{score_with, ConfidenceWeights};
use pharmyx_common::{
    DrugAssessment, Gene, GeneProfile, InputError, PgxProfile, Phenotype, Result, Variant,
};
use pharmyx_vcf::{parse_vcf, ParseStats};
use serde::Serialize;
use tracing::{debug, info};

use crate::resolver::resolve;
use crate::rules::evaluate;
use crate::tables::PgxTables;

/// Result of a single analysis. Built once and handed to collaborators
/// read-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub sample_id: Option<String>,
    pub variants: Vec<Variant>,
    pub profile: PgxProfile,
    pub assessment: DrugAssessment,
    /// Profile of the governing gene; absent for unsupported drugs.
    pub primary: Option<GeneProfile>,
    pub guideline: Option<String>,
    pub confidence: f64,
    pub missing_annotations: Vec<Gene>,
    pub parse_stats: ParseStats,
}

impl Analysis {
    pub fn rsids(&self) -> Vec<String> {
        self.variants.iter().map(|v| v.rsid.clone()).collect()
    }

    pub fn primary_phenotype(&self) -> Phenotype {
        self.primary.as_ref().map_or(Phenotype::Unknown, |p| p.phenotype)
    }

    /// Canonical diplotype of the governing gene, or `"Unknown"`.
    pub fn primary_diplotype(&self) -> &str {
        self.primary.as_ref().map_or("Unknown", |p| p.diplotype.as_str())
    }

    /// Pretty-printed JSON of the whole analysis.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Supported genes with at least one parsed variant.
    pub fn genes_detected(&self) -> Vec<Gene> {
        Gene::ALL
            .into_iter()
            .filter(|g| !self.missing_annotations.contains(g))
            .collect()
    }
}

/// Run parser → resolver → rules → scorer.
///
/// Fails only on input rejection: a blank drug name, or a file with no
/// supported variants. Every other gap is carried in the returned
/// [`Analysis`].
pub fn analyze(
    vcf_text: &str,
    drug: &str,
    tables: &PgxTables,
    weights: &ConfidenceWeights,
) -> Result<Analysis> {
    if drug.trim().is_empty() {
        return Err(InputError::MissingDrug.into());
    }

    let parsed = parse_vcf(vcf_text);
    if parsed.is_empty() {
        debug!(data_lines = parsed.stats.data_lines, "No supported variants; rejecting");
        return Err(InputError::NoSupportedVariants.into());
    }

    let profile = resolve(&parsed.variants, &tables.phenotypes);
    let assessment = evaluate(drug, &profile, &tables.drugs);

    let primary = assessment
        .governing_gene
        .and_then(|g| profile.get(g))
        .cloned();
    let phenotype = primary.as_ref().map_or(Phenotype::Unknown, |p| p.phenotype);
    let guideline = tables
        .drugs
        .get(&assessment.drug)
        .and_then(|r| r.guideline.clone());

    // n counts every accepted variant in the file, not only the governing gene's.
    let confidence = score_with(weights, parsed.variants.len(), phenotype, assessment.matched);
    let missing_annotations = profile.missing_annotations();

    info!(
        drug = %assessment.drug,
        gene = assessment.governing_gene_label(),
        phenotype = %phenotype,
        risk = %assessment.risk_label,
        confidence,
        "Analysis complete"
    );

    Ok(Analysis {
        sample_id: parsed.sample_id,
        variants: parsed.variants,
        profile,
        assessment,
        primary,
        guideline,
        confidence,
        missing_annotations,
        parse_stats: parsed.stats,
    })
}
