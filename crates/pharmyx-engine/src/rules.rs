//! Drug-risk rule evaluation over a resolved profile.

use pharmyx_common::{DrugAssessment, PgxProfile, Severity};
use tracing::info;

use crate::tables::{normalize_drug, DrugRuleSet};

pub const UNSUPPORTED_DRUG_LABEL: &str = "Unsupported Drug";
pub const UNSUPPORTED_DRUG_GUIDANCE: &str = "Drug not supported in system.";
pub const UNKNOWN_LABEL: &str = "Unknown";
pub const UNKNOWN_GUIDANCE: &str = "No actionable genotype data for the governing gene. \
Use standard dosing with conservative clinical monitoring.";

/// Evaluate one drug against a profile. Unsupported drugs and unresolved
/// phenotypes are reportable outcomes, not errors.
pub fn evaluate(drug: &str, profile: &PgxProfile, rules: &DrugRuleSet) -> DrugAssessment {
    let drug = normalize_drug(drug);

    let Some(rule) = rules.get(&drug) else {
        info!(drug = %drug, "Drug not in rule tables");
        return DrugAssessment {
            drug,
            governing_gene: None,
            matched: false,
            risk_label: UNSUPPORTED_DRUG_LABEL.to_string(),
            severity: Severity::Low,
            dose_guidance: UNSUPPORTED_DRUG_GUIDANCE.to_string(),
        };
    };

    let phenotype = profile.phenotype_of(rule.gene);
    if !phenotype.is_known() {
        info!(drug = %drug, gene = %rule.gene, "Governing gene phenotype unknown");
        return DrugAssessment {
            drug,
            governing_gene: Some(rule.gene),
            matched: false,
            risk_label: UNKNOWN_LABEL.to_string(),
            severity: Severity::Low,
            dose_guidance: UNKNOWN_GUIDANCE.to_string(),
        };
    }

    let outcome = rule.outcome_for(phenotype);
    DrugAssessment {
        drug,
        governing_gene: Some(rule.gene),
        matched: true,
        risk_label: outcome.risk_label.clone(),
        severity: outcome.severity,
        dose_guidance: outcome.dose_guidance.clone(),
    }
}
