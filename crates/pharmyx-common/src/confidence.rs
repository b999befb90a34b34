//! Confidence scoring for a drug assessment.
//!
//! score = base
//!       + evidence  × min(n, saturation) / saturation
//!       + phenotype × [phenotype ≠ Unknown]
//!       + drug_match × [matched]
//!
//! clamped to [0.0, 1.0]. Pure: the same three inputs always give the same score.

use serde::{Deserialize, Serialize};
use crate::entities::Phenotype;

/// Weights of the confidence formula. Components sum to 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceWeights {
    #[serde(default = "default_base")]
    pub base: f64,
    /// Variant yield, linear up to `saturation`
    #[serde(default = "default_evidence")]
    pub evidence: f64,
    /// Resolved (non-Unknown) phenotype
    #[serde(default = "default_phenotype")]
    pub phenotype: f64,
    /// Drug supported and its gene resolved
    #[serde(default = "default_drug_match")]
    pub drug_match: f64,
    /// Variant count at which evidence stops adding confidence
    #[serde(default = "default_saturation")]
    pub saturation: u32,
}

fn default_base() -> f64 { 0.20 }
fn default_evidence() -> f64 { 0.40 }
fn default_phenotype() -> f64 { 0.25 }
fn default_drug_match() -> f64 { 0.15 }
fn default_saturation() -> u32 { 3 }

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            base:       default_base(),
            evidence:   default_evidence(),
            phenotype:  default_phenotype(),
            drug_match: default_drug_match(),
            saturation: default_saturation(),
        }
    }
}

impl ConfidenceWeights {
    /// Validate that all weights are non-negative and sum to ~1.0
    pub fn validate(&self) -> bool {
        let parts = [self.base, self.evidence, self.phenotype, self.drug_match];
        let sum: f64 = parts.iter().sum();
        parts.iter().all(|w| *w >= 0.0) && (sum - 1.0).abs() < 1e-6 && self.saturation > 0
    }
}

/// Score with the default weights.
pub fn score(variant_count: usize, phenotype: Phenotype, drug_matched: bool) -> f64 {
    score_with(&ConfidenceWeights::default(), variant_count, phenotype, drug_matched)
}

pub fn score_with(
    weights: &ConfidenceWeights,
    variant_count: usize,
    phenotype: Phenotype,
    drug_matched: bool,
) -> f64 {
    let saturation = weights.saturation.max(1) as usize;
    let yield_fraction = variant_count.min(saturation) as f64 / saturation as f64;

    let mut confidence = weights.base + weights.evidence * yield_fraction;

    if phenotype.is_known() {
        confidence += weights.phenotype;
    }
    if drug_matched {
        confidence += weights.drug_match;
    }

    confidence.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_sum_to_one() {
        assert!(ConfidenceWeights::default().validate());
    }

    #[test]
    fn test_unknown_unmatched_below_resolved_matched() {
        assert!(score(1, Phenotype::Unknown, false) <= score(3, Phenotype::Poor, true));
    }

    #[test]
    fn test_monotonic_in_variant_count() {
        let mut prev = 0.0;
        for n in 0..10 {
            let s = score(n, Phenotype::Normal, true);
            assert!(s >= prev, "score dropped at n={n}: {s} < {prev}");
            prev = s;
        }
    }

    #[test]
    fn test_saturates() {
        assert_eq!(score(3, Phenotype::Normal, true), score(50, Phenotype::Normal, true));
        assert!((score(3, Phenotype::Normal, true) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_penalties() {
        assert!(score(2, Phenotype::Unknown, true) < score(2, Phenotype::Normal, true));
        assert!(score(2, Phenotype::Normal, false) < score(2, Phenotype::Normal, true));
    }

    #[test]
    fn test_bounded() {
        let heavy = ConfidenceWeights { base: 0.9, evidence: 0.9, ..Default::default() };
        assert!(!heavy.validate());
        let s = score_with(&heavy, 10, Phenotype::Normal, true);
        assert!((0.0..=1.0).contains(&s));
        assert!(score(0, Phenotype::Unknown, false) >= 0.0);
    }
}
