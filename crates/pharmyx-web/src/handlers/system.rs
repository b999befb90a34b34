//! Health and rule-table introspection.

use axum::extract::State;
use axum::response::Json;
use pharmyx_common::Gene;
use serde::Serialize;

use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
    pub llm_enabled: bool,
    pub advisory_enabled: bool,
}

/// GET /api/health
pub async fn health(State(state): State<SharedState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        llm_enabled: state.explainer.is_enabled(),
        advisory_enabled: state.advisory.is_some(),
    })
}

#[derive(Debug, Serialize)]
pub struct DrugSummary {
    pub drug: String,
    pub gene: Gene,
    pub guideline: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TablesSummary {
    pub phenotype_table_version: String,
    pub phenotype_table_source: Option<String>,
    pub phenotype_entries: usize,
    pub drug_rules_version: String,
    pub genes: Vec<Gene>,
    pub drugs: Vec<DrugSummary>,
}

/// GET /api/tables
pub async fn tables(State(state): State<SharedState>) -> Json<TablesSummary> {
    let t = &state.tables;
    Json(TablesSummary {
        phenotype_table_version: t.phenotypes.version().to_string(),
        phenotype_table_source: t.phenotypes.source().map(str::to_string),
        phenotype_entries: t.phenotypes.len(),
        drug_rules_version: t.drugs.version().to_string(),
        genes: Gene::ALL.to_vec(),
        drugs: t
            .drugs
            .drugs()
            .map(|(drug, rule)| DrugSummary {
                drug: drug.to_string(),
                gene: rule.gene,
                guideline: rule.guideline.clone(),
            })
            .collect(),
    })
}
