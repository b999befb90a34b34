//! pharmyx-engine: Deterministic PGx inference.
//!
//! variant parsing → diplotype/phenotype resolution → drug-risk rules →
//! confidence scoring. No I/O beyond loading the rule tables, no network,
//! no randomness.

pub mod tables;
pub mod resolver;
pub mod rules;
pub mod pipeline;

pub use pipeline::{analyze, Analysis};
pub use resolver::resolve;
pub use rules::evaluate;
pub use tables::{normalize_drug, DrugRule, DrugRuleSet, PgxTables, PhenotypeTable, RuleOutcome};
