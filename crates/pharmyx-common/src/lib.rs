//! pharmyx-common: Shared types, errors, and scoring used across all Pharmyx crates.

pub mod error;
pub mod entities;
pub mod confidence;

// Re-export commonly used types
pub use entities::{Diplotype, DrugAssessment, Gene, GeneProfile, PgxProfile, Phenotype, Severity, Variant, SUPPORTED_DRUGS};
pub use error::{InputError, PharmyxError, Result};
