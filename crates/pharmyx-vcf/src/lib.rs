//! pharmyx-vcf: Variant Call Format ingestion.
//! Turns raw single-sample VCF text into typed pharmacogene variants.

pub mod parser;

pub use parser::{parse_info, parse_vcf, DropReason, ParseStats, ParsedVcf};
