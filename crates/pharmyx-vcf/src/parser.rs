//! Line-oriented VCF parser.
//!
//! Only the columns the engine needs are read: ID (3rd) for the rsid and
//! INFO (8th) for the `GENE` and `STAR` annotations. The genotype/sample
//! columns are not interpreted; diplotypes are built later from the number of
//! star-allele annotations seen per gene.

use std::collections::HashMap;

use pharmyx_common::{Gene, Variant};
use serde::Serialize;
use tracing::debug;

const MIN_COLUMNS: usize = 8;
const ID_COLUMN: usize = 2;
const INFO_COLUMN: usize = 7;
const FIRST_SAMPLE_COLUMN: usize = 9;

pub const GENE_KEY: &str = "GENE";
pub const STAR_KEY: &str = "STAR";

/// Why a data line did not become a variant. Dropping is never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    TooFewColumns,
    MissingGene,
    MissingStarAllele,
    UnsupportedGene,
}

/// Per-file bookkeeping of accepted and dropped data lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    pub data_lines: usize,
    pub accepted: usize,
    pub too_few_columns: usize,
    pub missing_annotation: usize,
    pub unsupported_gene: usize,
}

impl ParseStats {
    fn record_drop(&mut self, reason: DropReason) {
        match reason {
            DropReason::TooFewColumns => self.too_few_columns += 1,
            DropReason::MissingGene | DropReason::MissingStarAllele => self.missing_annotation += 1,
            DropReason::UnsupportedGene => self.unsupported_gene += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedVcf {
    /// First sample name from the `#CHROM` header, if the file has one.
    pub sample_id: Option<String>,
    /// Accepted variants in file order.
    pub variants: Vec<Variant>,
    pub stats: ParseStats,
}

impl ParsedVcf {
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn rsids(&self) -> Vec<String> {
        self.variants.iter().map(|v| v.rsid.clone()).collect()
    }
}

/// Parse VCF text. Malformed or irrelevant records are skipped, so this
/// never fails; an empty `variants` list is the caller's concern.
pub fn parse_vcf(content: &str) -> ParsedVcf {
    let mut parsed = ParsedVcf::default();
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    for (idx, raw) in content.split('\n').enumerate() {
        let line = raw.trim_end_matches('\r');

        if let Some(header) = line.strip_prefix('#') {
            if parsed.sample_id.is_none() && header.starts_with("CHROM") {
                parsed.sample_id = sample_from_header(line);
            }
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }

        parsed.stats.data_lines += 1;
        match parse_record(line) {
            Ok(variant) => {
                parsed.stats.accepted += 1;
                parsed.variants.push(variant);
            }
            Err(reason) => {
                debug!(line = idx + 1, ?reason, "Dropped VCF record");
                parsed.stats.record_drop(reason);
            }
        }
    }

    debug!(
        accepted = parsed.stats.accepted,
        data_lines = parsed.stats.data_lines,
        "VCF parsed"
    );
    parsed
}

fn sample_from_header(line: &str) -> Option<String> {
    line.split('\t')
        .nth(FIRST_SAMPLE_COLUMN)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_record(line: &str) -> Result<Variant, DropReason> {
    let cols: Vec<&str> = line.split('\t').collect();
    if cols.len() < MIN_COLUMNS {
        return Err(DropReason::TooFewColumns);
    }

    let info = parse_info(cols[INFO_COLUMN]);
    let gene = info.get(GENE_KEY).ok_or(DropReason::MissingGene)?;
    let star = info.get(STAR_KEY).ok_or(DropReason::MissingStarAllele)?;
    let gene = Gene::from_symbol(gene).ok_or(DropReason::UnsupportedGene)?;

    Ok(Variant {
        rsid: cols[ID_COLUMN].trim().to_string(),
        gene,
        star_allele: star.to_string(),
    })
}

/// Split an INFO field into `KEY=VALUE` pairs. Flags without `=` and pairs
/// with an empty value are left out; a repeated key keeps its first value.
pub fn parse_info(info: &str) -> HashMap<&str, &str> {
    let mut out = HashMap::new();
    for part in info.split(';') {
        if let Some((key, value)) = part.split_once('=') {
            let (key, value) = (key.trim(), value.trim());
            if !key.is_empty() && !value.is_empty() {
                out.entry(key).or_insert(value);
            }
        }
    }
    out
}
