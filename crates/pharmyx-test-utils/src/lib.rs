//! Shared fixtures for Pharmyx tests: VCF text builders and canned profiles.

use pharmyx_common::{Diplotype, Gene, GeneProfile, PgxProfile, Phenotype};

pub const VCF_FILE_HEADER: &str = "##fileformat=VCFv4.2";
const COLUMN_HEADER: &str = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO";

/// Builds small single-sample VCF documents.
#[derive(Debug, Clone, Default)]
pub struct VcfBuilder {
    sample: Option<String>,
    lines: Vec<String>,
}

impl VcfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample(mut self, name: impl Into<String>) -> Self {
        self.sample = Some(name.into());
        self
    }

    /// Add a record annotated with `GENE=<gene>;STAR=<star>`.
    pub fn variant(self, rsid: &str, gene: &str, star: &str) -> Self {
        self.info(rsid, &format!("GENE={gene};STAR={star}"))
    }

    /// Add a record with an arbitrary INFO column.
    pub fn info(mut self, rsid: &str, info: &str) -> Self {
        let pos = 100_000 + self.lines.len() * 10;
        let mut line = format!("chr1\t{pos}\t{rsid}\tG\tA\t50\tPASS\t{info}");
        if self.sample.is_some() {
            line.push_str("\tGT\t0/1");
        }
        self.lines.push(line);
        self
    }

    /// Add a line verbatim.
    pub fn raw(mut self, line: &str) -> Self {
        self.lines.push(line.to_string());
        self
    }

    pub fn build(&self) -> String {
        let mut out = vec![VCF_FILE_HEADER.to_string()];
        match &self.sample {
            Some(s) => out.push(format!("{COLUMN_HEADER}\tFORMAT\t{s}")),
            None => out.push(COLUMN_HEADER.to_string()),
        }
        out.extend(self.lines.iter().cloned());
        let mut text = out.join("\n");
        text.push('\n');
        text
    }
}

/// One CYP2C19 *2 carrier, the classic clopidogrel reduced-response case.
pub fn cyp2c19_star2_vcf() -> String {
    VcfBuilder::new()
        .sample("NA12878")
        .variant("rs4244285", "CYP2C19", "*2")
        .build()
}

/// The "normal" label in a gene's own vocabulary.
pub fn normal_phenotype(gene: Gene) -> Phenotype {
    match gene {
        Gene::Slco1b1 => Phenotype::NormalFunction,
        Gene::Tpmt | Gene::Dpyd => Phenotype::NormalActivity,
        _ => Phenotype::Normal,
    }
}

/// A complete profile at wild-type/normal for every gene except `overrides`.
pub fn profile_with(overrides: &[(Gene, Phenotype)]) -> PgxProfile {
    PgxProfile::from_profiles(Gene::ALL.into_iter().map(|gene| {
        let phenotype = overrides
            .iter()
            .find(|(g, _)| *g == gene)
            .map(|(_, p)| *p)
            .unwrap_or_else(|| normal_phenotype(gene));
        GeneProfile {
            gene,
            diplotype: Diplotype::wild_type(),
            phenotype,
            observed_alleles: 0,
        }
    }))
}
