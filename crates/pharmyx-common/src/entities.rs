//! Core value types for a single pharmacogenomic analysis.
//! Everything here is owned by one analysis call and never mutated after
//! construction.

use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Gene
// ---------------------------------------------------------------------------

/// The supported pharmacogene allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Gene {
    #[serde(rename = "CYP2D6")]
    Cyp2d6,
    #[serde(rename = "CYP2C19")]
    Cyp2c19,
    #[serde(rename = "CYP2C9")]
    Cyp2c9,
    #[serde(rename = "SLCO1B1")]
    Slco1b1,
    #[serde(rename = "TPMT")]
    Tpmt,
    #[serde(rename = "DPYD")]
    Dpyd,
}

impl Gene {
    pub const ALL: [Gene; 6] = [
        Gene::Cyp2d6,
        Gene::Cyp2c19,
        Gene::Cyp2c9,
        Gene::Slco1b1,
        Gene::Tpmt,
        Gene::Dpyd,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gene::Cyp2d6  => "CYP2D6",
            Gene::Cyp2c19 => "CYP2C19",
            Gene::Cyp2c9  => "CYP2C9",
            Gene::Slco1b1 => "SLCO1B1",
            Gene::Tpmt    => "TPMT",
            Gene::Dpyd    => "DPYD",
        }
    }

    /// Exact, case-sensitive symbol match against the allow-list.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Gene::ALL.into_iter().find(|g| g.as_str() == symbol)
    }

    /// Phenotype labels a diplotype of this gene may resolve to.
    /// Transporter and enzyme-activity genes use their own taxonomies.
    pub fn vocabulary(&self) -> &'static [Phenotype] {
        use Phenotype::*;
        match self {
            Gene::Cyp2d6  => &[Poor, Intermediate, Normal, Ultrarapid],
            Gene::Cyp2c19 => &[Poor, Intermediate, Normal, Rapid, Ultrarapid],
            Gene::Cyp2c9  => &[Poor, Intermediate, Normal],
            Gene::Slco1b1 => &[LowFunction, IntermediateFunction, NormalFunction],
            Gene::Tpmt | Gene::Dpyd => &[LowActivity, IntermediateActivity, NormalActivity],
        }
    }

    /// Governing gene of a normalised drug name, from [`SUPPORTED_DRUGS`].
    pub fn for_drug(drug: &str) -> Option<Self> {
        SUPPORTED_DRUGS
            .into_iter()
            .find(|(name, _)| *name == drug)
            .map(|(_, gene)| gene)
    }
}

/// The fixed drug → governing gene pairs. Rule tables must cover exactly
/// these, each keyed on its listed gene.
pub const SUPPORTED_DRUGS: [(&str, Gene); 6] = [
    ("codeine",      Gene::Cyp2d6),
    ("clopidogrel",  Gene::Cyp2c19),
    ("warfarin",     Gene::Cyp2c9),
    ("simvastatin",  Gene::Slco1b1),
    ("azathioprine", Gene::Tpmt),
    ("fluorouracil", Gene::Dpyd),
];

impl fmt::Display for Gene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Phenotype
// ---------------------------------------------------------------------------

/// Closed phenotype label set. `Unknown` means the diplotype was not in the
/// phenotype table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phenotype {
    #[serde(rename = "PM")]
    Poor,
    #[serde(rename = "IM")]
    Intermediate,
    #[serde(rename = "NM")]
    Normal,
    #[serde(rename = "RM")]
    Rapid,
    #[serde(rename = "UM")]
    Ultrarapid,
    #[serde(rename = "Low Function")]
    LowFunction,
    #[serde(rename = "Intermediate Function")]
    IntermediateFunction,
    #[serde(rename = "Normal Function")]
    NormalFunction,
    #[serde(rename = "Low Activity")]
    LowActivity,
    #[serde(rename = "Intermediate Activity")]
    IntermediateActivity,
    #[serde(rename = "Normal Activity")]
    NormalActivity,
    Unknown,
}

impl Phenotype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phenotype::Poor                 => "PM",
            Phenotype::Intermediate         => "IM",
            Phenotype::Normal               => "NM",
            Phenotype::Rapid                => "RM",
            Phenotype::Ultrarapid           => "UM",
            Phenotype::LowFunction          => "Low Function",
            Phenotype::IntermediateFunction => "Intermediate Function",
            Phenotype::NormalFunction       => "Normal Function",
            Phenotype::LowActivity          => "Low Activity",
            Phenotype::IntermediateActivity => "Intermediate Activity",
            Phenotype::NormalActivity       => "Normal Activity",
            Phenotype::Unknown              => "Unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        *self != Phenotype::Unknown
    }
}

impl fmt::Display for Phenotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Ordered: none < low < moderate < high < critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    None,
    Low,
    Moderate,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::None     => "none",
            Severity::Low      => "low",
            Severity::Moderate => "moderate",
            Severity::High     => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Variant
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub rsid: String,   // VCF ID column, opaque
    pub gene: Gene,
    #[serde(rename = "star")]
    pub star_allele: String, // e.g. *2, *17
}

// ---------------------------------------------------------------------------
// Diplotype
// ---------------------------------------------------------------------------

/// Wild-type star allele assumed for any copy without evidence.
pub const WILD_TYPE_ALLELE: &str = "*1";

/// An unordered allele pair in canonical `"<lesser>/<greater>"` form, the two
/// allele strings sorted lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Diplotype(String);

impl Diplotype {
    pub fn canonical(a: &str, b: &str) -> Self {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        Self(format!("{lo}/{hi}"))
    }

    pub fn wild_type() -> Self {
        Self::canonical(WILD_TYPE_ALLELE, WILD_TYPE_ALLELE)
    }

    /// Parse `"*x/*y"` in either order. Returns None unless there are
    /// exactly two non-empty alleles.
    pub fn parse(s: &str) -> Option<Self> {
        let (a, b) = s.trim().split_once('/')?;
        let (a, b) = (a.trim(), b.trim());
        if a.is_empty() || b.is_empty() || b.contains('/') {
            return None;
        }
        Some(Self::canonical(a, b))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Diplotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Gene profile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneProfile {
    pub gene: Gene,
    pub diplotype: Diplotype,
    pub phenotype: Phenotype,
    /// Star-allele annotations seen for this gene; 0 means presumed wild-type.
    pub observed_alleles: usize,
}

/// One GeneProfile per supported gene, built once per analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PgxProfile {
    genes: BTreeMap<Gene, GeneProfile>,
}

impl PgxProfile {
    pub fn from_profiles(profiles: impl IntoIterator<Item = GeneProfile>) -> Self {
        Self {
            genes: profiles.into_iter().map(|p| (p.gene, p)).collect(),
        }
    }

    pub fn get(&self, gene: Gene) -> Option<&GeneProfile> {
        self.genes.get(&gene)
    }

    /// Phenotype for `gene`, `Unknown` when the profile carries nothing for it.
    pub fn phenotype_of(&self, gene: Gene) -> Phenotype {
        self.genes
            .get(&gene)
            .map(|p| p.phenotype)
            .unwrap_or(Phenotype::Unknown)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeneProfile> {
        self.genes.values()
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Supported genes with no detected variant evidence.
    pub fn missing_annotations(&self) -> Vec<Gene> {
        Gene::ALL
            .into_iter()
            .filter(|g| self.genes.get(g).map_or(true, |p| p.observed_alleles == 0))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Drug assessment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrugAssessment {
    pub drug: String,
    #[serde(serialize_with = "serialize_governing_gene")]
    pub governing_gene: Option<Gene>,
    pub matched: bool,
    pub risk_label: String,
    pub severity: Severity,
    pub dose_guidance: String,
}

impl DrugAssessment {
    /// Gene symbol, or `"none"` for unsupported drugs.
    pub fn governing_gene_label(&self) -> &'static str {
        self.governing_gene.map_or("none", |g| g.as_str())
    }
}

fn serialize_governing_gene<S: Serializer>(gene: &Option<Gene>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(gene.map_or("none", |g| g.as_str()))
}
