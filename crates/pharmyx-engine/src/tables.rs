//! Phenotype table and per-drug decision tables.
//!
//! Both are versioned YAML documents. The built-in copies under `data/` are
//! compiled into the binary and parsed once per process; deployments may load
//! replacements at startup. After loading, the tables are read-only.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::OnceLock;

use pharmyx_common::{Diplotype, Gene, PharmyxError, Phenotype, Result, Severity, SUPPORTED_DRUGS};
use serde::{Deserialize, Serialize};
use tracing::info;

const BUILTIN_PHENOTYPES: &str = include_str!("../data/phenotypes.yaml");
const BUILTIN_DRUG_RULES: &str = include_str!("../data/drug_rules.yaml");

static BUILTIN: OnceLock<PgxTables> = OnceLock::new();

/// Case-fold and trim a drug name.
pub fn normalize_drug(name: &str) -> String {
    name.trim().to_lowercase()
}

// ── Phenotype table ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PhenotypeTableFile {
    version: String,
    #[serde(default)]
    source: Option<String>,
    genes: BTreeMap<Gene, BTreeMap<String, Phenotype>>,
}

/// (gene, canonical diplotype) → phenotype.
#[derive(Debug, Clone)]
pub struct PhenotypeTable {
    version: String,
    source: Option<String>,
    entries: HashMap<(Gene, Diplotype), Phenotype>,
}

impl PhenotypeTable {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: PhenotypeTableFile = serde_yaml::from_str(yaml)?;
        let mut entries = HashMap::new();

        for (gene, diplotypes) in file.genes {
            for (key, phenotype) in diplotypes {
                let diplotype = Diplotype::parse(&key).ok_or_else(|| {
                    PharmyxError::Config(format!("{gene}: malformed diplotype key {key:?}"))
                })?;
                if !gene.vocabulary().contains(&phenotype) {
                    return Err(PharmyxError::Config(format!(
                        "{gene} {diplotype}: phenotype {phenotype} is not a {gene} label"
                    )));
                }
                if let Some(prev) = entries.insert((gene, diplotype.clone()), phenotype) {
                    if prev != phenotype {
                        return Err(PharmyxError::Config(format!(
                            "{gene} {diplotype}: conflicting phenotypes {prev} and {phenotype}"
                        )));
                    }
                }
            }
        }

        for gene in Gene::ALL {
            if !entries.contains_key(&(gene, Diplotype::wild_type())) {
                return Err(PharmyxError::Config(format!(
                    "{gene}: phenotype table has no {} entry",
                    Diplotype::wild_type()
                )));
            }
        }

        Ok(Self { version: file.version, source: file.source, entries })
    }

    pub fn from_yaml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Phenotype for a canonical diplotype; `Unknown` on miss.
    pub fn lookup(&self, gene: Gene, diplotype: &Diplotype) -> Phenotype {
        self.entries
            .get(&(gene, diplotype.clone()))
            .copied()
            .unwrap_or(Phenotype::Unknown)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Drug decision tables ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub risk_label: String,
    pub severity: Severity,
    pub dose_guidance: String,
}

/// One drug's decision table. `default` is mandatory: every drug owns the
/// branch for phenotype labels it does not call out.
#[derive(Debug, Clone, Deserialize)]
pub struct DrugRule {
    pub gene: Gene,
    #[serde(default)]
    pub guideline: Option<String>,
    #[serde(default)]
    pub phenotypes: BTreeMap<Phenotype, RuleOutcome>,
    pub default: RuleOutcome,
}

impl DrugRule {
    pub fn outcome_for(&self, phenotype: Phenotype) -> &RuleOutcome {
        self.phenotypes.get(&phenotype).unwrap_or(&self.default)
    }
}

#[derive(Debug, Deserialize)]
struct DrugRulesFile {
    version: String,
    drugs: BTreeMap<String, DrugRule>,
}

/// Drug → (governing gene, decision table). Loading rejects any file whose
/// drug set or genes differ from [`SUPPORTED_DRUGS`].
#[derive(Debug, Clone)]
pub struct DrugRuleSet {
    version: String,
    drugs: BTreeMap<String, DrugRule>,
}

impl DrugRuleSet {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: DrugRulesFile = serde_yaml::from_str(yaml)?;
        let mut drugs = BTreeMap::new();

        for (name, rule) in file.drugs {
            let key = normalize_drug(&name);
            if key.is_empty() {
                return Err(PharmyxError::Config("drug rules contain an empty drug name".to_string()));
            }
            match Gene::for_drug(&key) {
                None => {
                    return Err(PharmyxError::Config(format!("{key}: not a supported drug")));
                }
                Some(expected) if expected != rule.gene => {
                    return Err(PharmyxError::Config(format!(
                        "{key}: governed by {expected}, rules file says {}",
                        rule.gene
                    )));
                }
                Some(_) => {}
            }
            for (phenotype, outcome) in &rule.phenotypes {
                if !rule.gene.vocabulary().contains(phenotype) {
                    return Err(PharmyxError::Config(format!(
                        "{key}: rule keyed on {phenotype}, which {} never resolves to",
                        rule.gene
                    )));
                }
                check_outcome(&key, outcome)?;
            }
            check_outcome(&key, &rule.default)?;

            if drugs.insert(key.clone(), rule).is_some() {
                return Err(PharmyxError::Config(format!("{key}: drug defined twice")));
            }
        }

        if let Some((missing, _)) = SUPPORTED_DRUGS.iter().find(|(d, _)| !drugs.contains_key(*d)) {
            return Err(PharmyxError::Config(format!("drug rules have no table for {missing}")));
        }

        Ok(Self { version: file.version, drugs })
    }

    pub fn from_yaml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Look up by raw (un-normalised) drug name.
    pub fn get(&self, drug: &str) -> Option<&DrugRule> {
        self.drugs.get(&normalize_drug(drug))
    }

    pub fn governing_gene(&self, drug: &str) -> Option<Gene> {
        self.get(drug).map(|r| r.gene)
    }

    /// Supported drugs in name order.
    pub fn drugs(&self) -> impl Iterator<Item = (&str, &DrugRule)> {
        self.drugs.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

fn check_outcome(drug: &str, outcome: &RuleOutcome) -> Result<()> {
    if outcome.risk_label.trim().is_empty() || outcome.dose_guidance.trim().is_empty() {
        return Err(PharmyxError::Config(format!(
            "{drug}: rule outcome needs a risk label and dose guidance"
        )));
    }
    Ok(())
}

// ── Combined ──────────────────────────────────────────────────────────────────

/// Everything the deterministic pipeline reads. Shared read-only between
/// concurrent analyses.
#[derive(Debug, Clone)]
pub struct PgxTables {
    pub phenotypes: PhenotypeTable,
    pub drugs: DrugRuleSet,
}

impl PgxTables {
    pub fn new(phenotypes: PhenotypeTable, drugs: DrugRuleSet) -> Self {
        Self { phenotypes, drugs }
    }

    /// The tables compiled into this build, parsed on first use.
    pub fn builtin() -> Result<&'static PgxTables> {
        if let Some(tables) = BUILTIN.get() {
            return Ok(tables);
        }
        let parsed = Self::new(
            PhenotypeTable::from_yaml_str(BUILTIN_PHENOTYPES)?,
            DrugRuleSet::from_yaml_str(BUILTIN_DRUG_RULES)?,
        );
        Ok(BUILTIN.get_or_init(|| parsed))
    }

    /// Built-in tables with optional file overrides for either half.
    pub fn load(phenotype_path: Option<&Path>, rules_path: Option<&Path>) -> Result<PgxTables> {
        let phenotypes = match phenotype_path {
            Some(p) => {
                info!(path = %p.display(), "Loading phenotype table override");
                PhenotypeTable::from_yaml(p)?
            }
            None => PhenotypeTable::from_yaml_str(BUILTIN_PHENOTYPES)?,
        };
        let drugs = match rules_path {
            Some(p) => {
                info!(path = %p.display(), "Loading drug rules override");
                DrugRuleSet::from_yaml(p)?
            }
            None => DrugRuleSet::from_yaml_str(BUILTIN_DRUG_RULES)?,
        };
        info!(
            phenotype_version = phenotypes.version(),
            rules_version = drugs.version(),
            entries = phenotypes.len(),
            "PGx tables loaded"
        );
        Ok(Self::new(phenotypes, drugs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tables_parse() {
        let tables = PgxTables::builtin().unwrap();
        assert_eq!(tables.phenotypes.version(), "2024.1");
        assert!(tables.phenotypes.len() > 50);
    }

    #[test]
    fn test_builtin_covers_exactly_six_drugs() {
        let tables = PgxTables::builtin().unwrap();
        let pairs: Vec<(&str, Gene)> = tables.drugs.drugs().map(|(d, r)| (d, r.gene)).collect();
        assert_eq!(
            pairs,
            vec![
                ("azathioprine", Gene::Tpmt),
                ("clopidogrel", Gene::Cyp2c19),
                ("codeine", Gene::Cyp2d6),
                ("fluorouracil", Gene::Dpyd),
                ("simvastatin", Gene::Slco1b1),
                ("warfarin", Gene::Cyp2c9),
            ]
        );
    }

    #[test]
    fn test_wild_type_is_normal_for_every_gene() {
        let table = &PgxTables::builtin().unwrap().phenotypes;
        for gene in Gene::ALL {
            let p = table.lookup(gene, &Diplotype::wild_type());
            assert!(
                matches!(p, Phenotype::Normal | Phenotype::NormalFunction | Phenotype::NormalActivity),
                "{gene} *1/*1 resolved to {p}"
            );
        }
    }

    #[test]
    fn test_lookup_miss_is_unknown() {
        let table = &PgxTables::builtin().unwrap().phenotypes;
        assert_eq!(
            table.lookup(Gene::Cyp2c9, &Diplotype::canonical("*1", "*99")),
            Phenotype::Unknown
        );
    }

    #[test]
    fn test_reversed_keys_are_canonicalised() {
        let yaml = r#"
version: "t"
genes:
  CYP2D6: { "*1/*1": NM, "*4/*1": IM }
  CYP2C19: { "*1/*1": NM }
  CYP2C9: { "*1/*1": NM }
  SLCO1B1: { "*1/*1": Normal Function }
  TPMT: { "*1/*1": Normal Activity }
  DPYD: { "*1/*1": Normal Activity }
"#;
        let table = PhenotypeTable::from_yaml_str(yaml).unwrap();
        assert_eq!(table.lookup(Gene::Cyp2d6, &Diplotype::canonical("*1", "*4")), Phenotype::Intermediate);
    }

    #[test]
    fn test_conflicting_duplicate_rejected() {
        let yaml = r#"
version: "t"
genes:
  CYP2D6: { "*1/*1": NM, "*1/*4": IM, "*4/*1": PM }
  CYP2C19: { "*1/*1": NM }
  CYP2C9: { "*1/*1": NM }
  SLCO1B1: { "*1/*1": Normal Function }
  TPMT: { "*1/*1": Normal Activity }
  DPYD: { "*1/*1": Normal Activity }
"#;
        assert!(matches!(PhenotypeTable::from_yaml_str(yaml), Err(PharmyxError::Config(_))));
    }

    #[test]
    fn test_missing_wild_type_rejected() {
        let yaml = r#"
version: "t"
genes:
  CYP2D6: { "*1/*1": NM }
"#;
        assert!(matches!(PhenotypeTable::from_yaml_str(yaml), Err(PharmyxError::Config(_))));
    }

    #[test]
    fn test_label_outside_gene_vocabulary_rejected() {
        let yaml = r#"
version: "t"
genes:
  CYP2D6: { "*1/*1": NM }
  CYP2C19: { "*1/*1": NM }
  CYP2C9: { "*1/*1": Normal Function }
  SLCO1B1: { "*1/*1": Normal Function }
  TPMT: { "*1/*1": Normal Activity }
  DPYD: { "*1/*1": Normal Activity }
"#;
        assert!(matches!(PhenotypeTable::from_yaml_str(yaml), Err(PharmyxError::Config(_))));
    }

    #[test]
    fn test_drug_without_default_rejected() {
        let yaml = r#"
version: "t"
drugs:
  codeine:
    gene: CYP2D6
    phenotypes:
      PM: { risk_label: Ineffective, severity: high, dose_guidance: "Avoid." }
"#;
        assert!(matches!(DrugRuleSet::from_yaml_str(yaml), Err(PharmyxError::Yaml(_))));
    }

    #[test]
    fn test_rule_on_foreign_label_rejected() {
        let yaml = r#"
version: "t"
drugs:
  simvastatin:
    gene: SLCO1B1
    phenotypes:
      PM: { risk_label: Myopathy Risk, severity: high, dose_guidance: "Lower dose." }
    default: { risk_label: Safe, severity: low, dose_guidance: "Standard dosing recommended." }
"#;
        assert!(matches!(DrugRuleSet::from_yaml_str(yaml), Err(PharmyxError::Config(_))));
    }

    #[test]
    fn test_remapped_drug_gene_rejected() {
        let remapped = BUILTIN_DRUG_RULES.replace("gene: CYP2C9", "gene: CYP2D6");
        let err = DrugRuleSet::from_yaml_str(&remapped).unwrap_err();
        assert!(matches!(&err, PharmyxError::Config(msg) if msg.contains("warfarin")), "{err}");
    }

    #[test]
    fn test_partial_drug_set_rejected() {
        let yaml = r#"
version: "t"
drugs:
  warfarin:
    gene: CYP2C9
    default: { risk_label: Safe, severity: low, dose_guidance: "Standard dosing recommended." }
"#;
        assert!(matches!(DrugRuleSet::from_yaml_str(yaml), Err(PharmyxError::Config(_))));
    }

    #[test]
    fn test_extra_drug_rejected() {
        let extra = format!(
            "{BUILTIN_DRUG_RULES}\n  aspirin:\n    gene: CYP2C9\n    default: {{ risk_label: Safe, severity: low, dose_guidance: \"Standard dosing recommended.\" }}\n"
        );
        let err = DrugRuleSet::from_yaml_str(&extra).unwrap_err();
        assert!(matches!(&err, PharmyxError::Config(msg) if msg.contains("aspirin")), "{err}");
    }

    #[test]
    fn test_drug_names_case_folded_and_unique() {
        let yaml = r#"
version: "t"
drugs:
  Codeine:
    gene: CYP2D6
    default: { risk_label: Safe, severity: low, dose_guidance: "Standard dosing recommended." }
  codeine:
    gene: CYP2D6
    default: { risk_label: Safe, severity: low, dose_guidance: "Standard dosing recommended." }
"#;
        assert!(matches!(DrugRuleSet::from_yaml_str(yaml), Err(PharmyxError::Config(_))));

        let rules = &PgxTables::builtin().unwrap().drugs;
        assert_eq!(rules.governing_gene("  CLOPIDOGREL "), Some(Gene::Cyp2c19));
        assert_eq!(rules.governing_gene("aspirin"), None);
    }

    #[test]
    fn test_load_without_overrides_matches_builtin() {
        let loaded = PgxTables::load(None, None).unwrap();
        let builtin = PgxTables::builtin().unwrap();
        assert_eq!(loaded.phenotypes.len(), builtin.phenotypes.len());
        assert_eq!(loaded.drugs.version(), builtin.drugs.version());
    }

    fn write_temp(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("pharmyx-{}-{name}", std::process::id()));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_phenotype_override_from_file() {
        let path = write_temp(
            "phenotypes.yaml",
            r#"
version: "site-1"
genes:
  CYP2D6: { "*1/*1": NM }
  CYP2C19: { "*1/*1": NM, "*2/*1": PM }
  CYP2C9: { "*1/*1": NM }
  SLCO1B1: { "*1/*1": Normal Function }
  TPMT: { "*1/*1": Normal Activity }
  DPYD: { "*1/*1": Normal Activity }
"#,
        );
        let tables = PgxTables::load(Some(path.as_path()), None).unwrap();
        std::fs::remove_file(&path).unwrap();

        let star2 = Diplotype::canonical("*1", "*2");
        assert_eq!(tables.phenotypes.version(), "site-1");
        assert_eq!(tables.phenotypes.lookup(Gene::Cyp2c19, &star2), Phenotype::Poor);
        assert_eq!(
            PgxTables::builtin().unwrap().phenotypes.lookup(Gene::Cyp2c19, &star2),
            Phenotype::Intermediate
        );
        assert_eq!(tables.drugs.version(), "2024.1");
    }

    #[test]
    fn test_drug_rules_override_from_file() {
        let path = write_temp(
            "drug_rules.yaml",
            &BUILTIN_DRUG_RULES.replace(
                "Consider alternative therapy or monitor closely.",
                "Switch to prasugrel.",
            ),
        );
        let tables = PgxTables::load(None, Some(path.as_path())).unwrap();
        std::fs::remove_file(&path).unwrap();

        let rule = tables.drugs.get("clopidogrel").unwrap();
        assert_eq!(rule.outcome_for(Phenotype::Intermediate).dose_guidance, "Switch to prasugrel.");
    }

    #[test]
    fn test_missing_override_file_is_io_error() {
        let path = std::env::temp_dir().join("pharmyx-no-such-dir/phenotypes.yaml");
        assert!(matches!(PgxTables::load(Some(path.as_path()), None), Err(PharmyxError::Io(_))));
        assert!(matches!(PgxTables::load(None, Some(path.as_path())), Err(PharmyxError::Io(_))));
    }
}
