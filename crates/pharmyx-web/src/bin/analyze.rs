//! Offline analysis: runs the deterministic pipeline on a local VCF without
//! any LLM collaborator.
//!
//!   pharmyx-analyze --vcf patient.vcf --drug clopidogrel [--json]

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use pharmyx_engine::{analyze, PgxTables};
use pharmyx_web::config::{Config, DEFAULT_CONFIG_PATH};

#[derive(Debug, Parser)]
#[command(name = "pharmyx-analyze", version, about = "Pharmacogenomic risk report for one VCF and one drug")]
struct Args {
    /// Path to a single-sample VCF annotated with GENE and STAR INFO keys
    #[arg(long)]
    vcf: PathBuf,

    /// Drug name (case-insensitive)
    #[arg(long)]
    drug: String,

    /// Print the full analysis as JSON
    #[arg(long)]
    json: bool,

    /// Configuration file for table overrides and scoring weights
    #[arg(long, env = "PHARMYX_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pharmyx_web::init_tracing();

    let args = Args::parse();
    let config = Config::load_from(&args.config)?;
    let tables = PgxTables::load(
        config.tables.phenotypes.as_deref(),
        config.tables.drug_rules.as_deref(),
    )?;

    let vcf = std::fs::read_to_string(&args.vcf)
        .with_context(|| format!("reading {}", args.vcf.display()))?;
    let analysis = analyze(&vcf, &args.drug, &tables, &config.scoring)?;

    if args.json {
        println!("{}", analysis.to_json_pretty()?);
        return Ok(());
    }

    let a = &analysis.assessment;
    println!("Sample:        {}", analysis.sample_id.as_deref().unwrap_or("-"));
    println!("Drug:          {}", a.drug);
    println!("Gene:          {}", a.governing_gene_label());
    println!("Diplotype:     {}", analysis.primary_diplotype());
    println!("Phenotype:     {}", analysis.primary_phenotype());
    println!("Risk:          {} ({})", a.risk_label, a.severity);
    println!("Guidance:      {}", a.dose_guidance);
    println!("Confidence:    {:.2}", analysis.confidence);
    if !analysis.missing_annotations.is_empty() {
        let missing: Vec<&str> = analysis.missing_annotations.iter().map(|g| g.as_str()).collect();
        println!("No variants:   {}", missing.join(", "));
    }
    Ok(())
}
