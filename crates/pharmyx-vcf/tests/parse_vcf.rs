use pharmyx_common::{Gene, Variant};
use pharmyx_test_utils::{cyp2c19_star2_vcf, VcfBuilder};
use pharmyx_vcf::parse_vcf;
use pretty_assertions::assert_eq;

#[test]
fn test_single_supported_variant() {
    let parsed = parse_vcf(&cyp2c19_star2_vcf());
    assert_eq!(parsed.sample_id.as_deref(), Some("NA12878"));
    assert_eq!(
        parsed.variants,
        vec![Variant {
            rsid: "rs4244285".to_string(),
            gene: Gene::Cyp2c19,
            star_allele: "*2".to_string(),
        }]
    );
}

#[test]
fn test_irrelevant_and_malformed_lines_are_skipped() {
    let vcf = VcfBuilder::new()
        .variant("rs1", "BRCA1", "*1")
        .info("rs2", "GENE=CYP2D6")
        .info("rs3", "STAR=*4")
        .raw("chr1\t12345\trs4")
        .raw("")
        .variant("rs3892097", "CYP2D6", "*4")
        .variant("rs1142345", "TPMT", "*3C")
        .build();

    let parsed = parse_vcf(&vcf);
    let genes: Vec<Gene> = parsed.variants.iter().map(|v| v.gene).collect();
    assert_eq!(genes, vec![Gene::Cyp2d6, Gene::Tpmt]);
    assert_eq!(parsed.stats.data_lines, 6);
    assert_eq!(parsed.stats.accepted, 2);
    assert_eq!(parsed.stats.unsupported_gene, 1);
    assert_eq!(parsed.stats.missing_annotation, 2);
    assert_eq!(parsed.stats.too_few_columns, 1);
    assert_eq!(parsed.sample_id, None);
}

#[test]
fn test_crlf_line_endings() {
    let vcf = cyp2c19_star2_vcf().replace('\n', "\r\n");
    let parsed = parse_vcf(&vcf);
    assert_eq!(parsed.variants.len(), 1);
    assert_eq!(parsed.variants[0].star_allele, "*2");
    assert_eq!(parsed.sample_id.as_deref(), Some("NA12878"));
}

#[test]
fn test_leading_byte_order_mark() {
    let vcf = VcfBuilder::new()
        .sample("NA1")
        .variant("rs4244285", "CYP2C19", "*2")
        .build();
    let parsed = parse_vcf(&format!("\u{feff}{vcf}"));
    assert_eq!(parsed.sample_id.as_deref(), Some("NA1"));
    assert_eq!(parsed.stats.data_lines, 1);
    assert_eq!(parsed.stats.missing_annotation, 0);
    assert_eq!(parsed.variants.len(), 1);

    let bare = "\u{feff}#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tNA1\n\
                10\t94781859\trs4244285\tG\tA\t.\tPASS\tGENE=CYP2C19;STAR=*2\tGT\t0/1\n";
    let parsed = parse_vcf(bare);
    assert_eq!(parsed.sample_id.as_deref(), Some("NA1"));
    assert_eq!(parsed.stats.data_lines, 1);
}

#[test]
fn test_header_only_file_yields_nothing() {
    let parsed = parse_vcf(&VcfBuilder::new().sample("S1").build());
    assert!(parsed.is_empty());
    assert_eq!(parsed.stats.data_lines, 0);
}

#[test]
fn test_parsing_is_repeatable() {
    let vcf = VcfBuilder::new()
        .variant("rs4244285", "CYP2C19", "*2")
        .variant("rs12248560", "CYP2C19", "*17")
        .build();
    assert_eq!(parse_vcf(&vcf), parse_vcf(&vcf));
    assert_eq!(parse_vcf(&vcf).rsids(), vec!["rs4244285", "rs12248560"]);
}
