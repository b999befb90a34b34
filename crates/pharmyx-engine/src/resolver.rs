//! Gene profile resolution.
//!
//! Diplotypes come purely from how many star-allele annotations a gene
//! collected, in file order: none → `*1/*1`, one → paired with `*1`, two or
//! more → the first two. Zygosity is not read from the sample column.

use std::collections::BTreeMap;

use pharmyx_common::entities::WILD_TYPE_ALLELE;
use pharmyx_common::{Diplotype, Gene, GeneProfile, PgxProfile, Variant};
use tracing::{debug, warn};

use crate::tables::PhenotypeTable;

/// Build a profile covering every supported gene. Never fails; table misses
/// resolve to `Unknown`.
pub fn resolve(variants: &[Variant], table: &PhenotypeTable) -> PgxProfile {
    let mut observed: BTreeMap<Gene, Vec<&str>> = BTreeMap::new();
    for v in variants {
        observed.entry(v.gene).or_default().push(v.star_allele.as_str());
    }

    PgxProfile::from_profiles(Gene::ALL.into_iter().map(|gene| {
        let alleles = observed.get(&gene).map(Vec::as_slice).unwrap_or_default();
        resolve_gene(gene, alleles, table)
    }))
}

pub fn resolve_gene(gene: Gene, alleles: &[&str], table: &PhenotypeTable) -> GeneProfile {
    let diplotype = match alleles {
        [] => Diplotype::wild_type(),
        [only] => Diplotype::canonical(only, WILD_TYPE_ALLELE),
        [first, second, rest @ ..] => {
            if !rest.is_empty() {
                warn!(
                    gene = %gene,
                    observed = alleles.len(),
                    ignored = ?rest,
                    "More than two star alleles for gene; using the first two"
                );
            }
            Diplotype::canonical(first, second)
        }
    };

    let phenotype = table.lookup(gene, &diplotype);
    if !phenotype.is_known() {
        debug!(gene = %gene, diplotype = %diplotype, "Diplotype not in phenotype table");
    }

    GeneProfile {
        gene,
        diplotype,
        phenotype,
        observed_alleles: alleles.len(),
    }
}
