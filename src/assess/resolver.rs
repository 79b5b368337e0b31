//! Maps the variants observed for a gene to a diplotype and phenotype.

use super::profile::{CallEvidence, ContributingVariant, PharmacogenomicProfile};
use crate::knowledge::{AlleleDefinition, GeneDefinition, KnowledgeBase};
use crate::utils::UnphasedCall;
use crate::vcf::{ParseResult, Variant, Zygosity};
use arrayvec::ArrayVec;

#[derive(Debug, Clone, Default)]
pub struct ResolverParams {
    pub unphased: UnphasedCall,
}

/// Resolves the profile of `gene` from a parsed variant file.
///
/// The call does not depend on the order of the variants: allele copies are
/// ranked by the gene's allele-function priority and then by allele-table
/// order, and the two best-ranked copies form the diplotype. Missing copies
/// are filled with the reference allele.
pub fn resolve_profile(
    parse: &ParseResult,
    gene: &str,
    kb: &KnowledgeBase,
    params: &ResolverParams,
) -> PharmacogenomicProfile {
    let fallback_evidence = if parse.success {
        CallEvidence::Reference
    } else {
        CallEvidence::NoData
    };
    let Some(gene) = kb.gene(gene) else {
        log::debug!("No allele definitions for gene {}", gene);
        return PharmacogenomicProfile::unresolved(gene, fallback_evidence);
    };

    let mut detected_variants = Vec::new();
    let mut copies: Vec<&AlleleDefinition> = Vec::new();
    let mut matched = false;

    for variant in parse.variants.iter().filter(|v| selects(gene, v)) {
        let allele = map_allele(gene, variant);
        if let Some(allele) = allele {
            matched = true;
            let count = allele_copies(variant, params.unphased);
            copies.extend(std::iter::repeat(allele).take(count));
        }
        detected_variants.push(ContributingVariant {
            variant: variant.clone(),
            allele: allele.map(|a| a.name.clone()),
        });
    }

    copies.sort_by_key(|allele| (gene.priority_rank(allele.function), allele.order));
    let mut pair: ArrayVec<&AlleleDefinition, 2> = copies.into_iter().take(2).collect();
    while !pair.is_full() {
        pair.push(gene.reference());
    }
    let diplotype = gene.diplotype(pair[0], pair[1]);
    let phenotype = kb.phenotype_for(&gene.symbol, &diplotype);

    log::debug!(
        "{}: {} variants, diplotype {} ({})",
        gene.symbol,
        detected_variants.len(),
        diplotype,
        phenotype
    );

    PharmacogenomicProfile {
        primary_gene: gene.symbol.clone(),
        diplotype,
        phenotype,
        detected_variants,
        evidence: if matched {
            CallEvidence::Observed
        } else {
            fallback_evidence
        },
    }
}

/// A variant belongs to a gene through its `GENE` tag, or, when untagged,
/// through an rsID that marks one of the gene's alleles.
fn selects(gene: &GeneDefinition, variant: &Variant) -> bool {
    match variant.gene() {
        Some(tag) => tag.eq_ignore_ascii_case(&gene.symbol),
        None => variant
            .rsid()
            .is_some_and(|rsid| gene.allele_by_rsid(rsid).is_some()),
    }
}

fn map_allele<'a>(gene: &'a GeneDefinition, variant: &Variant) -> Option<&'a AlleleDefinition> {
    if let Some(allele) = variant.rsid().and_then(|rsid| gene.allele_by_rsid(rsid)) {
        return Some(allele);
    }
    let hint = variant.star_hint()?;
    gene.allele_by_name(hint)
        .or_else(|| gene.allele_by_name(&format!("*{}", hint)))
}

fn allele_copies(variant: &Variant, unphased: UnphasedCall) -> usize {
    if variant.alt_allele == "." {
        return 0;
    }
    match variant.zygosity {
        Some(Zygosity::HomAlt) => 2,
        Some(Zygosity::Het) => 1,
        Some(Zygosity::HomRef) | Some(Zygosity::NoCall) => 0,
        None => unphased.copies(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::Phenotype;
    use crate::vcf::parse_variants;

    const HEADER: &str = "##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tSAMPLE1\n";
    const HEADER_NO_SAMPLE: &str = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n";

    fn resolve(vcf: &str, gene: &str) -> PharmacogenomicProfile {
        resolve_with(vcf, gene, UnphasedCall::default())
    }

    fn resolve_with(vcf: &str, gene: &str, unphased: UnphasedCall) -> PharmacogenomicProfile {
        let kb = KnowledgeBase::builtin().unwrap();
        let parse = parse_variants(vcf.as_bytes());
        resolve_profile(&parse, gene, &kb, &ResolverParams { unphased })
    }

    #[test]
    fn single_unphased_row_is_homozygous_by_default() {
        let vcf = format!(
            "{}chr10\t94981296\trs1057910\tA\tC\t.\tPASS\tGENE=CYP2C9\n",
            HEADER_NO_SAMPLE
        );
        let profile = resolve(&vcf, "CYP2C9");
        assert_eq!(profile.diplotype, "*3/*3");
        assert_eq!(profile.phenotype, Phenotype::PoorMetabolizer);
        assert_eq!(profile.evidence, CallEvidence::Observed);
        assert_eq!(profile.detected_variants.len(), 1);
        assert_eq!(profile.detected_variants[0].allele.as_deref(), Some("*3"));
    }

    #[test]
    fn single_unphased_row_with_heterozygous_policy() {
        let vcf = format!(
            "{}chr10\t94981296\trs1057910\tA\tC\t.\tPASS\tGENE=CYP2C9\n",
            HEADER_NO_SAMPLE
        );
        let profile = resolve_with(&vcf, "CYP2C9", UnphasedCall::Heterozygous);
        assert_eq!(profile.diplotype, "*1/*3");
        assert_eq!(profile.phenotype, Phenotype::IntermediateMetabolizer);
    }

    #[test]
    fn genotype_column_sets_copy_number() {
        let vcf = format!(
            "{}chr10\t94981296\trs1057910\tA\tC\t.\tPASS\tGENE=CYP2C9\tGT\t0/1\n\
             chr10\t94942290\trs1799853\tC\tT\t.\tPASS\tGENE=CYP2C9\tGT\t0/1\n",
            HEADER
        );
        let profile = resolve(&vcf, "CYP2C9");
        assert_eq!(profile.diplotype, "*2/*3");
        assert_eq!(profile.phenotype, Phenotype::PoorMetabolizer);
    }

    #[test]
    fn hom_ref_rows_do_not_change_the_call() {
        let vcf = format!(
            "{}chr10\t94981296\trs1057910\tA\tC\t.\tPASS\tGENE=CYP2C9\tGT\t0/0\n",
            HEADER
        );
        let profile = resolve(&vcf, "CYP2C9");
        assert_eq!(profile.diplotype, "*1/*1");
        assert_eq!(profile.evidence, CallEvidence::Observed);
    }

    #[test]
    fn no_matching_variants_gives_reference_diplotype() {
        let vcf = format!(
            "{}chr22\t42126611\trs1065852\tG\tA\t.\tPASS\tGENE=CYP2D6\n",
            HEADER_NO_SAMPLE
        );
        let profile = resolve(&vcf, "CYP2C9");
        assert_eq!(profile.diplotype, "*1/*1");
        assert_eq!(profile.phenotype, Phenotype::NormalMetabolizer);
        assert_eq!(profile.evidence, CallEvidence::Reference);
        assert!(profile.detected_variants.is_empty());
    }

    #[test]
    fn failed_parse_without_matches_has_no_data() {
        let profile = resolve("   \n", "CYP2D6");
        assert_eq!(profile.diplotype, "*1/*1");
        assert_eq!(profile.evidence, CallEvidence::NoData);
    }

    #[test]
    fn headerless_rows_still_contribute() {
        let vcf = "chr10\t94981296\trs1057910\tA\tC\t.\tPASS\tGENE=CYP2C9\n";
        let profile = resolve(vcf, "CYP2C9");
        assert_eq!(profile.diplotype, "*3/*3");
        assert_eq!(profile.evidence, CallEvidence::Observed);
    }

    #[test]
    fn untagged_variant_is_selected_by_rsid() {
        let vcf = format!(
            "{}chr10\t94781859\trs4244285\tG\tA\t.\tPASS\t.\tGT\t0/1\n",
            HEADER
        );
        let profile = resolve(&vcf, "CYP2C19");
        assert_eq!(profile.diplotype, "*1/*2");
        assert_eq!(profile.phenotype, Phenotype::IntermediateMetabolizer);
    }

    #[test]
    fn rsid_from_info_tag_and_star_hint() {
        let vcf = format!(
            "{}chr22\t42130692\t.\tG\tA\t.\tPASS\tGENE=CYP2D6;RS=rs3892097\tGT\t0/1\n\
             chr22\t42126000\t.\tN\t<DUP>\t.\tPASS\tGENE=CYP2D6;STAR=1xN\tGT\t0/1\n",
            HEADER
        );
        let profile = resolve(&vcf, "CYP2D6");
        assert_eq!(profile.diplotype, "*1xN/*4");
        assert_eq!(profile.phenotype, Phenotype::NormalMetabolizer);
    }

    #[test]
    fn unknown_rsid_is_kept_but_not_called() {
        let vcf = format!(
            "{}chr10\t1\trs999\tA\tG\t.\tPASS\tGENE=CYP2C9\n",
            HEADER_NO_SAMPLE
        );
        let profile = resolve(&vcf, "CYP2C9");
        assert_eq!(profile.diplotype, "*1/*1");
        assert_eq!(profile.detected_variants.len(), 1);
        assert_eq!(profile.detected_variants[0].allele, None);
        assert_eq!(profile.evidence, CallEvidence::Reference);
    }

    #[test]
    fn tie_break_prefers_no_function_alleles_cyp2c19() {
        // *17 (increased), *2 (no function) and *3 (no function) all observed
        let vcf = format!(
            "{}chr10\t94761900\trs12248560\tC\tT\t.\tPASS\tGENE=CYP2C19\tGT\t0/1\n\
             chr10\t94781859\trs4244285\tG\tA\t.\tPASS\tGENE=CYP2C19\tGT\t0/1\n\
             chr10\t94780653\trs4986893\tG\tA\t.\tPASS\tGENE=CYP2C19\tGT\t0/1\n",
            HEADER
        );
        let profile = resolve(&vcf, "CYP2C19");
        assert_eq!(profile.diplotype, "*2/*3");
        assert_eq!(profile.phenotype, Phenotype::PoorMetabolizer);
    }

    #[test]
    fn tie_break_cyp2d6_increased_before_decreased() {
        let vcf = format!(
            "{}chr22\t42126611\trs1065852\tG\tA\t.\tPASS\tGENE=CYP2D6\tGT\t0/1\n\
             chr22\t42126000\t.\tN\t<DUP>\t.\tPASS\tGENE=CYP2D6;STAR=*1xN\tGT\t0/1\n\
             chr22\t42127803\trs28371725\tC\tT\t.\tPASS\tGENE=CYP2D6\tGT\t0/1\n",
            HEADER
        );
        let profile = resolve(&vcf, "CYP2D6");
        // *1xN outranks both decreased alleles; *10 precedes *41 in the table
        assert_eq!(profile.diplotype, "*1xN/*10");
    }

    #[test]
    fn tie_break_cyp2c9_same_function_uses_table_order() {
        let vcf = format!(
            "{}chr10\t94981296\trs1057910\tA\tC\t.\tPASS\tGENE=CYP2C9\tGT\t0/1\n\
             chr10\t94942290\trs1799853\tC\tT\t.\tPASS\tGENE=CYP2C9\tGT\t1/1\n",
            HEADER
        );
        let profile = resolve(&vcf, "CYP2C9");
        assert_eq!(profile.diplotype, "*2/*3");
    }

    #[test]
    fn tie_break_tpmt_and_dpyd() {
        let vcf = format!(
            "{}chr6\t18130918\trs1142345\tT\tC\t.\tPASS\tGENE=TPMT\tGT\t1/1\n\
             chr6\t18139228\trs1800460\tC\tT\t.\tPASS\tGENE=TPMT\tGT\t1/1\n\
             chr1\t97082391\trs67376798\tT\tA\t.\tPASS\tGENE=DPYD\tGT\t1/1\n\
             chr1\t97450058\trs3918290\tC\tT\t.\tPASS\tGENE=DPYD\tGT\t0/1\n",
            HEADER
        );
        assert_eq!(resolve(&vcf, "TPMT").diplotype, "*3B/*3B");
        let dpyd = resolve(&vcf, "DPYD");
        assert_eq!(dpyd.diplotype, "*2A/c.2846A>T");
        assert_eq!(dpyd.phenotype, Phenotype::PoorMetabolizer);
    }

    #[test]
    fn tie_break_slco1b1() {
        let vcf = format!(
            "{}chr12\t21178615\trs4149056\tT\tC\t.\tPASS\tGENE=SLCO1B1\tGT\t0/1\n",
            HEADER
        );
        let profile = resolve(&vcf, "SLCO1B1");
        assert_eq!(profile.diplotype, "*1/*5");
        assert_eq!(profile.phenotype, Phenotype::DecreasedFunction);
    }

    #[test]
    fn resolution_is_independent_of_variant_order() {
        let rows = [
            "chr10\t94761900\trs12248560\tC\tT\t.\tPASS\tGENE=CYP2C19\tGT\t0/1",
            "chr10\t94781859\trs4244285\tG\tA\t.\tPASS\tGENE=CYP2C19\tGT\t0/1",
            "chr10\t94780653\trs4986893\tG\tA\t.\tPASS\tGENE=CYP2C19\tGT\t0/0",
        ];
        let forward = format!("{}{}\n", HEADER, rows.join("\n"));
        let reversed: Vec<&str> = rows.iter().rev().copied().collect();
        let backward = format!("{}{}\n", HEADER, reversed.join("\n"));

        let a = resolve(&forward, "CYP2C19");
        let b = resolve(&backward, "CYP2C19");
        assert_eq!(a.diplotype, b.diplotype);
        assert_eq!(a.phenotype, b.phenotype);
        assert_eq!(a.diplotype, "*2/*17");
    }

    #[test]
    fn unknown_gene_is_unresolved() {
        let profile = resolve(HEADER, "VKORC1");
        assert_eq!(profile.primary_gene, "VKORC1");
        assert_eq!(profile.diplotype, "*1/*1");
        assert_eq!(profile.phenotype, Phenotype::Indeterminate);
        assert_eq!(profile.evidence, CallEvidence::Reference);
    }
}
