use super::load_knowledge_base;
use crate::cli::ValidateArgs;
use crate::knowledge::KnowledgeBase;
use crate::utils::{read_variant_file, Result};
use crate::vcf::{parse_variants, ParseResult};
use std::collections::BTreeMap;

const SKIPPED_ROW_PREFIX: &str = "Skipped row";

pub fn validate(args: ValidateArgs) -> Result<()> {
    let kb = load_knowledge_base(args.knowledge_base.as_deref())?;
    let bytes = read_variant_file(&args.vcf_path, args.max_file_size)?;
    let parse = parse_variants(&bytes);

    for warning in &parse.warnings {
        log::warn!("{}: {}", args.vcf_path.display(), warning);
    }

    let coverage = gene_coverage(&parse, &kb);
    for (gene, stats) in &coverage {
        log::info!(
            "{}: variants={}, known alleles={}{}",
            gene,
            stats.variants,
            stats.known_alleles,
            if stats.supported { "" } else { " (gene not in knowledge base)" }
        );
    }

    let success_count = parse.variant_count();
    let error_count = parse
        .warnings
        .iter()
        .filter(|w| w.message.starts_with(SKIPPED_ROW_PREFIX))
        .count();
    let total = success_count + error_count;
    let percentage = |count: usize| {
        if total == 0 {
            0.0
        } else {
            (count as f64 / total as f64) * 100.0
        }
    };

    match (parse.success, error_count) {
        (true, 0) => log::info!("Validation successful. Rows pass={}", success_count),
        (true, _) => log::warn!(
            "Validation completed with skipped rows. Rows pass={} ({:.2}%), fail={} ({:.2}%)",
            success_count,
            percentage(success_count),
            error_count,
            percentage(error_count)
        ),
        (false, _) => log::warn!(
            "Validation failed: no valid #CHROM header. Rows recovered={}, fail={}",
            success_count,
            error_count
        ),
    }

    Ok(())
}

#[derive(Debug, Default, PartialEq)]
struct GeneStats {
    variants: usize,
    known_alleles: usize,
    supported: bool,
}

/// Tallies variants per gene; untagged variants are attributed through their
/// rsID when the knowledge base knows it.
fn gene_coverage(parse: &ParseResult, kb: &KnowledgeBase) -> BTreeMap<String, GeneStats> {
    let mut coverage: BTreeMap<String, GeneStats> = BTreeMap::new();
    for variant in &parse.variants {
        let gene = match variant.gene() {
            Some(tag) => Some(tag.to_uppercase()),
            None => variant
                .rsid()
                .and_then(|rsid| kb.gene_for_rsid(rsid))
                .map(|gene| gene.symbol.clone()),
        };
        let Some(gene) = gene else {
            continue;
        };
        let known = variant
            .rsid()
            .is_some_and(|rsid| kb.allele_by_rsid(&gene, rsid).is_some());
        let stats = coverage.entry(gene.clone()).or_default();
        stats.variants += 1;
        stats.known_alleles += usize::from(known);
        stats.supported = kb.gene(&gene).is_some();
    }
    coverage
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coverage_counts_tagged_and_untagged_variants() {
        let vcf = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
                   chr10\t94981296\trs1057910\tA\tC\t.\tPASS\tGENE=CYP2C9\n\
                   chr10\t94942290\trs1799853\tC\tT\t.\tPASS\t.\n\
                   chr10\t1\trs999\tA\tG\t.\tPASS\tGENE=cyp2c9\n\
                   chr16\t31096368\trs9923231\tC\tT\t.\tPASS\tGENE=VKORC1\n\
                   chr1\t1\t.\tA\tG\t.\tPASS\t.\n";
        let kb = KnowledgeBase::builtin().unwrap();
        let coverage = gene_coverage(&parse_variants(vcf.as_bytes()), &kb);
        assert_eq!(coverage.len(), 2);
        assert_eq!(
            coverage["CYP2C9"],
            GeneStats {
                variants: 3,
                known_alleles: 2,
                supported: true
            }
        );
        assert!(!coverage["VKORC1"].supported);
    }
}
