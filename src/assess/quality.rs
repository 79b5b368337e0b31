use super::profile::PharmacogenomicProfile;
use crate::vcf::ParseResult;
use itertools::Itertools;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityMetrics {
    pub vcf_parsing_success: bool,
    pub variant_count: usize,
    pub warning_count: usize,
    pub gene_info_present: bool,
    pub rsid_info_present: bool,
    /// Evaluated genes with at least one selected variant.
    pub genes_with_variants: Vec<String>,
}

/// Summarizes parse and coverage quality; never alters the assessment.
///
/// Tag flags only consider variants selected for the evaluated genes.
pub fn audit<'a, I>(parse: &ParseResult, profiles: I) -> QualityMetrics
where
    I: IntoIterator<Item = &'a PharmacogenomicProfile>,
{
    let profiles: Vec<&PharmacogenomicProfile> = profiles.into_iter().collect();
    let selected = || {
        profiles
            .iter()
            .flat_map(|p| &p.detected_variants)
            .map(|v| &v.variant)
    };
    QualityMetrics {
        vcf_parsing_success: parse.success,
        variant_count: parse.variant_count(),
        warning_count: parse.warnings.len(),
        gene_info_present: selected().any(|v| v.has_gene_tag()),
        rsid_info_present: selected().any(|v| v.has_rsid()),
        genes_with_variants: profiles
            .iter()
            .filter(|p| !p.detected_variants.is_empty())
            .map(|p| p.primary_gene.clone())
            .unique()
            .collect(),
    }
}
