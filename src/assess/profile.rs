use crate::knowledge::Phenotype;
use crate::vcf::Variant;
use serde::Serialize;

/// Diplotype reported when nothing in the input maps to a known allele.
pub const DEFAULT_DIPLOTYPE: &str = "*1/*1";

/// Gene symbol reported for drugs without a primary gene.
pub const UNKNOWN_GENE: &str = "Unknown";

/// How much of the input supports a genotype call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallEvidence {
    /// At least one variant matched a known allele.
    Observed,
    /// The file parsed but nothing matched; the reference diplotype is assumed.
    Reference,
    /// The file failed to parse and nothing matched.
    NoData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributingVariant {
    #[serde(flatten)]
    pub variant: Variant,
    /// Allele the variant was mapped to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allele: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PharmacogenomicProfile {
    pub primary_gene: String,
    pub diplotype: String,
    pub phenotype: Phenotype,
    pub detected_variants: Vec<ContributingVariant>,
    pub evidence: CallEvidence,
}

impl PharmacogenomicProfile {
    /// Profile for a gene the knowledge base cannot resolve.
    pub fn unresolved(gene: &str, evidence: CallEvidence) -> Self {
        PharmacogenomicProfile {
            primary_gene: gene.to_string(),
            diplotype: DEFAULT_DIPLOTYPE.to_string(),
            phenotype: Phenotype::Indeterminate,
            detected_variants: Vec::new(),
            evidence,
        }
    }

    pub fn cited_variants(&self) -> Vec<String> {
        self.detected_variants
            .iter()
            .map(|v| v.variant.label())
            .collect()
    }
}
