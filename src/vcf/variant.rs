use serde::Serialize;
use std::collections::BTreeMap;

pub const GENE_TAG: &str = "GENE";
pub const RSID_TAG: &str = "RS";
pub const STAR_TAG: &str = "STAR";

/// Sample zygosity recovered from `FORMAT/GT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Zygosity {
    HomRef,
    Het,
    HomAlt,
    NoCall,
}

impl Zygosity {
    /// Parses a diploid or haploid `GT` value; phasing is ignored.
    pub fn from_gt(gt: &str) -> Option<Self> {
        let alleles: Vec<&str> = gt.split(['/', '|']).collect();
        if alleles.is_empty() || alleles.len() > 2 || alleles.iter().any(|a| a.is_empty()) {
            return None;
        }
        if alleles.iter().any(|&a| a == ".") {
            return Some(Zygosity::NoCall);
        }
        let mut indices = Vec::with_capacity(alleles.len());
        for allele in alleles {
            indices.push(allele.parse::<u32>().ok()?);
        }
        let alt_count = indices.iter().filter(|&&i| i > 0).count();
        Some(match (alt_count, indices.len()) {
            (0, _) => Zygosity::HomRef,
            (1, 2) => Zygosity::Het,
            _ => Zygosity::HomAlt,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variant {
    pub chrom: String,
    pub pos: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "ref")]
    pub ref_allele: String,
    #[serde(rename = "alt")]
    pub alt_allele: String,
    pub info: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zygosity: Option<Zygosity>,
}

impl Variant {
    /// Gene symbol from the `GENE` INFO tag.
    pub fn gene(&self) -> Option<&str> {
        self.info_value(GENE_TAG)
    }

    /// Variant identifier: the ID column when set, otherwise the `RS` INFO tag.
    pub fn rsid(&self) -> Option<&str> {
        self.id.as_deref().or_else(|| self.info_value(RSID_TAG))
    }

    /// Star-allele hint from the `STAR` INFO tag.
    pub fn star_hint(&self) -> Option<&str> {
        self.info_value(STAR_TAG)
    }

    pub fn has_gene_tag(&self) -> bool {
        self.gene().is_some()
    }

    pub fn has_rsid(&self) -> bool {
        self.rsid().is_some()
    }

    /// Display label, e.g. `rs1057910` or `chr10:94981296 A>C`.
    pub fn label(&self) -> String {
        match self.rsid() {
            Some(rsid) => rsid.to_string(),
            None => format!(
                "{}:{} {}>{}",
                self.chrom, self.pos, self.ref_allele, self.alt_allele
            ),
        }
    }

    fn info_value(&self, key: &str) -> Option<&str> {
        self.info
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty() && *v != ".")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseWarning {
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Outcome of parsing a variant file. Failure is encoded in `success` and
/// `warnings`; parsing never aborts.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParseResult {
    pub variants: Vec<Variant>,
    pub success: bool,
    pub warnings: Vec<ParseWarning>,
    pub sample_name: Option<String>,
}

impl ParseResult {
    pub fn variant_count(&self) -> usize {
        self.variants.len()
    }
}
