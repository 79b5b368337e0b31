use std::str::FromStr;

/// How many allele copies a variant without a sample `GT` contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnphasedCall {
    #[default]
    Homozygous,
    Heterozygous,
}

impl UnphasedCall {
    pub fn copies(&self) -> usize {
        match self {
            UnphasedCall::Homozygous => 2,
            UnphasedCall::Heterozygous => 1,
        }
    }
}

impl FromStr for UnphasedCall {
    type Err = &'static str;
    fn from_str(policy: &str) -> Result<Self, Self::Err> {
        match policy {
            "hom" | "homozygous" => Ok(UnphasedCall::Homozygous),
            "het" | "heterozygous" => Ok(UnphasedCall::Heterozygous),
            _ => Err("Invalid unphased call policy. Options are: homozygous, heterozygous"),
        }
    }
}
