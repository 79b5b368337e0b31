mod parser;
mod variant;

pub use parser::{parse_variants, FILE_LEVEL};
pub use variant::{ParseResult, ParseWarning, Variant, Zygosity, GENE_TAG, RSID_TAG, STAR_TAG};
