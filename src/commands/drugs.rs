use super::load_knowledge_base;
use crate::cli::DrugsArgs;
use crate::utils::Result;
use std::io::{self, Write};

pub fn list_drugs(args: DrugsArgs) -> Result<()> {
    let kb = load_knowledge_base(args.knowledge_base.as_deref())?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let write_error = |e: io::Error| format!("Failed to write drug list: {}", e);
    writeln!(out, "#drug\tgene\tdrug_class").map_err(write_error)?;
    for drug in kb.drugs() {
        writeln!(
            out,
            "{}\t{}\t{}",
            drug.name,
            drug.gene,
            drug.drug_class.as_deref().unwrap_or(".")
        )
        .map_err(write_error)?;
    }
    Ok(())
}
