use super::InputError;
use crate::knowledge::KnowledgeBase;
use itertools::Itertools;

/// Normalizes a comma/whitespace separated drug list: names are upper-cased
/// and de-duplicated in first-seen order.
pub fn normalize_drug_names(input: &str) -> Vec<String> {
    input
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| name.to_uppercase())
        .unique()
        .collect()
}

/// Validates a drug list against the supported drugs of the knowledge base.
/// Every unsupported name is reported, not just the first.
pub fn parse_drug_list(
    input: &str,
    kb: &KnowledgeBase,
) -> std::result::Result<Vec<String>, InputError> {
    let drugs = normalize_drug_names(input);
    if drugs.is_empty() {
        return Err(InputError::NoDrugs);
    }

    let unsupported = drugs
        .iter()
        .filter(|drug| kb.primary_gene_for(drug).is_none())
        .cloned()
        .collect_vec();
    if !unsupported.is_empty() {
        return Err(InputError::UnsupportedDrugs(unsupported));
    }
    Ok(drugs)
}
