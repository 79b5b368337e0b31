use super::profile::{CallEvidence, PharmacogenomicProfile};
use crate::knowledge::{Action, DosingRule, KnowledgeBase, Mechanism, Phenotype};
use serde::Serialize;

pub const DEFAULT_GUIDELINE: &str = "None";
pub const DEFAULT_NOTE: &str =
    "No gene-drug interaction found in the knowledge base; follow standard clinical dosing.";

/// How a dosing rule was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSpecificity {
    /// A rule exists for (gene, phenotype, drug).
    Exact,
    /// The gene is known but no rule covers the phenotype.
    NoRule,
    /// The drug has no primary gene.
    UnknownGene,
    /// The variant file could not be parsed and carried no usable calls.
    NoData,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatch {
    pub rule: DosingRule,
    pub specificity: MatchSpecificity,
}

impl RuleMatch {
    pub fn is_exact(&self) -> bool {
        self.specificity == MatchSpecificity::Exact
    }
}

/// Looks up the dosing rule for a resolved profile. Never fails: anything
/// short of an exact match yields the standard-dose default rule.
pub fn match_rule(profile: &PharmacogenomicProfile, drug: &str, kb: &KnowledgeBase) -> RuleMatch {
    let fallback = |specificity| RuleMatch {
        rule: default_rule(&profile.primary_gene, profile.phenotype, drug),
        specificity,
    };

    if kb.primary_gene_for(drug).is_none() {
        return fallback(MatchSpecificity::UnknownGene);
    }
    if profile.evidence == CallEvidence::NoData {
        return fallback(MatchSpecificity::NoData);
    }
    match kb.dosing_rule_for(&profile.primary_gene, profile.phenotype, drug) {
        Some(rule) => RuleMatch {
            rule: rule.clone(),
            specificity: MatchSpecificity::Exact,
        },
        None => {
            log::debug!(
                "No dosing rule for {} {} {}",
                profile.primary_gene,
                profile.phenotype,
                drug
            );
            fallback(MatchSpecificity::NoRule)
        }
    }
}

pub fn default_rule(gene: &str, phenotype: Phenotype, drug: &str) -> DosingRule {
    DosingRule {
        gene: gene.to_string(),
        phenotype,
        drug: drug.to_uppercase(),
        action: Action::StandardDose,
        mechanism: Mechanism::None,
        initial_dose: None,
        alternatives: Vec::new(),
        monitoring: Vec::new(),
        guideline: DEFAULT_GUIDELINE.to_string(),
        notes: DEFAULT_NOTE.to_string(),
    }
}
