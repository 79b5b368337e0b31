use super::profile::PharmacogenomicProfile;
use super::quality::QualityMetrics;
use super::risk::RiskAssessment;
use super::rules::RuleMatch;
use crate::explain::Explanation;
use crate::knowledge::{Action, Mechanism};
use serde::{Serialize, Serializer};

pub const PENDING: &str = "pending";
pub const NOT_CONFIGURED: &str = "not configured";
pub const GENERATION_ERROR: &str = "generation error";

/// Explanation attached to a result. Sentinels serialize as plain strings.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ExplanationSlot {
    #[default]
    Pending,
    NotConfigured,
    GenerationError,
    Generated(Explanation),
}

impl Serialize for ExplanationSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ExplanationSlot::Pending => serializer.serialize_str(PENDING),
            ExplanationSlot::NotConfigured => serializer.serialize_str(NOT_CONFIGURED),
            ExplanationSlot::GenerationError => serializer.serialize_str(GENERATION_ERROR),
            ExplanationSlot::Generated(explanation) => explanation.serialize(serializer),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClinicalRecommendation {
    pub action: Action,
    pub mechanism: Mechanism,
    pub initial_dose: Option<String>,
    pub alternatives: Vec<String>,
    pub monitoring: Vec<String>,
    pub guideline: String,
    pub notes: String,
    pub summary: String,
}

impl ClinicalRecommendation {
    pub fn new(rule_match: &RuleMatch, profile: &PharmacogenomicProfile) -> Self {
        let rule = &rule_match.rule;
        ClinicalRecommendation {
            action: rule.action,
            mechanism: rule.mechanism,
            initial_dose: rule.initial_dose.clone(),
            alternatives: rule.alternatives.clone(),
            monitoring: rule.monitoring.clone(),
            guideline: rule.guideline.clone(),
            notes: rule.notes.clone(),
            summary: summarize(rule_match, profile),
        }
    }
}

fn summarize(rule_match: &RuleMatch, profile: &PharmacogenomicProfile) -> String {
    let drug = &rule_match.rule.drug;
    if !rule_match.is_exact() {
        return format!(
            "No pharmacogenomic guidance for {}; use standard clinical dosing.",
            drug
        );
    }

    let directive = match rule_match.rule.action {
        Action::StandardDose => "Use standard dosing of",
        Action::ReduceDose => "Reduce the dose of",
        Action::Avoid => "Avoid",
        Action::AvoidOrSevereReduction => "Avoid or severely reduce the dose of",
        Action::ConsiderAlternative => "Consider an alternative to",
    };
    let mut summary = format!(
        "{} {} ({} {}, {}).",
        directive,
        drug,
        profile.primary_gene,
        profile.diplotype,
        profile.phenotype.label()
    );
    if !rule_match.rule.alternatives.is_empty() {
        summary.push_str(&format!(
            " Alternatives: {}.",
            rule_match.rule.alternatives.join(", ")
        ));
    }
    summary
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrugResult {
    pub patient_id: String,
    pub drug: String,
    pub timestamp: String,
    pub risk_assessment: RiskAssessment,
    pub pharmacogenomic_profile: PharmacogenomicProfile,
    pub clinical_recommendation: ClinicalRecommendation,
    pub quality_metrics: QualityMetrics,
    pub llm_generated_explanation: ExplanationSlot,
}
