use super::profile::{CallEvidence, PharmacogenomicProfile};
use super::rules::{MatchSpecificity, RuleMatch};
use crate::knowledge::{Action, Mechanism};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLabel {
    Safe,
    #[serde(rename = "Adjust Dosage")]
    AdjustDosage,
    Toxic,
    Ineffective,
    Unknown,
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskLabel::Safe => "Safe",
            RiskLabel::AdjustDosage => "Adjust Dosage",
            RiskLabel::Toxic => "Toxic",
            RiskLabel::Ineffective => "Ineffective",
            RiskLabel::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    None,
    Low,
    Moderate,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub risk_label: RiskLabel,
    pub severity: Severity,
    pub confidence_score: f64,
}

/// Maps a matched rule and the profile it was matched for to a risk label,
/// severity tier and confidence score. Total over every action/mechanism
/// combination.
pub fn classify(rule_match: &RuleMatch, profile: &PharmacogenomicProfile) -> RiskAssessment {
    let (risk_label, severity) = if rule_match.is_exact() {
        label_and_severity(rule_match, profile)
    } else {
        (RiskLabel::Unknown, Severity::Low)
    };
    RiskAssessment {
        risk_label,
        severity,
        confidence_score: confidence(rule_match.specificity, profile.evidence),
    }
}

fn label_and_severity(
    rule_match: &RuleMatch,
    profile: &PharmacogenomicProfile,
) -> (RiskLabel, Severity) {
    let mechanism = rule_match.rule.mechanism;
    match rule_match.rule.action {
        Action::StandardDose => (RiskLabel::Safe, Severity::None),
        Action::ReduceDose if profile.phenotype.is_poor() => (RiskLabel::AdjustDosage, Severity::High),
        Action::ReduceDose => (RiskLabel::AdjustDosage, Severity::Moderate),
        Action::ConsiderAlternative => match mechanism {
            Mechanism::Efficacy => (RiskLabel::Ineffective, Severity::Moderate),
            Mechanism::Toxicity | Mechanism::None => (RiskLabel::AdjustDosage, Severity::Moderate),
        },
        Action::Avoid | Action::AvoidOrSevereReduction => match mechanism {
            Mechanism::Toxicity => (RiskLabel::Toxic, Severity::Critical),
            Mechanism::Efficacy | Mechanism::None => (RiskLabel::Ineffective, Severity::High),
        },
    }
}

pub fn confidence(specificity: MatchSpecificity, evidence: CallEvidence) -> f64 {
    match (specificity, evidence) {
        (MatchSpecificity::Exact, CallEvidence::Observed) => 0.95,
        (MatchSpecificity::Exact, _) => 0.85,
        (MatchSpecificity::NoRule, _) => 0.3,
        (MatchSpecificity::UnknownGene, _) => 0.2,
        (MatchSpecificity::NoData, _) => 0.1,
    }
}
