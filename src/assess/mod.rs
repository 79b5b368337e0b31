mod profile;
mod quality;
mod resolver;
mod result;
mod risk;
mod rules;
mod workflow;

pub use profile::{
    CallEvidence, ContributingVariant, PharmacogenomicProfile, DEFAULT_DIPLOTYPE, UNKNOWN_GENE,
};
pub use quality::{audit, QualityMetrics};
pub use resolver::{resolve_profile, ResolverParams};
pub use result::{
    ClinicalRecommendation, DrugResult, ExplanationSlot, GENERATION_ERROR, NOT_CONFIGURED, PENDING,
};
pub use risk::{classify, confidence, RiskAssessment, RiskLabel, Severity};
pub use rules::{default_rule, match_rule, MatchSpecificity, RuleMatch};
pub use workflow::{assess, AssessParams, Assessment, UNKNOWN_PATIENT};
