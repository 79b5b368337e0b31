//! Runs the full assessment for one request: parse once, evaluate every drug
//! independently on a thread pool, audit once and assemble results in input
//! order.

use super::profile::{CallEvidence, PharmacogenomicProfile, UNKNOWN_GENE};
use super::quality::audit;
use super::resolver::{resolve_profile, ResolverParams};
use super::result::{ClinicalRecommendation, DrugResult, ExplanationSlot};
use super::risk::{classify, RiskAssessment};
use super::rules::match_rule;
use crate::knowledge::KnowledgeBase;
use crate::utils::Result;
use crate::vcf::{parse_variants, ParseResult, ParseWarning};
use chrono::{SecondsFormat, Utc};
use rayon::{prelude::*, ThreadPoolBuilder};

pub const UNKNOWN_PATIENT: &str = "PATIENT_UNKNOWN";

#[derive(Debug, Clone)]
pub struct AssessParams {
    pub num_threads: usize,
    /// Overrides the sample name from the variant file header.
    pub patient_id: Option<String>,
    pub resolver: ResolverParams,
}

impl Default for AssessParams {
    fn default() -> Self {
        AssessParams {
            num_threads: 1,
            patient_id: None,
            resolver: ResolverParams::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Assessment {
    pub warnings: Vec<ParseWarning>,
    pub results: Vec<DrugResult>,
}

struct DrugEvaluation {
    profile: PharmacogenomicProfile,
    risk: RiskAssessment,
    recommendation: ClinicalRecommendation,
}

/// Assesses each drug against the variant file. Drug names are expected to
/// be normalized and validated already; a drug without a primary gene still
/// yields a default result.
pub fn assess(
    bytes: &[u8],
    drugs: &[String],
    kb: &KnowledgeBase,
    params: &AssessParams,
) -> Result<Assessment> {
    let parse = parse_variants(bytes);
    if !parse.success {
        log::warn!("Variant file could not be parsed; results fall back to defaults");
    }
    log::info!(
        "Parsed {} variants with {} warnings",
        parse.variant_count(),
        parse.warnings.len()
    );

    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let patient_id = params
        .patient_id
        .clone()
        .or_else(|| parse.sample_name.clone())
        .unwrap_or_else(|| UNKNOWN_PATIENT.to_string());

    log::debug!("Initializing thread pool with {} threads...", params.num_threads);
    let pool = ThreadPoolBuilder::new()
        .num_threads(params.num_threads)
        .thread_name(|i| format!("pharmaguide-{}", i))
        .build()
        .map_err(|e| format!("Failed to initialize thread pool: {}", e))?;

    let evaluations: Vec<DrugEvaluation> = pool.install(|| {
        drugs
            .par_iter()
            .map(|drug| evaluate_drug(&parse, drug, kb, &params.resolver))
            .collect()
    });

    let quality = audit(&parse, evaluations.iter().map(|e| &e.profile));

    let results = drugs
        .iter()
        .zip(evaluations)
        .map(|(drug, evaluation)| DrugResult {
            patient_id: patient_id.clone(),
            drug: drug.clone(),
            timestamp: timestamp.clone(),
            risk_assessment: evaluation.risk,
            pharmacogenomic_profile: evaluation.profile,
            clinical_recommendation: evaluation.recommendation,
            quality_metrics: quality.clone(),
            llm_generated_explanation: ExplanationSlot::Pending,
        })
        .collect();

    Ok(Assessment {
        warnings: parse.warnings,
        results,
    })
}

fn evaluate_drug(
    parse: &ParseResult,
    drug: &str,
    kb: &KnowledgeBase,
    params: &ResolverParams,
) -> DrugEvaluation {
    let profile = match kb.primary_gene_for(drug) {
        Some(gene) => resolve_profile(parse, gene, kb, params),
        None => {
            log::warn!("{}: no primary gene in the knowledge base", drug);
            let evidence = if parse.success {
                CallEvidence::Reference
            } else {
                CallEvidence::NoData
            };
            PharmacogenomicProfile::unresolved(UNKNOWN_GENE, evidence)
        }
    };
    let rule_match = match_rule(&profile, drug, kb);
    let risk = classify(&rule_match, &profile);
    let recommendation = ClinicalRecommendation::new(&rule_match, &profile);
    log::info!(
        "{}: {} {} -> {} ({:?}, confidence {:.2})",
        drug,
        profile.primary_gene,
        profile.diplotype,
        risk.risk_label,
        risk.severity,
        risk.confidence_score
    );
    DrugEvaluation {
        profile,
        risk,
        recommendation,
    }
}
