use super::explainer::{Explainer, ExplanationContext};
use crate::assess::{DrugResult, ExplanationSlot};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

pub const DEFAULT_EXPLAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Time granted after the deadline for workers to cancel their explainers.
const CANCEL_GRACE: Duration = Duration::from_secs(1);

/// Fills the explanation slot of every result.
///
/// Each drug is explained on its own worker thread; all workers share one
/// deadline, which is also handed to the explainer so it can cancel its own
/// work. A worker that errors or misses the deadline leaves the
/// `generation error` sentinel, and its late result is discarded. The
/// deterministic fields of the results are never touched.
pub fn explain_results(
    results: &mut [DrugResult],
    explainer: Arc<dyn Explainer>,
    timeout: Duration,
) {
    if !explainer.is_configured() {
        for result in results.iter_mut() {
            result.llm_generated_explanation = ExplanationSlot::NotConfigured;
        }
        return;
    }

    let deadline = Instant::now() + timeout;
    let (done_sender, done_receiver) = bounded(results.len());
    let receivers: Vec<Option<Receiver<_>>> = results
        .iter()
        .map(|result| {
            let context = ExplanationContext::from_result(result);
            let explainer = Arc::clone(&explainer);
            let done_sender = done_sender.clone();
            let (sender, receiver) = bounded(1);
            let spawned = thread::Builder::new()
                .name(format!("explain-{}", result.drug))
                .spawn(move || {
                    // The receiver is gone once the deadline has passed
                    let _ = sender.send(explainer.explain(&context, deadline));
                    let _ = done_sender.send(());
                });
            match spawned {
                Ok(_) => Some(receiver),
                Err(e) => {
                    log::error!("{}: failed to start explainer thread: {}", result.drug, e);
                    None
                }
            }
        })
        .collect();
    drop(done_sender);
    let started = receivers.iter().flatten().count();

    for (result, receiver) in results.iter_mut().zip(receivers) {
        let Some(receiver) = receiver else {
            result.llm_generated_explanation = ExplanationSlot::GenerationError;
            continue;
        };
        let remaining = deadline.saturating_duration_since(Instant::now());
        result.llm_generated_explanation = match receiver.recv_timeout(remaining) {
            Ok(Ok(explanation)) => ExplanationSlot::Generated(explanation),
            Ok(Err(e)) => {
                log::warn!("{}: explanation failed: {}", result.drug, e);
                ExplanationSlot::GenerationError
            }
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "{}: explanation timed out after {:.1}s",
                    result.drug,
                    timeout.as_secs_f64()
                );
                ExplanationSlot::GenerationError
            }
            Err(RecvTimeoutError::Disconnected) => {
                log::warn!("{}: explainer thread exited without a result", result.drug);
                ExplanationSlot::GenerationError
            }
        };
    }

    for _ in 0..started {
        if done_receiver.recv_deadline(deadline + CANCEL_GRACE).is_err() {
            log::warn!("Explainer workers still running after the deadline");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assess::{assess, AssessParams};
    use crate::explain::{CommandExplainer, Explanation, Unconfigured};
    use crate::knowledge::KnowledgeBase;
    use crate::utils::Result;

    const VCF: &str = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
                       chr10\t94981296\trs1057910\tA\tC\t.\tPASS\tGENE=CYP2C9\n";

    fn results(drugs: &[&str]) -> Vec<DrugResult> {
        let kb = KnowledgeBase::builtin().unwrap();
        let drugs: Vec<String> = drugs.iter().map(|d| d.to_string()).collect();
        assess(VCF.as_bytes(), &drugs, &kb, &AssessParams::default())
            .unwrap()
            .results
    }

    struct Echo;

    impl Explainer for Echo {
        fn explain(&self, context: &ExplanationContext, _deadline: Instant) -> Result<Explanation> {
            Ok(Explanation {
                summary: format!("{} {} {}", context.drug, context.gene, context.diplotype),
                mechanism: None,
                source: Some("echo".to_string()),
                cited_variants: context.cited_variants.clone(),
            })
        }
    }

    struct Slow(Duration);

    impl Explainer for Slow {
        fn explain(&self, _context: &ExplanationContext, _deadline: Instant) -> Result<Explanation> {
            thread::sleep(self.0);
            Err("too late".to_string())
        }
    }

    struct Failing;

    impl Explainer for Failing {
        fn explain(&self, _context: &ExplanationContext, _deadline: Instant) -> Result<Explanation> {
            Err("backend unavailable".to_string())
        }
    }

    #[test]
    fn unconfigured_explainer_writes_sentinel() {
        let mut results = results(&["WARFARIN", "CODEINE"]);
        explain_results(&mut results, Arc::new(Unconfigured), DEFAULT_EXPLAIN_TIMEOUT);
        for result in &results {
            assert_eq!(result.llm_generated_explanation, ExplanationSlot::NotConfigured);
        }
    }

    #[test]
    fn explanations_fill_each_slot() {
        let mut results = results(&["WARFARIN", "CODEINE"]);
        explain_results(&mut results, Arc::new(Echo), DEFAULT_EXPLAIN_TIMEOUT);
        match &results[0].llm_generated_explanation {
            ExplanationSlot::Generated(explanation) => {
                assert_eq!(explanation.summary, "WARFARIN CYP2C9 *3/*3");
                assert_eq!(explanation.cited_variants, vec!["rs1057910"]);
            }
            other => panic!("unexpected slot {:?}", other),
        }
        match &results[1].llm_generated_explanation {
            ExplanationSlot::Generated(explanation) => {
                assert_eq!(explanation.summary, "CODEINE CYP2D6 *1/*1")
            }
            other => panic!("unexpected slot {:?}", other),
        }
    }

    #[test]
    fn timeout_keeps_deterministic_fields() {
        let mut results = results(&["WARFARIN"]);
        let before = results[0].clone();
        explain_results(
            &mut results,
            Arc::new(Slow(Duration::from_secs(2))),
            Duration::from_millis(50),
        );
        let after = &results[0];
        assert_eq!(after.llm_generated_explanation, ExplanationSlot::GenerationError);
        assert_eq!(after.risk_assessment, before.risk_assessment);
        assert_eq!(after.pharmacogenomic_profile, before.pharmacogenomic_profile);
        assert_eq!(after.clinical_recommendation, before.clinical_recommendation);
        assert_eq!(after.quality_metrics, before.quality_metrics);
    }

    struct Deadline;

    impl Explainer for Deadline {
        fn explain(&self, _context: &ExplanationContext, deadline: Instant) -> Result<Explanation> {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining > Duration::from_secs(5) {
                return Err(format!("deadline too far away: {:?}", remaining));
            }
            Ok(Explanation {
                summary: "within deadline".to_string(),
                mechanism: None,
                source: None,
                cited_variants: Vec::new(),
            })
        }
    }

    #[test]
    fn explainers_receive_the_shared_deadline() {
        let mut results = results(&["WARFARIN", "CODEINE"]);
        explain_results(&mut results, Arc::new(Deadline), Duration::from_secs(5));
        for result in &results {
            assert!(matches!(
                result.llm_generated_explanation,
                ExplanationSlot::Generated(_)
            ));
        }
    }

    #[cfg(unix)]
    #[test]
    fn timed_out_command_does_not_finish() {
        let dir = tempfile::TempDir::new().unwrap();
        let marker = dir.path().join("finished");
        let script = format!("cat > /dev/null; sleep 1; touch '{}'", marker.display());
        let explainer = CommandExplainer::new(&["sh".to_string(), "-c".to_string(), script]).unwrap();
        let mut results = results(&["WARFARIN"]);
        explain_results(&mut results, Arc::new(explainer), Duration::from_millis(100));
        assert_eq!(results[0].llm_generated_explanation, ExplanationSlot::GenerationError);

        thread::sleep(Duration::from_millis(1500));
        assert!(!marker.exists());
    }

    #[test]
    fn explainer_error_writes_sentinel() {
        let mut results = results(&["WARFARIN"]);
        explain_results(&mut results, Arc::new(Failing), DEFAULT_EXPLAIN_TIMEOUT);
        assert_eq!(results[0].llm_generated_explanation, ExplanationSlot::GenerationError);
    }
}
