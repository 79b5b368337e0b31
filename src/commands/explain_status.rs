use super::command_explainer;
use crate::cli::ExplainStatusArgs;
use crate::explain::{Explainer, Explanation, ExplanationContext};
use crate::utils::Result;
use serde::Serialize;
use std::io::{self, Write};
use std::time::{Duration, Instant};

#[derive(Debug, Serialize)]
struct ExplainerStatus {
    status: &'static str,
    elapsed_ms: u128,
    explanation: Explanation,
}

pub fn explain_status(args: ExplainStatusArgs) -> Result<()> {
    let explainer = command_explainer(&args.explainer_cmd, &args.explainer_args)?;
    let status = check_explainer(&explainer, args.explain_timeout)?;
    log::info!(
        "Explainer {} responded in {} ms",
        args.explainer_cmd,
        status.elapsed_ms
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &status)
        .map_err(|e| format!("Failed to write explainer status: {}", e))?;
    writeln!(out).map_err(|e| format!("Failed to write explainer status: {}", e))?;
    Ok(())
}

/// Runs the explainer once on a fixed context.
fn check_explainer(explainer: &dyn Explainer, timeout: Duration) -> Result<ExplainerStatus> {
    let start = Instant::now();
    let explanation = explainer
        .explain(&ExplanationContext::status_check(), start + timeout)
        .map_err(|e| format!("Explainer check failed: {}", e))?;
    Ok(ExplainerStatus {
        status: "ok",
        elapsed_ms: start.elapsed().as_millis(),
        explanation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<Explanation>);

    impl Explainer for Fixed {
        fn explain(&self, context: &ExplanationContext, _deadline: Instant) -> Result<Explanation> {
            assert_eq!(context.drug, "WARFARIN");
            self.0.clone()
        }
    }

    #[test]
    fn responding_explainer_reports_ok() {
        let explainer = Fixed(Ok(Explanation {
            summary: "OK".to_string(),
            mechanism: None,
            source: Some("stub".to_string()),
            cited_variants: Vec::new(),
        }));
        let status = check_explainer(&explainer, Duration::from_secs(1)).unwrap();
        assert_eq!(status.status, "ok");
        assert_eq!(status.explanation.summary, "OK");
    }

    #[test]
    fn failing_explainer_is_an_error() {
        let explainer = Fixed(Err("connection refused".to_string()));
        assert_eq!(
            check_explainer(&explainer, Duration::from_secs(1)).unwrap_err(),
            "Explainer check failed: connection refused"
        );
    }

    #[cfg(unix)]
    #[test]
    fn command_explainer_is_checked() {
        let args = vec![
            "-c".to_string(),
            r#"cat > /dev/null; echo '{"summary":"OK"}'"#.to_string(),
        ];
        let explainer = command_explainer("sh", &args).unwrap();
        let status = check_explainer(&explainer, Duration::from_secs(10)).unwrap();
        assert_eq!(status.explanation.summary, "OK");
    }
}
