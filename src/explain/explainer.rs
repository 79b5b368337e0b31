//! Collaborators that turn a deterministic result into a narrative
//! explanation.
//!
//! [`CommandExplainer`] delegates to an external process: the
//! [`ExplanationContext`] is written as JSON to its stdin and an
//! [`Explanation`] is read as JSON from its stdout.

use crate::assess::{
    default_rule, CallEvidence, ClinicalRecommendation, DrugResult, MatchSpecificity,
    PharmacogenomicProfile, RiskLabel, RuleMatch,
};
use crate::knowledge::Phenotype;
use crate::utils::Result;
use crossbeam_channel::{bounded, Receiver};
use serde::{Deserialize, Serialize};
use std::{
    io::{Read, Write},
    process::{Child, Command, ExitStatus, Stdio},
    thread,
    time::{Duration, Instant},
};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Prompt context handed to an explainer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplanationContext {
    pub drug: String,
    pub gene: String,
    pub diplotype: String,
    pub phenotype: Phenotype,
    pub cited_variants: Vec<String>,
    pub recommendation: ClinicalRecommendation,
    pub risk_label: RiskLabel,
}

impl ExplanationContext {
    pub fn from_result(result: &DrugResult) -> Self {
        let profile = &result.pharmacogenomic_profile;
        ExplanationContext {
            drug: result.drug.clone(),
            gene: profile.primary_gene.clone(),
            diplotype: profile.diplotype.clone(),
            phenotype: profile.phenotype,
            cited_variants: profile.cited_variants(),
            recommendation: result.clinical_recommendation.clone(),
            risk_label: result.risk_assessment.risk_label,
        }
    }

    /// Fixed context for checking that an explainer responds: WARFARIN on a
    /// normal CYP2C9 diplotype.
    pub fn status_check() -> Self {
        let mut profile = PharmacogenomicProfile::unresolved("CYP2C9", CallEvidence::Reference);
        profile.phenotype = Phenotype::NormalMetabolizer;
        let rule_match = RuleMatch {
            rule: default_rule("CYP2C9", Phenotype::NormalMetabolizer, "WARFARIN"),
            specificity: MatchSpecificity::Exact,
        };
        ExplanationContext {
            drug: "WARFARIN".to_string(),
            gene: profile.primary_gene.clone(),
            diplotype: profile.diplotype.clone(),
            phenotype: profile.phenotype,
            cited_variants: Vec::new(),
            recommendation: ClinicalRecommendation::new(&rule_match, &profile),
            risk_label: RiskLabel::Safe,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mechanism: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub cited_variants: Vec<String>,
}

pub trait Explainer: Send + Sync {
    /// False when no backend is configured; the caller then records the
    /// `not configured` sentinel without calling [`Explainer::explain`].
    fn is_configured(&self) -> bool {
        true
    }

    /// Explains one result. Implementations should give up once `deadline`
    /// has passed and release anything they started.
    fn explain(&self, context: &ExplanationContext, deadline: Instant) -> Result<Explanation>;
}

/// Explainer used when no backend is configured.
#[derive(Debug, Default)]
pub struct Unconfigured;

impl Explainer for Unconfigured {
    fn is_configured(&self) -> bool {
        false
    }

    fn explain(&self, _context: &ExplanationContext, _deadline: Instant) -> Result<Explanation> {
        Err("No explainer configured".to_string())
    }
}

/// Runs an external command once per explanation.
#[derive(Debug, Clone)]
pub struct CommandExplainer {
    program: String,
    args: Vec<String>,
}

impl CommandExplainer {
    pub fn new(cmd: &[String]) -> Result<Self> {
        let (program, args) = cmd
            .split_first()
            .ok_or_else(|| "Explainer command cannot be empty".to_string())?;
        Ok(CommandExplainer {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl Explainer for CommandExplainer {
    /// The child is killed when it is still running at `deadline`.
    fn explain(&self, context: &ExplanationContext, deadline: Instant) -> Result<Explanation> {
        let payload = serde_json::to_vec(context)
            .map_err(|e| format!("Failed to serialize explanation context: {}", e))?;
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| format!("Failed to spawn explainer {}: {}", self.program, e))?;

        let stdout = child.stdout.take().map(spawn_pipe_reader);
        let stderr = child.stderr.take().map(spawn_pipe_reader);

        // Dropping stdin closes it so the child sees end of input
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(&payload),
            None => Ok(()),
        };
        if let Err(e) = written {
            terminate(&mut child);
            return Err(format!("Failed to write to explainer stdin: {}", e));
        }

        let status = match wait_until(&mut child, deadline) {
            Ok(Some(status)) => status,
            Ok(None) => {
                terminate(&mut child);
                return Err(format!(
                    "Explainer {} timed out and was terminated",
                    self.program
                ));
            }
            Err(e) => {
                terminate(&mut child);
                return Err(e);
            }
        };

        let stdout = collect_pipe(stdout, deadline)?;
        if !status.success() {
            let stderr = collect_pipe(stderr, deadline).unwrap_or_default();
            return Err(format!(
                "Explainer exited with status {:?}: {}",
                status.code(),
                String::from_utf8_lossy(&stderr).trim()
            ));
        }

        let explanation: Explanation = serde_json::from_slice(&stdout)
            .map_err(|e| format!("Failed to parse explainer output: {}", e))?;
        if explanation.summary.trim().is_empty() {
            return Err("Explainer returned an empty summary".to_string());
        }
        Ok(explanation)
    }
}

fn spawn_pipe_reader<R: Read + Send + 'static>(mut pipe: R) -> Receiver<std::io::Result<Vec<u8>>> {
    let (sender, receiver) = bounded(1);
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = sender.send(pipe.read_to_end(&mut buf).map(|_| buf));
    });
    receiver
}

/// Output of a pipe reader; processes that outlive the child and keep the
/// pipe open are not waited for past `deadline`.
fn collect_pipe(
    receiver: Option<Receiver<std::io::Result<Vec<u8>>>>,
    deadline: Instant,
) -> Result<Vec<u8>> {
    let Some(receiver) = receiver else {
        return Ok(Vec::new());
    };
    receiver
        .recv_deadline(deadline)
        .map_err(|_| "Explainer output was not closed before the deadline".to_string())?
        .map_err(|e| format!("Failed to read explainer output: {}", e))
}

/// Polls the child until it exits or `deadline` passes.
fn wait_until(child: &mut Child, deadline: Instant) -> Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child
            .try_wait()
            .map_err(|e| format!("Failed to wait for explainer: {}", e))?
        {
            return Ok(Some(status));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

fn terminate(child: &mut Child) {
    if let Err(e) = child.kill() {
        log::debug!("Failed to kill explainer process {}: {}", child.id(), e);
    }
    let _ = child.wait();
}
