mod explainer;
mod runner;

pub use explainer::{CommandExplainer, Explainer, Explanation, ExplanationContext, Unconfigured};
pub use runner::{explain_results, DEFAULT_EXPLAIN_TIMEOUT};
