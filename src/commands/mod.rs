pub mod assess;
pub mod drugs;
pub mod explain_status;
pub mod validate;

use crate::explain::CommandExplainer;
use crate::knowledge::KnowledgeBase;
use crate::utils::Result;
use std::path::Path;

/// Loads the knowledge base from `dir`, or the built-in tables when unset.
fn load_knowledge_base(dir: Option<&Path>) -> Result<KnowledgeBase> {
    let kb = match dir {
        Some(dir) => {
            log::info!("Loading knowledge base from {}", dir.display());
            KnowledgeBase::from_dir(dir)?
        }
        None => KnowledgeBase::builtin()?,
    };
    log::info!(
        "Knowledge base v{}: {} supported drugs",
        kb.version(),
        kb.drugs().len()
    );
    Ok(kb)
}

fn command_explainer(program: &str, args: &[String]) -> Result<CommandExplainer> {
    let mut cmd = vec![program.to_string()];
    cmd.extend(args.iter().cloned());
    CommandExplainer::new(&cmd)
}
