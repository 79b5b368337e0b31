use super::{command_explainer, load_knowledge_base};
use crate::assess::{assess, AssessParams, ResolverParams};
use crate::cli::AssessArgs;
use crate::explain::{explain_results, Explainer, Unconfigured};
use crate::utils::{create_writer, parse_drug_list, read_variant_file, Result};
use crate::writers::JsonWriter;
use std::sync::Arc;

pub fn assess_drugs(args: AssessArgs) -> Result<()> {
    let kb = load_knowledge_base(args.knowledge_base.as_deref())?;

    let drugs = parse_drug_list(&args.drugs, &kb)?;
    log::info!("Assessing {} drug(s): {}", drugs.len(), drugs.join(", "));
    let bytes = read_variant_file(&args.vcf_path, args.max_file_size)?;

    let params = AssessParams {
        num_threads: args.num_threads,
        patient_id: args.patient_id,
        resolver: ResolverParams {
            unphased: args.unphased_call,
        },
    };
    let mut assessment = assess(&bytes, &drugs, &kb, &params)?;
    for warning in &assessment.warnings {
        log::warn!("{}: {}", args.vcf_path.display(), warning);
    }

    let explainer: Arc<dyn Explainer> = match &args.explainer_cmd {
        Some(program) => Arc::new(command_explainer(program, &args.explainer_args)?),
        None => Arc::new(Unconfigured),
    };
    explain_results(&mut assessment.results, explainer, args.explain_timeout);

    let mut writer = create_writer(&args.output_prefix, "json", |path| {
        JsonWriter::new(path, args.pretty)
    })?;
    writer.write(&assessment.results)?;
    Ok(())
}
