use clap::Parser;
use pharmaguide::{
    cli::{init_verbose, Cli, Command, FULL_VERSION},
    commands::{assess, drugs, explain_status, validate},
    utils::{handle_error_and_exit, Result},
};

fn runner() -> Result<()> {
    let cli = Cli::parse();
    init_verbose(&cli);
    let subcommand_name = match cli.command {
        Command::Assess(_) => "assess",
        Command::Validate(_) => "validate",
        Command::Drugs(_) => "drugs",
        Command::ExplainStatus(_) => "explain-status",
    };

    log::info!(
        "Running {}-{} [{}]",
        env!("CARGO_PKG_NAME"),
        *FULL_VERSION,
        subcommand_name
    );
    match cli.command {
        Command::Assess(args) => assess::assess_drugs(args)?,
        Command::Validate(args) => validate::validate(args)?,
        Command::Drugs(args) => drugs::list_drugs(args)?,
        Command::ExplainStatus(args) => explain_status::explain_status(args)?,
    }
    log::info!("{} end", env!("CARGO_PKG_NAME"));
    Ok(())
}

fn main() {
    if let Err(e) = runner() {
        handle_error_and_exit(e);
    }
}
