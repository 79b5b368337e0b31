use crate::utils::{Result, UnphasedCall, DEFAULT_MAX_FILE_SIZE};
use chrono::Datelike;
use clap::{ArgAction, ArgGroup, Parser, Subcommand};
use env_logger::fmt::Color;
use log::{Level, LevelFilter};
use once_cell::sync::Lazy;
use std::{
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

pub static FULL_VERSION: Lazy<String> = Lazy::new(|| {
    format!(
        "{}-{}",
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    )
});

#[derive(Parser)]
#[command(name="pharmaguide",
          version=&**FULL_VERSION,
          about="Pharmacogenomic risk assessment from variant calls",
          long_about = None,
          disable_help_subcommand = true,
          after_help = format!("Copyright (C) {}
Results are intended for research and decision support only and do not
replace clinical judgement.", chrono::Utc::now().year()),
          help_template = "{name} {version}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}{after-help}",
          )]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = ArgAction::Count, help = "Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)")]
    pub verbosity: u8,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Assess drug risks from a variant file")]
    Assess(AssessArgs),
    #[clap(about = "Check a variant file and the knowledge base")]
    Validate(ValidateArgs),
    #[clap(about = "List supported drugs")]
    Drugs(DrugsArgs),
    #[clap(about = "Check that the explainer command responds")]
    ExplainStatus(ExplainStatusArgs),
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("assess")))]
#[command(arg_required_else_help(true))]
pub struct AssessArgs {
    #[clap(required = true)]
    #[clap(short = 'i')]
    #[clap(long = "vcf")]
    #[clap(help = "Variant file (VCF, optionally gzipped)")]
    #[clap(value_name = "VCF")]
    #[arg(value_parser = check_file_exists)]
    pub vcf_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'd')]
    #[clap(long = "drugs")]
    #[clap(help = "Drug names separated by commas or whitespace")]
    #[clap(value_name = "DRUGS")]
    pub drugs: String,

    #[clap(short = 'o')]
    #[clap(long = "output-prefix")]
    #[clap(help = "Prefix for the output JSON file (- for stdout)")]
    #[clap(value_name = "OUTPUT_PREFIX")]
    #[clap(default_value = "-")]
    #[arg(value_parser = check_prefix_path)]
    pub output_prefix: String,

    #[clap(short = 't')]
    #[clap(long = "threads")]
    #[clap(help = "Number of threads")]
    #[clap(value_name = "THREADS")]
    #[clap(default_value = "1")]
    #[arg(value_parser = threads_in_range)]
    pub num_threads: usize,

    #[clap(long = "pretty")]
    #[clap(help = "Pretty-print the JSON output")]
    pub pretty: bool,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "patient-id")]
    #[clap(value_name = "PATIENT_ID")]
    #[clap(help = "Patient identifier (defaults to the VCF sample name)")]
    #[arg(value_parser = check_nonempty)]
    pub patient_id: Option<String>,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "unphased-call")]
    #[clap(value_name = "POLICY")]
    #[clap(help = "Allele copies for variants without a GT field (homozygous or heterozygous)")]
    #[clap(default_value = "homozygous")]
    pub unphased_call: UnphasedCall,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "max-file-size")]
    #[clap(value_name = "BYTES")]
    #[clap(help = "Maximum size of the (decompressed) variant file")]
    #[clap(default_value_t = DEFAULT_MAX_FILE_SIZE)]
    #[arg(value_parser = size_in_range)]
    pub max_file_size: u64,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "knowledge-base")]
    #[clap(value_name = "DIR")]
    #[clap(help = "Directory with knowledge base tables overriding the built-in ones")]
    #[arg(value_parser = check_dir_exists)]
    pub knowledge_base: Option<PathBuf>,

    #[clap(help_heading("Explanation"))]
    #[clap(long = "explainer-cmd")]
    #[clap(value_name = "PROGRAM")]
    #[clap(help = "Command that reads an explanation context as JSON on stdin and prints an explanation as JSON")]
    pub explainer_cmd: Option<String>,

    #[clap(help_heading("Explanation"))]
    #[clap(long = "explainer-arg")]
    #[clap(value_name = "ARG")]
    #[clap(help = "Argument passed to the explainer command (repeatable)")]
    #[clap(action = ArgAction::Append)]
    #[clap(allow_hyphen_values = true)]
    #[clap(requires = "explainer_cmd")]
    pub explainer_args: Vec<String>,

    #[clap(help_heading("Explanation"))]
    #[clap(long = "explain-timeout")]
    #[clap(value_name = "SECONDS")]
    #[clap(help = "Time allowed for explaining all drugs")]
    #[clap(default_value = "30")]
    #[arg(value_parser = seconds_to_duration)]
    pub explain_timeout: Duration,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("validate")))]
#[command(arg_required_else_help(true))]
pub struct ValidateArgs {
    #[clap(required = true)]
    #[clap(short = 'i')]
    #[clap(long = "vcf")]
    #[clap(help = "Variant file (VCF, optionally gzipped)")]
    #[clap(value_name = "VCF")]
    #[arg(value_parser = check_file_exists)]
    pub vcf_path: PathBuf,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "max-file-size")]
    #[clap(value_name = "BYTES")]
    #[clap(help = "Maximum size of the (decompressed) variant file")]
    #[clap(default_value_t = DEFAULT_MAX_FILE_SIZE)]
    #[arg(value_parser = size_in_range)]
    pub max_file_size: u64,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "knowledge-base")]
    #[clap(value_name = "DIR")]
    #[clap(help = "Directory with knowledge base tables overriding the built-in ones")]
    #[arg(value_parser = check_dir_exists)]
    pub knowledge_base: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("drugs")))]
pub struct DrugsArgs {
    #[clap(long = "knowledge-base")]
    #[clap(value_name = "DIR")]
    #[clap(help = "Directory with knowledge base tables overriding the built-in ones")]
    #[arg(value_parser = check_dir_exists)]
    pub knowledge_base: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("explain-status")))]
#[command(arg_required_else_help(true))]
pub struct ExplainStatusArgs {
    #[clap(required = true)]
    #[clap(long = "explainer-cmd")]
    #[clap(value_name = "PROGRAM")]
    #[clap(help = "Command that reads an explanation context as JSON on stdin and prints an explanation as JSON")]
    pub explainer_cmd: String,

    #[clap(long = "explainer-arg")]
    #[clap(value_name = "ARG")]
    #[clap(help = "Argument passed to the explainer command (repeatable)")]
    #[clap(action = ArgAction::Append)]
    #[clap(allow_hyphen_values = true)]
    pub explainer_args: Vec<String>,

    #[clap(long = "explain-timeout")]
    #[clap(value_name = "SECONDS")]
    #[clap(help = "Time allowed for the explanation")]
    #[clap(default_value = "30")]
    #[arg(value_parser = seconds_to_duration)]
    pub explain_timeout: Duration,
}

pub fn init_verbose(args: &Cli) {
    let filter_level: LevelFilter = match args.verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            let level = record.level();
            let mut style = buf.style();
            match record.level() {
                Level::Error => style.set_color(Color::Red),
                Level::Warn => style.set_color(Color::Yellow),
                Level::Info => style.set_color(Color::Green),
                Level::Debug => style.set_color(Color::Blue),
                Level::Trace => style.set_color(Color::Cyan),
            };

            writeln!(
                buf,
                "{} [{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                style.value(level),
                record.args()
            )
        })
        .filter_level(filter_level)
        .init();
}

fn check_prefix_path(s: &str) -> Result<String> {
    if s == "-" {
        return Ok(s.to_string());
    }
    let path = Path::new(s);
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            return Err(format!("Path does not exist: {}", parent_dir.display()));
        }
    }
    Ok(s.to_string())
}

fn threads_in_range(s: &str) -> Result<usize> {
    let thread: usize = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid thread number", s))?;
    if thread >= 1 {
        Ok(thread)
    } else {
        Err("Number of threads must be at least 1".into())
    }
}

fn size_in_range(s: &str) -> Result<u64> {
    let size: u64 = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid size in bytes", s))?;
    if size >= 1 {
        Ok(size)
    } else {
        Err("Maximum file size must be at least 1 byte".into())
    }
}

fn seconds_to_duration(s: &str) -> Result<Duration> {
    let seconds = s
        .parse::<f64>()
        .map_err(|e| format!("Could not parse float: {}", e))?;
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(format!("Timeout must be a positive number of seconds, got: {}", s));
    }
    Ok(Duration::from_secs_f64(seconds))
}

fn check_file_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.exists() {
        Err(format!("File does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn check_dir_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.is_dir() {
        Err(format!("Directory does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn check_nonempty(s: &str) -> Result<String> {
    if s.trim().is_empty() {
        Err("Patient ID cannot be an empty string".to_string())
    } else {
        Ok(s.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_assess_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let vcf = dir.path().join("in.vcf");
        std::fs::write(&vcf, "#CHROM\n").unwrap();
        let cli = Cli::try_parse_from([
            "pharmaguide",
            "assess",
            "--vcf",
            vcf.to_str().unwrap(),
            "--drugs",
            "warfarin,codeine",
        ])
        .unwrap();
        let Command::Assess(args) = cli.command else {
            panic!("expected assess");
        };
        assert_eq!(args.output_prefix, "-");
        assert_eq!(args.num_threads, 1);
        assert_eq!(args.max_file_size, DEFAULT_MAX_FILE_SIZE);
        assert_eq!(args.unphased_call, UnphasedCall::Homozygous);
        assert_eq!(args.explain_timeout, Duration::from_secs(30));
        assert!(args.explainer_cmd.is_none());
    }

    #[test]
    fn parse_explain_status() {
        let cli = Cli::try_parse_from([
            "pharmaguide",
            "explain-status",
            "--explainer-cmd",
            "explain.sh",
            "--explainer-arg",
            "--model=small",
            "--explain-timeout",
            "2.5",
        ])
        .unwrap();
        let Command::ExplainStatus(args) = cli.command else {
            panic!("expected explain-status");
        };
        assert_eq!(args.explainer_cmd, "explain.sh");
        assert_eq!(args.explainer_args, vec!["--model=small"]);
        assert_eq!(args.explain_timeout, Duration::from_millis(2500));
    }

    #[test]
    fn value_parsers() {
        assert!(threads_in_range("0").is_err());
        assert_eq!(threads_in_range("8"), Ok(8));
        assert!(size_in_range("0").is_err());
        assert_eq!(seconds_to_duration("0.5"), Ok(Duration::from_millis(500)));
        assert!(seconds_to_duration("-1").is_err());
        assert!(seconds_to_duration("abc").is_err());
        assert!(check_nonempty("  ").is_err());
        assert_eq!(check_prefix_path("-"), Ok("-".to_string()));
        assert!(check_prefix_path("/nonexistent/dir/out").is_err());
    }
}
