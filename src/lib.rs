pub mod assess;
pub mod cli;
pub mod commands;
pub mod explain;
pub mod knowledge;
pub mod utils;
pub mod vcf;
pub mod writers;
