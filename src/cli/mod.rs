//! Command-line parsing for the cohort threshold tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the normalizer/engine code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{DEFAULT_ID_FIELD, DEFAULT_RISK_FIELD};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "fairlend", version, about = "Equal-outcome loan approval thresholds per demographic cohort")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compute per-cohort thresholds and decisions for an applicant CSV.
    Run(RunArgs),
    /// Measure observed approval rates and ClearScore in historical data.
    Audit(AuditArgs),
    /// Write a synthetic HMDA-shaped applicant CSV.
    Sample(SampleArgs),
}

/// Options for `fairlend run`.
#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// Applicant CSV file.
    #[arg(value_name = "CSV")]
    pub input: PathBuf,

    /// Target approval rate per cohort, in [0, 1].
    #[arg(short = 'r', long, env = "FAIRLEND_APPROVAL_RATE", default_value_t = 0.5, allow_negative_numbers = true)]
    pub rate: f64,

    /// Column holding the risk ratio (lower is better).
    #[arg(long, env = "FAIRLEND_RISK_FIELD", default_value = DEFAULT_RISK_FIELD)]
    pub risk_field: String,

    /// Column holding the applicant id (row numbers are used when absent).
    #[arg(long, env = "FAIRLEND_ID_FIELD", default_value = DEFAULT_ID_FIELD)]
    pub id_field: String,

    /// Rename an input column before validation, e.g. `--column race=derived_race`.
    #[arg(long = "column", value_name = "ALIAS=COLUMN")]
    pub columns: Vec<String>,

    /// Cohort that must appear in the output even with no applicants (repeatable).
    #[arg(long = "expect-cohort", value_name = "KEY")]
    pub expect_cohorts: Vec<String>,

    /// Write decisions (id -> approved/denied) as JSON.
    #[arg(short = 'o', long, value_name = "JSON")]
    pub out: Option<PathBuf>,

    /// Write per-cohort statistics as CSV.
    #[arg(long = "export-stats", value_name = "CSV")]
    pub export_stats: Option<PathBuf>,

    /// Write the full run report as JSON.
    #[arg(long = "export-report", value_name = "JSON")]
    pub export_report: Option<PathBuf>,

    /// Disable the terminal bar chart.
    #[arg(long)]
    pub no_chart: bool,

    /// Bar chart width (columns).
    #[arg(long, default_value_t = 50)]
    pub width: usize,
}

/// Options for `fairlend audit`.
#[derive(Debug, Args, Clone)]
pub struct AuditArgs {
    /// Historical decisions CSV (HMDA layout).
    #[arg(value_name = "CSV")]
    pub input: PathBuf,

    /// Column holding the recorded outcome.
    #[arg(long, default_value = "action_taken")]
    pub outcome_field: String,

    /// Outcome value that counts as approved.
    #[arg(long, default_value = "1")]
    pub approved_code: String,

    /// Column holding the debt-to-income ratio.
    #[arg(long, env = "FAIRLEND_RISK_FIELD", default_value = DEFAULT_RISK_FIELD)]
    pub risk_field: String,

    /// Write the audit summary as text.
    #[arg(long, value_name = "PATH")]
    pub export: Option<PathBuf>,

    /// Write the race / sex / income approval rates as CSV.
    #[arg(long = "export-rates", value_name = "CSV")]
    pub export_rates: Option<PathBuf>,
}

/// Options for `fairlend sample`.
#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    /// Number of applicant rows to generate.
    #[arg(short = 'n', long, default_value_t = 1000)]
    pub count: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Output CSV path.
    #[arg(short = 'o', long, value_name = "CSV")]
    pub out: PathBuf,
}

/// Split an `ALIAS=COLUMN` flag value.
pub fn parse_column_alias(raw: &str) -> Option<(&str, &str)> {
    let (alias, column) = raw.split_once('=')?;
    let (alias, column) = (alias.trim(), column.trim());
    if alias.is_empty() || column.is_empty() {
        return None;
    }
    Some((alias, column))
}
