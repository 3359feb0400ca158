//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - folds flags into domain configs
//! - runs the threshold pipeline, the audit or the sample generator
//! - prints reports/charts
//! - writes optional exports

use clap::Parser;
use tracing::info;

use crate::cli::{AuditArgs, Command, RunArgs, SampleArgs, parse_column_alias};
use crate::domain::{AuditConfig, ColumnAliases, RunConfig, SampleConfig};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `fairlend` binary.
pub fn run() -> Result<(), AppError> {
    // `.env` only supplies defaults; a missing file is fine.
    dotenvy::dotenv().ok();
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Run(args) => handle_run(&run_config_from_args(&args)?),
        Command::Audit(args) => handle_audit(&audit_config_from_args(&args)),
        Command::Sample(args) => handle_sample(&sample_config_from_args(&args)),
    }
}

fn handle_run(config: &RunConfig) -> Result<(), AppError> {
    let run = pipeline::run_thresholds(config)?;
    let rows = run.row_counts();

    println!(
        "{}",
        crate::report::format_run_summary(&config.input, &rows, config.approval_rate, &run.stats)
    );
    println!("{}", crate::report::format_statistics(&run.stats));

    let dropped = crate::report::format_dropped(&run.normalized.dropped, &run.ingest.row_errors);
    if !dropped.is_empty() {
        println!("{dropped}");
    }

    if config.chart {
        println!(
            "{}",
            crate::plot::render_rate_bars(&run.stats, config.approval_rate, config.chart_width)
        );
    }

    // Optional exports.
    if let Some(path) = &config.decisions_out {
        crate::io::export::write_decisions_json(path, &run.outcome.decisions)?;
    }
    if let Some(path) = &config.export_stats {
        crate::io::export::write_stats_csv(path, &run.stats)?;
    }
    if let Some(path) = &config.export_report {
        crate::io::export::write_report_json(path, &run.report(config))?;
    }

    Ok(())
}

fn handle_audit(config: &AuditConfig) -> Result<(), AppError> {
    let ingest = crate::io::ingest::read_table(&config.input)?;
    let summary = crate::audit::run_audit(&ingest.table, config)?;
    let text = crate::report::format_audit(&config.input, &summary);

    println!("{text}");
    if let Some(path) = &config.export {
        crate::io::export::write_text(path, &text)?;
    }
    if let Some(path) = &config.export_rates {
        crate::io::export::write_audit_rates_csv(path, &summary)?;
    }
    Ok(())
}

fn handle_sample(config: &SampleConfig) -> Result<(), AppError> {
    let table = crate::data::generate_sample(config)?;
    crate::io::export::write_table_csv(&config.out, &table)?;
    info!(rows = table.len(), seed = config.seed, path = %config.out.display(), "wrote sample");
    println!("Wrote {} rows to {}", table.len(), config.out.display());
    Ok(())
}

/// Fold `run` flags into a [`RunConfig`].
///
/// Fails (exit 2) on a malformed `--column` value; the rate itself is
/// validated by the engine.
pub fn run_config_from_args(args: &RunArgs) -> Result<RunConfig, AppError> {
    let mut columns = ColumnAliases {
        risk_field: args.risk_field.clone(),
        id_field: args.id_field.clone(),
        ..ColumnAliases::default()
    };
    for raw in &args.columns {
        let (alias, canonical) = parse_column_alias(raw)
            .ok_or_else(|| AppError::new(2, format!("Invalid --column value '{raw}' (expected ALIAS=COLUMN).")))?;
        columns = columns.with_rename(alias, canonical);
    }

    Ok(RunConfig {
        input: args.input.clone(),
        approval_rate: args.rate,
        columns,
        expected_cohorts: args.expect_cohorts.clone(),
        decisions_out: args.out.clone(),
        export_stats: args.export_stats.clone(),
        export_report: args.export_report.clone(),
        chart: !args.no_chart,
        chart_width: args.width,
    })
}

pub fn audit_config_from_args(args: &AuditArgs) -> AuditConfig {
    AuditConfig {
        input: args.input.clone(),
        outcome_field: args.outcome_field.clone(),
        approved_code: args.approved_code.clone(),
        risk_field: args.risk_field.clone(),
        export: args.export.clone(),
        export_rates: args.export_rates.clone(),
    }
}

pub fn sample_config_from_args(args: &SampleArgs) -> SampleConfig {
    SampleConfig {
        count: args.count,
        seed: args.seed,
        out: args.out.clone(),
    }
}
