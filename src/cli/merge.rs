use std::collections::HashMap;
use std::path::{Path, PathBuf};

use clap::Args;

use crate::cli::{default_output_dir, merged_file_name, write_merged, OutputFormat, RunContext};
use crate::core::record::RecordTable;
use crate::merge::join::MergedTable;
use crate::merge::orchestrator::{
    merge_database, FailedDatabase, MergeOrchestrator, RunResult, RunSummary, SucceededDatabase,
};
use crate::parsing::records::parse_file;

#[derive(Args)]
pub struct MergeArgs {
    /// Sample file (.txt) with '>'-headed blocks of KO identifiers
    #[arg(required = true)]
    pub input: PathBuf,

    /// Registered database to merge with (see `ko-merge databases list`)
    #[arg(short, long, required = true)]
    pub database: String,

    /// Output directory (default: results_<timestamp>)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Keep all text columns as plain strings instead of dictionary-encoding them
    #[arg(long)]
    pub no_optimize: bool,
}

#[derive(Args)]
pub struct MergeAllArgs {
    /// Sample file (.txt) with '>'-headed blocks of KO identifiers
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output directory (default: results_<timestamp>)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Merge databases concurrently
    #[arg(long)]
    pub parallel: bool,

    /// Keep all text columns as plain strings instead of dictionary-encoding them
    #[arg(long)]
    pub no_optimize: bool,
}

/// Execute merge subcommand
///
/// # Errors
///
/// Returns an error if the input is invalid, the database is unknown, or
/// loading or joining the database fails.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: MergeArgs, ctx: &RunContext<'_>) -> anyhow::Result<()> {
    let records = parse_input(&args.input, ctx.verbose)?;
    let registry = ctx.load_registry()?;
    let database = registry.resolve(&args.database, ctx.data_dir)?;

    let merged = merge_database(&records, &database, !args.no_optimize)?;

    let output_dir = args.output.clone().unwrap_or_else(default_output_dir);
    let path = write_merged(&output_dir, &database.name, &merged)?;

    match ctx.format {
        OutputFormat::Text => {
            println!("Merged {} with {}", args.input.display(), database.name);
            println!("  Rows: {}", merged.num_rows());
            println!("  Matched identifiers: {}", merged.identifiers().len());
            println!("  Output: {}", path.display());
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "input": args.input.display().to_string(),
                "database": database.name,
                "key": merged.key(),
                "rows": merged.num_rows(),
                "columns": merged.table().names(),
                "matched_identifiers": merged.identifiers().len(),
                "output": path.display().to_string(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("database\trows\tmatched_identifiers\toutput");
            println!(
                "{}\t{}\t{}\t{}",
                database.name,
                merged.num_rows(),
                merged.identifiers().len(),
                path.display()
            );
        }
    }

    Ok(())
}

/// Execute merge-all subcommand
///
/// Individual database failures, including failures to write a database's
/// output file, are reported in the summary; only an invalid input or
/// registry makes this command fail.
///
/// # Errors
///
/// Returns an error if the input is invalid, the registry cannot be loaded,
/// or the run cannot start.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run_all(args: MergeAllArgs, ctx: &RunContext<'_>) -> anyhow::Result<()> {
    let records = parse_input(&args.input, ctx.verbose)?;
    let registry = ctx.load_registry()?;

    if ctx.verbose {
        eprintln!("Merging with {} databases", registry.len());
    }

    let result = MergeOrchestrator::new(registry.resolve_all(ctx.data_dir))
        .with_optimize(!args.no_optimize)
        .parallel(args.parallel)
        .run_all(&records)?;

    let output_dir = args.output.clone().unwrap_or_else(default_output_dir);
    let reports = write_outputs(&output_dir, &result);

    match ctx.format {
        OutputFormat::Text => print_text_summary(&args.input, &records, &reports),
        OutputFormat::Json => print_json_summary(&args.input, &reports)?,
        OutputFormat::Tsv => print_tsv_summary(&reports),
    }

    Ok(())
}

fn parse_input(input: &Path, verbose: bool) -> anyhow::Result<RecordTable> {
    let records = parse_file(input)?;
    if verbose {
        let stats = records.stats();
        eprintln!(
            "Parsed {} records across {} samples ({} unique identifiers)",
            stats.records, stats.samples, stats.unique_identifiers
        );
    }
    Ok(records)
}

/// Final state of one database after merging and writing its output
enum Status<'a> {
    Written {
        merged: &'a MergedTable,
        path: PathBuf,
    },
    Failed(String),
}

struct DatabaseReport<'a> {
    name: &'a str,
    status: Status<'a>,
}

/// Write every successful merge, in configured order. A database whose
/// output cannot be written is reported as failed; the others still run.
fn write_outputs<'a>(output_dir: &Path, result: &'a RunResult) -> Vec<DatabaseReport<'a>> {
    // Lowercased output file name -> database that claimed it
    let mut claimed: HashMap<String, &'a str> = HashMap::new();
    let mut reports = Vec::with_capacity(result.outcomes().len());

    for outcome in result.outcomes() {
        let name = outcome.name.as_str();
        let status = match &outcome.result {
            Ok(merged) => match write_output(output_dir, name, merged, &mut claimed) {
                Ok(path) => Status::Written { merged, path },
                Err(e) => Status::Failed(format!("{e:#}")),
            },
            Err(e) => Status::Failed(e.to_string()),
        };
        reports.push(DatabaseReport { name, status });
    }

    reports
}

fn write_output<'a>(
    output_dir: &Path,
    name: &'a str,
    merged: &MergedTable,
    claimed: &mut HashMap<String, &'a str>,
) -> anyhow::Result<PathBuf> {
    let file_name = merged_file_name(name)?;
    if let Some(other) = claimed.get(&file_name.to_lowercase()) {
        anyhow::bail!("Output file {file_name} is already used by database '{other}'");
    }
    claimed.insert(file_name.to_lowercase(), name);

    write_merged(output_dir, name, merged)
}

fn summarize(reports: &[DatabaseReport<'_>]) -> RunSummary {
    let mut succeeded = Vec::new();
    let mut failed = Vec::new();

    for report in reports {
        match &report.status {
            Status::Written { merged, .. } => succeeded.push(SucceededDatabase {
                name: report.name.to_string(),
                rows: merged.num_rows(),
                columns: merged.table().num_columns(),
            }),
            Status::Failed(error) => failed.push(FailedDatabase {
                name: report.name.to_string(),
                error: error.clone(),
            }),
        }
    }

    RunSummary {
        total: reports.len(),
        success_count: succeeded.len(),
        failure_count: failed.len(),
        succeeded,
        failed,
    }
}

fn print_text_summary(input: &Path, records: &RecordTable, reports: &[DatabaseReport<'_>]) {
    let summary = summarize(reports);
    let total = summary.total;

    println!("Merge Summary");
    println!("{}", "=".repeat(60));
    println!(
        "\nInput: {} ({} samples, {} records)",
        input.display(),
        records.stats().samples,
        records.len()
    );

    println!("\nSucceeded ({}/{total}):", summary.success_count);
    for report in reports {
        if let Status::Written { merged, path } = &report.status {
            println!(
                "  {:<12} {:>8} rows  -> {}",
                report.name,
                merged.num_rows(),
                path.display()
            );
        }
    }

    if summary.failure_count > 0 {
        println!("\nFailed ({}/{total}):", summary.failure_count);
        for failure in &summary.failed {
            println!("  {:<12} {}", failure.name, failure.error);
        }
    }
}

fn print_json_summary(input: &Path, reports: &[DatabaseReport<'_>]) -> anyhow::Result<()> {
    let outputs: serde_json::Map<String, serde_json::Value> = reports
        .iter()
        .filter_map(|report| match &report.status {
            Status::Written { path, .. } => {
                Some((report.name.to_string(), path.display().to_string().into()))
            }
            Status::Failed(_) => None,
        })
        .collect();

    let output = serde_json::json!({
        "input": input.display().to_string(),
        "summary": summarize(reports),
        "outputs": outputs,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv_summary(reports: &[DatabaseReport<'_>]) {
    println!("database\tstatus\trows\toutput_or_error");
    for report in reports {
        match &report.status {
            Status::Written { merged, path } => println!(
                "{}\tok\t{}\t{}",
                report.name,
                merged.num_rows(),
                path.display()
            ),
            Status::Failed(error) => println!("{}\tfailed\t\t{error}", report.name),
        }
    }
}
