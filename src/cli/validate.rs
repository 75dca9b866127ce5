use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use clap::Args;

use crate::cli::OutputFormat;
use crate::core::record::{RecordStats, RecordTable};
use crate::parsing::records::parse_file;

#[derive(Args)]
pub struct ValidateArgs {
    /// Sample file (.txt) with '>'-headed blocks of KO identifiers
    #[arg(required = true)]
    pub input: PathBuf,

    /// List every sample with its identifier count
    #[arg(long)]
    pub per_sample: bool,
}

/// Execute validate subcommand
///
/// # Errors
///
/// Returns an error if the input has the wrong extension, cannot be read, or
/// violates the sample grammar.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: ValidateArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let records = parse_file(&args.input)?;
    let stats = records.stats();

    if verbose {
        eprintln!(
            "Parsed {} records from {}",
            stats.records,
            args.input.display()
        );
    }

    match format {
        OutputFormat::Text => print_text(&args, &records, &stats),
        OutputFormat::Json => print_json(&args, &records, &stats)?,
        OutputFormat::Tsv => print_tsv(&args, &records, &stats),
    }

    Ok(())
}

/// Identifier count per sample, in order of first appearance
fn per_sample_counts(records: &RecordTable) -> Vec<(&str, usize)> {
    let mut seen = HashSet::new();
    let mut counts: Vec<(&str, usize)> = records
        .samples()
        .iter()
        .filter(|s| seen.insert(s.as_str()))
        .map(|s| (s.as_str(), 0))
        .collect();

    let index: HashMap<&str, usize> = counts
        .iter()
        .enumerate()
        .map(|(i, (sample, _))| (*sample, i))
        .collect();
    for record in records.records() {
        if let Some(&i) = index.get(record.sample()) {
            counts[i].1 += 1;
        }
    }
    counts
}

fn print_text(args: &ValidateArgs, records: &RecordTable, stats: &RecordStats) {
    println!("Input: {}", args.input.display());
    println!("  Status: valid");
    println!("  Samples: {}", stats.samples);
    println!("  Records: {}", stats.records);
    println!("  Unique identifiers: {}", stats.unique_identifiers);

    if stats.skipped_lines > 0 {
        println!("  Skipped lines: {}", stats.skipped_lines);
    }
    if !stats.empty_samples.is_empty() {
        println!(
            "  Samples without identifiers: {}",
            stats.empty_samples.join(", ")
        );
    }

    if args.per_sample {
        println!("\nPer-sample identifiers:");
        for (sample, count) in per_sample_counts(records) {
            println!("  {sample}: {count}");
        }
    }
}

fn print_json(
    args: &ValidateArgs,
    records: &RecordTable,
    stats: &RecordStats,
) -> anyhow::Result<()> {
    let mut output = serde_json::json!({
        "input": args.input.display().to_string(),
        "valid": true,
        "stats": stats,
    });

    if args.per_sample {
        let samples: Vec<_> = per_sample_counts(records)
            .into_iter()
            .map(|(sample, count)| serde_json::json!({ "sample": sample, "identifiers": count }))
            .collect();
        output["samples"] = serde_json::Value::Array(samples);
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv(args: &ValidateArgs, records: &RecordTable, stats: &RecordStats) {
    if args.per_sample {
        println!("sample\tidentifiers");
        for (sample, count) in per_sample_counts(records) {
            println!("{sample}\t{count}");
        }
        return;
    }

    println!("samples\trecords\tunique_identifiers\tskipped_lines\tempty_samples");
    println!(
        "{}\t{}\t{}\t{}\t{}",
        stats.samples,
        stats.records,
        stats.unique_identifiers,
        stats.skipped_lines,
        stats.empty_samples.len(),
    );
}
