//! Command-line interface for ko-merge.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **validate**: Check a sample file and report what it contains
//! - **merge**: Merge a sample file with one database
//! - **merge-all**: Merge a sample file with every registered database
//! - **databases**: List registered databases or describe one
//!
//! ## Usage
//!
//! ```text
//! # Check the input grammar
//! ko-merge validate samples.txt
//!
//! # Merge with a single database
//! ko-merge merge samples.txt --database kegg --output results/
//!
//! # Merge with everything, JSON summary for scripting
//! ko-merge merge-all samples.txt --format json
//!
//! # Use a custom registry and data directory
//! ko-merge --registry my_dbs.json --data-dir /srv/db merge-all samples.txt
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::merge::join::MergedTable;
use crate::parsing::reference::REFERENCE_DELIMITER;
use crate::registry::store::DatabaseRegistry;
use crate::utils::validation::validate_filename;

pub mod databases;
pub mod merge;
pub mod validate;

#[derive(Parser)]
#[command(name = "ko-merge")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Annotate KEGG Orthology sample lists with functional databases")]
#[command(
    long_about = "ko-merge validates sample files listing KEGG Orthology identifiers and joins them against functional annotation databases.\n\nInput files contain '>'-headed sample blocks, one identifier per line:\n  >SampleA\n  K00001\n  K00002\n\nEach database is merged independently: a missing or malformed database is reported without stopping the others."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Path to custom database registry (JSON)
    #[arg(long, global = true)]
    pub registry: Option<PathBuf>,

    /// Directory that relative database paths resolve against
    #[arg(long, global = true, default_value = "data")]
    pub data_dir: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a sample file without merging
    Validate(validate::ValidateArgs),

    /// Merge a sample file with one database
    Merge(merge::MergeArgs),

    /// Merge a sample file with every registered database
    MergeAll(merge::MergeAllArgs),

    /// Inspect the database registry
    Databases(databases::DatabasesArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Shared options every command that touches databases needs
pub struct RunContext<'a> {
    pub format: OutputFormat,
    pub verbose: bool,
    pub registry: Option<&'a Path>,
    pub data_dir: &'a Path,
}

impl RunContext<'_> {
    /// Load the custom registry if one was given, otherwise the embedded one.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be read or parsed.
    pub fn load_registry(&self) -> anyhow::Result<DatabaseRegistry> {
        let registry = match self.registry {
            Some(path) => DatabaseRegistry::load_from_file(path)
                .with_context(|| format!("Failed to load registry {}", path.display()))?,
            None => DatabaseRegistry::load_embedded()?,
        };
        Ok(registry)
    }
}

/// Default output directory: `results_<YYYYMMDD_HHMMSS>` in the working directory
#[must_use]
pub fn default_output_dir() -> PathBuf {
    PathBuf::from(format!(
        "results_{}",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    ))
}

/// Output file name for one database: `<database>_merged.csv`.
///
/// # Errors
///
/// Returns an error if the database name is not a safe filename.
pub fn merged_file_name(database: &str) -> anyhow::Result<String> {
    let stem = validate_filename(database)
        .with_context(|| format!("Database name '{database}' cannot be used as a filename"))?;
    Ok(format!("{stem}_merged.csv"))
}

/// Write one merged table as `<output_dir>/<database>_merged.csv`.
///
/// # Errors
///
/// Returns an error if the database name is not a safe filename or the file
/// cannot be written.
pub fn write_merged(
    output_dir: &Path,
    database: &str,
    merged: &MergedTable,
) -> anyhow::Result<PathBuf> {
    let path = output_dir.join(merged_file_name(database)?);

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    merged
        .table()
        .write_to_path(&path, REFERENCE_DELIMITER)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
