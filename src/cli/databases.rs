use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::cli::{OutputFormat, RunContext};
use crate::registry::store::DatabaseEntry;

#[derive(Args)]
pub struct DatabasesArgs {
    #[command(subcommand)]
    pub command: DatabasesCommands,
}

#[derive(Subcommand)]
pub enum DatabasesCommands {
    /// List all databases in the registry
    List,

    /// Load one database and describe its contents
    Show {
        /// Database name (e.g., "kegg")
        #[arg(required = true)]
        name: String,
    },

    /// Export the registry to a JSON file
    Export {
        /// Output file path
        #[arg(required = true)]
        output: PathBuf,
    },
}

/// Execute databases subcommand
///
/// # Errors
///
/// Returns an error if the registry cannot be loaded, the database is
/// unknown, or its table cannot be loaded.
pub fn run(args: DatabasesArgs, ctx: &RunContext<'_>) -> anyhow::Result<()> {
    match args.command {
        DatabasesCommands::List => run_list(ctx),
        DatabasesCommands::Show { name } => run_show(&name, ctx),
        DatabasesCommands::Export { output } => run_export(output, ctx),
    }
}

fn run_list(ctx: &RunContext<'_>) -> anyhow::Result<()> {
    let registry = ctx.load_registry()?;

    if ctx.verbose {
        eprintln!("Loaded registry with {} databases", registry.len());
    }

    match ctx.format {
        OutputFormat::Text => {
            let name_width = registry
                .entries()
                .iter()
                .map(|e| e.name.len())
                .max()
                .unwrap_or(4)
                .max(4);

            println!("Database Registry ({} databases)\n", registry.len());
            println!(
                "{:<name_w$} {:<8} {:<6} Path",
                "Name",
                "Status",
                "Key",
                name_w = name_width
            );
            println!("{}", "-".repeat(name_width + 40));

            for entry in registry.entries() {
                let path = entry.resolve_path(ctx.data_dir);
                println!(
                    "{:<name_w$} {:<8} {:<6} {}",
                    entry.name,
                    status(entry, ctx),
                    entry.key,
                    path.display(),
                    name_w = name_width
                );
            }
        }
        OutputFormat::Json => {
            let databases: Vec<_> = registry
                .entries()
                .iter()
                .map(|entry| {
                    serde_json::json!({
                        "name": entry.name,
                        "display_name": entry.display_name(),
                        "path": entry.resolve_path(ctx.data_dir).display().to_string(),
                        "key": entry.key,
                        "required_columns": entry.required_columns,
                        "available": entry.resolve_path(ctx.data_dir).is_file(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&databases)?);
        }
        OutputFormat::Tsv => {
            println!("name\tstatus\tkey\tpath");
            for entry in registry.entries() {
                println!(
                    "{}\t{}\t{}\t{}",
                    entry.name,
                    status(entry, ctx),
                    entry.key,
                    entry.resolve_path(ctx.data_dir).display()
                );
            }
        }
    }

    Ok(())
}

fn status(entry: &DatabaseEntry, ctx: &RunContext<'_>) -> &'static str {
    if entry.resolve_path(ctx.data_dir).is_file() {
        "ok"
    } else {
        "missing"
    }
}

fn run_show(name: &str, ctx: &RunContext<'_>) -> anyhow::Result<()> {
    let registry = ctx.load_registry()?;
    let config = registry.resolve(name, ctx.data_dir)?;
    let entry = registry
        .get(name)
        .ok_or_else(|| anyhow::anyhow!("Database '{name}' not found"))?;

    let reference = config.loader().load(&config.path)?;

    let table = reference.table();
    let distinct = reference.distinct_identifiers(&config.key).unwrap_or(0);
    let fanout = reference.max_fanout(&config.key).unwrap_or(0);

    match ctx.format {
        OutputFormat::Text => {
            println!("Database: {}", entry.display_name());
            println!("  Name: {}", entry.name);
            if let Some(description) = &entry.description {
                println!("  Description: {description}");
            }
            println!("  Path: {}", config.path.display());
            println!("  Key: {}", config.key);
            println!("  Rows: {}", table.num_rows());
            println!("  Columns ({}): {}", table.num_columns(), table.names().join(", "));
            println!("  Distinct identifiers: {distinct}");
            println!("  Max rows per identifier: {fanout}");
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "name": entry.name,
                "display_name": entry.display_name(),
                "description": entry.description,
                "path": config.path.display().to_string(),
                "key": config.key,
                "rows": table.num_rows(),
                "columns": table.names(),
                "distinct_identifiers": distinct,
                "max_fanout": fanout,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("name\trows\tcolumns\tdistinct_identifiers\tmax_fanout");
            println!(
                "{}\t{}\t{}\t{distinct}\t{fanout}",
                entry.name,
                table.num_rows(),
                table.num_columns()
            );
        }
    }

    Ok(())
}

fn run_export(output: PathBuf, ctx: &RunContext<'_>) -> anyhow::Result<()> {
    let registry = ctx.load_registry()?;

    let json = registry.to_json()?;
    std::fs::write(&output, json)?;

    println!(
        "Exported {} databases to {}",
        registry.len(),
        output.display()
    );

    Ok(())
}
