use clap::Parser;
use tracing_subscriber::EnvFilter;

use ko_merge::cli;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("ko_merge=debug,info")
    } else {
        EnvFilter::new("ko_merge=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let ctx = cli::RunContext {
        format: cli.format,
        verbose: cli.verbose,
        registry: cli.registry.as_deref(),
        data_dir: &cli.data_dir,
    };

    match cli.command {
        cli::Commands::Validate(args) => {
            cli::validate::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Merge(args) => {
            cli::merge::run(args, &ctx)?;
        }
        cli::Commands::MergeAll(args) => {
            cli::merge::run_all(args, &ctx)?;
        }
        cli::Commands::Databases(args) => {
            cli::databases::run(args, &ctx)?;
        }
    }

    Ok(())
}
