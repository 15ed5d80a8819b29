//! Command-line interface for qgen
//!
//! # Usage Examples
//!
//! ```bash
//! # Run the default 10 SELECT statements
//! qgen --username employees --password secret --dbname employees
//!
//! # Weighted mix of verbs, no pause, halt on the first error
//! qgen --verbs select update delete --max-queries 500 --interval 0 --stop
//!
//! # Reproducible dry run printed as JSON lines
//! qgen --dry-run --seed 42 --output json
//! ```
//!
//! Log verbosity follows `RUST_LOG` when set, `--log-level` otherwise.

use anyhow::Context;
use clap::Parser;
use qgen::{DatabaseOpts, OutputFormat, RunOpts, RunSummary};
use qgen_core::{AllowedVerbs, GeneratorOptions, QueryRecord, QueryTemplateDocument};
use qgen_mysql::{connect_generator, ConnectionOpts};
use std::io::Write;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "qgen")]
#[command(about = "Simple MySQL \"random\" query generator")]
#[command(long_about = None)]
struct Cli {
    #[command(flatten)]
    database: DatabaseOpts,

    #[command(flatten)]
    run: RunOpts,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let document = QueryTemplateDocument::from_file(&cli.run.queries).with_context(|| {
        format!("Cannot load query template {:?}", cli.run.queries)
    })?;
    let allowed_verbs = AllowedVerbs::new(&cli.run.verbs);
    let connection = ConnectionOpts::from(&cli.database);

    let options = GeneratorOptions {
        seed: cli.run.seed,
        max_value_attempts: cli.run.max_value_attempts,
        span: Some(tracing::info_span!("qgen", database = %connection.database)),
    };
    let mut generator = connect_generator(&connection, document, allowed_verbs, options)
        .await
        .with_context(|| format!("Cannot connect to db {}", connection.database))?;

    if cli.run.dry_run {
        tracing::info!("Running in dry-run mode - no queries will be executed");
    }

    let started = Instant::now();
    let mut summary = RunSummary::default();
    let mut run = generator.batch_run(cli.run.batch_options());
    while let Some(record) = run.next().await {
        let record = record.context("Cannot perform query")?;
        print_record(&record, cli.run.output)?;
        summary.record(&record);
    }
    let halted = run.halted().map(|e| e.to_string());

    summary.wall_time = started.elapsed();
    tracing::info!("{}", summary);

    if let Err(e) = generator.into_inner().disconnect().await {
        tracing::warn!("Failed to disconnect cleanly: {}", e);
    }

    if let Some(reason) = halted {
        anyhow::bail!("Batch halted: {reason}");
    }
    Ok(())
}

fn print_record(record: &QueryRecord, format: OutputFormat) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    match format {
        OutputFormat::Text => {
            writeln!(stdout, "{}", record.last_executed)?;
            match record.elapsed_time {
                Some(ms) => writeln!(stdout, "{ms}")?,
                None => writeln!(stdout, "None")?,
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer(&mut stdout, record)?;
            writeln!(stdout)?;
        }
    }
    Ok(())
}
