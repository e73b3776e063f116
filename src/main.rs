mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use logdigest_llm::AzureOpenAiClient;
use logdigest_logs::{DigestReport, Pipeline};
use logdigest_source::open_source;

use crate::config::Config;

/// Logdigest - collapse a pod log bundle into a short list of distinct failures
#[derive(Parser, Debug)]
#[command(name = "logdigest")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log bundle: a directory or a .zip archive
    #[arg(value_name = "PATH")]
    path: PathBuf,

    /// Similarity threshold (0-100) for clustering
    #[arg(long)]
    threshold: Option<f64>,

    /// Only process logs under this namespace directory
    #[arg(long)]
    namespace: Option<String>,

    /// Entries per classification request
    #[arg(long)]
    batch_size: Option<usize>,

    /// Config file (defaults to ~/.logdigest/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Skip the model: print every deduplicated cluster with its context
    #[arg(long)]
    digest_only: bool,

    /// Also print the contextualized failures as JSON
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = run(args).await;

    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

async fn run(args: Args) -> Result<()> {
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(threshold) = args.threshold {
        anyhow::ensure!(
            (0.0..=100.0).contains(&threshold),
            "--threshold must be between 0 and 100"
        );
        config.threshold = threshold;
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    if args.namespace.is_some() {
        config.namespace = args.namespace.clone();
    }

    let source = open_source(&args.path)
        .with_context(|| format!("Failed to open log bundle {}", args.path.display()))?;
    let pipeline = Pipeline::new(source.as_ref(), config.pipeline_options());

    if args.digest_only {
        let report = pipeline.digest()?;
        log_report(&report);
        println!("{}", report.payload.to_json_pretty()?);
        return Ok(());
    }

    let client = AzureOpenAiClient::from_env(config.llm.clone())
        .context("Failed to configure the model client")?;
    let report = pipeline.run(&client, &client).await?;
    log_report(&report);

    if args.json {
        println!("{}", report.payload.to_json_pretty()?);
    }
    println!("{}", outcome_message(&report));

    Ok(())
}

/// What to tell the user once a classified run finishes
fn outcome_message(report: &DigestReport) -> String {
    let mut message = match (&report.summary, report.failures) {
        (Some(summary), _) => summary.clone(),
        (None, Some(failures)) if failures > 0 => format!(
            "{} failures found, but none came from pod log files; no summary was written.",
            failures
        ),
        (None, _) => format!(
            "No failures found in {} distinct log messages.",
            report.clusters
        ),
    };

    if !report.ungrouped.is_empty() {
        message.push_str("\n\nFailures outside pod log files:");
        for failure in &report.ungrouped {
            message.push_str("\n  ");
            message.push_str(failure);
        }
    }
    message
}


fn log_report(report: &DigestReport) {
    tracing::info!(
        files = report.files_processed,
        skipped = report.files_skipped,
        entries = report.entries_extracted,
        clusters = report.clusters,
        failures = ?report.failures,
        groups = report.payload.log_entries.len(),
        "digest complete"
    );
}
