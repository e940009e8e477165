mod config;
mod docker;
mod error;
mod evaluator;
mod executor;
mod lifecycle;
mod orchestrator;
mod readiness;
mod report;
mod runner;
mod runtime;
mod suite;
#[cfg(test)]
mod testing;

use clap::Parser;
use config::HarnessConfig;
use docker::DockerRuntime;
use imagecheck_common::types::{RunSummary, Variant};
use orchestrator::{HarnessContext, Orchestrator};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "imagecheck")]
#[command(about = "Boot a Postgres container image and verify its entrypoints and extensions", long_about = None)]
struct Cli {
    /// Image to test (e.g. ghcr.io/pgedge/pgedge-postgres:17-spock5-standard)
    #[arg(long)]
    image: String,

    /// Image variant: baseline or extended (minimal/standard accepted)
    #[arg(long, alias = "flavor")]
    variant: Variant,

    /// Optional JSON harness config
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    // Usage errors exit 1 before any container exists
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_line_number(true);

    if std::env::var("LOG_FORMAT").map(|f| f == "json").unwrap_or(false) {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let code = match run(cli).await {
        Ok(summary) => summary.exit_code(),
        Err(e) => {
            error!(error = %format!("{:#}", e), "Harness failed before running any phase");
            1
        }
    };

    std::process::exit(code);
}

async fn run(cli: Cli) -> anyhow::Result<RunSummary> {
    let config = HarnessConfig::resolve(cli.config.as_deref())?;
    let runtime = DockerRuntime::connect(config.pull_missing_images, config.stop_timeout_secs)?;

    let ctx = HarnessContext {
        runtime: Arc::new(runtime),
        config: Arc::new(config),
    };

    info!(image = %cli.image, variant = %cli.variant, "imagecheck starting");
    report::print_header(&cli.image, cli.variant);

    let suite = suite::build_test_suite(&ctx.config.database);
    let summary = Orchestrator::new(&ctx, cli.image, cli.variant).run(&suite).await;

    report::print_summary(&summary);
    Ok(summary)
}
