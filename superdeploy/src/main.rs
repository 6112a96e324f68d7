//! SuperDeploy CLI - build, test and deploy a containerized Python service.

use anyhow::Context as _;
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use superdeploy::cli::DeployArgs;
use superdeploy::events::LoggingEventSink;
use superdeploy::exec::SystemCommandRunner;
use superdeploy::observability::init_logging;
use superdeploy::pipeline::{CancellationToken, Orchestrator, RunReport};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = DeployArgs::parse();

    if let Err(e) = init_logging(args.verbose, args.log_format) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    let token = CancellationToken::new();
    {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel("Deployment interrupted by user");
            }
        });
    }

    let orchestrator = Orchestrator::new(Arc::new(SystemCommandRunner::new()))
        .with_event_sink(Arc::new(LoggingEventSink::debug()))
        .with_cancellation(token);

    let report = orchestrator.run(args.to_config()).await;

    if let Some(summary) = &report.summary {
        println!("{}", summary.render());
    }

    if let Some(path) = &args.report {
        match write_report(&report, path) {
            Ok(()) => info!(path = %path.display(), "Wrote run report"),
            Err(e) => error!("{e:#}"),
        }
    }

    std::process::exit(report.exit_code());
}

fn write_report(report: &RunReport, path: &Path) -> anyhow::Result<()> {
    let json = report.to_json().context("Failed to serialize run report")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write run report to {}", path.display()))?;
    Ok(())
}
