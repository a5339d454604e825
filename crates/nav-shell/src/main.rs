mod config;
mod scenario;

use anyhow::{Context, Result};
use clap::Parser;
use config::ShellConfig;
use scenario::Scenario;
use std::path::PathBuf;
use tracing::info;

/// Drive the navigation coordinator from a scenario file.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Shell configuration (TOML). Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Scenario to replay (TOML)
    #[arg(long)]
    scenario: PathBuf,

    /// Starting rollout phase (overrides config and NAV_ROLLOUT_PHASE)
    #[arg(long)]
    phase: Option<String>,

    /// Emit JSON logs and a JSON report
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let config = ShellConfig::load(args.config.as_deref())?;
    let phase = config.initial_phase(args.phase.as_deref());
    info!(
        device = %config.coordinator.device,
        %phase,
        sites = config.account.sites.len(),
        "Navigation shell starting"
    );

    let scenario = Scenario::load(&args.scenario)
        .with_context(|| format!("Failed to load scenario {}", args.scenario.display()))?;
    let report = scenario::replay(&scenario, &config, phase)
        .await
        .context("Scenario replay failed")?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to encode report")?
        );
    } else {
        print!("{}", report.render_text());
    }
    Ok(())
}
