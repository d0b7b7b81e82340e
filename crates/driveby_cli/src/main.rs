mod commands;
mod output;
mod settings;

use anyhow::Result;
use clap::{Parser, Subcommand};
use driveby_core::parse_duration;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "driveby")]
#[command(version, about = "OpenAPI contract validation and live API testing", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and normalize a contract without evaluating rules
    Check {
        /// Path or URL of the OpenAPI contract (JSON or YAML)
        contract: String,
    },

    /// Evaluate the compliance rule catalog, no network calls
    Validate {
        /// Path or URL of the OpenAPI contract (JSON or YAML)
        contract: String,

        /// Attempt mechanical fixes for failing fixable rules
        #[arg(long)]
        auto_fix: bool,

        /// Output format: text, json, markdown
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Invoke every operation once against a live deployment
    Functional {
        /// Path or URL of the OpenAPI contract (JSON or YAML)
        contract: String,

        /// Base URL of the deployment (falls back to DRIVEBY_BASE_URL, then the contract)
        #[arg(short, long)]
        base_url: Option<String>,

        /// Run configuration file (YAML or TOML)
        #[arg(short, long)]
        config: Option<String>,

        /// Output format: text, json, markdown
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Load-test the contract's operations at a fixed rate
    Performance {
        /// Path or URL of the OpenAPI contract (JSON or YAML)
        contract: String,

        /// Base URL of the deployment (falls back to DRIVEBY_BASE_URL, then the contract)
        #[arg(short, long)]
        base_url: Option<String>,

        /// Run configuration file (YAML or TOML)
        #[arg(short, long)]
        config: Option<String>,

        /// Requests per second
        #[arg(long)]
        rate: Option<u32>,

        /// Attack duration (e.g., 30s, 2m)
        #[arg(long, value_parser = parse_duration)]
        duration: Option<Duration>,

        /// Maximum acceptable p95 latency (e.g., 500ms); 0 disables
        #[arg(long, value_parser = parse_duration)]
        max_p95: Option<Duration>,

        /// Minimum success rate as a fraction (e.g., 0.95); 0 disables
        #[arg(long)]
        min_success_rate: Option<f64>,

        /// Output format: text, json, markdown
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Run every phase and produce the full report
    Run {
        /// Path or URL of the OpenAPI contract (JSON or YAML)
        contract: String,

        /// Base URL of the deployment (falls back to DRIVEBY_BASE_URL, then the contract)
        #[arg(short, long)]
        base_url: Option<String>,

        /// Run configuration file (YAML or TOML)
        #[arg(short, long)]
        config: Option<String>,

        /// Directory to save validation-report.json and validation-report.md into
        #[arg(short, long)]
        output_dir: Option<String>,

        /// Output format: text, json, markdown
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Logs go to stderr so report output on stdout stays parseable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true)
                .compact(),
        )
        .with(filter)
        .init();

    match cli.command {
        Commands::Check { contract } => commands::check::execute(&contract).await,

        Commands::Validate {
            contract,
            auto_fix,
            format,
        } => commands::validate::execute(&contract, auto_fix, &format).await,

        Commands::Functional {
            contract,
            base_url,
            config,
            format,
        } => {
            commands::functional::execute(&contract, base_url.as_deref(), config.as_deref(), &format)
                .await
        }

        Commands::Performance {
            contract,
            base_url,
            config,
            rate,
            duration,
            max_p95,
            min_success_rate,
            format,
        } => {
            let overrides = commands::performance::LoadOverrides {
                rate,
                duration,
                max_p95,
                min_success_rate,
            };
            commands::performance::execute(
                &contract,
                base_url.as_deref(),
                config.as_deref(),
                overrides,
                &format,
            )
            .await
        }

        Commands::Run {
            contract,
            base_url,
            config,
            output_dir,
            format,
        } => {
            commands::run::execute(
                &contract,
                base_url.as_deref(),
                config.as_deref(),
                output_dir.as_deref(),
                &format,
            )
            .await
        }
    }
}
