pub mod check;
pub mod functional;
pub mod performance;
pub mod run;
pub mod validate;

use anyhow::{Context, Result};
use driveby_core::ValidationReport;
use driveby_runner::{CancellationToken, LoadedContract, load_contract};
use std::io::Write;
use tracing::{info, warn};

use crate::output;

/// Loads a contract and logs what normalization changed.
pub async fn load(contract: &str) -> Result<LoadedContract> {
    info!("Loading contract: {}", contract);
    let loaded = load_contract(contract)
        .await
        .with_context(|| format!("Failed to load contract: {}", contract))?;
    for note in &loaded.notes {
        info!(note = %note, "Normalized contract");
    }
    Ok(loaded)
}

/// Returns a token cancelled on Ctrl-C.
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let handle = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling run");
            handle.cancel();
        }
    });
    cancel
}

/// Prints the report and exits non-zero when the run failed.
pub fn finish(report: &ValidationReport, format: &str) -> Result<()> {
    output::print_validation_report(report, format)?;

    if report.is_failure() {
        // process::exit skips destructors, so flush the report first
        let _ = std::io::stdout().flush();
        std::process::exit(1);
    }

    Ok(())
}
