use anyhow::Result;
use driveby_core::{RunConfig, TestMode};
use driveby_runner::run_all;
use tracing::info;

use crate::commands;

pub async fn execute(contract_path: &str, auto_fix: bool, format: &str) -> Result<()> {
    let loaded = commands::load(contract_path).await?;
    info!("Auto-fix: {}", auto_fix);

    let config = RunConfig {
        auto_fix,
        test_mode: TestMode::None,
        ..RunConfig::default()
    };

    // Rules only: no request is sent, so the base URL is never used
    let report = run_all(&loaded.model, "", &config, &commands::cancel_on_ctrl_c()).await;

    commands::finish(&report, format)
}
