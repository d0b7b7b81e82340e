use anyhow::Result;
use driveby_core::TestMode;
use driveby_runner::run_all;
use tracing::info;

use crate::commands;
use crate::settings;

pub async fn execute(
    contract_path: &str,
    base_url: Option<&str>,
    config_path: Option<&str>,
    format: &str,
) -> Result<()> {
    let loaded = commands::load(contract_path).await?;

    let mut config = settings::load_run_config(config_path)?;
    config.test_mode = TestMode::Functional;
    settings::validate(&config)?;

    let base_url = settings::base_url(base_url, contract_path, &loaded.model)?;
    info!("Testing {} operations against {}", loaded.model.operation_count(), base_url);

    let report = run_all(&loaded.model, &base_url, &config, &commands::cancel_on_ctrl_c()).await;

    commands::finish(&report, format)
}
