use anyhow::Result;
use driveby_core::TestMode;
use driveby_runner::run_all;
use std::path::Path;
use tracing::info;

use crate::commands;
use crate::output;
use crate::settings;

pub async fn execute(
    contract_path: &str,
    base_url: Option<&str>,
    config_path: Option<&str>,
    output_dir: Option<&str>,
    format: &str,
) -> Result<()> {
    let loaded = commands::load(contract_path).await?;

    let config = settings::load_run_config(config_path)?;
    settings::validate(&config)?;

    let base_url = if config.test_mode == TestMode::None {
        base_url.unwrap_or_default().to_string()
    } else {
        settings::base_url(base_url, contract_path, &loaded.model)?
    };
    info!("Test mode: {:?}", config.test_mode);

    let report = run_all(&loaded.model, &base_url, &config, &commands::cancel_on_ctrl_c()).await;

    if let Some(dir) = output_dir {
        let (json_path, markdown_path) = output::save_report(&report, Path::new(dir))?;
        info!(
            "Report saved to {} and {}",
            json_path.display(),
            markdown_path.display()
        );
    }

    commands::finish(&report, format)
}
