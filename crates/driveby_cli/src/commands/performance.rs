use anyhow::Result;
use driveby_core::{RunConfig, TestMode, format_duration};
use driveby_runner::run_all;
use std::time::Duration;
use tracing::info;

use crate::commands;
use crate::settings;

/// Load flags layered over the config file.
#[derive(Debug, Default)]
pub struct LoadOverrides {
    pub rate: Option<u32>,
    pub duration: Option<Duration>,
    pub max_p95: Option<Duration>,
    pub min_success_rate: Option<f64>,
}

impl LoadOverrides {
    fn apply(self, config: &mut RunConfig) {
        if let Some(rate) = self.rate {
            config.load.rate = rate;
        }
        if let Some(duration) = self.duration {
            config.load.duration = duration;
        }
        if let Some(max_p95) = self.max_p95 {
            config.thresholds.max_latency_p95 = max_p95;
        }
        if let Some(min_success_rate) = self.min_success_rate {
            config.thresholds.min_success_rate = min_success_rate;
        }
    }
}

pub async fn execute(
    contract_path: &str,
    base_url: Option<&str>,
    config_path: Option<&str>,
    overrides: LoadOverrides,
    format: &str,
) -> Result<()> {
    let loaded = commands::load(contract_path).await?;

    let mut config = settings::load_run_config(config_path)?;
    config.test_mode = TestMode::Performance;
    overrides.apply(&mut config);
    settings::validate(&config)?;

    let base_url = settings::base_url(base_url, contract_path, &loaded.model)?;
    info!(
        "Load testing {} at {} req/s for {}",
        base_url,
        config.load.rate,
        format_duration(config.load.duration)
    );

    let report = run_all(&loaded.model, &base_url, &config, &commands::cancel_on_ctrl_c()).await;

    commands::finish(&report, format)
}
