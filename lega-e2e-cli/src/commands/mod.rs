//! Command handlers -- one module per subcommand

pub mod account;
pub mod check;
pub mod config;
pub mod db;

use std::path::Path;
use std::sync::Arc;

use lega_e2e_core::config::HarnessConfig;
use lega_e2e_docker::{BollardDockerClient, DockerHarness, WorkerSettings};

use crate::error::CliError;

/// Loads the effective configuration. A missing file falls back to defaults.
pub async fn load_config(config_path: &Path) -> Result<HarnessConfig, CliError> {
    Ok(HarnessConfig::load_or_default(config_path).await?)
}

/// Connects to Docker as configured and wraps the client in a harness.
pub fn connect_harness(
    config: &HarnessConfig,
) -> Result<DockerHarness<BollardDockerClient>, CliError> {
    let docker = BollardDockerClient::connect(&config.docker.socket)?;
    Ok(DockerHarness::new(
        Arc::new(docker),
        WorkerSettings::from_config(config),
    ))
}
