//! Cucumber world and step bindings.
//!
//! The bindings only translate step text into `ScenarioSteps` calls; a step
//! fails by panicking with the `StepError` message.

mod authentication;
mod password_login;

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use cucumber::World;

use lega_e2e_core::config::HarnessConfig;
use lega_e2e_docker::BollardDockerClient;
use lega_e2e_inbox::{RusshConnector, RusshSession};
use lega_e2e_suite::{ScenarioContext, ScenarioSteps, StepError};

/// Default config file, relative to the suite crate.
const DEFAULT_CONFIG: &str = "lega-e2e.toml";

/// Loaded once by the runner before any scenario starts.
static CONFIG: OnceLock<HarnessConfig> = OnceLock::new();

pub fn config_path() -> PathBuf {
    std::env::var_os("LEGA_E2E_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG))
}

pub fn install_config(config: HarnessConfig) {
    let _ = CONFIG.set(config);
}

#[derive(World)]
#[world(init = Self::new)]
pub struct LegaWorld {
    pub steps: Arc<ScenarioSteps<BollardDockerClient, RusshConnector>>,
    pub ctx: ScenarioContext<RusshSession>,
}

impl LegaWorld {
    fn new() -> Self {
        let config = CONFIG.get().cloned().unwrap_or_default();
        let docker = BollardDockerClient::connect(&config.docker.socket)
            .unwrap_or_else(|e| panic!("{e}"));
        let connector = RusshConnector::from_config(&config.inbox);
        Self {
            steps: Arc::new(ScenarioSteps::new(config, Arc::new(docker), connector)),
            ctx: ScenarioContext::new(),
        }
    }
}

impl std::fmt::Debug for LegaWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LegaWorld")
            .field("ctx", &self.ctx)
            .finish_non_exhaustive()
    }
}

/// Fails the current step on error.
pub fn check(result: Result<(), StepError>) {
    if let Err(e) = result {
        panic!("{e}");
    }
}
