//! Cucumber runner for the LocalEGA features.
//!
//! Needs a running LocalEGA stack (Docker, the inbox on `localhost:2222`,
//! the bootstrap's `private/` directory). Without `LEGA_E2E_LIVE=1` the
//! runner exits immediately so `cargo test` stays green on machines without
//! the stack.
//!
//! ```text
//! LEGA_E2E_LIVE=1 cargo test -p lega-e2e-suite --test cucumber
//! ```

mod steps;

use cucumber::World as _;

use lega_e2e_core::config::HarnessConfig;
use lega_e2e_suite::logging::init_tracing;

use steps::{LegaWorld, config_path, install_config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::var("LEGA_E2E_LIVE").as_deref() != Ok("1") {
        eprintln!("skipping LocalEGA scenarios: set LEGA_E2E_LIVE=1 to run them");
        return Ok(());
    }

    let config = HarnessConfig::load_or_default(config_path()).await?;
    init_tracing(&config.general)?;
    install_config(config);

    // scenarios share the inbox, the database container and worker names
    LegaWorld::cucumber()
        .max_concurrent_scenarios(1)
        .fail_on_skipped()
        .run_and_exit("tests/features")
        .await;
    Ok(())
}
