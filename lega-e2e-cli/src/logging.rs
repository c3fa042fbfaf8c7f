//! Logging initialization for the CLI.
//!
//! Diagnostics go to stderr so stdout carries only command output. The level
//! comes from `RUST_LOG`, then `--log-level`, then `[general] log_level` of a
//! loadable config file. JSON lines are used with `--output json` or
//! `log_format = "json"`.

use tracing_subscriber::EnvFilter;

use lega_e2e_core::config::GeneralConfig;

use crate::error::CliError;

/// Level used when no flag is given and the config file cannot be loaded.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Effective logging settings before `RUST_LOG` is consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: String,
    pub json: bool,
}

impl LogSettings {
    pub fn resolve(
        cli_level: Option<&str>,
        output_json: bool,
        general: Option<&GeneralConfig>,
    ) -> Self {
        let level = cli_level
            .or(general.map(|g| g.log_level.as_str()))
            .unwrap_or(DEFAULT_LOG_LEVEL)
            .to_owned();
        let json = output_json || general.is_some_and(|g| g.log_format == "json");
        Self { level, json }
    }
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `settings.level`.
pub fn init_tracing(settings: &LogSettings) -> Result<(), CliError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    let result = if settings.json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
    result.map_err(|e| CliError::Command(format!("failed to initialize tracing: {e}")))
}
