use clap::Parser;

use lega_e2e_core::config::HarnessConfig;

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use cli::{Cli, Commands, OutputFormat};
use error::CliError;
use logging::LogSettings;
use output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // load errors are reported by the command itself
    let general = HarnessConfig::load(&cli.config).await.ok().map(|c| c.general);
    let settings = LogSettings::resolve(
        cli.log_level.as_deref(),
        cli.output == OutputFormat::Json,
        general.as_ref(),
    );
    if let Err(e) = logging::init_tracing(&settings) {
        eprintln!("warning: {e}");
    }

    tracing::debug!(config = %cli.config.display(), "lega-e2e starting");

    let writer = OutputWriter::new(cli.output);
    if let Err(e) = run(cli, &writer).await {
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli, writer: &OutputWriter) -> Result<(), CliError> {
    match cli.command {
        Commands::Config(args) => commands::config::execute(args, &cli.config, writer).await,
        Commands::Check => commands::check::execute(&cli.config, writer).await,
        Commands::Account(args) => commands::account::execute(args, &cli.config, writer).await,
        Commands::Db(args) => commands::db::execute(args, &cli.config, writer).await,
    }
}
