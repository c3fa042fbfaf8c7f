//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// lega-e2e -- drive the LocalEGA end-to-end harness by hand.
///
/// Use `lega-e2e <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "lega-e2e", version, about, long_about = None)]
pub struct Cli {
    /// Path to the lega-e2e.toml configuration file.
    #[arg(short, long, default_value = "lega-e2e.toml")]
    pub config: PathBuf,

    /// Log level for diagnostics on stderr (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configuration.
    Config(ConfigArgs),

    /// Check that the LocalEGA stack is reachable (Docker, database container, trace file).
    Check,

    /// Create Central EGA test accounts and log in to the inbox.
    Account(AccountArgs),

    /// Query the local LocalEGA database.
    Db(DbArgs),
}

// ---- config ----

/// Manage lega-e2e configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, paths, docker, database, inbox, credentials).
        #[arg(long)]
        section: Option<String>,
    },
}

// ---- account ----

#[derive(Args, Debug)]
pub struct AccountArgs {
    #[command(subcommand)]
    pub action: AccountAction,
}

#[derive(Subcommand, Debug)]
pub enum AccountAction {
    /// Generate an RSA keypair and write the Central EGA user record.
    Create {
        /// Username (default: a random UUID).
        #[arg(long)]
        user: Option<String>,
    },
    /// Log in to the inbox over SFTP and list its root directory.
    Login {
        /// Username.
        #[arg(long)]
        user: String,

        #[command(flatten)]
        credential: LoginCredential,
    },
}

/// Exactly one of `--key` or `--password`.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct LoginCredential {
    /// PEM private key for public-key login.
    #[arg(long)]
    pub key: Option<PathBuf>,

    /// Password for password login.
    #[arg(long)]
    pub password: Option<String>,
}

// ---- db ----

#[derive(Args, Debug)]
pub struct DbArgs {
    #[command(subcommand)]
    pub action: DbAction,
}

#[derive(Subcommand, Debug)]
pub enum DbAction {
    /// Count rows in `users` for an Elixir ID.
    Count {
        /// Elixir ID (username).
        user: String,
    },
    /// Expire an account.
    Expire {
        /// Elixir ID (username).
        user: String,

        /// Expiration interval (default: `database.expiration`).
        #[arg(long)]
        expiration: Option<String>,
    },
    /// Run raw SQL with psql and print its output.
    Query {
        /// SQL statement.
        sql: String,
    },
}
