//! CLI-specific error types and exit code mapping

use lega_e2e_core::error::{ContainerError, HarnessError};
use lega_e2e_credentials::CredentialsError;
use lega_e2e_docker::DockerError;
use lega_e2e_inbox::InboxClientError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// Cannot talk to the Docker daemon.
    #[error("docker not reachable: {0}")]
    DockerUnavailable(String),

    /// The inbox rejected the credentials.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                  |
    /// |------|--------------------------|
    /// | 0    | Success                  |
    /// | 1    | General / command error  |
    /// | 2    | Configuration error      |
    /// | 3    | Docker unreachable       |
    /// | 4    | Authentication failed    |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::DockerUnavailable(_) => 3,
            Self::AuthenticationFailed(_) => 4,
            Self::JsonSerialize(_) | Self::Command(_) | Self::Io(_) => 1,
        }
    }
}

impl From<HarnessError> for CliError {
    fn from(e: HarnessError) -> Self {
        match e {
            HarnessError::Config(inner) => Self::Config(inner.to_string()),
            HarnessError::Container(ContainerError::Connection(msg)) => Self::DockerUnavailable(msg),
            other => Self::Command(other.to_string()),
        }
    }
}

impl From<DockerError> for CliError {
    fn from(e: DockerError) -> Self {
        match e {
            DockerError::DockerConnection(msg) => Self::DockerUnavailable(msg),
            other => Self::Command(other.to_string()),
        }
    }
}

impl From<CredentialsError> for CliError {
    fn from(e: CredentialsError) -> Self {
        match e {
            CredentialsError::Docker(inner) => inner.into(),
            other => Self::Command(other.to_string()),
        }
    }
}

impl From<InboxClientError> for CliError {
    fn from(e: InboxClientError) -> Self {
        if e.is_rejection() {
            Self::AuthenticationFailed(e.to_string())
        } else {
            Self::Command(e.to_string())
        }
    }
}
