//! `lega-e2e db` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use lega_e2e_core::config::HarnessConfig;
use lega_e2e_credentials::TraceFile;
use lega_e2e_docker::{DockerClient, DockerHarness, LocalDatabase};

use crate::cli::{DbAction, DbArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `db` command.
pub async fn execute(args: DbArgs, config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    let config = super::load_config(config_path).await?;
    let harness = super::connect_harness(&config)?;
    let database = open_database(&config, harness).await?;

    match args.action {
        DbAction::Count { user } => {
            let count = database.user_count(&user).await?;
            writer.render(&UserCountReport { user, count })?;
        }
        DbAction::Expire { user, expiration } => {
            let expiration = expiration.unwrap_or_else(|| config.database.expiration.clone());
            let updated = database.expire_user(&user, &expiration).await?;
            writer.render(&ExpireReport {
                user,
                expiration,
                updated,
            })?;
        }
        DbAction::Query { sql } => {
            let output = database.execute_query(&sql).await?;
            writer.render(&QueryReport { sql, output })?;
        }
    }
    Ok(())
}

/// Builds the database handle; the role comes from the trace file.
pub async fn open_database<D: DockerClient>(
    config: &HarnessConfig,
    harness: DockerHarness<D>,
) -> Result<LocalDatabase<D>, CliError> {
    let trace = TraceFile::load(config.paths.trace_file()).await?;
    let db_user = trace.require(&config.database.user_trace_key)?;
    Ok(LocalDatabase::new(harness, config, db_user))
}

#[derive(Debug, Serialize)]
pub struct UserCountReport {
    pub user: String,
    pub count: i64,
}

impl Render for UserCountReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "{}: {} row(s) in users", self.user, self.count)
    }
}

#[derive(Debug, Serialize)]
pub struct ExpireReport {
    pub user: String,
    pub expiration: String,
    pub updated: u64,
}

impl Render for ExpireReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if self.updated == 0 {
            writeln!(w, "{} no account found for {}", "WARN".yellow().bold(), self.user)
        } else {
            writeln!(
                w,
                "Expired {} (expiration '{}', {} row(s) updated)",
                self.user.bold(),
                self.expiration,
                self.updated
            )
        }
    }
}

/// Raw psql output.
#[derive(Debug, Serialize)]
pub struct QueryReport {
    pub sql: String,
    pub output: String,
}

impl Render for QueryReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        write!(w, "{}", self.output)?;
        if !self.output.ends_with('\n') {
            writeln!(w)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;

    fn render(writer: &OutputWriter, payload: &(impl Render + Serialize)) -> String {
        let mut buffer = Vec::new();
        writer.render_to(payload, &mut buffer).expect("render");
        String::from_utf8(buffer).expect("utf8")
    }

    #[test]
    fn test_user_count_text() {
        let writer = OutputWriter::new(OutputFormat::Text);
        let output = render(
            &writer,
            &UserCountReport {
                user: "alice".to_owned(),
                count: 1,
            },
        );
        assert_eq!(output, "alice: 1 row(s) in users\n");
    }

    #[test]
    fn test_expire_report_json() {
        let writer = OutputWriter::new(OutputFormat::Json);
        let output = render(
            &writer,
            &ExpireReport {
                user: "alice".to_owned(),
                expiration: "1 second".to_owned(),
                updated: 1,
            },
        );
        let value: serde_json::Value = serde_json::from_str(&output).expect("json");
        assert_eq!(value["expiration"], "1 second");
        assert_eq!(value["updated"], 1);
    }

    #[test]
    fn test_expire_report_warns_when_nothing_updated() {
        let report = ExpireReport {
            user: "ghost".to_owned(),
            expiration: "1 second".to_owned(),
            updated: 0,
        };
        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("render");
        let output = String::from_utf8(buffer).expect("utf8");
        assert!(output.contains("no account found for ghost"));
    }

    #[test]
    fn test_query_output_gets_trailing_newline() {
        let writer = OutputWriter::new(OutputFormat::Text);
        let output = render(
            &writer,
            &QueryReport {
                sql: "SELECT 1".to_owned(),
                output: " ?column? \n----------\n        1".to_owned(),
            },
        );
        assert!(output.ends_with("1\n"));
    }

    /// Docker double that is never reached by these tests.
    struct NullDocker;

    impl DockerClient for NullDocker {
        async fn list_containers(
            &self,
            _all: bool,
        ) -> Result<Vec<lega_e2e_core::types::ContainerInfo>, lega_e2e_docker::DockerError> {
            Ok(Vec::new())
        }

        async fn create_container(
            &self,
            _spec: &lega_e2e_docker::ContainerSpec,
        ) -> Result<String, lega_e2e_docker::DockerError> {
            Ok("null".to_owned())
        }

        async fn start_container(&self, _id: &str) -> Result<(), lega_e2e_docker::DockerError> {
            Ok(())
        }

        async fn exec(
            &self,
            _id: &str,
            _cmd: &[String],
        ) -> Result<lega_e2e_core::types::ExecOutput, lega_e2e_docker::DockerError> {
            Ok(lega_e2e_core::types::ExecOutput::default())
        }

        async fn wait_container(&self, _id: &str) -> Result<i64, lega_e2e_docker::DockerError> {
            Ok(0)
        }

        async fn remove_container(
            &self,
            _id: &str,
            _force: bool,
        ) -> Result<(), lega_e2e_docker::DockerError> {
            Ok(())
        }

        async fn ping(&self) -> Result<(), lega_e2e_docker::DockerError> {
            Ok(())
        }
    }

    fn harness(config: &HarnessConfig) -> DockerHarness<NullDocker> {
        use lega_e2e_docker::WorkerSettings;
        DockerHarness::new(std::sync::Arc::new(NullDocker), WorkerSettings::from_config(config))
    }

    fn config_in(dir: &Path) -> HarnessConfig {
        let mut config = HarnessConfig::default();
        config.paths.project_root = dir.to_path_buf();
        config
    }

    #[tokio::test]
    async fn test_open_database_missing_trace_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config_in(dir.path());
        let err = open_database(&config, harness(&config))
            .await
            .err()
            .expect("missing trace file should fail");
        assert_eq!(err.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_open_database_reads_db_user() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config_in(dir.path());
        let trace = config.paths.trace_file();
        std::fs::create_dir_all(trace.parent().expect("parent")).expect("mkdir");
        std::fs::write(&trace, "DB_USER = lega\n").expect("write trace");

        assert!(open_database(&config, harness(&config)).await.is_ok());
    }

    #[tokio::test]
    async fn test_open_database_missing_db_user_key() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config_in(dir.path());
        let trace = config.paths.trace_file();
        std::fs::create_dir_all(trace.parent().expect("parent")).expect("mkdir");
        std::fs::write(&trace, "DB_PASSWORD = secret\n").expect("write trace");

        let err = open_database(&config, harness(&config))
            .await
            .err()
            .expect("missing key should fail");
        assert!(err.to_string().contains("DB_USER"));
    }
}
