//! `lega-e2e check` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use lega_e2e_core::config::HarnessConfig;
use lega_e2e_credentials::{CegaUsers, TraceFile};
use lega_e2e_docker::{DockerClient, DockerHarness};

use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `check` command.
///
/// Every probe runs even if an earlier one fails; the report lists them all.
pub async fn execute(config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    let config = super::load_config(config_path).await?;
    let harness = super::connect_harness(&config)?;

    let report = build_check_report(&config, &harness).await;
    writer.render(&report)?;

    if !report.docker_reachable() {
        return Err(CliError::DockerUnavailable(
            "docker ping failed".to_owned(),
        ));
    }
    let failed = report.failed_count();
    if failed > 0 {
        return Err(CliError::Command(format!("{failed} check(s) failed")));
    }
    Ok(())
}

pub async fn build_check_report<D: DockerClient>(
    config: &HarnessConfig,
    harness: &DockerHarness<D>,
) -> CheckReport {
    let mut checks = Vec::with_capacity(4);

    checks.push(match harness.docker().ping().await {
        Ok(()) => CheckItem::ok(CHECK_DOCKER, "daemon responded to ping"),
        Err(e) => CheckItem::failed(CHECK_DOCKER, e),
    });

    checks.push(
        match harness
            .find_container(&config.docker.db_image, &config.docker.db_container)
            .await
        {
            Ok(c) => CheckItem::ok(
                "database container",
                format!("{} ({}) {}", c.display_name(), c.short_id(), c.state),
            ),
            Err(e) => CheckItem::failed("database container", e),
        },
    );

    let trace_path = config.paths.trace_file();
    checks.push(match TraceFile::load(&trace_path).await {
        Ok(trace) => match trace.require(&config.database.user_trace_key) {
            Ok(user) => CheckItem::ok(
                "trace file",
                format!("{} = {}", config.database.user_trace_key, user),
            ),
            Err(e) => CheckItem::failed("trace file", e),
        },
        Err(e) => CheckItem::failed("trace file", e),
    });

    let users = CegaUsers::new(config.paths.cega_users_dir());
    checks.push(match users.list_users().await {
        Ok(list) => CheckItem::ok("cega users", format!("{} record(s)", list.len())),
        Err(e) => CheckItem::failed("cega users", e),
    });

    for check in &checks {
        if check.ok {
            debug!(check = %check.name, detail = %check.detail, "check passed");
        } else {
            warn!(check = %check.name, detail = %check.detail, "check failed");
        }
    }

    CheckReport { checks }
}

const CHECK_DOCKER: &str = "docker";

/// Result of one probe.
#[derive(Debug, Serialize)]
pub struct CheckItem {
    pub name: String,
    pub ok: bool,
    pub detail: String,
}

impl CheckItem {
    fn ok(name: &str, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_owned(),
            ok: true,
            detail: detail.into(),
        }
    }

    fn failed(name: &str, error: impl std::fmt::Display) -> Self {
        Self {
            name: name.to_owned(),
            ok: false,
            detail: error.to_string(),
        }
    }
}

/// Stack reachability report.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub checks: Vec<CheckItem>,
}

impl CheckReport {
    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.ok).count()
    }

    pub fn docker_reachable(&self) -> bool {
        self.checks
            .iter()
            .any(|c| c.name == CHECK_DOCKER && c.ok)
    }
}

impl Render for CheckReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "LocalEGA stack check")?;
        for check in &self.checks {
            let status = if check.ok {
                "OK".green().bold()
            } else {
                "FAIL".red().bold()
            };
            writeln!(w, "  {:<20} {:<5} {}", check.name, status, check.detail)?;
        }
        Ok(())
    }
}
