//! Local LocalEGA database access through `psql` inside the database container.
//!
//! The harness never opens a PostgreSQL connection itself: every query is run
//! as `psql -U <user> -d <db> -c <sql>` in the running database container and
//! the textual output is parsed.

use tracing::{debug, info};

use lega_e2e_core::config::HarnessConfig;

use crate::client::DockerClient;
use crate::error::DockerError;
use crate::harness::DockerHarness;

/// `psql` front-end for the `users` table.
pub struct LocalDatabase<D: DockerClient> {
    harness: DockerHarness<D>,
    image: String,
    container: String,
    user: String,
    name: String,
}

impl<D: DockerClient> LocalDatabase<D> {
    /// `db_user` is the role name the bootstrap wrote to the trace file.
    pub fn new(harness: DockerHarness<D>, config: &HarnessConfig, db_user: impl Into<String>) -> Self {
        Self {
            harness,
            image: config.docker.db_image.clone(),
            container: config.docker.db_container.clone(),
            user: db_user.into(),
            name: config.database.name.clone(),
        }
    }

    /// Runs `sql` and returns raw `psql` stdout.
    pub async fn execute_query(&self, sql: &str) -> Result<String, DockerError> {
        let container = self
            .harness
            .find_container(&self.image, &self.container)
            .await?;
        debug!(sql = %sql, "executing db query");
        self.harness
            .execute_within_container(
                &container,
                &["psql", "-U", self.user.as_str(), "-d", self.name.as_str(), "-c", sql],
            )
            .await
    }

    /// Number of rows in `users` for the given Elixir ID.
    pub async fn user_count(&self, elixir_id: &str) -> Result<i64, DockerError> {
        let sql = format!(
            "select count(*) from users where elixir_id = {}",
            quote_literal(elixir_id)
        );
        let output = self.execute_query(&sql).await?;
        parse_count(&output)
    }

    /// Sets the account expiration interval so the inbox treats the user as expired.
    ///
    /// Returns the number of updated rows.
    pub async fn expire_user(&self, elixir_id: &str, expiration: &str) -> Result<u64, DockerError> {
        let sql = format!(
            "update users set expiration = {} where elixir_id = {}",
            quote_literal(expiration),
            quote_literal(elixir_id)
        );
        let output = self.execute_query(&sql).await?;
        let rows = parse_update(&output)?;
        info!(user = %elixir_id, rows, "account expired");
        Ok(rows)
    }
}

/// Extracts the count from aligned `psql` output.
///
/// The value sits on the third line, below the column header and the rule:
///
/// ```text
///  count
/// -------
///      1
/// (1 row)
/// ```
pub fn parse_count(output: &str) -> Result<i64, DockerError> {
    let line = output
        .lines()
        .nth(2)
        .ok_or_else(|| DockerError::UnexpectedOutput(format!("no value line in {output:?}")))?;
    line.trim()
        .parse::<i64>()
        .map_err(|e| DockerError::UnexpectedOutput(format!("{:?}: {e}", line.trim())))
}

/// Parses the `UPDATE <n>` command tag.
fn parse_update(output: &str) -> Result<u64, DockerError> {
    output
        .lines()
        .find_map(|l| l.trim().strip_prefix("UPDATE "))
        .and_then(|n| n.trim().parse::<u64>().ok())
        .ok_or_else(|| DockerError::Query(format!("no UPDATE tag in {output:?}")))
}

/// SQL string literal with embedded quotes doubled.
fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
