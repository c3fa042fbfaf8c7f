//! SSH/SFTP connection abstraction for the LocalEGA inbox.
//!
//! The [`InboxConnector`] trait hides the SSH client library so the
//! authentication policy and the step definitions can be tested with a
//! scripted connector, while production code uses [`RusshConnector`].
//!
//! A connection attempt is only considered successful once the SSH session is
//! authenticated *and* the `sftp` subsystem is open; an [`InboxSession`] is
//! therefore always ready for SFTP calls.
//!
//! # Host key verification
//!
//! The inbox under test generates a fresh host key on every bootstrap, so
//! server keys are accepted without verification.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use russh::client::{self, Handle};
use russh_sftp::client::SftpSession;
use tracing::{debug, info};

use lega_e2e_core::config::InboxConfig;

use crate::error::InboxClientError;

/// An authenticated SFTP session.
pub trait InboxSession: Send + 'static {
    /// Entry names of a remote directory, without `.` and `..`.
    fn list_dir(
        &mut self,
        path: &str,
    ) -> impl Future<Output = Result<Vec<String>, InboxClientError>> + Send;

    /// Closes the SFTP channel and disconnects.
    fn close(self) -> impl Future<Output = Result<(), InboxClientError>> + Send
    where
        Self: Sized;
}

/// Opens authenticated SFTP sessions against the inbox.
///
/// Authentication rejection is reported as [`InboxClientError::Rejected`];
/// every other failure (network, key file, SFTP subsystem) keeps its own
/// variant.
pub trait InboxConnector: Send + Sync + 'static {
    type Session: InboxSession;

    /// Public-key login with the PEM private key at `key`.
    fn connect_with_key(
        &self,
        user: &str,
        key: &Path,
    ) -> impl Future<Output = Result<Self::Session, InboxClientError>> + Send;

    /// Password login.
    fn connect_with_password(
        &self,
        user: &str,
        password: &str,
    ) -> impl Future<Output = Result<Self::Session, InboxClientError>> + Send;
}

/// Accepts every server key.
struct AcceptAnyHostKey;

#[async_trait::async_trait]
impl client::Handler for AcceptAnyHostKey {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &russh_keys::key::PublicKey,
    ) -> Result<bool, Self::Error> {
        debug!("accepting inbox host key");
        Ok(true)
    }
}

/// Production connector built on `russh`.
#[derive(Clone)]
pub struct RusshConnector {
    host: String,
    port: u16,
    connect_timeout: Duration,
    config: Arc<client::Config>,
}

impl RusshConnector {
    pub fn new(host: impl Into<String>, port: u16, connect_timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout,
            config: Arc::new(client::Config::default()),
        }
    }

    pub fn from_config(config: &InboxConfig) -> Self {
        Self::new(
            &config.host,
            config.port,
            Duration::from_secs(config.connect_timeout_secs),
        )
    }

    /// `host:port` of the inbox.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// TCP connect and SSH handshake, bounded by the connect timeout.
    async fn open(&self) -> Result<Handle<AcceptAnyHostKey>, InboxClientError> {
        let connect = client::connect(
            Arc::clone(&self.config),
            (self.host.as_str(), self.port),
            AcceptAnyHostKey,
        );
        match tokio::time::timeout(self.connect_timeout, connect).await {
            Ok(Ok(handle)) => {
                debug!(addr = %self.addr(), "ssh handshake complete");
                Ok(handle)
            }
            Ok(Err(e)) => Err(InboxClientError::Connect {
                addr: self.addr(),
                reason: e.to_string(),
            }),
            Err(_) => Err(InboxClientError::Timeout(self.connect_timeout.as_secs())),
        }
    }
}

impl InboxConnector for RusshConnector {
    type Session = RusshSession;

    async fn connect_with_key(
        &self,
        user: &str,
        key: &Path,
    ) -> Result<RusshSession, InboxClientError> {
        let key_pair =
            russh_keys::load_secret_key(key, None).map_err(|e| InboxClientError::Key {
                path: key.display().to_string(),
                reason: e.to_string(),
            })?;

        let mut handle = self.open().await?;
        let accepted = handle
            .authenticate_publickey(user, Arc::new(key_pair))
            .await
            .map_err(|e| self.connect_error(e))?;
        if !accepted {
            return Err(InboxClientError::Rejected(user.to_owned()));
        }

        info!(user = %user, addr = %self.addr(), "public key accepted");
        RusshSession::open(handle).await
    }

    async fn connect_with_password(
        &self,
        user: &str,
        password: &str,
    ) -> Result<RusshSession, InboxClientError> {
        let mut handle = self.open().await?;
        let accepted = handle
            .authenticate_password(user, password)
            .await
            .map_err(|e| self.connect_error(e))?;
        if !accepted {
            return Err(InboxClientError::Rejected(user.to_owned()));
        }

        info!(user = %user, addr = %self.addr(), "password accepted");
        RusshSession::open(handle).await
    }
}

impl RusshConnector {
    fn connect_error(&self, e: russh::Error) -> InboxClientError {
        InboxClientError::Connect {
            addr: self.addr(),
            reason: e.to_string(),
        }
    }
}

/// SFTP session over an authenticated `russh` connection.
pub struct RusshSession {
    handle: Handle<AcceptAnyHostKey>,
    sftp: SftpSession,
}

impl RusshSession {
    async fn open(handle: Handle<AcceptAnyHostKey>) -> Result<Self, InboxClientError> {
        let channel = handle.channel_open_session().await.map_err(sftp_error)?;
        channel
            .request_subsystem(true, "sftp")
            .await
            .map_err(sftp_error)?;
        let sftp = SftpSession::new(channel.into_stream())
            .await
            .map_err(sftp_error)?;
        Ok(Self { handle, sftp })
    }
}

impl std::fmt::Debug for RusshSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RusshSession").finish_non_exhaustive()
    }
}

impl InboxSession for RusshSession {
    async fn list_dir(&mut self, path: &str) -> Result<Vec<String>, InboxClientError> {
        let entries = self.sftp.read_dir(path).await.map_err(sftp_error)?;
        let names: Vec<String> = entries
            .map(|entry| entry.file_name())
            .filter(|name| name != "." && name != "..")
            .collect();
        debug!(path = %path, count = names.len(), "remote directory listed");
        Ok(names)
    }

    async fn close(self) -> Result<(), InboxClientError> {
        self.sftp.close().await.map_err(sftp_error)?;
        self.handle
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(sftp_error)
    }
}

fn sftp_error(e: impl std::fmt::Display) -> InboxClientError {
    InboxClientError::Sftp(e.to_string())
}
