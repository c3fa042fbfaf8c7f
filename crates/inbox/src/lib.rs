//! SFTP inbox access for the LocalEGA end-to-end harness.
//!
//! # Module Structure
//!
//! - [`error`]: Domain error type (`InboxClientError`)
//! - [`client`]: Connection abstraction (`InboxConnector`, `InboxSession`) and
//!   the `russh` implementation (`RusshConnector`)
//! - [`auth`]: Attempt policy for public-key and password logins (`Authenticator`)

pub mod auth;
pub mod client;
pub mod error;

// --- Public API Re-exports ---

pub use auth::{AttemptResult, AuthOutcome, AuthPolicy, Authenticator};
pub use client::{InboxConnector, InboxSession, RusshConnector, RusshSession};
pub use error::InboxClientError;
