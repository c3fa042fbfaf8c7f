//! Docker plumbing for the LocalEGA end-to-end harness.
//!
//! # Module Structure
//!
//! - [`error`]: Domain error type (`DockerError`)
//! - [`client`]: Docker API abstraction (`DockerClient` trait, `BollardDockerClient`)
//! - [`harness`]: Container utilities (`DockerHarness`, `TemporaryWorker`)
//! - [`checksum`]: MD5 of files on the host
//! - [`database`]: `psql` access to the local LocalEGA database (`LocalDatabase`)
//!
//! # Architecture
//!
//! ```text
//! step definitions
//!        |
//!   DockerHarness ---- LocalDatabase (psql via exec)
//!        |
//!   DockerClient (trait)
//!        |
//!   Docker daemon
//! ```

pub mod checksum;
pub mod client;
pub mod database;
pub mod error;
pub mod harness;

// --- Public API Re-exports ---

pub use checksum::md5_hex;
pub use client::{BollardDockerClient, ContainerSpec, DockerClient};
pub use database::{LocalDatabase, parse_count};
pub use error::DockerError;
pub use harness::{DockerHarness, TemporaryWorker, WorkerSettings};
