//! Test credentials for the LocalEGA end-to-end harness.
//!
//! - [`trace`]: `KEY = value` trace files written by the bootstrap scripts
//! - [`cega`]: the mounted Central EGA users directory
//! - [`keygen`]: RSA keypair provisioning inside a throwaway worker container

pub mod cega;
pub mod error;
pub mod keygen;
pub mod trace;

pub use cega::{CegaUser, CegaUsers};
pub use error::CredentialsError;
pub use keygen::{KeyProvisioner, ProvisionedAccount};
pub use trace::TraceFile;
