//! LocalEGA end-to-end scenarios.
//!
//! # Module Structure
//!
//! - [`context`]: per-scenario state (`ScenarioContext`)
//! - [`steps`]: step operations shared by the Cucumber runner and the tests (`ScenarioSteps`)
//! - [`error`]: step failures (`StepError`)
//! - [`logging`]: tracing subscriber setup for the runner
//!
//! The feature files live in `tests/features` and are executed by the
//! `cucumber` test target against a running LocalEGA stack.

pub mod context;
pub mod error;
pub mod logging;
pub mod steps;

// --- Public API Re-exports ---

pub use context::ScenarioContext;
pub use error::StepError;
pub use steps::ScenarioSteps;
