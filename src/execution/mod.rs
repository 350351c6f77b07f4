//! Turning a ranked candidate into a submitted bundle.

/// Executor and pair calldata
pub mod calldata;
/// Candidate-by-candidate gating and submission
pub mod pipeline;
/// Private bundle relay
pub mod relay;

pub use pipeline::{ExecutionPipeline, SkipReason};
pub use relay::{BundleRelay, FlashbotsRelay, SignedBundle, Simulation};

use thiserror::Error;

/// Failures that end a cycle's execution attempt.
///
/// Anything that only disqualifies one candidate is a [`SkipReason`] instead.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// A ranked candidate could not be encoded; the ranking is not trusted further
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    /// The relay rejected a submission after simulation passed
    #[error("bundle submission failed: {0}")]
    Submission(String),
}
