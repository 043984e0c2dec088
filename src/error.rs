//! Error types for the Faultline orchestration engine.
//!
//! This module provides a unified error type [`FaultlineError`] for all engine
//! operations, along with a convenient [`Result`] type alias.
//!
//! # Error Categories
//!
//! - **Configuration**: empty or mismatched target lists, unsupported
//!   sequence modes — fatal, surfaced immediately, never retried.
//! - **Adapter**: a remote mutate/query call failed — fatal for the current
//!   round, wrapped with the target identifier and attempted action.
//! - **Convergence**: the call succeeded but the target never reached the
//!   expected state within the retry budget — deliberately distinct from
//!   adapter errors so callers can tell the two apart.
//! - **Probe**: a health probe failed during the chaos window — fatal for the
//!   round, passed through with priority.
//!
//! # Example
//!
//! ```rust
//! use faultline::error::{FaultlineError, Result};
//!
//! fn parse_targets(raw: &str) -> Result<Vec<String>> {
//!     if raw.is_empty() {
//!         return Err(FaultlineError::Config("no target ids found".into()));
//!     }
//!     Ok(raw.split(',').map(str::to_string).collect())
//! }
//! ```

use std::io;
use thiserror::Error;

/// Main error type for Faultline operations.
#[derive(Error, Debug)]
pub enum FaultlineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration: {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("{0} sequence is not supported")]
    UnsupportedSequence(String),

    // Adapter call errors
    #[error("{action} failed for target {target}: {reason}")]
    Adapter {
        target: String,
        action: String,
        reason: String,
    },

    // Convergence-timeout errors
    #[error("target {target} did not reach {expected} state: {reason}")]
    Convergence {
        target: String,
        expected: String,
        reason: String,
    },

    // Probe errors
    #[error("probe failed during {phase}: {reason}")]
    Probe { phase: String, reason: String },

    // Script execution errors
    #[error("script execution failed on {target}: {reason}")]
    ScriptExecution { target: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl FaultlineError {
    /// Check if the error is retryable within a convergence poll.
    ///
    /// A failed state query is retried on the next poll attempt; everything
    /// else unwinds to the strategy immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FaultlineError::Adapter { .. } | FaultlineError::Convergence { .. }
        )
    }

    /// Check if the error is a configuration error (no round was started).
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            FaultlineError::Config(_)
                | FaultlineError::InvalidConfig { .. }
                | FaultlineError::UnsupportedSequence(_)
        )
    }
}

impl From<serde_json::Error> for FaultlineError {
    fn from(e: serde_json::Error) -> Self {
        FaultlineError::Serialization(e.to_string())
    }
}

/// Result type alias for Faultline operations.
pub type Result<T> = std::result::Result<T, FaultlineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_error_carries_target_and_action() {
        let err = FaultlineError::Adapter {
            target: "disk-1".into(),
            action: "detach".into(),
            reason: "connection refused".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("disk-1"));
        assert!(msg.contains("detach"));
    }

    #[test]
    fn convergence_distinct_from_adapter() {
        let conv = FaultlineError::Convergence {
            target: "disk-1".into(),
            expected: "detached".into(),
            reason: "still attached after 90 attempts".into(),
        };
        assert!(matches!(conv, FaultlineError::Convergence { .. }));
        assert!(conv.is_retryable());
    }

    #[test]
    fn config_errors_are_not_retryable() {
        let err = FaultlineError::UnsupportedSequence("diagonal".into());
        assert!(!err.is_retryable());
        assert!(err.is_config());
    }
}
