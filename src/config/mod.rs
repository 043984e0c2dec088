//! Run configuration for chaos experiments.
//!
//! Configuration arrives as a flat key/value map (environment variables in
//! deployment); this module translates it into an immutable [`RunConfig`]
//! and validates it. Absence of a required key is a fatal configuration
//! error, never an engine concern.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{FaultlineError, Result};
use crate::types::Sequence;

/// Immutable parameters for one chaos run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Experiment name, used in events and logs.
    pub experiment_name: String,
    /// Engine name; round-start events are emitted only when non-empty.
    pub engine_name: String,
    /// Execution ordering.
    pub sequence: Sequence,
    /// Total chaos window.
    pub chaos_duration: Duration,
    /// Spacing between rounds (serial) or hold time per round (parallel).
    pub chaos_interval: Duration,
    /// One-shot pre/post pause, excluded from the chaos window.
    pub ramp_time: Duration,
    /// Delay between convergence checks.
    pub delay: Duration,
    /// Total convergence budget; attempts = timeout / delay, truncating.
    pub timeout: Duration,
    /// Service variant only: whether convergence is awaited rather than
    /// forced by an explicit restore call.
    pub self_healing: bool,
    /// Raw comma-separated target identifier lists, keyed by the
    /// experiment-specific variable name they came from.
    pub target_lists: HashMap<String, String>,
}

impl RunConfig {
    /// Build from a flat key/value map using the deployment variable names.
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self> {
        let get = |key: &str, default: &str| -> String {
            map.get(key).cloned().unwrap_or_else(|| default.to_string())
        };

        let secs = |key: &str, default: u64| -> Result<Duration> {
            let raw = get(key, &default.to_string());
            raw.parse::<u64>().map(Duration::from_secs).map_err(|_| {
                FaultlineError::InvalidConfig {
                    field: key.to_string(),
                    reason: format!("expected seconds, got {:?}", raw),
                }
            })
        };

        let sequence_raw = get("SEQUENCE", "parallel");
        let sequence = Sequence::parse(&sequence_raw)
            .ok_or_else(|| FaultlineError::UnsupportedSequence(sequence_raw.clone()))?;

        let self_healing = match get("SELF_HEALING_SERVICES", "false").as_str() {
            "true" => true,
            "false" => false,
            other => {
                return Err(FaultlineError::InvalidConfig {
                    field: "SELF_HEALING_SERVICES".to_string(),
                    reason: format!("{} value is not supported", other),
                })
            }
        };

        let mut target_lists = HashMap::new();
        for key in ["DISK_IDS", "APP_VM_MOIDS", "SERVICE_NAMES", "PROCESS_IDS", "VM_NAMES"] {
            if let Some(value) = map.get(key) {
                target_lists.insert(key.to_string(), value.clone());
            }
        }

        Ok(Self {
            experiment_name: get("EXPERIMENT_NAME", "faultline"),
            engine_name: get("CHAOSENGINE", ""),
            sequence,
            chaos_duration: secs("TOTAL_CHAOS_DURATION", 30)?,
            chaos_interval: secs("CHAOS_INTERVAL", 30)?,
            ramp_time: secs("RAMP_TIME", 0)?,
            delay: secs("STATUS_CHECK_DELAY", 2)?,
            timeout: secs("STATUS_CHECK_TIMEOUT", 180)?,
            self_healing,
            target_lists,
        })
    }

    /// Build from the process environment.
    pub fn from_env() -> Result<Self> {
        let map: HashMap<String, String> = std::env::vars().collect();
        Self::from_map(&map)
    }

    /// Fetch and split a comma-separated target list; empty or missing
    /// lists are configuration errors.
    pub fn target_list(&self, key: &str) -> Result<Vec<String>> {
        let raw = self
            .target_lists
            .get(key)
            .map(String::as_str)
            .unwrap_or("");
        let ids: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if ids.is_empty() {
            return Err(FaultlineError::Config(format!(
                "no target ids found in {}",
                key
            )));
        }
        Ok(ids)
    }

    /// Small fast configuration for tests.
    #[doc(hidden)]
    pub fn for_tests() -> Self {
        Self {
            experiment_name: "test".into(),
            engine_name: "test-engine".into(),
            sequence: Sequence::Serial,
            chaos_duration: Duration::from_millis(50),
            chaos_interval: Duration::from_millis(5),
            ramp_time: Duration::ZERO,
            delay: Duration::from_millis(2),
            timeout: Duration::from_millis(20),
            self_healing: false,
            target_lists: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_match_deployment_contract() {
        let cfg = RunConfig::from_map(&map(&[])).unwrap();
        assert_eq!(cfg.chaos_duration, Duration::from_secs(30));
        assert_eq!(cfg.chaos_interval, Duration::from_secs(30));
        assert_eq!(cfg.ramp_time, Duration::ZERO);
        assert_eq!(cfg.delay, Duration::from_secs(2));
        assert_eq!(cfg.timeout, Duration::from_secs(180));
        assert_eq!(cfg.sequence, Sequence::Parallel);
        assert!(!cfg.self_healing);
    }

    #[test]
    fn unsupported_sequence_is_fatal() {
        let err = RunConfig::from_map(&map(&[("SEQUENCE", "diagonal")])).unwrap_err();
        assert!(matches!(err, FaultlineError::UnsupportedSequence(_)));
    }

    #[test]
    fn bad_self_healing_value_is_fatal() {
        let err =
            RunConfig::from_map(&map(&[("SELF_HEALING_SERVICES", "maybe")])).unwrap_err();
        assert!(matches!(err, FaultlineError::InvalidConfig { .. }));
    }

    #[test]
    fn non_numeric_duration_is_fatal() {
        let err = RunConfig::from_map(&map(&[("TOTAL_CHAOS_DURATION", "soon")])).unwrap_err();
        assert!(matches!(err, FaultlineError::InvalidConfig { .. }));
    }

    #[test]
    fn target_list_splits_and_trims() {
        let cfg =
            RunConfig::from_map(&map(&[("DISK_IDS", "disk-1, disk-2,disk-3")])).unwrap();
        assert_eq!(
            cfg.target_list("DISK_IDS").unwrap(),
            vec!["disk-1", "disk-2", "disk-3"]
        );
    }

    #[test]
    fn empty_target_list_is_fatal() {
        let cfg = RunConfig::from_map(&map(&[("DISK_IDS", "")])).unwrap();
        assert!(cfg.target_list("DISK_IDS").is_err());
        assert!(cfg.target_list("SERVICE_NAMES").is_err());
    }
}
