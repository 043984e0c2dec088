//! Experiment catalogue.
//!
//! Each experiment supplies two things: the [`FaultProfile`] describing its
//! fault, and the target list built from configuration. Everything else is
//! the generic engine.

pub mod disk_loss;
pub mod process_kill;
pub mod run_script;
pub mod service_kill;

use crate::config::RunConfig;
use crate::error::{FaultlineError, Result};
use crate::lifecycle::FaultProfile;
use crate::types::{Target, TargetKind};

/// Auxiliary key naming the VM a target lives on.
pub const AUX_VM_ID: &str = "vm_id";

/// A fully prepared experiment: profile plus resolved targets.
#[derive(Debug)]
pub struct Experiment {
    pub profile: FaultProfile,
    pub targets: Vec<Target>,
}

/// Resolve an experiment by name.
pub fn build(name: &str, config: &RunConfig) -> Result<Experiment> {
    match name {
        "disk-loss" => disk_loss::build(config),
        "service-kill" => service_kill::build(config),
        "process-kill" => process_kill::build(config),
        "run-script" => run_script::build(config),
        other => Err(FaultlineError::Config(format!(
            "unrecognized experiment name: {}",
            other
        ))),
    }
}

/// Pair target ids with their owning VM. A single VM id is applied to every
/// target; otherwise the lists must match element for element.
fn with_vm_ids(ids: Vec<String>, kind: TargetKind, moids: &[String]) -> Result<Vec<Target>> {
    if moids.len() != 1 && moids.len() != ids.len() {
        return Err(FaultlineError::Config(format!(
            "{} target ids listed against {} VM ids",
            ids.len(),
            moids.len()
        )));
    }
    Ok(ids
        .into_iter()
        .enumerate()
        .map(|(i, id)| {
            let moid = if moids.len() == 1 { &moids[0] } else { &moids[i] };
            Target::new(id, kind).with_aux(AUX_VM_ID, moid.clone())
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    pub(crate) fn config_from(pairs: &[(&str, &str)]) -> RunConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RunConfig::from_map(&map).unwrap()
    }

    #[test]
    fn unknown_experiment_name_is_a_config_error() {
        let config = config_from(&[]);
        let err = build("coffee-spill", &config).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn single_vm_id_broadcasts_to_all_targets() {
        let targets = with_vm_ids(
            vec!["p1".into(), "p2".into()],
            TargetKind::Process,
            &["vm-1".to_string()],
        )
        .unwrap();
        assert!(targets.iter().all(|t| t.auxiliary[AUX_VM_ID] == "vm-1"));
    }

    #[test]
    fn mismatched_vm_list_is_rejected() {
        let err = with_vm_ids(
            vec!["p1".into(), "p2".into(), "p3".into()],
            TargetKind::Process,
            &["vm-1".to_string(), "vm-2".to_string()],
        )
        .unwrap_err();
        assert!(err.is_config());
    }
}
