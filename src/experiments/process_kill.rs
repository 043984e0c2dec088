//! Process-kill experiment: kill guest processes, no revert.
//!
//! Killed processes are not brought back; there is no restore action, no
//! recovery wait, and no abort watcher. Rounds still space the kills by the
//! chaos interval.

use crate::adapter::ResourceAction;
use crate::config::RunConfig;
use crate::error::Result;
use crate::lifecycle::FaultProfile;
use crate::types::TargetKind;

use super::{with_vm_ids, Experiment};

pub fn profile() -> FaultProfile {
    FaultProfile {
        kind: TargetKind::Process,
        inject: ResourceAction::Kill,
        launch: None,
        restore: None,
        injected_state: None,
        healthy_state: None,
        watch_abort: false,
        single_shot_parallel: false,
    }
}

pub fn build(config: &RunConfig) -> Result<Experiment> {
    let process_ids = config.target_list("PROCESS_IDS")?;
    let vm_ids = config.target_list("APP_VM_MOIDS")?;
    Ok(Experiment {
        profile: profile(),
        targets: with_vm_ids(process_ids, TargetKind::Process, &vm_ids)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiments::tests::config_from;

    #[test]
    fn kill_profile_has_no_recovery_path() {
        let config = config_from(&[("PROCESS_IDS", "101,102"), ("APP_VM_MOIDS", "vm-1")]);
        let exp = build(&config).unwrap();
        assert_eq!(exp.profile.inject, ResourceAction::Kill);
        assert_eq!(exp.profile.restore, None);
        assert_eq!(exp.profile.healthy_state, None);
        assert!(!exp.profile.watch_abort);
        assert_eq!(exp.targets.len(), 2);
    }
}
