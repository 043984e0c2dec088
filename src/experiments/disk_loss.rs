//! Disk-loss experiment: detach virtual disks from their VMs, hold, reattach.
//!
//! Every disk id is paired with the VM it is attached to; the lists must
//! match element for element because reattachment needs the owning VM. The
//! disk's backing path is captured by the adapter before the first detach.

use crate::adapter::ResourceAction;
use crate::config::RunConfig;
use crate::error::{FaultlineError, Result};
use crate::lifecycle::FaultProfile;
use crate::types::{ResourceState, Target, TargetKind};

use super::{Experiment, AUX_VM_ID};

pub fn profile() -> FaultProfile {
    FaultProfile {
        kind: TargetKind::Disk,
        inject: ResourceAction::Detach,
        launch: None,
        restore: Some(ResourceAction::Attach),
        injected_state: Some(ResourceState::from("detached")),
        healthy_state: Some(ResourceState::from("attached")),
        watch_abort: true,
        single_shot_parallel: false,
    }
}

pub fn build(config: &RunConfig) -> Result<Experiment> {
    let disk_ids = config.target_list("DISK_IDS")?;
    let vm_ids = config.target_list("APP_VM_MOIDS")?;
    if disk_ids.len() != vm_ids.len() {
        return Err(FaultlineError::Config(format!(
            "{} disk ids listed against {} VM ids",
            disk_ids.len(),
            vm_ids.len()
        )));
    }

    let targets = disk_ids
        .into_iter()
        .zip(vm_ids)
        .map(|(disk, vm)| Target::new(disk, TargetKind::Disk).with_aux(AUX_VM_ID, vm))
        .collect();

    Ok(Experiment {
        profile: profile(),
        targets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiments::tests::config_from;

    #[test]
    fn pairs_each_disk_with_its_vm() {
        let config = config_from(&[
            ("DISK_IDS", "disk-1,disk-2"),
            ("APP_VM_MOIDS", "vm-1,vm-2"),
        ]);
        let exp = build(&config).unwrap();
        assert_eq!(exp.targets.len(), 2);
        assert_eq!(exp.targets[0].auxiliary[AUX_VM_ID], "vm-1");
        assert_eq!(exp.targets[1].auxiliary[AUX_VM_ID], "vm-2");
        assert_eq!(exp.profile.restore, Some(ResourceAction::Attach));
    }

    #[test]
    fn mismatched_lists_are_rejected() {
        let config = config_from(&[("DISK_IDS", "disk-1,disk-2"), ("APP_VM_MOIDS", "vm-1")]);
        assert!(build(&config).unwrap_err().is_config());
    }

    #[test]
    fn missing_disk_list_is_rejected() {
        let config = config_from(&[("APP_VM_MOIDS", "vm-1")]);
        assert!(build(&config).unwrap_err().is_config());
    }
}
