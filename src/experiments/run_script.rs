//! Run-script experiment: upload a script into each guest and execute it.
//!
//! Injection uploads the script and launches execution as a detached task;
//! the fault is considered applied the moment execution starts. Revert waits
//! for the execution to finish and surfaces its result. Parallel mode runs a
//! single shot per invocation rather than looping until the window elapses,
//! since re-running an arbitrary script every interval tick compounds its
//! side effects.

use crate::adapter::ResourceAction;
use crate::config::RunConfig;
use crate::error::Result;
use crate::lifecycle::FaultProfile;
use crate::types::{Target, TargetKind};

use super::Experiment;

pub fn profile() -> FaultProfile {
    FaultProfile {
        kind: TargetKind::Script,
        inject: ResourceAction::Upload,
        launch: Some(ResourceAction::Execute),
        restore: None,
        injected_state: None,
        healthy_state: None,
        watch_abort: true,
        single_shot_parallel: true,
    }
}

pub fn build(config: &RunConfig) -> Result<Experiment> {
    let vm_names = config.target_list("VM_NAMES")?;
    let targets = vm_names
        .into_iter()
        .map(|vm| Target::new(vm, TargetKind::Script))
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
    fn script_profile_launches_detached_execution() {
        let config = config_from(&[("VM_NAMES", "vm-a,vm-b")]);
        let exp = build(&config).unwrap();
        assert_eq!(exp.profile.inject, ResourceAction::Upload);
        assert_eq!(exp.profile.launch, Some(ResourceAction::Execute));
        assert!(exp.profile.single_shot_parallel);
        assert_eq!(exp.targets.len(), 2);
    }
}
