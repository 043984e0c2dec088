//! Service-kill experiment: stop guest services, then recover.
//!
//! Recovery has two modes. By default the engine starts the service back up
//! explicitly; with self-healing enabled (a guest supervisor restarts the
//! service on its own) the engine only waits for the service to report
//! active again.

use crate::adapter::ResourceAction;
use crate::config::RunConfig;
use crate::error::Result;
use crate::lifecycle::FaultProfile;
use crate::types::{ResourceState, TargetKind};

use super::{with_vm_ids, Experiment};

pub fn profile(self_healing: bool) -> FaultProfile {
    FaultProfile {
        kind: TargetKind::Service,
        inject: ResourceAction::Stop,
        launch: None,
        restore: if self_healing {
            None
        } else {
            Some(ResourceAction::Start)
        },
        injected_state: Some(ResourceState::from("inactive")),
        healthy_state: Some(ResourceState::from("active")),
        // self-healing services recover without intervention, so an abort
        // has nothing to force-revert
        watch_abort: !self_healing,
        single_shot_parallel: false,
    }
}

pub fn build(config: &RunConfig) -> Result<Experiment> {
    let services = config.target_list("SERVICE_NAMES")?;
    let vm_ids = config.target_list("APP_VM_MOIDS")?;
    Ok(Experiment {
        profile: profile(config.self_healing),
        targets: with_vm_ids(services, TargetKind::Service, &vm_ids)?,
    })
}
