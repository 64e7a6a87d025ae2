use crate::channel::{Outcome, Payload};
use crate::launcher::{LaunchContext, LaunchFuture, Launcher};
use portal_domain::subsystem::{AppMode, SubsystemId};
use tracing::info;

/// Resolves the application mode from its configured name.
#[derive(Debug, Clone)]
pub struct ModeLauncher {
    raw: String,
}

impl ModeLauncher {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }
}

impl Launcher for ModeLauncher {
    fn id(&self) -> SubsystemId {
        SubsystemId::MODE
    }

    fn launch(&self, _ctx: LaunchContext) -> LaunchFuture {
        Box::pin(resolve(self.raw.clone()))
    }
}

async fn resolve(raw: String) -> Outcome {
    let mode = raw.parse::<AppMode>()?;
    info!(mode = ?mode, "Application mode resolved");
    Ok(Payload::Mode(mode))
}
