use crate::channel::{Outcome, Payload};
use crate::launcher::{LaunchContext, LaunchFuture, Launcher};
use portal_domain::subsystem::SubsystemId;
use std::path::PathBuf;
use tracing::info;

/// Prepares the session log directory and records the session start.
///
/// Subscriber installation happens in the binary before the bootstrap runs;
/// this subsystem only covers what a session needs on top of it.
#[derive(Debug, Clone)]
pub struct LoggingLauncher {
    client: String,
    directory: Option<PathBuf>,
}

impl LoggingLauncher {
    #[must_use]
    pub fn new(client: impl Into<String>, directory: Option<PathBuf>) -> Self {
        Self { client: client.into(), directory }
    }
}

impl Launcher for LoggingLauncher {
    fn id(&self) -> SubsystemId {
        SubsystemId::LOGGING
    }

    fn launch(&self, _ctx: LaunchContext) -> LaunchFuture {
        Box::pin(open_session(self.client.clone(), self.directory.clone()))
    }
}

async fn open_session(client: String, directory: Option<PathBuf>) -> Outcome {
    if let Some(dir) = &directory {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| format!("cannot create log directory {}: {e}", dir.display()))?;
    }
    info!(
        client = %client,
        directory = ?directory,
        pid = std::process::id(),
        "Session started"
    );
    Ok(Payload::None)
}
