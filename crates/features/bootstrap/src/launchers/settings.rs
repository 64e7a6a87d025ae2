use crate::channel::{Outcome, Payload};
use crate::launcher::{LaunchContext, LaunchFuture, Launcher};
use portal_domain::subsystem::SubsystemId;
use portal_fetcher::{RetryPolicy, Transport, feeds};
use std::sync::Arc;
use tracing::info;

/// Loads the base settings document every other feed depends on.
#[derive(Debug)]
pub struct SettingsLauncher<T> {
    transport: Arc<T>,
    policy: RetryPolicy,
    source: String,
}

impl<T: Transport> SettingsLauncher<T> {
    #[must_use]
    pub fn new(transport: Arc<T>, source: impl Into<String>) -> Self {
        Self { transport, policy: RetryPolicy::STANDARD, source: source.into() }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl<T: Transport> Launcher for SettingsLauncher<T> {
    fn id(&self) -> SubsystemId {
        SubsystemId::SETTINGS
    }

    fn launch(&self, _ctx: LaunchContext) -> LaunchFuture {
        Box::pin(load(Arc::clone(&self.transport), self.policy, self.source.clone()))
    }
}

async fn load<T: Transport>(transport: Arc<T>, policy: RetryPolicy, source: String) -> Outcome {
    let settings = feeds::fetch_base_settings(&*transport, policy, &source)
        .await
        .map_err(|e| e.to_string())?;
    info!(
        source = %source,
        version = %settings.version,
        services = settings.services.len(),
        "Base settings loaded"
    );
    Ok(Payload::Settings(settings))
}
