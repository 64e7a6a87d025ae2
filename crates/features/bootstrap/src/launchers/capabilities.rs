use crate::channel::Payload;
use crate::launcher::{LaunchContext, LaunchFuture, Launcher, Stage};
use portal_domain::batch::ExternalBatch;
use portal_domain::subsystem::SubsystemId;
use portal_fetcher::{RetryPolicy, Transport, feeds};
use std::sync::Arc;
use tracing::{debug, info};

/// Scrapes the service information page.
#[derive(Debug)]
pub struct CapabilitiesLauncher<T> {
    transport: Arc<T>,
    policy: RetryPolicy,
}

impl<T: Transport> CapabilitiesLauncher<T> {
    #[must_use]
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport, policy: RetryPolicy::STANDARD }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl<T: Transport> Launcher for CapabilitiesLauncher<T> {
    fn id(&self) -> SubsystemId {
        SubsystemId::CAPABILITIES
    }

    fn required(&self) -> bool {
        false
    }

    fn stage(&self) -> Stage {
        Stage::AfterSettings
    }

    fn launch(&self, ctx: LaunchContext) -> LaunchFuture {
        let transport = Arc::clone(&self.transport);
        let policy = self.policy;
        Box::pin(async move {
            let settings = ctx.require_settings()?;
            let url = settings.endpoints.capability_info_url.as_deref();
            match feeds::fetch_capabilities(&*transport, policy, url).await {
                Ok(batch) => {
                    info!(services = batch.len(), "Capability information fetched");
                    Ok(Payload::Batch(batch))
                },
                Err(e) if e.is_config_missing() => {
                    debug!(error = %e, "Capability feed not configured");
                    Ok(Payload::Batch(ExternalBatch::Capabilities(Vec::new())))
                },
                Err(e) => Err(e.to_string()),
            }
        })
    }
}
