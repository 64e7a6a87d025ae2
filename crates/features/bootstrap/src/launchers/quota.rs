use crate::channel::Payload;
use crate::launcher::{LaunchContext, LaunchFuture, Launcher, Stage};
use portal_domain::batch::{ExternalBatch, QuotaInfo};
use portal_domain::subsystem::SubsystemId;
use portal_fetcher::{RetryPolicy, Transport, feeds};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Fetches the quota of every ASR provider that declares a quota endpoint.
///
/// Providers are queried concurrently, each with its own retry budget. The
/// subsystem succeeds when at least one provider answered (or none applies)
/// and fails only when every request failed.
#[derive(Debug)]
pub struct QuotaLauncher<T> {
    transport: Arc<T>,
    policy: RetryPolicy,
}

impl<T: Transport> QuotaLauncher<T> {
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

impl<T: Transport> Launcher for QuotaLauncher<T> {
    fn id(&self) -> SubsystemId {
        SubsystemId::QUOTA
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
            let providers: Vec<_> = settings.quota_providers().cloned().collect();
            let Some(template) = settings.endpoints.quota_info_url.clone() else {
                debug!("No quota endpoint configured");
                return Ok(Payload::Batch(ExternalBatch::Quota(Vec::new())));
            };
            if providers.is_empty() {
                debug!("No provider requires quota information");
                return Ok(Payload::Batch(ExternalBatch::Quota(Vec::new())));
            }

            let mut tasks = JoinSet::new();
            for descriptor in providers {
                let transport = Arc::clone(&transport);
                let template = template.clone();
                tasks.spawn(async move {
                    let result =
                        feeds::fetch_quota(&*transport, policy, Some(&template), &descriptor).await;
                    (descriptor.provider, result)
                });
            }

            let mut infos: Vec<QuotaInfo> = Vec::new();
            let mut failures: Vec<String> = Vec::new();
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((_, Ok(info))) => infos.push(info),
                    Ok((provider, Err(e))) => {
                        warn!(provider = %provider, error = %e, "Quota request failed");
                        failures.push(format!("{provider}: {e}"));
                    },
                    Err(e) => failures.push(format!("quota task aborted: {e}")),
                }
            }

            if infos.is_empty() {
                return Err(format!("all quota requests failed: {}", failures.join("; ")));
            }
            infos.sort_by(|a, b| a.provider.cmp(&b.provider));
            info!(answered = infos.len(), failed = failures.len(), "Quota information fetched");
            Ok(Payload::Batch(ExternalBatch::Quota(infos)))
        })
    }
}
