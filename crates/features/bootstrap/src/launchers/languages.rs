use crate::channel::Payload;
use crate::launcher::{LaunchContext, LaunchFuture, Launcher, Stage};
use portal_domain::batch::ExternalBatch;
use portal_domain::settings::LanguageFeed;
use portal_domain::subsystem::SubsystemId;
use portal_fetcher::{RetryPolicy, Transport, feeds};
use std::sync::Arc;
use tracing::{debug, info};

/// Fetches one of the language lists.
#[derive(Debug)]
pub struct LanguagesLauncher<T> {
    transport: Arc<T>,
    feed: LanguageFeed,
    policy: RetryPolicy,
}

impl<T: Transport> LanguagesLauncher<T> {
    /// The MAUS feed gets a smaller retry budget than the ASR feed.
    #[must_use]
    pub fn new(transport: Arc<T>, feed: LanguageFeed) -> Self {
        let policy = match feed {
            LanguageFeed::Asr => RetryPolicy::STANDARD,
            LanguageFeed::Maus => RetryPolicy::MAUS,
        };
        Self { transport, feed, policy }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl<T: Transport> Launcher for LanguagesLauncher<T> {
    fn id(&self) -> SubsystemId {
        match self.feed {
            LanguageFeed::Asr => SubsystemId::ASR_LANGUAGES,
            LanguageFeed::Maus => SubsystemId::MAUS_LANGUAGES,
        }
    }

    fn stage(&self) -> Stage {
        Stage::AfterSettings
    }

    fn launch(&self, ctx: LaunchContext) -> LaunchFuture {
        let transport = Arc::clone(&self.transport);
        let policy = self.policy;
        let feed = self.feed;
        Box::pin(async move {
            let settings = ctx.require_settings()?;
            let url = match feed {
                LanguageFeed::Asr => settings.endpoints.asr_languages_url.as_deref(),
                LanguageFeed::Maus => settings.endpoints.maus_languages_url.as_deref(),
            };
            match feeds::fetch_languages(&*transport, policy, feed, url).await {
                Ok(batch) => {
                    info!(feed = feed.as_str(), languages = batch.len(), "Language list fetched");
                    Ok(Payload::Batch(batch))
                },
                Err(e) if e.is_config_missing() => {
                    debug!(feed = feed.as_str(), error = %e, "Language feed not configured");
                    Ok(Payload::Batch(ExternalBatch::Languages { feed, entries: Vec::new() }))
                },
                Err(e) => Err(e.to_string()),
            }
        })
    }
}
