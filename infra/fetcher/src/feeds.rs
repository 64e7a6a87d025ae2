//! One function per external feed: retry around (request + parse), then hand
//! back a normalized value.

use crate::error::FetchError;
use crate::parse::{parse_base_settings, parse_capabilities, parse_languages, parse_quota};
use crate::retry::{RetryPolicy, retry};
use crate::transport::Transport;
use portal_domain::batch::{ExternalBatch, QuotaInfo};
use portal_domain::settings::{CanonicalSettings, LanguageFeed, ServiceDescriptor};

/// Placeholder replaced by the provider's external name in the quota URL template.
pub const PROVIDER_PLACEHOLDER: &str = "{provider}";

/// Loads the base settings document from `source`.
pub async fn fetch_base_settings<T: Transport>(
    transport: &T,
    policy: RetryPolicy,
    source: &str,
) -> Result<CanonicalSettings, FetchError> {
    retry(policy, "settings", |_| async move {
        let body = transport.get(source).await?;
        parse_base_settings(&body)
    })
    .await
}

/// Fetches the quota of a single provider.
///
/// The returned record is keyed by the descriptor's provider name, not by the
/// external name used in the request.
pub async fn fetch_quota<T: Transport>(
    transport: &T,
    policy: RetryPolicy,
    url_template: Option<&str>,
    descriptor: &ServiceDescriptor,
) -> Result<QuotaInfo, FetchError> {
    let template = url_template.ok_or_else(|| FetchError::config_missing("quotaInfoUrl"))?;
    let url = template.replace(PROVIDER_PLACEHOLDER, descriptor.external_or_provider());
    let url = url.as_str();
    let provider = descriptor.provider.as_str();

    retry(policy, "quota", |_| async move {
        let body = transport.get(url).await?;
        parse_quota(provider, &body)
    })
    .await
}

/// Fetches and scrapes the capability page.
pub async fn fetch_capabilities<T: Transport>(
    transport: &T,
    policy: RetryPolicy,
    url: Option<&str>,
) -> Result<ExternalBatch, FetchError> {
    let url = url.ok_or_else(|| FetchError::config_missing("capabilityInfoUrl"))?;

    retry(policy, "capabilities", |_| async move {
        let body = transport.get(url).await?;
        parse_capabilities(&body).map(ExternalBatch::Capabilities)
    })
    .await
}

/// Fetches one of the language lists.
pub async fn fetch_languages<T: Transport>(
    transport: &T,
    policy: RetryPolicy,
    feed: LanguageFeed,
    url: Option<&str>,
) -> Result<ExternalBatch, FetchError> {
    let url = url.ok_or_else(|| {
        FetchError::config_missing(match feed {
            LanguageFeed::Asr => "asrLanguagesUrl",
            LanguageFeed::Maus => "mausLanguagesUrl",
        })
    })?;
    let label = match feed {
        LanguageFeed::Asr => "asr-languages",
        LanguageFeed::Maus => "maus-languages",
    };

    retry(policy, label, |_| async move {
        let body = transport.get(url).await?;
        parse_languages(feed, &body).map(|entries| ExternalBatch::Languages { feed, entries })
    })
    .await
}
