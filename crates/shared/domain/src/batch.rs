use crate::settings::{LanguageEntry, LanguageFeed};
use serde::{Deserialize, Serialize};

/// Normalized result of one external fetch.
///
/// Raw payload shapes (HTML, XML, JSON) never leave the fetcher; everything
/// downstream only sees one of these variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum ExternalBatch {
    Quota(Vec<QuotaInfo>),
    Capabilities(Vec<CapabilityInfo>),
    Languages { feed: LanguageFeed, entries: Vec<LanguageEntry> },
}

impl ExternalBatch {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Quota(_) => "quota",
            Self::Capabilities(_) => "capabilities",
            Self::Languages { feed: LanguageFeed::Asr, .. } => "asr-languages",
            Self::Languages { feed: LanguageFeed::Maus, .. } => "maus-languages",
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Quota(items) => items.len(),
            Self::Capabilities(items) => items.len(),
            Self::Languages { entries, .. } => entries.len(),
        }
    }
}

/// Monthly quota of one provider, keyed by the settings' provider name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaInfo {
    pub provider: String,
    pub monthly_quota: Option<u64>,
    pub used_quota: Option<u64>,
}

/// Capability record scraped for one external service name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityInfo {
    pub name: String,
    pub max_signal_duration: Option<u64>,
    pub known_issues: Option<String>,
    pub data_storage_policy: Option<String>,
    pub quota_per_month: Option<u64>,
    pub terms_url: Option<String>,
}
