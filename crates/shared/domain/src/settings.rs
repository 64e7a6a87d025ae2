use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The single merged configuration object consumed by the rest of the application.
///
/// The base document is loaded once; external data is folded into it afterwards.
/// The set of keys in [`CanonicalSettings::services`] is fixed by the base document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CanonicalSettings {
    /// Version string of the settings document.
    pub version: String,
    /// Client rules the portal is known to work with.
    pub allowed_browsers: Vec<BrowserRule>,
    /// Named plugin toggles.
    pub plugins: BTreeMap<String, bool>,
    /// URLs of the external information feeds.
    pub endpoints: Endpoints,
    /// Service descriptors keyed by provider name.
    #[serde(with = "services_by_provider")]
    pub services: BTreeMap<String, ServiceDescriptor>,
    /// Language collections, one per feed.
    pub languages: Languages,
}

impl CanonicalSettings {
    #[must_use]
    pub fn service(&self, provider: &str) -> Option<&ServiceDescriptor> {
        self.services.get(provider)
    }

    /// ASR descriptors whose quota endpoint applies.
    pub fn quota_providers(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.services.values().filter(|s| s.kind == ServiceKind::Asr && s.quota_info)
    }

    #[must_use]
    pub fn plugin_enabled(&self, name: &str) -> bool {
        self.plugins.get(name).copied().unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserRule {
    pub name: String,
    #[serde(default)]
    pub min_version: Option<u32>,
}

/// Where the external information feeds live.
///
/// `quota_info_url` is a template; `{provider}` is replaced with the
/// descriptor's external name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Endpoints {
    pub quota_info_url: Option<String>,
    pub capability_info_url: Option<String>,
    pub asr_languages_url: Option<String>,
    pub maus_languages_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    #[default]
    Asr,
    Summarization,
    Translation,
}

/// One third-party backend as described by the base settings document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceDescriptor {
    pub provider: String,
    #[serde(rename = "type")]
    pub kind: ServiceKind,
    /// Name the provider is known by on the external info endpoints.
    #[serde(alias = "basName")]
    pub external_name: Option<String>,
    /// `false` marks providers the quota endpoint does not apply to.
    pub quota_info: bool,
    pub quota_per_month: Option<u64>,
    pub used_quota: Option<u64>,
    /// Maximum signal duration in seconds.
    pub max_signal_duration: Option<u64>,
    pub known_issues: Option<String>,
    pub data_storage_policy: Option<String>,
    #[serde(rename = "termsURL", alias = "termsUrl")]
    pub terms_url: Option<String>,
    #[serde(rename = "homepageURL", alias = "homepageUrl")]
    pub homepage_url: Option<String>,
}

impl Default for ServiceDescriptor {
    fn default() -> Self {
        Self {
            provider: String::new(),
            kind: ServiceKind::Asr,
            external_name: None,
            quota_info: true,
            quota_per_month: None,
            used_quota: None,
            max_signal_duration: None,
            known_issues: None,
            data_storage_policy: None,
            terms_url: None,
            homepage_url: None,
        }
    }
}

impl ServiceDescriptor {
    /// Name used when querying external endpoints for this provider.
    #[must_use]
    pub fn external_or_provider(&self) -> &str {
        self.external_name.as_deref().unwrap_or(&self.provider)
    }
}

/// Selectable recognition language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageEntry {
    pub value: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_providers: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageFeed {
    Asr,
    Maus,
}

impl LanguageFeed {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asr => "asr",
            Self::Maus => "maus",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Languages {
    pub asr: Vec<LanguageEntry>,
    pub maus: Vec<LanguageEntry>,
}

impl Languages {
    #[must_use]
    pub fn feed(&self, feed: LanguageFeed) -> &[LanguageEntry] {
        match feed {
            LanguageFeed::Asr => &self.asr,
            LanguageFeed::Maus => &self.maus,
        }
    }

    pub const fn feed_mut(&mut self, feed: LanguageFeed) -> &mut Vec<LanguageEntry> {
        match feed {
            LanguageFeed::Asr => &mut self.asr,
            LanguageFeed::Maus => &mut self.maus,
        }
    }
}

/// The settings document lists services as an array; internally they are keyed by provider.
/// A later entry with an already seen provider replaces the earlier one.
#[allow(clippy::redundant_pub_crate)]
pub mod services_by_provider {
    use super::ServiceDescriptor;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub(super) fn serialize<S: Serializer>(
        v: &BTreeMap<String, ServiceDescriptor>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        let list: Vec<&ServiceDescriptor> = v.values().collect();
        list.serialize(s)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<BTreeMap<String, ServiceDescriptor>, D::Error> {
        let list = Vec::<ServiceDescriptor>::deserialize(d)?;
        let mut map = BTreeMap::new();
        for service in list {
            if service.provider.trim().is_empty() {
                return Err(serde::de::Error::custom("service entry without provider name"));
            }
            map.insert(service.provider.clone(), service);
        }
        Ok(map)
    }
}
