//! # Settings Merge
//!
//! Folds normalized [`ExternalBatch`]es into a [`CanonicalSettings`] value.
//!
//! Batches arrive in arbitrary order, long after the base settings were handed
//! out, so every merge obeys three rules:
//!
//! * the set of service keys never changes: data for unknown providers is dropped;
//! * an absent incoming value never erases an existing one;
//! * language lists are replaced wholesale per feed.
//!
//! Together these make merges of batches touching different keys commutative.
//! Merging never fails and never mutates its input.

use portal_domain::batch::{CapabilityInfo, ExternalBatch, QuotaInfo};
use portal_domain::settings::{
    CanonicalSettings, LanguageEntry, LanguageFeed, ServiceDescriptor, ServiceKind,
};
use tracing::{debug, trace};

/// Returns `settings` with `batch` applied.
#[must_use]
pub fn merge(settings: &CanonicalSettings, batch: &ExternalBatch) -> CanonicalSettings {
    let mut next = settings.clone();
    match batch {
        ExternalBatch::Quota(items) => apply_quota(&mut next, items),
        ExternalBatch::Capabilities(items) => apply_capabilities(&mut next, items),
        ExternalBatch::Languages { feed, entries } => apply_languages(&mut next, *feed, entries),
    }
    next
}

/// Applies `batches` left to right.
#[must_use]
pub fn merge_all<'a>(
    settings: &CanonicalSettings,
    batches: impl IntoIterator<Item = &'a ExternalBatch>,
) -> CanonicalSettings {
    batches.into_iter().fold(settings.clone(), |acc, batch| merge(&acc, batch))
}

fn apply_quota(settings: &mut CanonicalSettings, items: &[QuotaInfo]) {
    for item in items {
        let Some(service) = settings.services.get_mut(&item.provider) else {
            debug!(provider = %item.provider, "Dropping quota for unknown provider");
            continue;
        };
        overwrite(&mut service.quota_per_month, item.monthly_quota);
        overwrite(&mut service.used_quota, item.used_quota);
        trace!(provider = %item.provider, "Quota merged");
    }
}

fn apply_capabilities(settings: &mut CanonicalSettings, items: &[CapabilityInfo]) {
    for item in items {
        let mut matched = false;
        for service in settings.services.values_mut().filter(|s| accepts_capabilities(s, &item.name)) {
            overwrite(&mut service.max_signal_duration, item.max_signal_duration);
            overwrite(&mut service.known_issues, item.known_issues.clone());
            overwrite(&mut service.data_storage_policy, item.data_storage_policy.clone());
            overwrite(&mut service.quota_per_month, item.quota_per_month);
            overwrite(&mut service.terms_url, item.terms_url.clone());
            matched = true;
        }
        if !matched {
            debug!(name = %item.name, "Dropping capability info without matching service");
        }
    }
}

fn accepts_capabilities(service: &ServiceDescriptor, name: &str) -> bool {
    service.kind != ServiceKind::Summarization && service.external_name.as_deref() == Some(name)
}

fn apply_languages(settings: &mut CanonicalSettings, feed: LanguageFeed, entries: &[LanguageEntry]) {
    *settings.languages.feed_mut(feed) = normalize_languages(entries);
}

/// Drops entries with an empty description and stable-sorts the rest by description.
///
/// The comparison is byte-wise, independent of any locale.
#[must_use]
pub fn normalize_languages(entries: &[LanguageEntry]) -> Vec<LanguageEntry> {
    let mut kept: Vec<LanguageEntry> =
        entries.iter().filter(|e| !e.description.trim().is_empty()).cloned().collect();
    kept.sort_by(|a, b| a.description.cmp(&b.description));
    kept
}

fn overwrite<T>(slot: &mut Option<T>, incoming: Option<T>) {
    if incoming.is_some() {
        *slot = incoming;
    }
}
