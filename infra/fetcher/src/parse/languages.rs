use crate::error::FetchError;
use crate::normalize::{list, text};
use portal_domain::settings::{LanguageEntry, LanguageFeed};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct RawParameterValues {
    #[serde(rename = "ParameterValue", default)]
    values: Vec<RawParameterValue>,
}

#[derive(Debug, Deserialize)]
struct RawParameterValue {
    #[serde(rename = "Value", default)]
    value: String,
    #[serde(rename = "Description", default)]
    description: String,
    #[serde(rename = "Providers", default)]
    providers: Option<String>,
}

/// Parses a parameter-value list:
///
/// ```xml
/// <ParameterValues>
///   <ParameterValue>
///     <Value>deu-DE</Value>
///     <Description>German (Germany)</Description>
///     <Providers>Google,Watson</Providers>
///   </ParameterValue>
/// </ParameterValues>
/// ```
///
/// Entries without a value are dropped. Entries are returned in document order;
/// filtering of empty descriptions and sorting happen when the list is merged.
pub fn parse_languages(feed: LanguageFeed, raw: &str) -> Result<Vec<LanguageEntry>, FetchError> {
    let parsed: RawParameterValues = quick_xml::de::from_str(raw)
        .map_err(|e| FetchError::parse(e.to_string()).context(format!("{} languages", feed.as_str())))?;

    Ok(parsed
        .values
        .into_iter()
        .filter_map(|raw| {
            let value = text(&raw.value)?;
            Some(LanguageEntry {
                value,
                description: raw.description.trim().to_owned(),
                allowed_providers: raw.providers.as_deref().and_then(list),
            })
        })
        .collect())
}
