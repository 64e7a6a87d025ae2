use crate::error::FetchError;
use portal_domain::settings::CanonicalSettings;

/// Parses the base settings JSON document.
pub fn parse_base_settings(raw: &str) -> Result<CanonicalSettings, FetchError> {
    serde_json::from_str::<CanonicalSettings>(raw)
        .map_err(|e| FetchError::parse(e.to_string()).context("base settings"))
}
