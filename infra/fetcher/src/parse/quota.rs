use crate::error::FetchError;
use crate::normalize::json_number;
use portal_domain::batch::QuotaInfo;
use serde_json::Value;

/// Parses one quota response (`{"monthlyQuota": .., "usedQuota": ..}`) for `provider`.
///
/// Both counters may be JSON numbers or numeric strings; anything else is absent.
pub fn parse_quota(provider: &str, raw: &str) -> Result<QuotaInfo, FetchError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| FetchError::parse(e.to_string()).context(format!("quota for {provider}")))?;

    let Value::Object(fields) = value else {
        return Err(FetchError::parse("expected a JSON object").context(format!("quota for {provider}")));
    };

    Ok(QuotaInfo {
        provider: provider.to_owned(),
        monthly_quota: fields.get("monthlyQuota").and_then(json_number),
        used_quota: fields.get("usedQuota").and_then(json_number),
    })
}
