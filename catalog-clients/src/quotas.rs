//! Cloud Quotas adapter. Per-region quota values size the rate limits of the
//! region subqueues; the values come back per minute and are converted to a
//! per-second dispatch rate.

use serde::Deserialize;
use tracing::error;

use transfer_gcp_auth::SharedTokenProvider;

use crate::error::ApiError;
use crate::http::RestClient;

const CLOUD_QUOTAS_BASE_URL: &str = "https://cloudquotas.googleapis.com";

pub const DATAPLEX_SERVICE: &str = "dataplex.googleapis.com";
pub const DATA_CATALOG_SERVICE: &str = "datacatalog.googleapis.com";

/// Catalog management reads, per project per region.
pub const DATAPLEX_CONTENT_READS_QUOTA: &str = "CatalogManagementReadsPerMinutePerProjectPerRegion";
/// Catalog management reads, per project per user per region.
pub const DATAPLEX_CONTENT_READS_PER_USER_QUOTA: &str =
    "CatalogManagementReadsPerMinutePerProjectPerUserPerRegion";
/// IAM policy requests, per project per region.
pub const DATAPLEX_IAM_POLICY_QUOTA: &str = "DefaultIamPolicyRequestsPerMinutePerProjectPerRegion";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuotaInfoResponse {
    #[serde(default)]
    dimensions_infos: Vec<DimensionInfo>,
}

#[derive(Debug, Deserialize)]
struct DimensionInfo {
    #[serde(default)]
    details: QuotaDetails,
}

#[derive(Debug, Default, Deserialize)]
struct QuotaDetails {
    /// int64 comes back as a JSON string on some surfaces; accept both.
    #[serde(default, deserialize_with = "int64_or_string")]
    value: Option<i64>,
}

fn int64_or_string<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) => s
            .parse::<i64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("not an int64: {s}"))),
    }
}

pub struct QuotasClient {
    rest: RestClient,
    base_url: String,
}

impl QuotasClient {
    pub fn new(tokens: SharedTokenProvider) -> Self {
        Self {
            rest: RestClient::new(tokens),
            base_url: CLOUD_QUOTAS_BASE_URL.to_string(),
        }
    }

    /// Test seam: point the adapter at a fake Cloud Quotas endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        self.base_url = base_url;
        self
    }

    /// The default value of one quota, reduced to requests per second:
    /// `ceil(min over dimensions / 60)`. Missing quota information degrades
    /// to `None` so callers can fall back to a conservative rate.
    pub async fn default_quota_value(
        &self,
        project: &str,
        service: &str,
        quota: &str,
    ) -> Result<Option<u32>, ApiError> {
        let url = format!(
            "{}/v1/projects/{project}/locations/global/services/{service}/quotaInfos/{quota}",
            self.base_url,
        );
        let response: QuotaInfoResponse = match self.rest.get_json(&url, &[], "get quota info").await
        {
            Ok(response) => response,
            Err(ApiError::NotFound(_)) => {
                error!(quota, service, "quota information not found");
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        let minimum = response
            .dimensions_infos
            .iter()
            .filter_map(|info| info.details.value)
            .min();
        Ok(minimum.map(per_minute_to_rps))
    }
}

fn per_minute_to_rps(per_minute: i64) -> u32 {
    let per_minute = per_minute.max(0) as u64;
    (per_minute.div_ceil(60)).min(u32::MAX as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn quota_values_round_up_to_rps() {
        assert_eq!(per_minute_to_rps(600), 10);
        assert_eq!(per_minute_to_rps(601), 11);
        assert_eq!(per_minute_to_rps(59), 1);
        assert_eq!(per_minute_to_rps(0), 0);
    }
}
