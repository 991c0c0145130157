//! Abuse reputation source - AbuseIPDB confidence score
//!
//! Requires a key; without one the source is skipped and reports 0.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{AbuseFinding, Finding, SourceAdapter, SourceError, SourceKind, SourceReport};

/// Reports from the last 90 days are considered
const MAX_AGE_DAYS: u32 = 90;

/// AbuseIPDB reputation lookups
pub struct AbuseSource {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl AbuseSource {
    pub fn new(client: Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn has_key(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch(&self, address: &str, api_key: &str) -> Result<AbuseFinding, SourceError> {
        let url = format!(
            "{}/check?ipAddress={}&maxAgeInDays={}",
            self.base_url,
            urlencoding::encode(address),
            MAX_AGE_DAYS
        );

        let response = self
            .client
            .get(&url)
            .header("Key", api_key)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SourceError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        parse_abuse(&body)
    }
}

/// Parse an AbuseIPDB `check` body
pub fn parse_abuse(body: &str) -> Result<AbuseFinding, SourceError> {
    let response: AbuseCheckResponse =
        serde_json::from_str(body).map_err(|e| SourceError::Parse(e.to_string()))?;

    let data = response.data.unwrap_or_default();
    let confidence = data.abuse_confidence_score.unwrap_or(0).clamp(0, 100) as u8;

    Ok(AbuseFinding {
        confidence,
        usage_type: data.usage_type,
    })
}

#[async_trait]
impl SourceAdapter for AbuseSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Abuse
    }

    fn name(&self) -> &str {
        "AbuseIPDB"
    }

    async fn query(&self, address: &str) -> SourceReport {
        let api_key = match &self.api_key {
            Some(key) => key,
            None => {
                debug!("No AbuseIPDB key configured");
                return SourceReport::skipped(SourceKind::Abuse);
            }
        };

        match self.fetch(address, api_key).await {
            Ok(finding) => SourceReport::new(SourceKind::Abuse, "AbuseIPDB", Finding::Abuse(finding)),
            Err(SourceError::Status(401)) | Err(SourceError::Status(403)) => {
                warn!("AbuseIPDB rejected the configured key");
                SourceReport::empty(SourceKind::Abuse)
            }
            Err(e) => {
                debug!("AbuseIPDB check for {} failed: {}", address, e);
                SourceReport::empty(SourceKind::Abuse)
            }
        }
    }
}

// AbuseIPDB response types
#[derive(Debug, Deserialize)]
struct AbuseCheckResponse {
    data: Option<AbuseCheckData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AbuseCheckData {
    abuse_confidence_score: Option<i64>,
    usage_type: Option<String>,
}
