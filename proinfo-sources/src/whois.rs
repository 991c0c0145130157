//! WHOIS/Geo source - ownership and location via ipwho.is
//!
//! The organization falls back to the ISP when absent and the ASN is
//! rendered as `AS<number>`. A `success: false` body counts as a failure.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{Finding, SourceAdapter, SourceError, SourceKind, SourceReport, WhoisFinding};

/// Ownership/geolocation lookups
pub struct WhoisSource {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl WhoisSource {
    pub fn new(client: Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn url(&self, address: &str) -> String {
        match &self.api_key {
            Some(key) => format!("{}/{}?key={}", self.base_url, address, urlencoding::encode(key)),
            None => format!("{}/{}", self.base_url, address),
        }
    }

    async fn fetch(&self, address: &str) -> Result<WhoisFinding, SourceError> {
        let response = self.client.get(self.url(address)).send().await?;

        if !response.status().is_success() {
            return Err(SourceError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        parse_whois(&body)
    }
}

/// Parse an ipwho.is body
pub fn parse_whois(body: &str) -> Result<WhoisFinding, SourceError> {
    let data: IpWhoResponse =
        serde_json::from_str(body).map_err(|e| SourceError::Parse(e.to_string()))?;

    if !data.success {
        return Err(SourceError::Provider(
            data.message.unwrap_or_else(|| "lookup unsuccessful".to_string()),
        ));
    }

    let connection = data.connection.unwrap_or_default();
    let owner = connection
        .org
        .filter(|o| !o.is_empty())
        .or(connection.isp.filter(|i| !i.is_empty()));

    Ok(WhoisFinding {
        owner,
        country: data.country_code.or(data.country),
        asn: connection.asn.map(|asn| format!("AS{}", asn)),
        latitude: data.latitude,
        longitude: data.longitude,
    })
}

#[async_trait]
impl SourceAdapter for WhoisSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Whois
    }

    fn name(&self) -> &str {
        "ipwho.is"
    }

    async fn query(&self, address: &str) -> SourceReport {
        match self.fetch(address).await {
            Ok(finding) => SourceReport::new(SourceKind::Whois, "ipwho.is", Finding::Whois(finding)),
            Err(e) => {
                debug!("WHOIS lookup for {} failed: {}", address, e);
                SourceReport::empty(SourceKind::Whois)
            }
        }
    }
}

// ipwho.is response types
#[derive(Debug, Deserialize)]
struct IpWhoResponse {
    #[serde(default)]
    success: bool,
    message: Option<String>,
    country: Option<String>,
    country_code: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    connection: Option<IpWhoConnection>,
}

#[derive(Debug, Default, Deserialize)]
struct IpWhoConnection {
    asn: Option<u64>,
    org: Option<String>,
    isp: Option<String>,
}
